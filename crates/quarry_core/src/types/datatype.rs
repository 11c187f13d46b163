use std::fmt;

/// Logical type of a value or column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// Type of an untyped NULL literal.
    Null,
    Boolean,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    Utf8,
    Binary,
    Date,
    Timestamp,
}

impl DataType {
    pub const fn is_integer(&self) -> bool {
        matches!(
            self,
            Self::Int8
                | Self::Int16
                | Self::Int32
                | Self::Int64
                | Self::UInt8
                | Self::UInt16
                | Self::UInt32
                | Self::UInt64
        )
    }

    pub const fn is_float(&self) -> bool {
        matches!(self, Self::Float32 | Self::Float64)
    }

    pub const fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_float()
    }

    pub const fn is_temporal(&self) -> bool {
        matches!(self, Self::Date | Self::Timestamp)
    }

    /// Check if values of this type can be implicitly converted to `target`
    /// when written into a column of that type.
    pub fn can_coerce_to(&self, target: &DataType) -> bool {
        if self == target || *self == DataType::Null {
            return true;
        }

        match target {
            DataType::Utf8 => true,
            t if t.is_numeric() => self.is_numeric() || *self == DataType::Boolean,
            DataType::Boolean => self.is_integer(),
            DataType::Date => *self == DataType::Utf8,
            DataType::Timestamp => matches!(self, DataType::Utf8 | DataType::Date),
            _ => false,
        }
    }

    /// Common type two operands of an arithmetic operator are widened to.
    pub fn arith_result_type(left: &DataType, right: &DataType) -> Option<DataType> {
        match (left, right) {
            (DataType::Null, other) | (other, DataType::Null) if other.is_numeric() => {
                Some(*other)
            }
            (l, r) if l.is_float() || r.is_float() => {
                if l.is_numeric() && r.is_numeric() {
                    Some(DataType::Float64)
                } else {
                    None
                }
            }
            (l, r) if l.is_integer() && r.is_integer() => {
                if l == r {
                    Some(*l)
                } else {
                    Some(DataType::Int64)
                }
            }
            _ => None,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Null => "NULL",
            Self::Boolean => "BOOLEAN",
            Self::Int8 => "TINYINT",
            Self::Int16 => "SMALLINT",
            Self::Int32 => "INT",
            Self::Int64 => "BIGINT",
            Self::UInt8 => "TINYINT UNSIGNED",
            Self::UInt16 => "SMALLINT UNSIGNED",
            Self::UInt32 => "INT UNSIGNED",
            Self::UInt64 => "BIGINT UNSIGNED",
            Self::Float32 => "FLOAT",
            Self::Float64 => "DOUBLE",
            Self::Utf8 => "TEXT",
            Self::Binary => "BLOB",
            Self::Date => "DATE",
            Self::Timestamp => "TIMESTAMP",
        };
        write!(f, "{s}")
    }
}
