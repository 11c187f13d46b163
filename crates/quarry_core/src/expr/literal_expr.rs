use std::fmt;

use crate::types::datatype::DataType;
use crate::types::scalar::ScalarValue;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LiteralExpr {
    pub literal: ScalarValue,
    /// Declared type of the literal. Lets NULL literals carry a type.
    pub datatype: DataType,
}

impl LiteralExpr {
    pub fn new(literal: ScalarValue) -> Self {
        let datatype = literal.datatype();
        LiteralExpr { literal, datatype }
    }

    pub fn typed(literal: ScalarValue, datatype: DataType) -> Self {
        LiteralExpr { literal, datatype }
    }
}

impl fmt::Display for LiteralExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.literal {
            ScalarValue::Utf8(s) => write!(f, "'{s}'"),
            other => write!(f, "{other}"),
        }
    }
}
