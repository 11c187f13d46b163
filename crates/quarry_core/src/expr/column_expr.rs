use std::fmt;

use quarry_error::{eval_error, Result};

use crate::types::datatype::DataType;
use crate::types::scalar::ScalarValue;
use crate::types::schema::Column;

/// A bound reference to a column in the input row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnExpr {
    /// Index into the row. Rows evaluated under a scope have the scope row as
    /// a prefix, so this may point at an outer column.
    pub index: usize,
    pub name: String,
    pub source: String,
    pub datatype: DataType,
    pub nullable: bool,
}

impl ColumnExpr {
    pub fn new(index: usize, datatype: DataType, name: impl Into<String>, nullable: bool) -> Self {
        ColumnExpr {
            index,
            name: name.into(),
            source: String::new(),
            datatype,
            nullable,
        }
    }

    pub fn from_column(index: usize, column: &Column) -> Self {
        ColumnExpr {
            index,
            name: column.name.clone(),
            source: column.source.clone(),
            datatype: column.datatype,
            nullable: column.nullable,
        }
    }

    pub fn eval(&self, row: &[ScalarValue]) -> Result<ScalarValue> {
        row.get(self.index).cloned().ok_or_else(|| {
            eval_error!(
                "column '{}' at index {} out of bounds for row of width {}",
                self.name,
                self.index,
                row.len()
            )
        })
    }
}

impl fmt::Display for ColumnExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A column reference produced by the parser that hasn't been bound yet.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnresolvedColumn {
    pub qualifier: Option<String>,
    pub name: String,
}

impl UnresolvedColumn {
    pub fn new(name: impl Into<String>) -> Self {
        UnresolvedColumn {
            qualifier: None,
            name: name.into(),
        }
    }

    pub fn qualified(qualifier: impl Into<String>, name: impl Into<String>) -> Self {
        UnresolvedColumn {
            qualifier: Some(qualifier.into()),
            name: name.into(),
        }
    }
}

impl fmt::Display for UnresolvedColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Some(q) => write!(f, "{q}.{}", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// `*` or `table.*` in a select list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StarExpr {
    pub qualifier: Option<String>,
}

impl fmt::Display for StarExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Some(q) => write!(f, "{q}.*"),
            None => write!(f, "*"),
        }
    }
}
