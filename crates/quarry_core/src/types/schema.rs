use super::datatype::DataType;
use super::scalar::ScalarValue;

/// A single column in a schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub datatype: DataType,
    pub nullable: bool,
    /// Name of the table or view that produced this column.
    pub source: String,
    /// Default value from the column's DDL definition.
    pub default: Option<ScalarValue>,
}

impl Column {
    pub fn new(name: impl Into<String>, datatype: DataType, nullable: bool) -> Self {
        Column {
            name: name.into(),
            datatype,
            nullable,
            source: String::new(),
            default: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_default(mut self, default: ScalarValue) -> Self {
        self.default = Some(default);
        self
    }
}

/// Ordered list of columns.
///
/// Order defines the row layout.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Schema {
    pub columns: Vec<Column>,
}

impl Schema {
    pub fn new(columns: impl IntoIterator<Item = Column>) -> Self {
        Schema {
            columns: columns.into_iter().collect(),
        }
    }

    pub const fn empty() -> Self {
        Schema {
            columns: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter()
    }

    /// Exact, case-sensitive lookup of a column by name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    /// Find all column indices matching a (possibly qualified) reference.
    ///
    /// Matching is case-insensitive. If a qualifier is provided, it's matched
    /// against the column source.
    pub fn find_matches(&self, qualifier: Option<&str>, name: &str) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, c)| {
                c.name.eq_ignore_ascii_case(name)
                    && qualifier.is_none_or(|q| c.source.eq_ignore_ascii_case(q))
            })
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Returns a new schema with every column's source replaced.
    pub fn with_source(self, source: &str) -> Schema {
        Schema {
            columns: self
                .columns
                .into_iter()
                .map(|c| c.with_source(source))
                .collect(),
        }
    }

    /// Concatenate schemas in order.
    pub fn merge(schemas: impl IntoIterator<Item = Schema>) -> Schema {
        Schema {
            columns: schemas.into_iter().flat_map(|s| s.columns).collect(),
        }
    }
}

impl FromIterator<Column> for Schema {
    fn from_iter<T: IntoIterator<Item = Column>>(iter: T) -> Self {
        Schema::new(iter)
    }
}

impl<'a> IntoIterator for &'a Schema {
    type Item = &'a Column;
    type IntoIter = std::slice::Iter<'a, Column>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.iter()
    }
}
