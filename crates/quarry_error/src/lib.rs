use std::fmt;

/// Kind of entity that failed to bind during analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Table,
    Column,
    View,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Table => write!(f, "table"),
            Self::Column => write!(f, "column"),
            Self::View => write!(f, "view"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("unresolved {kind}: {name}")]
    UnresolvedEntity { kind: EntityKind, name: String },

    #[error("incompatible use of AS OF: view '{view}' already defines its own AS OF")]
    IncompatibleAsOf { view: String },

    #[error("schema mismatch for column '{column}': cannot use {found} as {expected}")]
    SchemaMismatch {
        column: String,
        expected: String,
        found: String,
    },

    #[error("evaluation error: {0}")]
    Evaluation(String),

    #[error("not implemented: {0}")]
    NotImplemented(String),

    #[error("view '{view}' already exists in database '{database}'")]
    ViewAlreadyExists { database: String, view: String },

    #[error("table '{table}' already exists in database '{database}'")]
    TableAlreadyExists { database: String, table: String },

    #[error("database not found: {0}")]
    DatabaseNotFound(String),

    #[error("ambiguous column name: {0}")]
    AmbiguousColumn(String),

    #[error("query cancelled")]
    Cancelled,

    #[error("query exceeded its deadline")]
    DeadlineExceeded,

    #[error("unknown setting: {0}")]
    UnknownSetting(String),

    #[error("invalid value for setting '{name}': {reason}")]
    InvalidSetting { name: String, reason: String },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("internal: {0}")]
    Internal(String),
}

impl DbError {
    pub fn unresolved(kind: EntityKind, name: impl Into<String>) -> Self {
        DbError::UnresolvedEntity {
            kind,
            name: name.into(),
        }
    }

    /// Returns true if the error came from a tripped cancellation signal or
    /// deadline.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, DbError::Cancelled | DbError::DeadlineExceeded)
    }
}

pub type Result<T, E = DbError> = std::result::Result<T, E>;

#[macro_export]
macro_rules! internal {
    ($($arg:tt)*) => {
        $crate::DbError::Internal(std::format!($($arg)*))
    };
}

/// Return early with a `NotImplemented` error.
#[macro_export]
macro_rules! not_implemented {
    ($($arg:tt)*) => {
        return Err($crate::DbError::NotImplemented(std::format!($($arg)*)))
    };
}

#[macro_export]
macro_rules! eval_error {
    ($($arg:tt)*) => {
        $crate::DbError::Evaluation(std::format!($($arg)*))
    };
}
