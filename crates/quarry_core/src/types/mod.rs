pub mod datatype;
pub mod scalar;
pub mod schema;

use scalar::ScalarValue;

/// A single row of values, laid out according to some schema.
pub type Row = Vec<ScalarValue>;
