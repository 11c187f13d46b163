use std::collections::HashMap;
use std::sync::LazyLock;

use quarry_error::{DbError, Result};
use serde::Deserialize;

use crate::types::datatype::DataType;
use crate::types::scalar::ScalarValue;

pub const DEFAULT_ANALYZER_MAX_ITERATIONS: u64 = 8;

/// Configuration for the session.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Iteration cap for fixpoint analyzer batches.
    pub analyzer_max_iterations: u64,
    pub application_name: String,
    /// Query deadline in milliseconds. Zero disables the deadline.
    pub query_timeout_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            analyzer_max_iterations: DEFAULT_ANALYZER_MAX_ITERATIONS,
            application_name: String::new(),
            query_timeout_ms: 0,
        }
    }
}

impl SessionConfig {
    /// Load a config from JSON. Missing fields take their defaults.
    pub fn from_json(s: &str) -> Result<Self> {
        let conf: SessionConfig = serde_json::from_str(s)?;
        AnalyzerMaxIterations::validate_value(conf.analyzer_max_iterations)?;
        Ok(conf)
    }

    pub fn set_from_scalar(&mut self, name: &str, value: ScalarValue) -> Result<()> {
        let func = GET_SET_FUNCTIONS
            .get(name)
            .ok_or_else(|| DbError::UnknownSetting(name.to_string()))?;

        (func.set)(value, self)
    }

    pub fn get_as_scalar(&self, name: &str) -> Result<ScalarValue> {
        let func = GET_SET_FUNCTIONS
            .get(name)
            .ok_or_else(|| DbError::UnknownSetting(name.to_string()))?;

        Ok((func.get)(self))
    }

    pub fn reset(&mut self, name: &str) -> Result<()> {
        let def_conf = Self::default();

        let func = GET_SET_FUNCTIONS
            .get(name)
            .ok_or_else(|| DbError::UnknownSetting(name.to_string()))?;

        let scalar = (func.get)(&def_conf);
        (func.set)(scalar, self)
    }

    pub fn reset_all(&mut self) {
        *self = Self::default();
    }

    /// Names and descriptions of every setting, sorted by name.
    pub fn describe() -> Vec<(&'static str, &'static str)> {
        let mut settings: Vec<_> = GET_SET_FUNCTIONS
            .iter()
            .map(|(name, funcs)| (*name, funcs.description))
            .collect();
        settings.sort_unstable();
        settings
    }
}

struct SettingFunctions {
    description: &'static str,
    set: fn(scalar: ScalarValue, conf: &mut SessionConfig) -> Result<()>,
    get: fn(conf: &SessionConfig) -> ScalarValue,
}

impl SettingFunctions {
    const fn new<S: SessionSetting>() -> Self {
        SettingFunctions {
            description: S::DESCRIPTION,
            set: S::set_from_scalar as _,
            get: S::get_as_scalar as _,
        }
    }
}

fn insert_setting<S: SessionSetting>(map: &mut HashMap<&'static str, SettingFunctions>) {
    if map.insert(S::NAME, SettingFunctions::new::<S>()).is_some() {
        panic!("Duplicate settings names: {}", S::NAME);
    }
}

static GET_SET_FUNCTIONS: LazyLock<HashMap<&'static str, SettingFunctions>> = LazyLock::new(|| {
    let mut map = HashMap::new();

    insert_setting::<AnalyzerMaxIterations>(&mut map);
    insert_setting::<ApplicationName>(&mut map);
    insert_setting::<QueryTimeoutMs>(&mut map);

    map
});

pub trait SessionSetting: Sync + Send + 'static {
    const NAME: &'static str;
    const DESCRIPTION: &'static str;

    fn set_from_scalar(scalar: ScalarValue, conf: &mut SessionConfig) -> Result<()>;
    fn get_as_scalar(conf: &SessionConfig) -> ScalarValue;
}

fn invalid_setting<S: SessionSetting>(reason: impl Into<String>) -> DbError {
    DbError::InvalidSetting {
        name: S::NAME.to_string(),
        reason: reason.into(),
    }
}

fn scalar_as_u64<S: SessionSetting>(scalar: &ScalarValue) -> Result<u64> {
    match scalar.cast_to(&DataType::UInt64) {
        Ok(ScalarValue::UInt64(v)) => Ok(v),
        Ok(other) => Err(invalid_setting::<S>(format!("expected an integer, got {other}"))),
        Err(e) => Err(invalid_setting::<S>(e.to_string())),
    }
}

const MIN_ANALYZER_ITERATIONS: u64 = 1;
const MAX_ANALYZER_ITERATIONS: u64 = 1024;

pub struct AnalyzerMaxIterations;

impl AnalyzerMaxIterations {
    pub fn validate_value(val: u64) -> Result<()> {
        if !(MIN_ANALYZER_ITERATIONS..=MAX_ANALYZER_ITERATIONS).contains(&val) {
            return Err(invalid_setting::<Self>(format!(
                "must be between {MIN_ANALYZER_ITERATIONS} and {MAX_ANALYZER_ITERATIONS}"
            )));
        }
        Ok(())
    }
}

impl SessionSetting for AnalyzerMaxIterations {
    const NAME: &'static str = "analyzer_max_iterations";
    const DESCRIPTION: &'static str = "Maximum passes over a fixpoint analyzer batch";

    fn set_from_scalar(scalar: ScalarValue, conf: &mut SessionConfig) -> Result<()> {
        let val = scalar_as_u64::<Self>(&scalar)?;
        Self::validate_value(val)?;
        conf.analyzer_max_iterations = val;
        Ok(())
    }

    fn get_as_scalar(conf: &SessionConfig) -> ScalarValue {
        conf.analyzer_max_iterations.into()
    }
}

pub struct ApplicationName;

impl SessionSetting for ApplicationName {
    const NAME: &'static str = "application_name";
    const DESCRIPTION: &'static str = "Name reported by the client application";

    fn set_from_scalar(scalar: ScalarValue, conf: &mut SessionConfig) -> Result<()> {
        conf.application_name = match scalar {
            ScalarValue::Utf8(s) => s,
            ScalarValue::Null => String::new(),
            other => other.to_string(),
        };
        Ok(())
    }

    fn get_as_scalar(conf: &SessionConfig) -> ScalarValue {
        conf.application_name.clone().into()
    }
}

pub struct QueryTimeoutMs;

impl SessionSetting for QueryTimeoutMs {
    const NAME: &'static str = "query_timeout_ms";
    const DESCRIPTION: &'static str = "Milliseconds a query may run before being cancelled, 0 to disable";

    fn set_from_scalar(scalar: ScalarValue, conf: &mut SessionConfig) -> Result<()> {
        conf.query_timeout_ms = scalar_as_u64::<Self>(&scalar)?;
        Ok(())
    }

    fn get_as_scalar(conf: &SessionConfig) -> ScalarValue {
        conf.query_timeout_ms.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_setting_exists() {
        let mut conf = SessionConfig::default();
        conf.set_from_scalar("application_name", "test".into())
            .unwrap();

        let val = conf.get_as_scalar("application_name").unwrap();
        assert_eq!(ScalarValue::from("test"), val);
    }

    #[test]
    fn set_setting_not_exists() {
        let mut conf = SessionConfig::default();
        let err = conf.set_from_scalar("hell_world", 58.into()).unwrap_err();
        assert!(matches!(err, DbError::UnknownSetting(_)));
    }

    #[test]
    fn set_casts_value() {
        let mut conf = SessionConfig::default();
        conf.set_from_scalar("analyzer_max_iterations", ScalarValue::Int8(13))
            .unwrap();

        let val = conf.get_as_scalar("analyzer_max_iterations").unwrap();
        assert_eq!(ScalarValue::UInt64(13), val);
    }

    #[test]
    fn set_rejects_out_of_range() {
        let mut conf = SessionConfig::default();
        let err = conf
            .set_from_scalar("analyzer_max_iterations", ScalarValue::Int64(0))
            .unwrap_err();
        assert!(matches!(err, DbError::InvalidSetting { .. }));
        assert_eq!(DEFAULT_ANALYZER_MAX_ITERATIONS, conf.analyzer_max_iterations);
    }

    #[test]
    fn reset_restores_default() {
        let mut conf = SessionConfig::default();
        conf.set_from_scalar("query_timeout_ms", ScalarValue::from("250"))
            .unwrap();
        assert_eq!(250, conf.query_timeout_ms);

        conf.reset("query_timeout_ms").unwrap();
        assert_eq!(0, conf.query_timeout_ms);
    }

    #[test]
    fn from_json_partial() {
        let conf = SessionConfig::from_json(r#"{"application_name": "psql"}"#).unwrap();
        assert_eq!("psql", conf.application_name);
        assert_eq!(DEFAULT_ANALYZER_MAX_ITERATIONS, conf.analyzer_max_iterations);

        SessionConfig::from_json(r#"{"analyzer_max_iterations": 0}"#).unwrap_err();
        SessionConfig::from_json("{").unwrap_err();
    }

    #[test]
    fn describe_lists_all() {
        let names: Vec<_> = SessionConfig::describe().into_iter().map(|(n, _)| n).collect();
        assert_eq!(
            vec!["analyzer_max_iterations", "application_name", "query_timeout_ms"],
            names
        );
    }
}
