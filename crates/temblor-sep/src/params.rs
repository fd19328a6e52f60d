//! Named-parameter handling for peril-model constructors.
//!
//! Job configurations address parameters to models by name. Each model
//! validates the keys it receives against its recognized-options set and
//! falls back to documented defaults for anything omitted.

use indexmap::IndexMap;
use temblor_core::ConfigError;

/// A single named parameter value.
#[derive(Clone, Debug, PartialEq)]
pub enum ParamValue {
    /// Numeric parameter (coefficients, thresholds).
    Num(f64),
    /// String parameter (e.g. a deformation component name).
    Str(String),
}

/// Per-model parameter maps, keyed by registry model name.
pub type PerilParams = IndexMap<String, IndexMap<String, ParamValue>>;

/// Accessor over one model's parameter map with recognized-key
/// validation and typed defaults.
#[derive(Debug)]
pub(crate) struct ModelParams<'a> {
    model: &'static str,
    map: Option<&'a IndexMap<String, ParamValue>>,
}

impl<'a> ModelParams<'a> {
    pub(crate) fn new(
        model: &'static str,
        params: &'a PerilParams,
        recognized: &[&str],
    ) -> Result<Self, ConfigError> {
        let map = params.get(model);
        if let Some(map) = map {
            for key in map.keys() {
                if !recognized.contains(&key.as_str()) {
                    return Err(ConfigError::UnknownPerilParam {
                        model: model.to_string(),
                        param: key.clone(),
                    });
                }
            }
        }
        Ok(Self { model, map })
    }

    /// Numeric parameter with a default.
    pub(crate) fn num(&self, key: &str, default: f64) -> Result<f64, ConfigError> {
        match self.map.and_then(|m| m.get(key)) {
            None => Ok(default),
            Some(ParamValue::Num(v)) => Ok(*v),
            Some(ParamValue::Str(_)) => Err(ConfigError::InvalidPerilParam {
                model: self.model.to_string(),
                param: key.to_string(),
                reason: "expected a number".to_string(),
            }),
        }
    }

    /// String parameter with a default.
    pub(crate) fn str(&self, key: &str, default: &str) -> Result<String, ConfigError> {
        match self.map.and_then(|m| m.get(key)) {
            None => Ok(default.to_string()),
            Some(ParamValue::Str(s)) => Ok(s.clone()),
            Some(ParamValue::Num(_)) => Err(ConfigError::InvalidPerilParam {
                model: self.model.to_string(),
                param: key.to_string(),
                reason: "expected a string".to_string(),
            }),
        }
    }
}
