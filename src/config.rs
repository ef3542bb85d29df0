//! Layered configuration.
//!
//! Values are merged, later sources winning, from:
//! - built-in defaults
//! - `dlrel.toml`
//! - `dlrel.local.toml`
//! - environment variables with the `DLREL_` prefix, `__` separating
//!   nested keys
//!
//! ```toml
//! [evaluation]
//! optimize = true
//! print_dependency_graph = true
//!
//! [logging]
//! level = "debug"
//! ```
//!
//! ```bash
//! DLREL_EVALUATION__OPTIMIZE=false
//! DLREL_LOGGING__LEVEL=trace
//! ```

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub evaluation: EvaluationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Evaluate strongly connected components separately, in dependency
    /// order, instead of iterating every rule together
    #[serde(default = "default_true")]
    pub optimize: bool,

    /// Print the rule dependency graph before rule evaluation
    #[serde(default = "default_true")]
    pub print_dependency_graph: bool,

    /// Print postorder numbers of the reversed dependency graph
    #[serde(default)]
    pub print_postorder: bool,

    /// Print every evaluated rule with the tuples it derived
    #[serde(default = "default_true")]
    pub trace_rules: bool,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        EvaluationConfig {
            optimize: true,
            print_dependency_graph: true,
            print_postorder: false,
            trace_rules: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or filter directive (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (text, json)
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> LogFormat {
    LogFormat::Text
}

impl Config {
    /// Load configuration from the default locations.
    pub fn load() -> Result<Self, figment::Error> {
        Self::defaults()
            .merge(Toml::file("dlrel.toml"))
            .merge(Toml::file("dlrel.local.toml"))
            .merge(Env::prefixed("DLREL_").split("__"))
            .extract()
    }

    /// Load configuration from a specific file, still honoring the
    /// environment.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, figment::Error> {
        Self::defaults()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("DLREL_").split("__"))
            .extract()
    }

    /// Parse configuration from TOML text over the defaults.
    pub fn from_toml_str(toml: &str) -> Result<Self, figment::Error> {
        Self::defaults().merge(Toml::string(toml)).extract()
    }

    fn defaults() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_enable_the_scheduler() {
        let config = Config::default();
        assert!(config.evaluation.optimize);
        assert!(config.evaluation.print_dependency_graph);
        assert!(!config.evaluation.print_postorder);
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.logging.format, LogFormat::Text);
    }

    #[test]
    fn toml_overrides_single_keys() {
        let config = Config::from_toml_str(
            r#"
            [evaluation]
            optimize = false

            [logging]
            format = "json"
            "#,
        )
        .unwrap();

        assert!(!config.evaluation.optimize);
        assert!(config.evaluation.trace_rules);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn empty_toml_is_the_default() {
        assert_eq!(Config::from_toml_str("").unwrap(), Config::default());
    }

    #[test]
    fn rejects_unknown_log_format() {
        assert!(Config::from_toml_str("[logging]\nformat = \"xml\"").is_err());
    }
}
