//! Engine settings
//!
//! Layered with `figment`, lowest to highest priority:
//! 1. built-in defaults
//! 2. optional settings file (TOML, YAML or JSON, chosen by extension)
//! 3. `REGULATORS_`-prefixed environment variables, e.g. `REGULATORS_LOG_LEVEL=debug`

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Prefix of environment variables that override settings
pub const ENV_PREFIX: &str = "REGULATORS_";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Regulator configuration file used when none is given on the command line
    pub config_file: PathBuf,
    /// Ceiling for nested `run_rule` actions
    pub max_rule_depth: usize,
    /// Log filter, e.g. "info" or "info,voltage_regulators=debug"
    pub log_level: String,
    /// Structured JSON log output
    pub log_json: bool,
    /// Directory for log files; console only when unset
    pub log_dir: Option<PathBuf>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            config_file: PathBuf::from("regulators.json"),
            max_rule_depth: 5,
            log_level: "info".to_string(),
            log_json: false,
            log_dir: None,
        }
    }
}

impl EngineSettings {
    /// Load settings from defaults, `path` if given, then the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            figment = merge_file(figment, path)?;
        }
        figment
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()
            .map_err(|e| Error::Config(format!("Failed to load settings: {}", e)))
    }
}

fn merge_file(figment: Figment, path: &Path) -> Result<Figment> {
    if !path.exists() {
        return Err(Error::Config(format!(
            "Settings file not found: {}",
            path.display()
        )));
    }
    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .ok_or_else(|| Error::Config("Settings file must have an extension".to_string()))?;

    let figment = match extension {
        "toml" => figment.merge(Toml::file(path)),
        "yaml" | "yml" => figment.merge(Yaml::file(path)),
        "json" => figment.merge(Json::file(path)),
        _ => {
            return Err(Error::Config(format!(
                "Unsupported settings file format: {}",
                extension
            )))
        },
    };
    Ok(figment)
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        figment::Jail::expect_with(|_jail| {
            let settings = EngineSettings::load(None).unwrap();
            assert_eq!(settings, EngineSettings::default());
            Ok(())
        });
    }

    #[test]
    fn test_file_then_env() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "settings.toml",
                r#"
                config_file = "/etc/regulators/system.json"
                max_rule_depth = 8
                "#,
            )?;
            jail.set_env("REGULATORS_MAX_RULE_DEPTH", "12");
            jail.set_env("REGULATORS_LOG_JSON", "true");

            let settings = EngineSettings::load(Some(Path::new("settings.toml"))).unwrap();
            assert_eq!(settings.config_file, PathBuf::from("/etc/regulators/system.json"));
            assert_eq!(settings.max_rule_depth, 12);
            assert!(settings.log_json);
            assert_eq!(settings.log_level, "info");
            Ok(())
        });
    }

    #[test]
    fn test_yaml_and_json_files() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("settings.yaml", "log_level: debug\nlog_dir: /var/log/regulators\n")?;
            let settings = EngineSettings::load(Some(Path::new("settings.yaml"))).unwrap();
            assert_eq!(settings.log_level, "debug");
            assert_eq!(settings.log_dir, Some(PathBuf::from("/var/log/regulators")));

            jail.create_file("settings.json", r#"{ "max_rule_depth": 3 }"#)?;
            let settings = EngineSettings::load(Some(Path::new("settings.json"))).unwrap();
            assert_eq!(settings.max_rule_depth, 3);
            Ok(())
        });
    }

    #[test]
    fn test_invalid_files() {
        figment::Jail::expect_with(|jail| {
            let err = EngineSettings::load(Some(Path::new("missing.toml"))).unwrap_err();
            assert!(err.to_string().contains("Settings file not found"));

            jail.create_file("settings.ini", "log_level=debug")?;
            let err = EngineSettings::load(Some(Path::new("settings.ini"))).unwrap_err();
            assert_eq!(
                err.to_string(),
                "Configuration error: Unsupported settings file format: ini"
            );

            jail.create_file("settings.json", r#"{ "max_rule_depth": "deep" }"#)?;
            assert!(EngineSettings::load(Some(Path::new("settings.json"))).is_err());
            Ok(())
        });
    }
}
