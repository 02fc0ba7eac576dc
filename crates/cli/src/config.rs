use config::{Config, ConfigError, Environment, File};
use engine::keymap::{Action, KeyMap, KeyMapError};
use engine::types::{DisplayFormat, DivisionByZero, EngineOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CalcConfig {
    #[serde(default)]
    pub arithmetic: ArithmeticConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub keys: KeysConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ArithmeticConfig {
    #[serde(default)]
    pub division_by_zero: DivisionByZero,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DisplayConfig {
    /// Round results to this many decimals; unset means canonical output.
    #[serde(default)]
    pub rounding_decimals: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct KeysConfig {
    #[serde(default)]
    pub bindings: Vec<KeyBinding>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KeyBinding {
    pub key: String,
    pub action: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub levels: LoggingLevelsConfig,
    #[serde(default)]
    pub format: LoggingFormatConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingLevelsConfig {
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub info: bool,
    #[serde(default = "true_default")]
    pub warning: bool,
    #[serde(default = "true_default")]
    pub error: bool,
}

impl Default for LoggingLevelsConfig {
    fn default() -> Self {
        Self {
            debug: false,
            info: false,
            warning: true,
            error: true,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LoggingFormatConfig {
    #[serde(default)]
    pub show_time: bool,
    #[serde(default)]
    pub show_target: bool,
    #[serde(default)]
    pub show_file: bool,
    #[serde(default)]
    pub show_line: bool,
}

fn true_default() -> bool {
    true
}

impl CalcConfig {
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            division_by_zero: self.arithmetic.division_by_zero,
            display_format: match self.display.rounding_decimals {
                Some(decimals) => DisplayFormat::Rounded { decimals },
                None => DisplayFormat::Canonical,
            },
        }
    }

    /// Default key map plus the configured extra bindings.
    pub fn keymap(&self) -> Result<KeyMap, KeyMapError> {
        let mut map = KeyMap::default();
        for binding in &self.keys.bindings {
            let action: Action = binding.action.parse()?;
            map.bind(binding.key.clone(), action);
        }
        Ok(map)
    }
}

/// Load configuration: defaults, then `calc_config.yaml`, then the local
/// `.calc_config.yaml` override (or an explicit `--config` file), then
/// `CALC__*` environment variables.
pub fn load_config(explicit: Option<&Path>) -> Result<CalcConfig, ConfigError> {
    let mut builder = Config::builder()
        .add_source(File::from(locate("calc_config.yaml")).required(false))
        .add_source(File::from(locate(".calc_config.yaml")).required(false));

    if let Some(path) = explicit {
        builder = builder.add_source(File::from(path.to_path_buf()).required(true));
    }

    builder
        // Nested keys, e.g. CALC__DISPLAY__ROUNDING_DECIMALS=8
        .add_source(Environment::with_prefix("CALC").separator("__"))
        .build()?
        .try_deserialize()
}

/// Prefer the working directory; fall back to the CLI crate dir for
/// repo-root execution.
fn locate(name: &str) -> PathBuf {
    let here = Path::new(name);
    if here.exists() {
        here.to_path_buf()
    } else {
        Path::new("crates/cli").join(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use std::io::Write;

    struct EnvGuard(&'static str);
    impl EnvGuard {
        fn new(key: &'static str, val: &str) -> Self {
            env::set_var(key, val);
            Self(key)
        }
    }
    impl Drop for EnvGuard {
        fn drop(&mut self) {
            env::remove_var(self.0);
        }
    }

    #[test]
    #[serial]
    fn test_load_config_defaults() {
        let config = load_config(None);
        assert!(config.is_ok(), "Failed to load config: {:?}", config.err());

        let config = config.unwrap();
        assert_eq!(config.arithmetic.division_by_zero, DivisionByZero::Zero);
        assert_eq!(config.display.rounding_decimals, None);
        assert_eq!(config.engine_options(), EngineOptions::default());
        assert!(config.logging.levels.warning);
    }

    #[test]
    #[serial]
    fn test_env_override_division_policy() {
        let _guard = EnvGuard::new("CALC__ARITHMETIC__DIVISION_BY_ZERO", "ieee");
        let config = load_config(None).expect("Should load config");
        assert_eq!(config.engine_options().division_by_zero, DivisionByZero::Ieee);
    }

    #[test]
    #[serial]
    fn test_env_numeric_coercion() {
        let _guard = EnvGuard::new("CALC__DISPLAY__ROUNDING_DECIMALS", "8");
        let config = load_config(None).expect("Should load config");
        assert_eq!(
            config.engine_options().display_format,
            DisplayFormat::Rounded { decimals: 8 }
        );
    }

    #[test]
    #[serial]
    fn test_explicit_file() {
        let path = env::temp_dir().join("calcctl_config_test.yaml");
        {
            let mut f = std::fs::File::create(&path).unwrap();
            writeln!(
                f,
                "keys:\n  bindings:\n    - key: \"x\"\n      action: multiply\n    - key: \"Delete\"\n      action: delete"
            )
            .unwrap();
        }
        let config = load_config(Some(&path)).expect("Should load config");
        let keymap = config.keymap().unwrap();
        assert_eq!(
            keymap.resolve("x"),
            Some(Action::Operator(engine::Operator::Multiply))
        );
        assert_eq!(keymap.resolve("Delete"), Some(Action::Delete));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    #[serial]
    fn test_missing_explicit_file_is_error() {
        let path = env::temp_dir().join("calcctl_config_does_not_exist.yaml");
        assert!(load_config(Some(&path)).is_err());
    }

    #[test]
    fn test_bad_binding_action() {
        let config = CalcConfig {
            keys: KeysConfig {
                bindings: vec![KeyBinding {
                    key: "s".into(),
                    action: "sqrt".into(),
                }],
            },
            ..Default::default()
        };
        assert!(config.keymap().is_err());
    }
}
