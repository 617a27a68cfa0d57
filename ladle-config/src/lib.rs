//! Loader for Ladle configuration with YAML + environment overlays.
//!
//! Sources are merged in the order they are added, later ones winning, with
//! `LADLE__`-prefixed environment variables applied last (`LADLE__TARGET__URL`
//! overrides `target.url`). String values may reference `${VAR}` placeholders,
//! which are expanded after merging.
//!
//! ```yaml
//! version: "1"
//! target:
//!   url: "https://example.com"
//!   headers:
//!     User-Agent: "Mozilla/5.0"
//!   timeout_secs: 10
//! queries:
//!   - selector: "h1"
//!   - selector: ".title.big"
//!     attributes: true
//! logging:
//!   format: json
//!   stderr: true
//!   filter: debug
//! output: text
//! ```
use config::{Config, Environment, File, FileFormat};
use ladle_common::OutputFormat;
use ladle_common::observability::LogFormat;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};

pub use config::ConfigError;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;
const ENV_PREFIX: &str = "LADLE";
const DEFAULT_FILE_NAME: &str = "ladle.yaml";

#[derive(Debug, Default, Deserialize)]
pub struct LadleConfig {
    pub version: Option<String>,
    #[serde(default)]
    pub target: Option<TargetConfig>,
    #[serde(default)]
    pub queries: Vec<QuerySpec>,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub output: OutputFormat,
}

/// Page to fetch when no URL is given on the command line.
#[derive(Debug, Deserialize)]
pub struct TargetConfig {
    pub url: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// One selector to run against the fetched document.
#[derive(Debug, Deserialize)]
pub struct QuerySpec {
    pub selector: String,
    /// Print each match's attribute mapping as well as its text.
    #[serde(default)]
    pub attributes: bool,
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
    #[serde(default = "default_stderr")]
    pub stderr: bool,
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            stderr: default_stderr(),
            filter: default_filter(),
        }
    }
}

fn default_stderr() -> bool {
    true
}
fn default_filter() -> String {
    "info".into()
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    // Unset variables stay verbatim without blocking the set ones.
                    let expanded =
                        shellexpand::env_with_context_no_errors(&cur, |name| env::var(name).ok())
                            .into_owned();
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Per-user config location: `<config dir>/ladle/ladle.yaml`.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("ladle").join(DEFAULT_FILE_NAME))
}

/// Builder hiding the `config` crate wiring (YAML + env overrides).
pub struct LadleConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for LadleConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl LadleConfigLoader {
    /// Start with no files; only `LADLE__` env overrides.
    ///
    /// ```
    /// use ladle_config::LadleConfigLoader;
    ///
    /// let config = LadleConfigLoader::new()
    ///     .with_yaml_str("version: '1'\nqueries: []")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.version.as_deref(), Some("1"));
    /// assert!(config.queries.is_empty());
    /// assert!(config.target.is_none());
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a required YAML/TOML/JSON file; the `config` crate infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that is silently skipped when missing.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Look for `ladle.yaml` in the user config dir, then the working directory.
    pub fn with_default_locations(mut self) -> Self {
        if let Some(user) = user_config_path() {
            self = self.with_optional_file(user);
        }
        self.with_optional_file(DEFAULT_FILE_NAME)
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    ///
    /// ```
    /// use ladle_config::LadleConfigLoader;
    ///
    /// let cfg = LadleConfigLoader::new()
    ///     .with_yaml_str(
    ///         r##"
    /// target:
    ///   url: "https://example.com/news"
    /// queries:
    ///   - selector: "li"
    ///   - selector: "#main"
    ///     attributes: true
    /// "##,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.target.unwrap().url, "https://example.com/news");
    /// assert_eq!(cfg.queries.len(), 2);
    /// assert!(cfg.queries[1].attributes);
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources into strongly typed config.
    ///
    /// ```
    /// use ladle_config::LadleConfigLoader;
    ///
    /// temp_env::with_var("SITE_TOKEN", Some("injected-from-env"), || {
    ///     let config = LadleConfigLoader::new()
    ///         .with_yaml_str(r#"
    /// target:
    ///   url: "https://example.com"
    ///   headers:
    ///     authorization: "Bearer ${SITE_TOKEN}"
    /// "#)
    ///         .load()
    ///         .expect("valid configuration");
    ///
    ///     let target = config.target.expect("target");
    ///     assert_eq!(target.headers["authorization"], "Bearer injected-from-env");
    ///     assert_eq!(target.timeout_secs, None);
    /// });
    /// ```
    pub fn load(self) -> Result<LadleConfig, ConfigError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn expands_simple_string() {
        temp_env::with_var("FOO", Some("bar"), || {
            let mut v = json!("prefix-${FOO}-suffix");
            expand_env_in_value(&mut v);
            assert_eq!(v, json!("prefix-bar-suffix"));
        });
    }

    #[test]
    fn expands_in_array_and_object() {
        temp_env::with_vars([("CITY", Some("Winston")), ("STATE", Some("NC"))], || {
            let mut v = json!([
                "hello-$CITY",
                { "loc": "${CITY}-${STATE}" },
                42,
                true,
                null
            ]);
            expand_env_in_value(&mut v);
            assert_eq!(
                v,
                json!(["hello-Winston", { "loc": "Winston-NC" }, 42, true, null])
            );
        });
    }

    #[test]
    fn expands_recursively_across_env_values() {
        temp_env::with_vars(
            [
                ("BAZ", Some("qux")),
                ("BAR", Some("mid-${BAZ}")),
                ("FOO", Some("start-${BAR}-end")),
            ],
            || {
                let mut v = json!("X=${FOO}");
                expand_env_in_value(&mut v);
                assert_eq!(v, json!("X=start-mid-qux-end"));
            },
        );
    }

    #[test]
    fn stops_on_cycles() {
        temp_env::with_vars([("A", Some("${B}")), ("B", Some("${A}"))], || {
            let mut v = json!("x=${A}-y");
            expand_env_in_value(&mut v);
            let s = v.as_str().unwrap();
            assert!(s.starts_with("x=") && s.ends_with("-y"));
            assert!(s.contains("${"));
        });
    }

    #[test]
    fn unknown_vars_are_left_as_is() {
        let mut v = json!("hi-${DOES_NOT_EXIST}");
        expand_env_in_value(&mut v);
        assert_eq!(v, json!("hi-${DOES_NOT_EXIST}"));
    }

    #[test]
    fn unset_var_does_not_block_set_ones() {
        temp_env::with_vars(
            [("LADLE_SET_VAR", Some("val")), ("LADLE_UNSET_VAR", None)],
            || {
                let mut v = json!("a-${LADLE_SET_VAR}-${LADLE_UNSET_VAR}-$LADLE_SET_VAR");
                expand_env_in_value(&mut v);
                assert_eq!(v, json!("a-val-${LADLE_UNSET_VAR}-val"));
            },
        );
    }

    #[test]
    fn empty_config_uses_defaults() {
        let cfg = LadleConfigLoader::new().load().unwrap();
        assert!(cfg.target.is_none());
        assert!(cfg.queries.is_empty());
        assert_eq!(cfg.output, OutputFormat::Text);
        assert_eq!(cfg.logging.format, LogFormat::Text);
        assert!(cfg.logging.stderr);
        assert_eq!(cfg.logging.filter, "info");
    }

    #[test]
    fn later_yaml_overrides_earlier() {
        let cfg = LadleConfigLoader::new()
            .with_yaml_str("output: text\nlogging:\n  filter: warn")
            .with_yaml_str("output: json")
            .load()
            .unwrap();
        assert_eq!(cfg.output, OutputFormat::Json);
        assert_eq!(cfg.logging.filter, "warn");
    }

    #[test]
    fn missing_optional_file_is_skipped() {
        let cfg = LadleConfigLoader::new()
            .with_optional_file("/definitely/not/here/ladle.yaml")
            .with_yaml_str("version: '2'")
            .load()
            .unwrap();
        assert_eq!(cfg.version.as_deref(), Some("2"));
    }

    #[test]
    fn missing_required_file_fails() {
        let err = LadleConfigLoader::new()
            .with_file("/definitely/not/here/ladle.yaml")
            .load();
        assert!(err.is_err());
    }

    #[test]
    fn query_without_selector_is_rejected() {
        let err = LadleConfigLoader::new()
            .with_yaml_str("queries:\n  - attributes: true")
            .load();
        assert!(err.is_err());
    }
}
