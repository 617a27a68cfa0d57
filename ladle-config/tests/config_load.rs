use ladle_common::OutputFormat;
use ladle_common::observability::LogFormat;
use ladle_config::LadleConfigLoader;
use serial_test::serial;
use std::{fs, path::PathBuf};
use tempfile::TempDir;

/// Helper to write a YAML file in a temp dir and return its path.
fn write_yaml(tmp: &TempDir, name: &str, yaml: &str) -> PathBuf {
    let p = tmp.path().join(name);
    fs::write(&p, yaml).expect("write yaml");
    p
}

const FILE_YAML: &str = r#"
version: "0.1"
target:
  url: "https://example.com/listing"
  timeout_secs: 10
  headers:
    user-agent: "Mozilla/5.0"
    authorization: "Bearer ${LADLE_TEST_TOKEN}"
queries:
  - selector: "h1"
  - selector: ".result.title"
    attributes: true
logging:
  format: json
  stderr: false
output: json
"#;

#[test]
#[serial]
fn test_config_load() {
    let tmp = TempDir::new().unwrap();
    let p = write_yaml(&tmp, "ladle.yaml", FILE_YAML);

    temp_env::with_var("LADLE_TEST_TOKEN", Some("abc123"), || {
        let config = LadleConfigLoader::new()
            .with_file(&p)
            .load()
            .expect("load config");

        let target = config.target.expect("target section");
        assert_eq!(target.url, "https://example.com/listing");
        assert_eq!(target.timeout_secs, Some(10));
        assert_eq!(target.headers["authorization"], "Bearer abc123");
        assert_eq!(config.queries.len(), 2);
        assert_eq!(config.queries[1].selector, ".result.title");
        assert!(config.queries[1].attributes);
        assert!(!config.queries[0].attributes);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(!config.logging.stderr);
        assert_eq!(config.output, OutputFormat::Json);
    });
}

#[test]
#[serial]
fn env_overrides_file_values() {
    let tmp = TempDir::new().unwrap();
    let p = write_yaml(&tmp, "ladle.yaml", FILE_YAML);

    temp_env::with_vars(
        [
            ("LADLE__TARGET__URL", Some("https://override.example.org/")),
            ("LADLE__TARGET__TIMEOUT_SECS", Some("30")),
            ("LADLE_TEST_TOKEN", Some("unused")),
        ],
        || {
            let config = LadleConfigLoader::new()
                .with_file(&p)
                .load()
                .expect("load config");
            let target = config.target.expect("target section");
            assert_eq!(target.url, "https://override.example.org/");
            assert_eq!(target.timeout_secs, Some(30));
        },
    );
}
