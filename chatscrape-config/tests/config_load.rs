use chatscrape_config::ChatscrapeConfigLoader;
use serial_test::serial;
use std::{fs, path::PathBuf};
use tempfile::TempDir;

/// Helper to write a YAML file in a temp dir and return its path.
fn write_yaml(tmp: &TempDir, name: &str, yaml: &str) -> PathBuf {
    let p = tmp.path().join(name);
    fs::write(&p, yaml).expect("write yaml");
    p
}

#[test]
#[serial]
fn test_config_load() {
    let tmp = TempDir::new().unwrap();

    let file_yaml = r#"
server:
  port: 9000
browser:
  webdriver_url: "http://${CHATSCRAPE_TEST_DRIVER_HOST}:9515"
  navigation_timeout_secs: 45
  extra_args:
    - "--lang=en-US"
logging:
  format: json
  "#;
    let p = write_yaml(&tmp, "chatscrape.yaml", file_yaml);

    temp_env::with_var("CHATSCRAPE_TEST_DRIVER_HOST", Some("selenium"), || {
        let config = ChatscrapeConfigLoader::new()
            .with_file(&p)
            .load()
            .expect("load service config");

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.browser.webdriver_url, "http://selenium:9515");
        assert_eq!(config.browser.navigation_timeout_secs, 45);
        assert_eq!(config.browser.extra_args, vec!["--lang=en-US".to_string()]);
        // untouched sections keep their defaults
        assert_eq!(config.browser.viewport.width, 1280);
        assert!(config.browser.headless);
    });
}

#[test]
#[serial]
fn env_overrides_file_values() {
    let tmp = TempDir::new().unwrap();
    let p = write_yaml(&tmp, "chatscrape.yaml", "server:\n  port: 9000\n");

    temp_env::with_vars(
        [
            ("CHATSCRAPE__SERVER__PORT", Some("9100")),
            ("CHATSCRAPE__BROWSER__HEADLESS", Some("false")),
        ],
        || {
            let config = ChatscrapeConfigLoader::new()
                .with_file(&p)
                .load()
                .expect("load with env overlay");

            assert_eq!(config.server.port, 9100);
            assert!(!config.browser.headless);
        },
    );
}

#[test]
#[serial]
fn missing_optional_file_falls_back_to_defaults() {
    let tmp = TempDir::new().unwrap();
    let config = ChatscrapeConfigLoader::new()
        .with_optional_file(tmp.path().join("absent.yaml"))
        .load()
        .expect("defaults");

    assert_eq!(config.server.port, 10000);
    assert_eq!(config.browser.settle_millis, 2000);
}

#[test]
#[serial]
fn missing_required_file_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let result = ChatscrapeConfigLoader::new()
        .with_file(tmp.path().join("absent.yaml"))
        .load();

    assert!(result.is_err());
}
