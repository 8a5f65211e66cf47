//! Loader for service configuration with YAML + environment overlays.
//!
//! Sources are merged in order: an optional YAML file (or inline YAML in
//! tests), then `CHATSCRAPE__`-prefixed environment variables using `__` as the
//! nesting separator (`CHATSCRAPE__BROWSER__HEADLESS=false`). String values may
//! reference other environment variables as `${VAR}`; expansion is recursive up
//! to a fixed depth. Every field has a default, so an empty source set yields a
//! usable configuration.
use chatscrape_common::observability::LogFormat;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;
const ENV_PREFIX: &str = "CHATSCRAPE";

/// Chrome UA the scraper presents unless configured otherwise.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error(transparent)]
    Source(#[from] ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChatscrapeConfig {
    pub server: ServerSettings,
    pub browser: BrowserSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 10000,
        }
    }
}

/// Everything the WebDriver session needs to load one page.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    pub webdriver_url: String,
    pub headless: bool,
    /// Explicit Chromium/Chrome binary; the driver's default when `None`.
    pub chrome_binary: Option<PathBuf>,
    pub navigation_timeout_secs: u64,
    /// Fixed wait after navigation so client-side rendering can finish.
    pub settle_millis: u64,
    pub user_agent: String,
    pub viewport: Viewport,
    /// Appended verbatim after the built-in launch arguments.
    pub extra_args: Vec<String>,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:9515".into(),
            headless: true,
            chrome_binary: None,
            navigation_timeout_secs: 30,
            settle_millis: 2000,
            user_agent: DEFAULT_USER_AGENT.into(),
            viewport: Viewport::default(),
            extra_args: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub format: LogFormat,
    /// Used when `RUST_LOG` is unset.
    pub filter: String,
    pub dir: Option<PathBuf>,
    pub stderr: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
            filter: "info".into(),
            dir: None,
            stderr: true,
        }
    }
}

impl ChatscrapeConfig {
    fn validate(&self) -> Result<(), LoadError> {
        if self.server.port == 0 {
            return Err(LoadError::Invalid("server.port must be non-zero".into()));
        }
        if self.browser.navigation_timeout_secs == 0 {
            return Err(LoadError::Invalid(
                "browser.navigation_timeout_secs must be non-zero".into(),
            ));
        }
        if self.browser.viewport.width == 0 || self.browser.viewport.height == 0 {
            return Err(LoadError::Invalid(
                "browser.viewport dimensions must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
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

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct ChatscrapeConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for ChatscrapeConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatscrapeConfigLoader {
    /// Start with no file sources; environment overrides are applied last in
    /// [`load`](Self::load) so they always win.
    ///
    /// ```
    /// use chatscrape_config::ChatscrapeConfigLoader;
    ///
    /// let config = ChatscrapeConfigLoader::new().load().expect("defaults load");
    /// assert_eq!(config.server.port, 10000);
    /// assert!(config.browser.headless);
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a YAML/TOML/JSON file; the `config` crate infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Like [`with_file`](Self::with_file) but silently skipped when absent, so
    /// container deployments can rely purely on environment variables.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    ///
    /// ```
    /// use chatscrape_config::ChatscrapeConfigLoader;
    ///
    /// let cfg = ChatscrapeConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// server:
    ///   port: 8088
    /// browser:
    ///   headless: false
    ///   viewport: { width: 1920, height: 1080 }
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.server.port, 8088);
    /// assert!(!cfg.browser.headless);
    /// assert_eq!(cfg.browser.viewport.width, 1920);
    /// assert_eq!(cfg.browser.settle_millis, 2000);
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources into typed config.
    ///
    /// ```
    /// use chatscrape_config::ChatscrapeConfigLoader;
    ///
    /// unsafe { std::env::set_var("WEBDRIVER_HOST", "chromedriver.internal"); }
    ///
    /// let config = ChatscrapeConfigLoader::new()
    ///     .with_yaml_str(r#"
    /// browser:
    ///   webdriver_url: "http://${WEBDRIVER_HOST}:4444"
    /// "#)
    ///     .load()
    ///     .expect("valid configuration");
    ///
    /// assert_eq!(config.browser.webdriver_url, "http://chromedriver.internal:4444");
    ///
    /// unsafe { std::env::remove_var("WEBDRIVER_HOST"); }
    /// ```
    pub fn load(self) -> Result<ChatscrapeConfig, LoadError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let typed: ChatscrapeConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;
        typed.validate()?;

        Ok(typed)
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
        temp_env::with_vars([("CHROME_FLAG", Some("--lang=en")), ("PORT_X", Some("4444"))], || {
            let mut v = json!([
                "$CHROME_FLAG",
                { "url": "http://localhost:${PORT_X}" },
                42,
                true,
                null
            ]);
            expand_env_in_value(&mut v);
            assert_eq!(
                v,
                json!(["--lang=en", { "url": "http://localhost:4444" }, 42, true, null])
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
    fn rejects_zero_timeout() {
        let err = ChatscrapeConfigLoader::new()
            .with_yaml_str("browser:\n  navigation_timeout_secs: 0\n")
            .load()
            .unwrap_err();
        assert!(matches!(err, LoadError::Invalid(_)));
    }

    #[test]
    fn parses_json_log_format() {
        let cfg = ChatscrapeConfigLoader::new()
            .with_yaml_str("logging:\n  format: json\n  filter: debug\n")
            .load()
            .unwrap();
        assert_eq!(cfg.logging.format, LogFormat::Json);
        assert_eq!(cfg.logging.filter, "debug");
    }
}
