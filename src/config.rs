use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use tracing::warn;

/// Name of the optional per-project configuration file.
pub const CONFIG_FILE: &str = "code-context.toml";

/// Configuration loaded from `code-context.toml` at the project root.
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct CodeContextConfig {
    /// Additional glob patterns to exclude from indexing (beyond the fixed ignore list).
    pub exclude: Option<Vec<String>>,
    /// Also honour `.gitignore` files during the initial scan.
    pub respect_gitignore: bool,
    pub watch: WatchConfig,
    pub context: ContextConfig,
    pub logging: LoggingConfig,
}

/// File watcher settings.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct WatchConfig {
    /// Debounce window for filesystem notifications, in milliseconds.
    pub debounce_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self { debounce_ms: 75 }
    }
}

/// Context document settings.
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct ContextConfig {
    /// Upper bound on the assembled document size in bytes. Unbounded when `None`.
    pub max_bytes: Option<usize>,
}

/// Log filter settings. `RUST_LOG` overrides both fields.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level for every target.
    pub default: String,
    /// Per-target overrides, e.g. `code_context::watcher = "debug"`.
    pub modules: BTreeMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: "warn".to_string(),
            modules: BTreeMap::new(),
        }
    }
}

impl LoggingConfig {
    /// Render as an `EnvFilter` directive string.
    pub fn directives(&self) -> String {
        let mut filter = self.default.clone();
        for (module, level) in &self.modules {
            filter.push_str(&format!(",{module}={level}"));
        }
        filter
    }
}

impl CodeContextConfig {
    /// Load configuration from `code-context.toml` in the given root directory.
    ///
    /// Returns a default configuration if the file does not exist or cannot be
    /// parsed; the latter is logged.
    pub fn load(root: &Path) -> Self {
        let (config, problem) = Self::load_reporting(root);
        if let Some(problem) = problem {
            warn!("{problem}");
        }
        config
    }

    /// Like [`load`](Self::load), but hands back the fallback reason instead of
    /// logging it, for callers that install the log subscriber from the result.
    pub fn load_reporting(root: &Path) -> (Self, Option<String>) {
        let config_path = root.join(CONFIG_FILE);

        if !config_path.exists() {
            return (Self::default(), None);
        }

        match std::fs::read_to_string(&config_path) {
            Ok(contents) => match Self::parse(&contents) {
                Ok(config) => (config, None),
                Err(err) => (
                    Self::default(),
                    Some(format!("failed to parse {CONFIG_FILE}: {err}. Using defaults.")),
                ),
            },
            Err(err) => (
                Self::default(),
                Some(format!("failed to read {CONFIG_FILE}: {err}. Using defaults.")),
            ),
        }
    }

    /// Parse configuration from TOML text.
    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = CodeContextConfig::load(dir.path());
        assert!(config.exclude.is_none());
        assert!(!config.respect_gitignore);
        assert_eq!(config.watch.debounce_ms, 75);
        assert_eq!(config.context.max_bytes, None);
        assert_eq!(config.logging.default, "warn");
    }

    #[test]
    fn test_parse_full_config() {
        let config = CodeContextConfig::parse(
            r#"
            exclude = ["*.generated.ts"]
            respect_gitignore = true

            [watch]
            debounce_ms = 200

            [context]
            max_bytes = 4096

            [logging]
            default = "info"
            [logging.modules]
            "code_context::watcher" = "debug"
            "#,
        )
        .unwrap();
        assert_eq!(config.exclude, Some(vec!["*.generated.ts".to_string()]));
        assert!(config.respect_gitignore);
        assert_eq!(config.watch.debounce_ms, 200);
        assert_eq!(config.context.max_bytes, Some(4096));
        assert_eq!(config.logging.directives(), "info,code_context::watcher=debug");
    }

    #[test]
    fn test_malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "exclude = 3").unwrap();
        let config = CodeContextConfig::load(dir.path());
        assert!(config.exclude.is_none());

        let (config, problem) = CodeContextConfig::load_reporting(dir.path());
        assert!(config.exclude.is_none());
        assert!(problem.is_some_and(|p| p.contains(CONFIG_FILE)));
    }

    #[test]
    fn test_valid_file_reports_nothing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "respect_gitignore = true").unwrap();
        let (config, problem) = CodeContextConfig::load_reporting(dir.path());
        assert!(config.respect_gitignore);
        assert!(problem.is_none());
    }
}
