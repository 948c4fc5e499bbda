//! Stridebuf Configuration
//!
//! Handles parsing of `stridebuf.toml`, which selects the native runtime and
//! the default log level of the `sbuf` tool.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::error::BufferResult;
use crate::ffi::{host_runtime, LibraryLoader, NativeRuntime};

/// File name searched for by [`StridebufConfig::find_and_load`]
pub const CONFIG_FILE_NAME: &str = "stridebuf.toml";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Config file not found: {0}")]
    NotFound(String),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Root configuration structure matching stridebuf.toml.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct StridebufConfig {
    /// Native runtime selection
    #[serde(default)]
    pub runtime: RuntimeConfig,

    /// Logging defaults
    #[serde(default)]
    pub log: LogConfig,
}

impl StridebufConfig {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        let config: StridebufConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from the current directory or parents.
    pub fn load_from_cwd() -> ConfigResult<Self> {
        let cwd = std::env::current_dir()?;
        Self::find_and_load(&cwd)
    }

    /// Find and load configuration by searching up from the given directory.
    pub fn find_and_load(start_dir: &Path) -> ConfigResult<Self> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let config_path = dir.join(CONFIG_FILE_NAME);
            if config_path.exists() {
                return Self::load(&config_path);
            }
            if !dir.pop() {
                return Ok(Self::default());
            }
        }
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Which native runtime buffers are allocated from.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct RuntimeConfig {
    /// Shared library name or path; the in-process runtime when absent
    #[serde(default)]
    pub library: Option<String>,

    /// Extra directories searched for `library`, highest priority first
    #[serde(default)]
    pub search_paths: Vec<PathBuf>,
}

impl RuntimeConfig {
    /// Build the configured runtime
    pub fn build_runtime(&self) -> BufferResult<Arc<dyn NativeRuntime>> {
        let Some(library) = &self.library else {
            return Ok(host_runtime());
        };

        let mut loader = LibraryLoader::new();
        for path in self.search_paths.iter().rev() {
            loader.add_search_path(path);
        }
        let runtime: Arc<dyn NativeRuntime> = loader.load(library)?;
        Ok(runtime)
    }
}

/// Logging defaults, overridden by `RUST_LOG`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogConfig {
    /// Default filter, e.g. `warn` or `stridebuf=debug`
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env::temp_dir;

    #[test]
    fn test_default_config() {
        let config = StridebufConfig::default();
        assert!(config.runtime.library.is_none());
        assert!(config.runtime.search_paths.is_empty());
        assert_eq!(config.log.level, "warn");
    }

    #[test]
    fn test_parse_config() {
        let toml_str = r#"
[runtime]
library = "stridebuf"
search_paths = ["target/release", "/opt/lib"]

[log]
level = "debug"
"#;
        let config: StridebufConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.runtime.library.as_deref(), Some("stridebuf"));
        assert_eq!(config.runtime.search_paths.len(), 2);
        assert_eq!(config.log.level, "debug");
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: StridebufConfig = toml::from_str("[runtime]\n").unwrap();
        assert_eq!(config, StridebufConfig::default());
    }

    #[test]
    fn test_missing_file() {
        let err = StridebufConfig::load(Path::new("/nonexistent/stridebuf.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_save_and_find() {
        let root = temp_dir().join("stridebuf_test_config");
        let nested = root.join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let mut config = StridebufConfig::default();
        config.log.level = "info".to_string();
        config.save(&root.join(CONFIG_FILE_NAME)).unwrap();

        let found = StridebufConfig::find_and_load(&nested).unwrap();
        assert_eq!(found, config);

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn test_host_runtime_by_default() {
        let runtime = RuntimeConfig::default().build_runtime().unwrap();
        assert_eq!(runtime.name(), "host");
    }

    #[test]
    fn test_missing_library_is_an_error() {
        let config = RuntimeConfig {
            library: Some("no_such_buffer_runtime".to_string()),
            search_paths: vec![temp_dir()],
        };
        assert!(config.build_runtime().is_err());
    }
}
