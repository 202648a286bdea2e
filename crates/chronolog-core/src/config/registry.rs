use super::store::StoreConfig;
use crate::error::{ChronologError, Result};
use crate::types::Level;
use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

/// Wire format of the records in one store
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RecordFormat {
    /// Compact, lossless binary records (default)
    #[default]
    Binary,

    /// One human-readable line per event, plus throwable lines
    Text,
}

/// Settings for the root logger or a dotted logger-name prefix.
///
/// Unset fields inherit from the longest configured prefix that sets them,
/// then from the root.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggerSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<Level>,

    /// Store location; relative paths are joined to `base_dir`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<RecordFormat>,
}

impl LoggerSettings {
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = Some(level);
        self
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_format(mut self, format: RecordFormat) -> Self {
        self.format = Some(format);
        self
    }
}

/// Configuration for a logger registry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Directory that relative store paths are resolved against
    #[serde(default)]
    pub base_dir: PathBuf,

    /// strftime pattern for text record timestamps (UTC)
    /// Default: `%Y.%m.%d-%H:%M:%S%.3f`
    #[serde(default = "default_date_format")]
    pub date_format: String,

    /// Maximum stack frames kept per throwable; unlimited when unset
    #[serde(default)]
    pub stack_trace_depth: Option<usize>,

    /// Maximum arguments per binary record; unlimited when unset
    #[serde(default)]
    pub max_arg_count: Option<usize>,

    /// Options passed to the store on open
    #[serde(default)]
    pub store: StoreConfig,

    /// Fallback settings; must set `path`
    #[serde(default = "default_root")]
    pub root: LoggerSettings,

    /// Per-prefix overrides keyed by dotted logger name
    #[serde(default)]
    pub loggers: BTreeMap<String, LoggerSettings>,
}

fn default_date_format() -> String {
    "%Y.%m.%d-%H:%M:%S%.3f".to_string()
}

/// Root level when the configuration leaves it unset
pub const DEFAULT_LEVEL: Level = Level::Debug;

fn default_root() -> LoggerSettings {
    LoggerSettings {
        level: Some(DEFAULT_LEVEL),
        path: None,
        format: Some(RecordFormat::Binary),
    }
}

impl RegistryConfig {
    /// Create a configuration whose root logger writes to `root_path`
    pub fn new(base_dir: impl Into<PathBuf>, root_path: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            date_format: default_date_format(),
            stack_trace_depth: None,
            max_arg_count: None,
            store: StoreConfig::default(),
            root: default_root().with_path(root_path),
            loggers: BTreeMap::new(),
        }
    }

    /// Parse a TOML document
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| ChronologError::Config(format!("Invalid TOML: {}", e)))
    }

    pub fn with_root_level(mut self, level: Level) -> Self {
        self.root.level = Some(level);
        self
    }

    pub fn with_root_format(mut self, format: RecordFormat) -> Self {
        self.root.format = Some(format);
        self
    }

    pub fn with_logger(mut self, prefix: impl Into<String>, settings: LoggerSettings) -> Self {
        self.loggers.insert(prefix.into(), settings);
        self
    }

    pub fn with_date_format(mut self, date_format: impl Into<String>) -> Self {
        self.date_format = date_format.into();
        self
    }

    pub fn with_stack_trace_depth(mut self, depth: usize) -> Self {
        self.stack_trace_depth = Some(depth);
        self
    }

    pub fn with_max_arg_count(mut self, max: usize) -> Self {
        self.max_arg_count = Some(max);
        self
    }

    pub fn with_store(mut self, store: StoreConfig) -> Self {
        self.store = store;
        self
    }

    pub fn root_level(&self) -> Level {
        self.root.level.unwrap_or(DEFAULT_LEVEL)
    }

    pub fn root_format(&self) -> RecordFormat {
        self.root.format.unwrap_or_default()
    }

    /// Resolve a configured store path against `base_dir`
    ///
    /// The result is absolute (relative to the working directory when
    /// `base_dir` is relative) with `.` and `..` folded away, so spellings of
    /// the same directory compare equal. Symlinks are not resolved.
    pub fn store_path(&self, path: &Path) -> PathBuf {
        let joined = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        };
        let joined = if joined.is_absolute() {
            joined
        } else {
            match std::env::current_dir() {
                Ok(cwd) => cwd.join(joined),
                Err(_) => joined,
            }
        };
        normalize(&joined)
    }

    /// Check the configuration is usable by a registry
    pub fn validate(&self) -> Result<()> {
        match &self.root.path {
            None => return Err(ChronologError::Config("root.path is required".into())),
            Some(p) if p.as_os_str().is_empty() => {
                return Err(ChronologError::Config("root.path is empty".into()))
            }
            Some(_) => {}
        }

        for name in self.loggers.keys() {
            if name.is_empty() || name.split('.').any(str::is_empty) {
                return Err(ChronologError::Config(format!(
                    "Invalid logger name '{}'",
                    name
                )));
            }
        }

        if self.date_format.is_empty()
            || StrftimeItems::new(&self.date_format).any(|item| matches!(item, Item::Error))
        {
            return Err(ChronologError::Config(format!(
                "Invalid date_format '{}'",
                self.date_format
            )));
        }

        if self.store.max_record_size == 0 {
            return Err(ChronologError::Config(
                "store.max_record_size must be positive".into(),
            ));
        }

        Ok(())
    }
}

/// Where a registry reads its configuration from, at startup and on reload
pub trait ConfigSource: Send + Sync {
    fn load(&self) -> Result<RegistryConfig>;
}

impl ConfigSource for RegistryConfig {
    fn load(&self) -> Result<RegistryConfig> {
        Ok(self.clone())
    }
}

/// Reads a TOML file on every load
#[derive(Debug, Clone)]
pub struct TomlFileSource {
    path: PathBuf,
}

impl TomlFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigSource for TomlFileSource {
    fn load(&self) -> Result<RegistryConfig> {
        let data = std::fs::read_to_string(&self.path).map_err(|e| {
            ChronologError::Config(format!("Failed to read {}: {}", self.path.display(), e))
        })?;
        RegistryConfig::from_toml_str(&data)
    }
}

/// A [`ConfigSource`] backed by a closure; see [`from_fn`]
pub struct FromFn<F>(F);

/// Wrap a closure as a [`ConfigSource`]
pub fn from_fn<F>(f: F) -> FromFn<F>
where
    F: Fn() -> Result<RegistryConfig> + Send + Sync,
{
    FromFn(f)
}

impl<F> ConfigSource for FromFn<F>
where
    F: Fn() -> Result<RegistryConfig> + Send + Sync,
{
    fn load(&self) -> Result<RegistryConfig> {
        (self.0)()
    }
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other),
        }
    }
    out
}
