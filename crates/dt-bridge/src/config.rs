//! Bridge configuration.
//!
//! Where adapters live, how they are launched and how long a call may take:
//! - adapters root directory (one sub-directory per provider)
//! - entry point file name inside each provider directory
//! - launcher (run the entry directly or through a script runtime)
//! - per-call deadline

use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use dt_proto::Provider;

use crate::error::ConfigError;

/// Default per-call deadline.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default entry point inside a provider directory.
pub const DEFAULT_ENTRY_POINT: &str = "index.ts";

/// How an adapter entry point is started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Launcher {
    /// Execute the entry point itself.
    Direct,
    /// Run the entry point through a runtime: `<program> <args..> <entry> <verb>`.
    Runtime {
        /// Runtime executable.
        program: String,
        /// Arguments placed before the entry point.
        #[serde(default)]
        args: Vec<String>,
    },
}

impl Launcher {
    /// `bun run <entry>`, the launcher for the bundled TypeScript adapters.
    #[must_use]
    pub fn bun() -> Self {
        Self::Runtime {
            program: "bun".to_string(),
            args: vec!["run".to_string()],
        }
    }
}

impl Default for Launcher {
    fn default() -> Self {
        Self::bun()
    }
}

/// Configuration of the execution engine. Read-only once the engine is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Directory holding one sub-directory per provider.
    pub adapters_root: PathBuf,
    /// File name of the entry point inside a provider directory.
    pub entry_point: String,
    /// How the entry point is started.
    pub launcher: Launcher,
    /// Deadline for a single call.
    pub timeout: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            adapters_root: default_adapters_root(),
            entry_point: DEFAULT_ENTRY_POINT.to_string(),
            launcher: Launcher::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// `<dir of the running binary>/../adapters`, or `./adapters` if the binary
/// path is unavailable.
fn default_adapters_root() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("..").join("adapters")))
        .unwrap_or_else(|| PathBuf::from("adapters"))
}

/// On-disk form of [`BridgeConfig`]; every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    adapters_root: Option<PathBuf>,
    entry_point: Option<String>,
    launcher: Option<Launcher>,
    timeout_secs: Option<u64>,
}

impl BridgeConfig {
    /// Configuration rooted at `adapters_root` with default everything else.
    #[must_use]
    pub fn new(adapters_root: impl Into<PathBuf>) -> Self {
        Self {
            adapters_root: adapters_root.into(),
            ..Self::default()
        }
    }

    /// Set the entry point file name.
    #[must_use]
    pub fn with_entry_point(mut self, entry_point: impl Into<String>) -> Self {
        self.entry_point = entry_point.into();
        self
    }

    /// Set the launcher.
    #[must_use]
    pub fn with_launcher(mut self, launcher: Launcher) -> Self {
        self.launcher = launcher;
        self
    }

    /// Set the per-call deadline.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Load a TOML configuration file. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or the values fail validation.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(content)?;
        let mut config = Self::default();
        if let Some(root) = file.adapters_root {
            config.adapters_root = root;
        }
        if let Some(entry) = file.entry_point {
            config.entry_point = entry;
        }
        if let Some(launcher) = file.launcher {
            config.launcher = launcher;
        }
        if let Some(secs) = file.timeout_secs {
            config.timeout = Duration::from_secs(secs);
        }
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any value is unusable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout.is_zero() {
            return Err(ConfigError::Invalid("timeout must be greater than 0".into()));
        }
        if self.entry_point.is_empty() {
            return Err(ConfigError::Invalid("entry_point cannot be empty".into()));
        }
        if !is_relative_within(Path::new(&self.entry_point)) {
            return Err(ConfigError::Invalid(
                "entry_point must be a relative path inside the provider directory".into(),
            ));
        }
        if let Launcher::Runtime { program, .. } = &self.launcher {
            if program.is_empty() {
                return Err(ConfigError::Invalid("launcher program cannot be empty".into()));
            }
        }
        Ok(())
    }

    /// Entry point path for `provider`: `<root>/<provider>/<entry_point>`.
    #[must_use]
    pub fn adapter_path(&self, provider: &Provider) -> PathBuf {
        self.adapters_root
            .join(provider.as_str())
            .join(&self.entry_point)
    }

    /// Whether `path` lies lexically below the adapters root, with no `..`,
    /// root or prefix components after it.
    #[must_use]
    pub fn is_inside_root(&self, path: &Path) -> bool {
        path.strip_prefix(&self.adapters_root)
            .is_ok_and(|rest| rest.components().next().is_some() && is_relative_within(rest))
    }
}

/// Only plain name components: nothing that climbs out or restarts the path.
fn is_relative_within(path: &Path) -> bool {
    path.components()
        .all(|component| matches!(component, Component::Normal(_) | Component::CurDir))
}
