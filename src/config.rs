//! Embedder configuration, usually read from a TOML file.
//!
//! ```toml
//! backend = "native"
//!
//! [descriptors]
//! first = 3
//! max = 1024
//!
//! [logging]
//! level = "debug"
//! start = "name"
//! end = "basic"
//! track_duration = true
//!
//! [environment]
//! TMPDIR = "/tmp"
//! ```

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use vfs_core::{FdTableConfig, LogLevel, LogVerbosity, LoggingEvents};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid descriptor range {first}..={max}")]
    DescriptorRange { first: i32, max: i32 },
    #[error("the {0:?} backend is not available on this platform")]
    UnsupportedBackend(BackendKind),
    #[error("environment variable `{0}` cannot be passed to the guest")]
    InvalidEnvironment(String),
}

/// Which [`FileSystemBackend`](vfs_core::FileSystemBackend) serves the guest.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Portable `std::fs` backend.
    #[default]
    Host,
    /// Raw Linux syscalls.
    Native,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub start: LogVerbosity,
    pub end: LogVerbosity,
    pub track_duration: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Debug,
            start: LogVerbosity::None,
            end: LogVerbosity::None,
            track_duration: false,
        }
    }
}

impl LoggingConfig {
    pub fn events(&self) -> LoggingEvents {
        LoggingEvents {
            start: self.start,
            end: self.end,
            track_duration: self.track_duration,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HostConfig {
    pub backend: BackendKind,
    pub descriptors: FdTableConfig,
    pub logging: LoggingConfig,
    /// Variables the guest sees through `environ_get`. Nothing is
    /// inherited from the host process.
    pub environment: BTreeMap<String, String>,
}

impl HostConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: HostConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Reject settings that deserialize fine but cannot work.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let FdTableConfig { first, max } = self.descriptors;
        if first < 0 || max < first {
            return Err(ConfigError::DescriptorRange { first, max });
        }
        if self.backend == BackendKind::Native && !cfg!(target_os = "linux") {
            return Err(ConfigError::UnsupportedBackend(self.backend));
        }
        for (key, value) in &self.environment {
            if key.is_empty() || key.contains(['=', '\0']) || value.contains('\0') {
                return Err(ConfigError::InvalidEnvironment(key.clone()));
            }
        }
        Ok(())
    }
}
