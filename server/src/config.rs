//! Configuration for the playfish server
//!
//! Values are resolved once at startup with the following precedence:
//! 1. command-line flags
//! 2. `PLAYFISH_*` environment variables
//! 3. the TOML file named by `--config`, else `./config.toml` if present
//! 4. built-in defaults

use std::collections::BTreeMap;
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "config.toml";
const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_MOVE_TIME_MS: u64 = 1000;
const DEFAULT_SEARCH_GRACE_MS: u64 = 5000;
const DEFAULT_HANDSHAKE_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub engine_path: Option<PathBuf>,
    pub listen_addr: String,
    pub move_time_ms: u64,
    pub search_grace_ms: u64,
    pub handshake_timeout_ms: u64,
    pub assets_dir: PathBuf,
    pub log_file: Option<PathBuf>,
    /// Sent to the engine as `setoption` after the handshake.
    pub uci_options: BTreeMap<String, toml::Value>,
    /// File the values were read from, if any.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            engine_path: None,
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            move_time_ms: DEFAULT_MOVE_TIME_MS,
            search_grace_ms: DEFAULT_SEARCH_GRACE_MS,
            handshake_timeout_ms: DEFAULT_HANDSHAKE_TIMEOUT_MS,
            assets_dir: PathBuf::from("."),
            log_file: None,
            uci_options: BTreeMap::new(),
            source: None,
        }
    }
}

/// Values supplied on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub engine_path: Option<PathBuf>,
    pub listen_addr: Option<String>,
    pub move_time_ms: Option<u64>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },
    #[error("No engine path configured (set engine_path, PLAYFISH_ENGINE_PATH or --engine)")]
    MissingEnginePath,
    #[error("Invalid listen address: {0}")]
    InvalidListenAddr(String),
}

impl ServerConfig {
    /// Full resolution: file, then process environment, then CLI.
    pub fn resolve(explicit: Option<&Path>, overrides: Overrides) -> Result<Self, ConfigError> {
        let mut config = Self::load(explicit, Path::new(DEFAULT_CONFIG_FILE))?;
        config.apply_env(|key| std::env::var(key).ok())?;
        config.apply_overrides(overrides);
        config.validate()?;
        Ok(config)
    }

    /// Read `explicit` if given (it must exist), else `fallback` if it
    /// exists, else use defaults.
    pub fn load(explicit: Option<&Path>, fallback: &Path) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None if fallback.is_file() => Self::from_file(fallback),
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    /// Apply `PLAYFISH_*` variables through `lookup`.
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(path) = lookup("PLAYFISH_ENGINE_PATH") {
            self.engine_path = Some(PathBuf::from(path));
        }
        if let Some(addr) = lookup("PLAYFISH_LISTEN_ADDR") {
            self.listen_addr = addr;
        }
        if let Some(value) = lookup("PLAYFISH_MOVE_TIME_MS") {
            self.move_time_ms = parse_millis("PLAYFISH_MOVE_TIME_MS", &value)?;
        }
        if let Some(value) = lookup("PLAYFISH_SEARCH_GRACE_MS") {
            self.search_grace_ms = parse_millis("PLAYFISH_SEARCH_GRACE_MS", &value)?;
        }
        if let Some(dir) = lookup("PLAYFISH_ASSETS_DIR") {
            self.assets_dir = PathBuf::from(dir);
        }
        if let Some(file) = lookup("PLAYFISH_LOG_FILE") {
            self.log_file = Some(PathBuf::from(file));
        }
        Ok(())
    }

    pub fn apply_overrides(&mut self, overrides: Overrides) {
        if let Some(path) = overrides.engine_path {
            self.engine_path = Some(path);
        }
        if let Some(addr) = overrides.listen_addr {
            self.listen_addr = addr;
        }
        if let Some(ms) = overrides.move_time_ms {
            self.move_time_ms = ms;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine_path()?;
        self.listen_addr()?;
        if self.move_time_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "move_time_ms".to_string(),
                value: "0".to_string(),
            });
        }
        Ok(())
    }

    pub fn engine_path(&self) -> Result<&Path, ConfigError> {
        self.engine_path
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or(ConfigError::MissingEnginePath)
    }

    /// The listen address; a bare `:PORT` binds every interface.
    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = self.listen_addr.trim();
        let full = if addr.starts_with(':') {
            format!("0.0.0.0{}", addr)
        } else {
            addr.to_string()
        };
        full.to_socket_addrs()
            .ok()
            .and_then(|mut addrs| addrs.next())
            .ok_or_else(|| ConfigError::InvalidListenAddr(self.listen_addr.clone()))
    }

    pub fn move_time(&self) -> Duration {
        Duration::from_millis(self.move_time_ms)
    }

    pub fn search_grace(&self) -> Duration {
        Duration::from_millis(self.search_grace_ms)
    }

    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms)
    }

    /// Engine options as `setoption` name/value pairs, values stringified.
    pub fn uci_options(&self) -> Vec<(String, String)> {
        self.uci_options
            .iter()
            .map(|(name, value)| (name.clone(), stringify(value)))
            .collect()
    }
}

fn parse_millis(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn stringify(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
