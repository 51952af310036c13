//! Configuration module for trpc
//!
//! Holds the tracker short-name table, the daemon endpoint and a couple of
//! display policies. Configuration is read from the user's config directory;
//! a missing file means defaults. `TR_HOST` and `TR_AUTH` override the
//! endpoint settings from the file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use config::{Config, ConfigError, File, FileFormat};
use serde::{Deserialize, Deserializer};
use tracing::debug;

use crate::torrent::ZeroSize;

/// Application configuration structure
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TrpcConfig {
    /// Tracker announce substrings mapped to display short names
    pub trackernames: TrackerNames,

    /// Daemon endpoint
    pub rpc: RpcSettings,

    /// Default log filter when `RUST_LOG` is unset
    pub log_level: String,

    /// Report zero-byte torrents as 100% done instead of dividing by zero
    pub zero_size_complete: bool,
}

impl Default for TrpcConfig {
    fn default() -> Self {
        Self {
            trackernames: TrackerNames::default(),
            rpc: RpcSettings::default(),
            log_level: "warn".to_string(),
            zero_size_complete: true,
        }
    }
}

impl TrpcConfig {
    /// Get the path to the config file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the system config directory cannot be determined.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ConfigError::Message("Could not determine config directory".to_string()))?;

        Ok(config_dir.join("trpc").join("config.toml"))
    }

    /// Load configuration from the default location and apply environment
    /// overrides
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the config file cannot be parsed or an
    /// environment override is malformed.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_at(&Self::config_path()?)
    }

    /// Load configuration from `path` and apply environment overrides
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the config file cannot be parsed or an
    /// environment override is malformed.
    pub fn load_at(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_env(
            std::env::var("TR_HOST").ok().as_deref(),
            std::env::var("TR_AUTH").ok().as_deref(),
        )?;
        Ok(config)
    }

    /// Load configuration from `path`, or defaults if it does not exist
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let settings = Config::builder()
            .add_source(File::from(path).format(FileFormat::Toml))
            .build()?;

        settings.try_deserialize()
    }

    /// Apply `TR_HOST` (`host[:port]`) and `TR_AUTH` (`user:password`)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the port in `host` is not a number.
    pub fn apply_env(&mut self, host: Option<&str>, auth: Option<&str>) -> Result<(), ConfigError> {
        if let Some(host) = host.filter(|h| !h.is_empty()) {
            match host.rsplit_once(':') {
                Some((name, port)) => {
                    self.rpc.port = port
                        .parse()
                        .map_err(|_| ConfigError::Message(format!("Invalid port in TR_HOST: '{port}'")))?;
                    if !name.is_empty() {
                        self.rpc.host = name.to_string();
                    }
                }
                None => self.rpc.host = host.to_string(),
            }
        }

        if let Some(auth) = auth.filter(|a| !a.is_empty()) {
            let (user, password) = match auth.split_once(':') {
                Some((user, password)) => (user, Some(password.to_string())),
                None => (auth, None),
            };
            self.rpc.user = Some(user.to_string());
            self.rpc.password = password;
        }

        Ok(())
    }

    /// Progress policy for zero-byte torrents
    #[must_use]
    pub const fn zero_size(&self) -> ZeroSize {
        if self.zero_size_complete {
            ZeroSize::Complete
        } else {
            ZeroSize::Raw
        }
    }
}

/// Daemon endpoint and credentials
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct RpcSettings {
    pub host: String,
    pub port: u16,
    pub path: String,
    pub https: bool,
    pub user: Option<String>,
    pub password: Option<String>,
    pub timeout_secs: u64,
}

impl Default for RpcSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9091,
            path: "/transmission/rpc".to_string(),
            https: false,
            user: None,
            password: None,
            timeout_secs: 30,
        }
    }
}

impl RpcSettings {
    /// Full RPC endpoint URL
    #[must_use]
    pub fn url(&self) -> String {
        let scheme = if self.https { "https" } else { "http" };
        format!("{scheme}://{}:{}{}", self.host, self.port, self.path)
    }
}

/// Substring to short-name lookup for tracker announce URLs
///
/// Entries are kept longest substring first, ties in lexical order, so that
/// a lookup is deterministic when several substrings match the same URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackerNames {
    entries: Vec<(String, String)>,
}

impl TrackerNames {
    /// Build a table from `(substring, short name)` pairs
    #[must_use]
    pub fn from_pairs<I, S, N>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, N)>,
        S: Into<String>,
        N: Into<String>,
    {
        let mut entries: Vec<(String, String)> = pairs
            .into_iter()
            .map(|(sub, short)| (sub.into(), short.into()))
            .filter(|(sub, _)| !sub.is_empty())
            .collect();
        entries.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));
        entries.dedup_by(|a, b| a.0 == b.0);
        Self { entries }
    }

    /// Short name for the first configured substring contained in `url`
    #[must_use]
    pub fn lookup(&self, url: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(sub, _)| url.contains(sub.as_str()))
            .map(|(_, short)| short.as_str())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'de> Deserialize<'de> for TrackerNames {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Substrings {
            One(String),
            Many(Vec<String>),
        }

        let raw = BTreeMap::<String, Substrings>::deserialize(deserializer)?;
        Ok(Self::from_pairs(raw.into_iter().flat_map(|(short, subs)| {
            let subs = match subs {
                Substrings::One(sub) => vec![sub],
                Substrings::Many(subs) => subs,
            };
            subs.into_iter().map(move |sub| (sub, short.clone()))
        })))
    }
}
