//! Relay configuration and persistence
//!
//! A [`ChannelConfig`] is what callers hand to add/edit; the registry runs
//! it through [`ChannelConfig::merged_with`] so that fields the caller left
//! unset pick up the process-wide defaults. The full registry shape is
//! persisted as a [`RelayConfig`] document through a [`ConfigStore`] after
//! every successful mutation.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Configuration of a single channel
///
/// Set at add/edit time and immutable in between; runtime state (clients,
/// codecs, run lock) lives in the registry entry, not here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Human-readable channel name
    pub name: String,
    /// Source URL the driver connects to
    pub url: String,
    /// Lazily activated on first access instead of at startup
    pub on_demand: bool,
    /// Verbose driver logging for this channel
    pub debug: bool,
    /// Skip TLS certificate verification when dialing the source
    pub insecure_skip_verify: bool,
}

impl ChannelConfig {
    /// Overlay this config onto process-wide defaults
    ///
    /// Every field left at its zero value (empty string, `false`) is taken
    /// from `defaults`; fields the caller set win. The overlay goes through
    /// a JSON value round-trip; if that fails the caller's config is used
    /// unmodified and the failure is only logged, since missing defaults are
    /// not fatal to channel operation.
    pub fn merged_with(&self, defaults: &ChannelConfig) -> ChannelConfig {
        match merge_values(self, defaults) {
            Ok(merged) => merged,
            Err(e) => {
                tracing::error!(error = %e, "channel config merge failed, keeping caller values");
                self.clone()
            }
        }
    }
}

fn merge_values(
    own: &ChannelConfig,
    defaults: &ChannelConfig,
) -> Result<ChannelConfig, serde_json::Error> {
    let mut base = serde_json::to_value(defaults)?;
    let overlay = serde_json::to_value(own)?;

    if let (Value::Object(base), Value::Object(overlay)) = (&mut base, overlay) {
        for (key, value) in overlay {
            if !is_zero(&value) {
                base.insert(key, value);
            }
        }
    }

    serde_json::from_value(base)
}

fn is_zero(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

/// Configuration of one stream: a name and its channels
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Human-readable stream name
    pub name: String,
    /// Channel id to channel configuration
    pub channels: HashMap<String, ChannelConfig>,
}

/// The persisted registry document
///
/// Round-trips through [`ConfigStore::save`] and registry loading: saving
/// after a mutation and loading the result reproduces the same streams and
/// channels (with fresh runtime state).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Defaults merged into every added or edited channel
    pub channel_defaults: ChannelConfig,
    /// Stream id to stream configuration
    pub streams: HashMap<String, StreamConfig>,
}

/// Error at the persistence boundary
#[derive(Debug)]
pub enum ConfigError {
    /// Filesystem failure
    Io(std::io::Error),
    /// Document (de)serialization failure
    Serialize(serde_json::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config io error: {}", e),
            ConfigError::Serialize(e) => write!(f, "config serialize error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Serialize(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Serialize(e)
    }
}

/// Persistence hook invoked after every successful registry mutation
///
/// An error is propagated to the caller of the mutating operation but the
/// in-memory change is never rolled back, so registry and persisted state
/// may transiently diverge until the next successful save.
pub trait ConfigStore: Send + Sync + 'static {
    /// Persist a snapshot of the registry configuration
    fn save(&self, config: &RelayConfig) -> Result<(), ConfigError>;
}

/// [`ConfigStore`] writing a pretty-printed JSON document to one file
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Create a store targeting `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read the document back, e.g. at process startup
    pub fn load(&self) -> Result<RelayConfig, ConfigError> {
        let raw = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

impl ConfigStore for JsonFileStore {
    fn save(&self, config: &RelayConfig) -> Result<(), ConfigError> {
        let doc = serde_json::to_string_pretty(config)?;
        fs::write(&self.path, doc)?;
        tracing::debug!(path = %self.path.display(), "relay config saved");
        Ok(())
    }
}

/// [`ConfigStore`] that discards every save
///
/// For embedders that keep configuration elsewhere, and for tests.
pub struct NullStore;

impl ConfigStore for NullStore {
    fn save(&self, _config: &RelayConfig) -> Result<(), ConfigError> {
        Ok(())
    }
}
