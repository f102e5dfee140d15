//! Per-stream and per-channel registry state

use std::collections::HashMap;
use std::time::Instant;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::config::ChannelConfig;
use crate::media::CodecDescriptor;
use crate::signal::SignalQueue;

use super::client::Client;
use super::config::RegistryConfig;

/// Driver-reported connection state of a channel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelStatus {
    /// No driver activity
    #[default]
    Idle,
    /// Driver is dialing the source
    Connecting,
    /// Driver is receiving media
    Connected,
    /// Driver gave up on the source
    Error,
}

/// One stream: a named source and its channels
pub(super) struct StreamEntry {
    pub(super) name: String,
    pub(super) channels: HashMap<String, ChannelEntry>,
}

impl StreamEntry {
    pub(super) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            channels: HashMap::new(),
        }
    }
}

/// Per-channel registry state
///
/// Configuration is immutable between edits; everything else is runtime
/// state mutated in place by broadcast, status, codec and run-lock
/// operations, and rebuilt wholesale when the channel is edited.
pub(super) struct ChannelEntry {
    pub(super) config: ChannelConfig,
    pub(super) clients: HashMap<u64, Client>,
    pub(super) codecs: Vec<CodecDescriptor>,
    pub(super) sdp: Bytes,
    pub(super) status: ChannelStatus,
    /// Last liveness-relevant access; `None` means never
    pub(super) ack: Option<Instant>,
    /// True while a driver worker is presumed running
    pub(super) run_lock: bool,
    pub(super) signals: SignalQueue,
}

impl ChannelEntry {
    /// Build fresh runtime state around a merged configuration
    ///
    /// Invoked on every add and edit: clients, codecs, session description,
    /// status and the signal mailbox always start over.
    pub(super) fn new(config: ChannelConfig, registry: &RegistryConfig) -> Self {
        Self {
            config,
            clients: HashMap::new(),
            codecs: Vec::new(),
            sdp: Bytes::new(),
            status: ChannelStatus::Idle,
            ack: None,
            run_lock: false,
            signals: SignalQueue::new(registry.signal_capacity),
        }
    }

    /// Refresh the last-activity timestamp
    pub(super) fn touch(&mut self) {
        self.ack = Some(Instant::now());
    }

    /// Point-in-time copy of the externally visible state
    pub(super) fn snapshot(&self) -> ChannelSnapshot {
        ChannelSnapshot {
            config: self.config.clone(),
            status: self.status,
            client_count: self.clients.len(),
            codecs: self.codecs.clone(),
            sdp: self.sdp.clone(),
            running: self.run_lock,
            last_ack: self.ack,
            signals: self.signals.clone(),
        }
    }
}

/// Point-in-time copy of a channel's externally visible state
///
/// The signal mailbox clone stays live after the snapshot: a driver keeps
/// consuming from it, and edits replacing the channel do not retarget
/// already-handed-out clones.
#[derive(Debug, Clone)]
pub struct ChannelSnapshot {
    /// Channel configuration as of the snapshot
    pub config: ChannelConfig,
    /// Driver-reported status
    pub status: ChannelStatus,
    /// Number of attached clients
    pub client_count: usize,
    /// Published codec descriptors (empty until the driver negotiates)
    pub codecs: Vec<CodecDescriptor>,
    /// Published session description (empty until the driver negotiates)
    pub sdp: Bytes,
    /// Whether a driver is presumed running
    pub running: bool,
    /// Last liveness-relevant access; `None` means never
    pub last_ack: Option<Instant>,
    /// The channel's signal mailbox
    pub signals: SignalQueue,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_entry_state() {
        let entry = ChannelEntry::new(ChannelConfig::default(), &RegistryConfig::default());

        assert!(entry.clients.is_empty());
        assert!(entry.codecs.is_empty());
        assert!(entry.sdp.is_empty());
        assert_eq!(entry.status, ChannelStatus::Idle);
        assert!(entry.ack.is_none());
        assert!(!entry.run_lock);
        assert_eq!(entry.signals.pending(), 0);
    }

    #[test]
    fn test_touch_sets_ack() {
        let mut entry = ChannelEntry::new(ChannelConfig::default(), &RegistryConfig::default());
        assert!(entry.ack.is_none());

        entry.touch();
        assert!(entry.ack.is_some());
    }

    #[test]
    fn test_snapshot_reflects_entry() {
        let config = ChannelConfig {
            name: "cam".to_string(),
            url: "rtsp://cam.local/live".to_string(),
            on_demand: true,
            ..Default::default()
        };
        let mut entry = ChannelEntry::new(config, &RegistryConfig::default());
        entry.run_lock = true;
        entry.status = ChannelStatus::Connected;

        let snapshot = entry.snapshot();

        assert_eq!(snapshot.config.url, "rtsp://cam.local/live");
        assert_eq!(snapshot.status, ChannelStatus::Connected);
        assert_eq!(snapshot.client_count, 0);
        assert!(snapshot.running);
        assert!(snapshot.last_ack.is_none());
    }

    #[test]
    fn test_status_serde_names() {
        assert_eq!(
            serde_json::to_string(&ChannelStatus::Connected).unwrap(),
            "\"connected\""
        );
        let status: ChannelStatus = serde_json::from_str("\"error\"").unwrap();
        assert_eq!(status, ChannelStatus::Error);
    }
}
