//! Channel registry implementation
//!
//! The authoritative mapping of stream id to channel state, plus the
//! lifecycle protocol around it: channels are installed through the
//! defaults merger, activated eagerly or on demand under a per-channel run
//! lock, reconfigured and removed with a best-effort stop signal to the old
//! driver, and fed to subscribers by the fan-out engine.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::RwLock;

use crate::config::{ChannelConfig, ConfigStore, RelayConfig, StreamConfig};
use crate::driver::ChannelDriver;
use crate::media::{CodecDescriptor, MediaPacket};
use crate::signal::Signal;

use super::client::{Client, ClientHandle, ClientMode, Outgoing};
use super::config::RegistryConfig;
use super::entry::{ChannelEntry, ChannelSnapshot, ChannelStatus, StreamEntry};
use super::error::RegistryError;

/// Central registry for all streams and channels
///
/// One process-wide instance behind one coarse `RwLock`: pure lookups and
/// the metadata waits take the read mode, every mutation — including
/// broadcasts — takes the write mode. Operations on the same channel
/// observe a total order consistent with lock acquisition; broadcast
/// throughput is deliberately bounded by this single critical section.
pub struct ChannelRegistry {
    /// Stream id to stream state
    streams: RwLock<HashMap<String, StreamEntry>>,

    /// Defaults merged into every added or edited channel
    defaults: ChannelConfig,

    /// Queue bounds and wait tuning
    config: RegistryConfig,

    /// Spawner for channel workers
    driver: Arc<dyn ChannelDriver>,

    /// Persistence hook called after every successful mutation
    store: Arc<dyn ConfigStore>,

    /// Source of client ids
    next_client_id: AtomicU64,
}

impl ChannelRegistry {
    /// Create an empty registry with default tuning
    pub fn new(driver: Arc<dyn ChannelDriver>, store: Arc<dyn ConfigStore>) -> Self {
        Self::with_config(RegistryConfig::default(), driver, store)
    }

    /// Create an empty registry with custom tuning
    pub fn with_config(
        config: RegistryConfig,
        driver: Arc<dyn ChannelDriver>,
        store: Arc<dyn ConfigStore>,
    ) -> Self {
        Self {
            streams: RwLock::new(HashMap::new()),
            defaults: ChannelConfig::default(),
            config,
            driver,
            store,
            next_client_id: AtomicU64::new(1),
        }
    }

    /// Rebuild a registry from a persisted configuration document
    ///
    /// Every configured channel goes through the defaults merger and gets
    /// fresh runtime state; nothing is marked running. Call [`run_all`]
    /// afterward to activate the eager channels.
    ///
    /// [`run_all`]: ChannelRegistry::run_all
    pub fn load(
        relay: RelayConfig,
        config: RegistryConfig,
        driver: Arc<dyn ChannelDriver>,
        store: Arc<dyn ConfigStore>,
    ) -> Self {
        let defaults = relay.channel_defaults;
        let streams = relay
            .streams
            .into_iter()
            .map(|(stream_id, stream_config)| {
                let mut stream = StreamEntry::new(stream_config.name);
                for (channel_id, channel_config) in stream_config.channels {
                    let merged = channel_config.merged_with(&defaults);
                    stream
                        .channels
                        .insert(channel_id, ChannelEntry::new(merged, &config));
                }
                (stream_id, stream)
            })
            .collect();

        Self {
            streams: RwLock::new(streams),
            defaults,
            config,
            driver,
            store,
            next_client_id: AtomicU64::new(1),
        }
    }

    /// Snapshot the configuration and hand it to the store
    fn save_locked(&self, streams: &HashMap<String, StreamEntry>) -> Result<(), RegistryError> {
        let snapshot = RelayConfig {
            channel_defaults: self.defaults.clone(),
            streams: streams
                .iter()
                .map(|(stream_id, stream)| {
                    (
                        stream_id.clone(),
                        StreamConfig {
                            name: stream.name.clone(),
                            channels: stream
                                .channels
                                .iter()
                                .map(|(channel_id, channel)| {
                                    (channel_id.clone(), channel.config.clone())
                                })
                                .collect(),
                        },
                    )
                })
                .collect(),
        };

        self.store.save(&snapshot).map_err(|e| {
            tracing::error!(error = %e, "relay config save failed");
            RegistryError::ConfigSave(e.to_string())
        })
    }

    // ---- streams ----

    /// Register a new stream with an empty channel map
    pub async fn stream_add(&self, stream_id: &str, name: &str) -> Result<(), RegistryError> {
        let mut streams = self.streams.write().await;
        if streams.contains_key(stream_id) {
            return Err(RegistryError::StreamAlreadyExists(stream_id.to_string()));
        }
        streams.insert(stream_id.to_string(), StreamEntry::new(name));
        tracing::info!(stream = %stream_id, "stream added");
        self.save_locked(&streams)
    }

    /// Remove a stream, asking every running channel driver to stop
    pub async fn stream_delete(&self, stream_id: &str) -> Result<(), RegistryError> {
        let mut streams = self.streams.write().await;
        let stream = streams
            .get(stream_id)
            .ok_or_else(|| RegistryError::StreamNotFound(stream_id.to_string()))?;

        for channel in stream.channels.values() {
            if channel.run_lock {
                channel.signals.send(Signal::Stop);
            }
        }
        streams.remove(stream_id);
        tracing::info!(stream = %stream_id, "stream deleted");
        self.save_locked(&streams)
    }

    /// Sorted list of registered stream ids
    pub async fn stream_list(&self) -> Vec<String> {
        let streams = self.streams.read().await;
        let mut ids: Vec<String> = streams.keys().cloned().collect();
        ids.sort();
        ids
    }

    // ---- channel lifecycle ----

    /// Install a new channel
    ///
    /// The configuration goes through the defaults merger; unless the
    /// result is on-demand the driver is started immediately. Persistence
    /// runs afterward and its failure is returned, but the channel stays
    /// installed either way.
    pub async fn channel_add(
        &self,
        stream_id: &str,
        channel_id: &str,
        config: ChannelConfig,
    ) -> Result<(), RegistryError> {
        let mut streams = self.streams.write().await;
        let stream = streams
            .get_mut(stream_id)
            .ok_or_else(|| RegistryError::StreamNotFound(stream_id.to_string()))?;
        if stream.channels.contains_key(channel_id) {
            return Err(RegistryError::ChannelAlreadyExists(
                stream_id.to_string(),
                channel_id.to_string(),
            ));
        }

        let merged = config.merged_with(&self.defaults);
        let mut entry = ChannelEntry::new(merged, &self.config);
        let eager = !entry.config.on_demand;
        if eager {
            entry.run_lock = true;
        }
        stream.channels.insert(channel_id.to_string(), entry);
        if eager {
            self.driver.start(stream_id, channel_id);
        }

        tracing::info!(stream = %stream_id, channel = %channel_id, eager, "channel added");
        self.save_locked(&streams)
    }

    /// Replace a channel's configuration and runtime state wholesale
    ///
    /// A running driver gets a best-effort stop signal first; the call does
    /// not wait for it to exit, so the old worker may briefly keep acting
    /// on ids that now resolve to the replacement entry. Attached clients
    /// and cached codec/session data are discarded with the old entry.
    ///
    /// Matching the original behavior, a missing channel id reports
    /// `StreamNotFound` here (unlike the lookups, which distinguish).
    pub async fn channel_edit(
        &self,
        stream_id: &str,
        channel_id: &str,
        config: ChannelConfig,
    ) -> Result<(), RegistryError> {
        let mut streams = self.streams.write().await;
        let stream = streams
            .get_mut(stream_id)
            .ok_or_else(|| RegistryError::StreamNotFound(stream_id.to_string()))?;
        let current = stream
            .channels
            .get(channel_id)
            .ok_or_else(|| RegistryError::StreamNotFound(stream_id.to_string()))?;

        if current.run_lock {
            current.signals.send(Signal::Stop);
        }

        let merged = config.merged_with(&self.defaults);
        let mut entry = ChannelEntry::new(merged, &self.config);
        let eager = !entry.config.on_demand;
        if eager {
            entry.run_lock = true;
        }
        stream.channels.insert(channel_id.to_string(), entry);
        if eager {
            self.driver.start(stream_id, channel_id);
        }

        tracing::info!(stream = %stream_id, channel = %channel_id, eager, "channel replaced");
        self.save_locked(&streams)
    }

    /// Remove a channel, asking a running driver to stop first
    pub async fn channel_delete(
        &self,
        stream_id: &str,
        channel_id: &str,
    ) -> Result<(), RegistryError> {
        let mut streams = self.streams.write().await;
        let stream = streams
            .get_mut(stream_id)
            .ok_or_else(|| RegistryError::StreamNotFound(stream_id.to_string()))?;
        let channel = stream
            .channels
            .get(channel_id)
            .ok_or_else(|| RegistryError::StreamNotFound(stream_id.to_string()))?;

        if channel.run_lock {
            channel.signals.send(Signal::Stop);
        }
        stream.channels.remove(channel_id);

        tracing::info!(stream = %stream_id, channel = %channel_id, "channel deleted");
        self.save_locked(&streams)
    }

    /// Ask a channel's driver to recycle its upstream connection
    ///
    /// Best-effort signal; does not wait for the driver to react.
    pub async fn channel_reload(
        &self,
        stream_id: &str,
        channel_id: &str,
    ) -> Result<(), RegistryError> {
        let streams = self.streams.read().await;
        let channel = lookup(&streams, stream_id, channel_id)?;
        channel.signals.send(Signal::Restart);
        tracing::debug!(stream = %stream_id, channel = %channel_id, "restart requested");
        Ok(())
    }

    // ---- activation ----

    /// Start every eager channel that is not already running
    ///
    /// The process-startup activation pass; on-demand channels are left for
    /// [`run_one`](ChannelRegistry::run_one).
    pub async fn run_all(&self) {
        let mut streams = self.streams.write().await;
        for (stream_id, stream) in streams.iter_mut() {
            for (channel_id, channel) in stream.channels.iter_mut() {
                if !channel.config.on_demand && !channel.run_lock {
                    channel.run_lock = true;
                    self.driver.start(stream_id, channel_id);
                    tracing::info!(stream = %stream_id, channel = %channel_id, "channel driver started");
                }
            }
        }
    }

    /// Lazily activate one channel
    ///
    /// No-op when the channel is absent or already running; the run lock
    /// guarantees at most one driver per channel even under duplicate calls.
    pub async fn run_one(&self, stream_id: &str, channel_id: &str) {
        let mut streams = self.streams.write().await;
        if let Some(stream) = streams.get_mut(stream_id) {
            if let Some(channel) = stream.channels.get_mut(channel_id) {
                if !channel.run_lock {
                    channel.run_lock = true;
                    self.driver.start(stream_id, channel_id);
                    tracing::debug!(stream = %stream_id, channel = %channel_id, "channel driver started on demand");
                }
            }
        }
    }

    /// Clear a channel's run lock
    ///
    /// Called by the driver itself on exit, whether it stopped voluntarily
    /// or reacted to a stop signal; the channel can be activated again
    /// afterward. No-op when the channel is gone.
    pub async fn unlock(&self, stream_id: &str, channel_id: &str) {
        let mut streams = self.streams.write().await;
        if let Some(stream) = streams.get_mut(stream_id) {
            if let Some(channel) = stream.channels.get_mut(channel_id) {
                channel.run_lock = false;
                tracing::debug!(stream = %stream_id, channel = %channel_id, "channel unlocked");
            }
        }
    }

    // ---- driver-reported state ----

    /// Overwrite a channel's status; no-op when the channel is absent
    pub async fn set_status(&self, stream_id: &str, channel_id: &str, status: ChannelStatus) {
        let mut streams = self.streams.write().await;
        if let Some(stream) = streams.get_mut(stream_id) {
            if let Some(channel) = stream.channels.get_mut(channel_id) {
                channel.status = status;
            }
        }
    }

    /// Publish codec descriptors and session bytes for a channel
    ///
    /// Called by the driver once negotiated; no-op when the channel is
    /// absent. A late call from a driver that was replaced by an edit lands
    /// in the replacement entry — documented relaxed behavior.
    pub async fn update_codecs(
        &self,
        stream_id: &str,
        channel_id: &str,
        codecs: Vec<CodecDescriptor>,
        sdp: Bytes,
    ) {
        let mut streams = self.streams.write().await;
        if let Some(stream) = streams.get_mut(stream_id) {
            if let Some(channel) = stream.channels.get_mut(channel_id) {
                channel.codecs = codecs;
                channel.sdp = sdp;
            }
        }
    }

    // ---- lookups ----

    /// Pure inspection of a channel; does not refresh its activity
    pub async fn channel_info(
        &self,
        stream_id: &str,
        channel_id: &str,
    ) -> Result<ChannelSnapshot, RegistryError> {
        let streams = self.streams.read().await;
        let channel = lookup(&streams, stream_id, channel_id)?;
        Ok(channel.snapshot())
    }

    /// Lookup that refreshes the channel's activity timestamp
    ///
    /// For callers about to act on the channel — a driver fetching its
    /// mailbox, a transport worker preparing a session.
    pub async fn channel_control(
        &self,
        stream_id: &str,
        channel_id: &str,
    ) -> Result<ChannelSnapshot, RegistryError> {
        let mut streams = self.streams.write().await;
        let channel = lookup_mut(&mut streams, stream_id, channel_id)?;
        channel.touch();
        Ok(channel.snapshot())
    }

    /// Whether a channel exists, refreshing its activity when it does
    pub async fn channel_exists(&self, stream_id: &str, channel_id: &str) -> bool {
        let mut streams = self.streams.write().await;
        if let Some(stream) = streams.get_mut(stream_id) {
            if let Some(channel) = stream.channels.get_mut(channel_id) {
                channel.touch();
                return true;
            }
        }
        false
    }

    // ---- clients ----

    /// Attach a subscriber to a channel
    ///
    /// Builds the mode-matching bounded queues and returns the transport
    /// side of them. Activation is not implied: on-demand channels are
    /// started by the caller via [`run_one`](ChannelRegistry::run_one).
    pub async fn client_add(
        &self,
        stream_id: &str,
        channel_id: &str,
        mode: ClientMode,
    ) -> Result<ClientHandle, RegistryError> {
        let mut streams = self.streams.write().await;
        let channel = lookup_mut(&mut streams, stream_id, channel_id)?;

        let id = self.next_client_id.fetch_add(1, Ordering::Relaxed);
        let (client, outgoing) = Client::new(
            mode,
            self.config.client_queue_capacity,
            self.config.client_signal_capacity,
        );
        let signals = client.signals.clone();
        channel.clients.insert(id, client);
        channel.touch();

        tracing::debug!(stream = %stream_id, channel = %channel_id, client = id, mode = ?mode, "client attached");
        Ok(ClientHandle {
            id,
            outgoing,
            signals,
        })
    }

    /// Detach a subscriber; silent no-op when it is already gone
    pub async fn client_delete(&self, stream_id: &str, channel_id: &str, client_id: u64) {
        let mut streams = self.streams.write().await;
        if let Some(stream) = streams.get_mut(stream_id) {
            if let Some(channel) = stream.channels.get_mut(channel_id) {
                if channel.clients.remove(&client_id).is_some() {
                    tracing::debug!(stream = %stream_id, channel = %channel_id, client = client_id, "client detached");
                }
            }
        }
    }

    // ---- fan-out ----

    /// Deliver a packet to every structured-path client of a channel
    ///
    /// Silent no-op for unknown ids or a clientless channel (the activity
    /// timestamp is refreshed only when at least one client is attached).
    /// A client whose outgoing queue is saturated gets a stop signal in its
    /// mailbox instead of the packet; if the mailbox is full as well the
    /// packet is dropped for that client this round.
    pub async fn broadcast(&self, stream_id: &str, channel_id: &str, packet: MediaPacket) {
        let mut streams = self.streams.write().await;
        let Some(stream) = streams.get_mut(stream_id) else {
            return;
        };
        let Some(channel) = stream.channels.get_mut(channel_id) else {
            return;
        };
        if channel.clients.is_empty() {
            return;
        }

        for (client_id, client) in &channel.clients {
            let Outgoing::Packets(tx) = &client.outgoing else {
                continue;
            };
            if tx.try_send(packet.clone()).is_err() && client.signals.send(Signal::Stop) {
                tracing::debug!(stream = %stream_id, channel = %channel_id, client = *client_id, "slow client, stop requested");
            }
        }
        channel.touch();
    }

    /// Deliver raw protocol bytes to every raw-path client of a channel
    ///
    /// Symmetric to [`broadcast`](ChannelRegistry::broadcast) for proxy
    /// consumers.
    pub async fn broadcast_raw(&self, stream_id: &str, channel_id: &str, payload: Bytes) {
        let mut streams = self.streams.write().await;
        let Some(stream) = streams.get_mut(stream_id) else {
            return;
        };
        let Some(channel) = stream.channels.get_mut(channel_id) else {
            return;
        };
        if channel.clients.is_empty() {
            return;
        }

        for (client_id, client) in &channel.clients {
            let Outgoing::Raw(tx) = &client.outgoing else {
                continue;
            };
            if tx.try_send(payload.clone()).is_err() && client.signals.send(Signal::Stop) {
                tracing::debug!(stream = %stream_id, channel = %channel_id, client = *client_id, "slow client, stop requested");
            }
        }
        channel.touch();
    }

    // ---- async-wait accessors ----

    /// Codec descriptors for a channel, waiting for the driver to publish
    ///
    /// The driver negotiates codecs concurrently with activation, so this
    /// polls up to the configured bound (default 100 × 50 ms ≈ 5 s), taking
    /// the read lock only long enough to check each time. Unknown ids fail
    /// on the attempt that observes them, without burning the bound.
    pub async fn codecs(
        &self,
        stream_id: &str,
        channel_id: &str,
    ) -> Result<Vec<CodecDescriptor>, RegistryError> {
        for _ in 0..self.config.wait_attempts {
            {
                let streams = self.streams.read().await;
                let channel = lookup(&streams, stream_id, channel_id)?;
                if !channel.codecs.is_empty() {
                    return Ok(channel.codecs.clone());
                }
            }
            tokio::time::sleep(self.config.wait_interval).await;
        }
        Err(RegistryError::CodecsUnavailable(
            stream_id.to_string(),
            channel_id.to_string(),
        ))
    }

    /// Session description for a channel, waiting like [`codecs`]
    ///
    /// [`codecs`]: ChannelRegistry::codecs
    pub async fn sdp(&self, stream_id: &str, channel_id: &str) -> Result<Bytes, RegistryError> {
        for _ in 0..self.config.wait_attempts {
            {
                let streams = self.streams.read().await;
                let channel = lookup(&streams, stream_id, channel_id)?;
                if !channel.sdp.is_empty() {
                    return Ok(channel.sdp.clone());
                }
            }
            tokio::time::sleep(self.config.wait_interval).await;
        }
        Err(RegistryError::SessionUnavailable(
            stream_id.to_string(),
            channel_id.to_string(),
        ))
    }
}

fn lookup<'a>(
    streams: &'a HashMap<String, StreamEntry>,
    stream_id: &str,
    channel_id: &str,
) -> Result<&'a ChannelEntry, RegistryError> {
    let stream = streams
        .get(stream_id)
        .ok_or_else(|| RegistryError::StreamNotFound(stream_id.to_string()))?;
    stream.channels.get(channel_id).ok_or_else(|| {
        RegistryError::ChannelNotFound(stream_id.to_string(), channel_id.to_string())
    })
}

fn lookup_mut<'a>(
    streams: &'a mut HashMap<String, StreamEntry>,
    stream_id: &str,
    channel_id: &str,
) -> Result<&'a mut ChannelEntry, RegistryError> {
    let stream = streams
        .get_mut(stream_id)
        .ok_or_else(|| RegistryError::StreamNotFound(stream_id.to_string()))?;
    stream.channels.get_mut(channel_id).ok_or_else(|| {
        RegistryError::ChannelNotFound(stream_id.to_string(), channel_id.to_string())
    })
}
