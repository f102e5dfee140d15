//! Live media relay core
//!
//! `relay-rs` is the distribution heart of a streaming relay: a registry of
//! media sources ("streams"), each exposing sub-feeds ("channels"), fanning
//! every channel's packets out to any number of attached subscribers with
//! bounded queues and proactive disconnection of consumers that cannot keep
//! up.
//!
//! The crate deliberately stops at the registry boundary. Producing media
//! is the job of an external [`ChannelDriver`] worker per channel; serving
//! clients is the job of the transport layer that attaches them. Both talk
//! to the same [`ChannelRegistry`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use relay_rs::{ChannelConfig, ChannelRegistry, ClientMode, NullStore};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! // The driver spawns one worker per activated channel.
//! let driver = Arc::new(|stream_id: &str, channel_id: &str| {
//!     let (stream_id, channel_id) = (stream_id.to_string(), channel_id.to_string());
//!     tokio::spawn(async move {
//!         // pull from the source, publish packets, watch for signals...
//!         let _ = (stream_id, channel_id);
//!     });
//! });
//!
//! let registry = Arc::new(ChannelRegistry::new(driver, Arc::new(NullStore)));
//!
//! registry.stream_add("cam1", "front door").await?;
//! registry
//!     .channel_add(
//!         "cam1",
//!         "ch0",
//!         ChannelConfig {
//!             url: "rtsp://cam1.local/live".into(),
//!             on_demand: true,
//!             ..Default::default()
//!         },
//!     )
//!     .await?;
//!
//! // First viewer: activate lazily, attach, wait for codec metadata.
//! registry.run_one("cam1", "ch0").await;
//! let client = registry.client_add("cam1", "ch0", ClientMode::Packets).await?;
//! let codecs = registry.codecs("cam1", "ch0").await?;
//! # let _ = (client, codecs);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod driver;
pub mod media;
pub mod registry;
pub mod signal;

pub use config::{ChannelConfig, ConfigError, ConfigStore, JsonFileStore, NullStore, RelayConfig,
    StreamConfig};
pub use driver::ChannelDriver;
pub use media::{CodecDescriptor, CodecKind, MediaPacket};
pub use registry::{ChannelRegistry, ChannelSnapshot, ChannelStatus, ClientHandle, ClientMode,
    OutgoingReceiver, RegistryConfig, RegistryError};
pub use signal::{Signal, SignalQueue};
