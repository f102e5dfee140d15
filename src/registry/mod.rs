//! Stream/channel registry and broadcast fan-out
//!
//! The registry is the authoritative map of streams to channels and the
//! single serialization point for everything that touches them: lifecycle
//! (add/edit/delete), activation (eager or on demand, guarded by a
//! per-channel run lock), driver-reported metadata, and packet fan-out.
//!
//! # Architecture
//!
//! ```text
//!                    Arc<ChannelRegistry>
//!              ┌────────────────────────────────┐
//!              │ RwLock<HashMap<StreamId,       │
//!              │   StreamEntry {                │
//!              │     channels: HashMap<Id,      │
//!              │       ChannelEntry {           │
//!              │         clients, codecs, sdp,  │
//!              │         run_lock, signals,     │
//!              │       }>                       │
//!              │   }>>                          │
//!              └───────────┬────────────────────┘
//!                          │
//!       ┌──────────────────┼──────────────────────┐
//!       │                  │                      │
//!       ▼                  ▼                      ▼
//!  [Channel driver]   [Transport worker]     [Admin/API]
//!  broadcast()        client_add()           channel_add()
//!  update_codecs()    codecs() / sdp()       channel_edit()
//!  recv signals       drain ClientHandle     channel_delete()
//! ```
//!
//! # Backpressure
//!
//! Every client owns a bounded outgoing queue. A broadcast never waits for
//! a slow consumer: when a client's queue is full the fan-out engine drops
//! a stop signal into that client's mailbox so the transport layer tears it
//! down, and the stream stays live for everyone else.

pub mod client;
pub mod config;
pub mod entry;
pub mod error;
pub mod store;

pub use client::{ClientHandle, ClientMode, OutgoingReceiver};
pub use config::RegistryConfig;
pub use entry::{ChannelSnapshot, ChannelStatus};
pub use error::RegistryError;
pub use store::ChannelRegistry;
