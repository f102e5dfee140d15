//! Registry error types
//!
//! Every registry operation reports failure as an ordinary result; the
//! registry never panics or terminates the process on these.

/// Error type for registry operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Stream id is not registered
    StreamNotFound(String),
    /// Channel id is absent under a registered stream
    ChannelNotFound(String, String),
    /// Add attempted on a stream id that is already registered
    StreamAlreadyExists(String),
    /// Add attempted on a channel id that is already taken
    ChannelAlreadyExists(String, String),
    /// Codec descriptors did not appear within the wait bound
    CodecsUnavailable(String, String),
    /// Session description did not appear within the wait bound
    SessionUnavailable(String, String),
    /// The in-memory change applied but persisting it failed
    ConfigSave(String),
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryError::StreamNotFound(stream) => {
                write!(f, "stream not found: {}", stream)
            }
            RegistryError::ChannelNotFound(stream, channel) => {
                write!(f, "channel not found: {}/{}", stream, channel)
            }
            RegistryError::StreamAlreadyExists(stream) => {
                write!(f, "stream already exists: {}", stream)
            }
            RegistryError::ChannelAlreadyExists(stream, channel) => {
                write!(f, "channel already exists: {}/{}", stream, channel)
            }
            RegistryError::CodecsUnavailable(stream, channel) => {
                write!(f, "codecs not available: {}/{}", stream, channel)
            }
            RegistryError::SessionUnavailable(stream, channel) => {
                write!(f, "session description not available: {}/{}", stream, channel)
            }
            RegistryError::ConfigSave(msg) => {
                write!(f, "config save failed: {}", msg)
            }
        }
    }
}

impl std::error::Error for RegistryError {}
