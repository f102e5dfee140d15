//! Media payload types moved through the fan-out engine
//!
//! The registry is a pass-through: it never inspects codec bitstreams. A
//! [`MediaPacket`] is an opaque demuxed unit on the structured path, raw
//! proxy payloads travel as plain [`Bytes`], and [`CodecDescriptor`]s carry
//! the per-track metadata a subscriber needs to bootstrap its decoder.
//!
//! Everything here is designed to be cheap to clone: `Bytes` is
//! reference-counted, so broadcasting to many clients shares one allocation.

use std::time::Duration;

use bytes::Bytes;

/// A single demuxed media unit on the structured delivery path
#[derive(Debug, Clone)]
pub struct MediaPacket {
    /// Index of the track this packet belongs to (position in the
    /// channel's codec descriptor list)
    pub track: u8,
    /// Whether this is a random access point (video only)
    pub is_keyframe: bool,
    /// Media timestamp
    pub time: Duration,
    /// Offset between decode and presentation time
    pub composition_time: Duration,
    /// Payload (zero-copy via reference counting)
    pub data: Bytes,
}

impl MediaPacket {
    /// Create a video packet
    pub fn video(track: u8, time: Duration, data: Bytes, is_keyframe: bool) -> Self {
        Self {
            track,
            is_keyframe,
            time,
            composition_time: Duration::ZERO,
            data,
        }
    }

    /// Create an audio packet
    pub fn audio(track: u8, time: Duration, data: Bytes) -> Self {
        Self {
            track,
            is_keyframe: false,
            time,
            composition_time: Duration::ZERO,
            data,
        }
    }
}

/// Codec family of one track
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecKind {
    H264,
    H265,
    Aac,
    Opus,
    Pcma,
    Pcmu,
}

impl CodecKind {
    /// Whether this codec carries video
    pub fn is_video(&self) -> bool {
        matches!(self, CodecKind::H264 | CodecKind::H265)
    }

    /// Whether this codec carries audio
    pub fn is_audio(&self) -> bool {
        !self.is_video()
    }
}

/// Metadata describing one track of a channel
///
/// Published by the channel driver once it has negotiated with the source;
/// the order of descriptors defines the packet track indexes.
#[derive(Debug, Clone)]
pub struct CodecDescriptor {
    /// Codec family
    pub kind: CodecKind,
    /// Opaque codec private data (e.g. SPS/PPS, AudioSpecificConfig)
    pub config: Bytes,
}

impl CodecDescriptor {
    /// Create a descriptor without private data
    pub fn new(kind: CodecKind) -> Self {
        Self {
            kind,
            config: Bytes::new(),
        }
    }

    /// Create a descriptor with codec private data
    pub fn with_config(kind: CodecKind, config: Bytes) -> Self {
        Self { kind, config }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_packet() {
        let packet = MediaPacket::video(
            0,
            Duration::from_millis(33),
            Bytes::from_static(&[0x65, 0x01]),
            true,
        );

        assert_eq!(packet.track, 0);
        assert!(packet.is_keyframe);
        assert_eq!(packet.composition_time, Duration::ZERO);
    }

    #[test]
    fn test_audio_packet_never_keyframe() {
        let packet = MediaPacket::audio(1, Duration::from_millis(21), Bytes::from_static(&[0xAF]));

        assert_eq!(packet.track, 1);
        assert!(!packet.is_keyframe);
    }

    #[test]
    fn test_codec_kind_classification() {
        assert!(CodecKind::H264.is_video());
        assert!(CodecKind::H265.is_video());
        assert!(CodecKind::Aac.is_audio());
        assert!(CodecKind::Opus.is_audio());
        assert!(CodecKind::Pcma.is_audio());
    }

    #[test]
    fn test_descriptor_constructors() {
        let plain = CodecDescriptor::new(CodecKind::Pcmu);
        assert!(plain.config.is_empty());

        let sps = CodecDescriptor::with_config(CodecKind::H264, Bytes::from_static(&[0x67]));
        assert_eq!(sps.config.len(), 1);
    }
}
