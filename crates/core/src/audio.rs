//! Audio format identifiers
//!
//! The relay never transcodes. Both sides are configured with the same
//! narrowband encoding and payloads pass through untouched.

use serde::{Deserialize, Serialize};

/// Wire audio format negotiated with the realtime agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AudioFormat {
    /// μ-law, 8 kHz mono (telephony default)
    #[default]
    #[serde(rename = "g711_ulaw")]
    Mulaw,
    /// A-law, 8 kHz mono
    #[serde(rename = "g711_alaw")]
    Alaw,
    /// 16-bit signed PCM (little-endian)
    #[serde(rename = "pcm16")]
    Pcm16,
}

impl AudioFormat {
    /// Bytes of encoded audio per millisecond
    pub fn bytes_per_ms(&self) -> u64 {
        match self {
            AudioFormat::Mulaw | AudioFormat::Alaw => 8,
            AudioFormat::Pcm16 => 48,
        }
    }

    /// Playback duration of `bytes` of encoded audio
    pub fn duration_ms(&self, bytes: usize) -> u64 {
        bytes as u64 / self.bytes_per_ms()
    }

    /// Name used by the telephony provider's `mediaFormat.encoding`
    pub fn telephony_encoding(&self) -> &'static str {
        match self {
            AudioFormat::Mulaw => "audio/x-mulaw",
            AudioFormat::Alaw => "audio/x-alaw",
            AudioFormat::Pcm16 => "audio/l16",
        }
    }

    /// Whether a telephony `mediaFormat.encoding` string matches this format
    pub fn matches_telephony_encoding(&self, encoding: &str) -> bool {
        self.telephony_encoding().eq_ignore_ascii_case(encoding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names() {
        assert_eq!(
            serde_json::to_string(&AudioFormat::Mulaw).unwrap(),
            "\"g711_ulaw\""
        );
        let parsed: AudioFormat = serde_json::from_str("\"pcm16\"").unwrap();
        assert_eq!(parsed, AudioFormat::Pcm16);
    }

    #[test]
    fn test_telephony_encoding_match() {
        assert!(AudioFormat::Mulaw.matches_telephony_encoding("audio/x-mulaw"));
        assert!(!AudioFormat::Alaw.matches_telephony_encoding("audio/x-mulaw"));
    }

    #[test]
    fn test_duration() {
        // 160 bytes of 8 kHz μ-law is one 20 ms telephony frame
        assert_eq!(AudioFormat::Mulaw.duration_ms(160), 20);
        assert_eq!(AudioFormat::Pcm16.duration_ms(960), 20);
    }
}
