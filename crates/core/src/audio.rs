//! Audio payload helpers
//!
//! The browser leg and the hosted live API both carry mono PCM16-LE audio,
//! base64-encoded inside JSON messages.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

use crate::error::Error;

/// Sample rate of microphone audio sent to the hosted session
pub const DEFAULT_INPUT_SAMPLE_RATE: u32 = 16_000;

/// Sample rate of model audio received from the hosted session
pub const DEFAULT_OUTPUT_SAMPLE_RATE: u32 = 24_000;

/// A chunk of decoded model audio ready for playback
#[derive(Debug, Clone, PartialEq)]
pub struct AudioChunk {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Mono PCM samples
    pub samples: Vec<i16>,
}

impl AudioChunk {
    pub fn new(sample_rate: u32, samples: Vec<i16>) -> Self {
        Self {
            sample_rate,
            samples,
        }
    }

    /// Duration of this chunk in milliseconds
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        (self.samples.len() as u64 * 1000) / self.sample_rate as u64
    }
}

/// Decode little-endian PCM16 bytes into samples
///
/// A trailing odd byte is dropped rather than treated as an error.
pub fn pcm16_from_bytes(bytes: &[u8]) -> Vec<i16> {
    bytes
        .chunks_exact(2)
        .map(|chunk| i16::from_le_bytes([chunk[0], chunk[1]]))
        .collect()
}

/// Encode PCM16 samples as little-endian bytes
pub fn pcm16_to_bytes(samples: &[i16]) -> Vec<u8> {
    samples
        .iter()
        .flat_map(|s| s.to_le_bytes())
        .collect()
}

/// Base64-encode PCM16 samples for a JSON payload
pub fn encode_audio(samples: &[i16]) -> String {
    BASE64.encode(pcm16_to_bytes(samples))
}

/// Decode a base64 PCM16 payload from a JSON message
pub fn decode_audio(data: &str) -> Result<Vec<i16>, Error> {
    let bytes = BASE64
        .decode(data)
        .map_err(|e| Error::Audio(format!("Invalid base64 audio payload: {}", e)))?;
    Ok(pcm16_from_bytes(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pcm16_roundtrip() {
        let samples = vec![0i16, 1, -1, i16::MAX, i16::MIN, 1234];
        let bytes = pcm16_to_bytes(&samples);
        assert_eq!(bytes.len(), samples.len() * 2);
        assert_eq!(pcm16_from_bytes(&bytes), samples);
    }

    #[test]
    fn test_pcm16_drops_trailing_odd_byte() {
        let samples = pcm16_from_bytes(&[0x34, 0x12, 0xff]);
        assert_eq!(samples, vec![0x1234]);
    }

    #[test]
    fn test_base64_audio_roundtrip() {
        let samples = vec![100i16, -200, 300];
        let encoded = encode_audio(&samples);
        assert_eq!(decode_audio(&encoded).unwrap(), samples);
    }

    #[test]
    fn test_decode_audio_rejects_garbage() {
        assert!(decode_audio("not base64!!!").is_err());
    }

    #[test]
    fn test_chunk_duration() {
        let chunk = AudioChunk::new(24_000, vec![0; 480]);
        assert_eq!(chunk.duration_ms(), 20);
    }
}
