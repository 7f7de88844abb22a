//! DLC codec seam.
//!
//! The parser and validator treat DLC payloads as opaque bytes; only the
//! AudioDataID, the coded sample rate and the byte length are inspected.
//! Decoding to PCM (and encoding when authoring essence) goes through the
//! [`DlcCodec`] trait so the signal-processing kernel can live in a separate
//! crate or be stubbed out entirely.

use anyhow::Result;

use crate::structs::types::SampleRate;

/// Opaque encoder/decoder for DLC-compressed mono PCM blocks.
///
/// Implementations must be deterministic: the same payload, sample rate and
/// sample count always produce the same samples. Byte-exact re-encoding is
/// not required.
pub trait DlcCodec {
    /// Encodes `samples` into a DLC payload. `samples.len()` must match the
    /// frame sample count for the stream's frame rate at `sample_rate`.
    fn encode(&self, samples: &[i32], sample_rate: SampleRate) -> Result<Vec<u8>>;

    /// Decodes a DLC payload into exactly `sample_count` samples.
    fn decode(&self, data: &[u8], sample_rate: SampleRate, sample_count: usize)
    -> Result<Vec<i32>>;
}

/// Stand-in codec that stores samples as uncompressed big-endian words.
///
/// Useful as the oracle in tests and tools that do not care about actual
/// DLC compression; it satisfies the determinism contract trivially.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughCodec;

impl DlcCodec for PassthroughCodec {
    fn encode(&self, samples: &[i32], _sample_rate: SampleRate) -> Result<Vec<u8>> {
        let mut data = Vec::with_capacity(samples.len() * 4);
        for &sample in samples {
            data.extend_from_slice(&sample.to_be_bytes());
        }

        Ok(data)
    }

    fn decode(
        &self,
        data: &[u8],
        _sample_rate: SampleRate,
        sample_count: usize,
    ) -> Result<Vec<i32>> {
        anyhow::ensure!(
            data.len() == sample_count * 4,
            "DLC payload length {} does not hold {} samples",
            data.len(),
            sample_count
        );

        Ok(data
            .chunks_exact(4)
            .map(|chunk| i32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passthrough_round_trip() {
        let codec = PassthroughCodec;
        let samples = vec![0, -1, i32::MAX, i32::MIN, 0x1234_5600];

        let encoded = codec.encode(&samples, SampleRate::Fs48000).unwrap();
        let decoded = codec
            .decode(&encoded, SampleRate::Fs48000, samples.len())
            .unwrap();
        assert_eq!(decoded, samples);
    }

    #[test]
    fn decode_rejects_short_payloads() {
        let codec = PassthroughCodec;
        assert!(codec.decode(&[0u8; 7], SampleRate::Fs48000, 2).is_err());
    }
}
