//! Variable-length unsigned integer codecs used throughout the bitstream.
//!
//! Two encodings share the escape-to-wider-field idea:
//!
//! * **Plex(N)** — read an N-bit window; an all-ones window escapes to a
//!   window of twice the width, capped at 32 bits. The first window that is
//!   not all ones (or the final 32-bit window) is the value.
//! * **PackedLength** — one byte for values below 128, otherwise a marker
//!   byte giving the byte count of a big-endian field.

use std::io;

use crate::utils::bitstream_io::{BitstreamIoReader, BitstreamIoWriter};
use crate::utils::errors::CodecError;

pub const PLEX_MAX_BITS: u32 = 32;

const fn all_ones(bits: u32) -> u64 {
    (1u64 << bits) - 1
}

/// Smallest Plex window width that can carry `value`, starting from `base_bits`.
pub const fn plex_width(base_bits: u32, value: u32) -> u32 {
    let mut width = base_bits;
    while width < PLEX_MAX_BITS && value as u64 >= all_ones(width) {
        width *= 2;
        if width > PLEX_MAX_BITS {
            width = PLEX_MAX_BITS;
        }
    }

    width
}

/// Total encoded size of a Plex(N) value in bits, escapes included.
pub const fn plex_bit_len(base_bits: u32, value: u32) -> u32 {
    let target = plex_width(base_bits, value);

    let mut bits = 0;
    let mut width = base_bits;
    while width < target {
        bits += width;
        width *= 2;
        if width > PLEX_MAX_BITS {
            width = PLEX_MAX_BITS;
        }
    }

    bits + target
}

/// Encoded size of a PackedLength value in bits.
pub const fn packed_length_bit_len(value: u32) -> u32 {
    if value < 128 { 8 } else { 40 }
}

impl<R> BitstreamIoReader<R>
where
    R: io::Read + io::Seek,
{
    /// Reads a Plex(N)-coded unsigned integer with base width `base_bits`.
    pub fn get_plex(&mut self, base_bits: u32) -> io::Result<u32> {
        let mut width = base_bits;

        loop {
            let value: u64 = self.get_n(width)?;

            if width == PLEX_MAX_BITS || value != all_ones(width) {
                return Ok(value as u32);
            }

            width *= 2;
            if width > PLEX_MAX_BITS {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    CodecError::PlexWidthExceeded(width).to_string(),
                ));
            }
        }
    }

    /// Reads a PackedLength-coded unsigned integer.
    pub fn get_packed_length(&mut self) -> io::Result<u32> {
        let code: u8 = self.get_n(8)?;

        if code < 128 {
            return Ok(code as u32);
        }

        let num_bytes = (code & 0x7F) + 1;
        if num_bytes > 4 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                CodecError::PackedLengthTooWide(num_bytes).to_string(),
            ));
        }

        self.get_n((num_bytes as u32) << 3)
    }
}

impl BitstreamIoWriter {
    /// Writes `value` Plex(N)-coded in the smallest valid window width.
    pub fn put_plex(&mut self, base_bits: u32, value: u32) -> io::Result<()> {
        let target = plex_width(base_bits, value);

        let mut width = base_bits;
        while width < target {
            self.put_n(width, all_ones(width))?;
            width *= 2;
            if width > PLEX_MAX_BITS {
                width = PLEX_MAX_BITS;
            }
        }

        self.put_n(target, value)
    }

    /// Writes `value` PackedLength-coded: one byte below 128, otherwise the
    /// 32-bit marker form.
    pub fn put_packed_length(&mut self, value: u32) -> io::Result<()> {
        if value < 128 {
            self.put_n(8, value)
        } else {
            self.put_n(8, 0x83u32)?;
            self.put_n(32, value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::bitstream_io::BsIoSliceReader;

    fn plex_round_trip(base_bits: u32, value: u32) -> (u32, u64) {
        let mut writer = BitstreamIoWriter::new();
        writer.put_plex(base_bits, value).unwrap();
        let encoded_bits = writer.position();
        writer.align().unwrap();
        let bytes = writer.into_bytes().unwrap();

        let mut reader = BsIoSliceReader::from_slice(&bytes);
        (reader.get_plex(base_bits).unwrap(), encoded_bits)
    }

    #[test]
    fn plex8_round_trip_and_minimal_width() {
        for value in [0u32, 1, 7, 127, 254, 255, 256, 65534, 65535, 65536, u32::MAX - 1, u32::MAX] {
            let (decoded, bits) = plex_round_trip(8, value);
            assert_eq!(decoded, value, "plex8 value {value}");
            assert_eq!(bits, plex_bit_len(8, value) as u64, "plex8 bit length {value}");
        }

        // Width boundaries must not escape early.
        assert_eq!(plex_bit_len(8, 254), 8);
        assert_eq!(plex_bit_len(8, 255), 8 + 16);
        assert_eq!(plex_bit_len(8, 65534), 8 + 16);
        assert_eq!(plex_bit_len(8, 65535), 8 + 16 + 32);
    }

    #[test]
    fn plex4_round_trip_and_minimal_width() {
        for value in [0u32, 7, 14, 15, 16, 254, 255, 256, 65535, 70000, u32::MAX] {
            let (decoded, bits) = plex_round_trip(4, value);
            assert_eq!(decoded, value, "plex4 value {value}");
            assert_eq!(bits, plex_bit_len(4, value) as u64, "plex4 bit length {value}");
        }

        assert_eq!(plex_bit_len(4, 14), 4);
        assert_eq!(plex_bit_len(4, 15), 4 + 8);
        assert_eq!(plex_bit_len(4, 255), 4 + 8 + 16);
    }

    #[test]
    fn plex_dense_range_round_trips() {
        for value in 0..5000u32 {
            let (decoded, _) = plex_round_trip(4, value);
            assert_eq!(decoded, value);
            let (decoded, _) = plex_round_trip(8, value);
            assert_eq!(decoded, value);
        }
    }

    #[test]
    fn packed_length_round_trip() {
        for value in [0u32, 1, 127, 128, 129, 1000, 65536, u32::MAX] {
            let mut writer = BitstreamIoWriter::new();
            writer.put_packed_length(value).unwrap();
            assert_eq!(writer.position(), packed_length_bit_len(value) as u64);
            let bytes = writer.into_bytes().unwrap();

            let mut reader = BsIoSliceReader::from_slice(&bytes);
            assert_eq!(reader.get_packed_length().unwrap(), value);
        }
    }

    #[test]
    fn packed_length_one_byte_form() {
        let mut writer = BitstreamIoWriter::new();
        writer.put_packed_length(127).unwrap();
        assert_eq!(writer.into_bytes().unwrap(), vec![127]);

        let mut writer = BitstreamIoWriter::new();
        writer.put_packed_length(128).unwrap();
        assert_eq!(writer.into_bytes().unwrap(), vec![0x83, 0, 0, 0, 128]);
    }

    #[test]
    fn packed_length_rejects_wide_fields() {
        // 0x87 claims an 8-byte field; only up to 4 are meaningful.
        let bytes = [0x87, 0, 0, 0, 0, 0, 0, 0, 1];
        let mut reader = BsIoSliceReader::from_slice(&bytes);
        assert!(reader.get_packed_length().is_err());
    }
}
