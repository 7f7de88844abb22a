//! Bitstream I/O utilities for bitstream parsing and packing.
//!
//! Wraps [`bitstream_io`] readers/writers with the operations the element
//! decoders need: bounded reads, peeking, byte-aligned sync scanning, state
//! snapshots and CRC checks over already-consumed ranges.

use std::io;
use std::io::SeekFrom;

use bitstream_io::{BigEndian, BitRead, BitReader, BitWrite, BitWriter, UnsignedInteger};

use crate::utils::crc::Crc16;
use crate::utils::errors::ElementError;

const STACK_BUF_SIZE: usize = 256;

#[derive(Debug)]
pub struct BitstreamIoReader<R: io::Read + io::Seek> {
    bs: BitReader<R, BigEndian>,
    len: u64,
}

pub type BsIoSliceReader<'a> = BitstreamIoReader<io::Cursor<&'a [u8]>>;

/// Saved reader state, restorable with [`BitstreamIoReader::restore`].
///
/// A snapshot captures the bit cursor only; CRC range accounting is
/// positional (see [`BitstreamIoReader::crc16_check`]) and therefore
/// unaffected by save/restore pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderState {
    position: u64,
}

impl<R> BitstreamIoReader<R>
where
    R: io::Read + io::Seek,
{
    pub fn new(read: R, len_bytes: u64) -> Self {
        Self {
            bs: BitReader::new(read),
            len: len_bytes << 3,
        }
    }

    #[inline(always)]
    pub fn get(&mut self) -> io::Result<bool> {
        self.bs.read_bit()
    }

    #[inline(always)]
    pub fn get_n<I: UnsignedInteger>(&mut self, n: u32) -> io::Result<I> {
        if n <= 32 {
            match self.bs.read_unsigned_var(n) {
                Ok(val) => Ok(val),
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!(
                        "get_n({}): out of bounds bits at {}",
                        n,
                        self.bs.position_in_bits().unwrap_or(0)
                    ),
                )),
                Err(e) => Err(e),
            }
        } else {
            self.available().and_then(|avail| {
                if n as u64 > avail {
                    Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        format!(
                            "get_n({}): out of bounds bits at {}",
                            n,
                            self.bs.position_in_bits().unwrap_or(0)
                        ),
                    ))
                } else {
                    self.bs.read_unsigned_var(n)
                }
            })
        }
    }

    /// Reads `n` bits without advancing the cursor.
    #[inline(always)]
    pub fn peek_n<I: UnsignedInteger>(&mut self, n: u32) -> io::Result<I> {
        let state = self.save()?;
        let result = self.get_n(n);
        self.restore(state)?;

        result
    }

    /// Aligns to the next byte boundary, then reads `buf.len()` whole bytes.
    #[inline(always)]
    pub fn get_aligned_bytes(&mut self, buf: &mut [u8]) -> io::Result<()> {
        self.align();

        self.available().and_then(|avail| {
            if (buf.len() as u64) << 3 > avail {
                Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "get_aligned_bytes: out of bounds bytes",
                ))
            } else {
                self.bs.read_bytes(buf)
            }
        })
    }

    /// Consumes the remaining high-order bits of the current byte.
    #[inline(always)]
    pub fn align(&mut self) {
        self.bs.byte_align();
    }

    #[inline(always)]
    pub fn skip_n(&mut self, n: u32) -> io::Result<()> {
        if n <= 64 {
            self.bs.skip(n)
        } else {
            self.available().and_then(|avail| {
                if n as u64 > avail {
                    Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "skip_n: out of bounds bits",
                    ))
                } else {
                    self.bs.skip(n)
                }
            })
        }
    }

    /// Scans forward byte-aligned for the first position where the next
    /// `pattern.len()` bytes match `pattern`, honoring `mask` when given.
    ///
    /// On success the cursor rests at the start of the match. On failure the
    /// cursor is left where the call found it.
    pub fn sync(&mut self, pattern: &[u8], mask: Option<&[u8]>) -> io::Result<()> {
        debug_assert!(!pattern.is_empty());

        let origin = self.save()?;
        self.align();

        let mut window = vec![0u8; pattern.len()];
        loop {
            let candidate = self.save()?;

            if self.available()? < (pattern.len() as u64) << 3 {
                self.restore(origin)?;
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "sync: pattern not found before end of stream",
                ));
            }

            self.bs.read_bytes(&mut window)?;

            let matched = window.iter().enumerate().all(|(i, &byte)| {
                let m = mask.map_or(0xFF, |m| m[i]);
                byte & m == pattern[i] & m
            });

            if matched {
                self.restore(candidate)?;
                return Ok(());
            }

            self.restore(candidate)?;
            self.skip_n(8)?;
        }
    }

    /// Snapshots the cursor for later [`restore`](Self::restore).
    #[inline(always)]
    pub fn save(&mut self) -> io::Result<ReaderState> {
        Ok(ReaderState {
            position: self.bs.position_in_bits()?,
        })
    }

    #[inline(always)]
    pub fn restore(&mut self, state: ReaderState) -> io::Result<()> {
        self.bs.seek_bits(SeekFrom::Start(state.position))?;
        Ok(())
    }

    /// Computes a CRC-16 over the bit range `[start, start + len)` without
    /// disturbing the cursor. The range must already lie within the stream.
    pub fn crc16_check(&mut self, crc: &Crc16, start: u64, len: u64) -> io::Result<u16> {
        let position = self.bs.position_in_bits()?;

        if start + len > self.len {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "crc16_check: out of bounds bits",
            ));
        }

        self.bs.seek_bits(SeekFrom::Start(start))?;

        let mut checksum = crc.init;

        let prefix_len = (8 - (start & 7)) & 7;
        let prefix_len = prefix_len.min(len);
        let suffix_len = (len - prefix_len) & 7;
        let middle_len = (len - prefix_len - suffix_len) as usize;

        if prefix_len != 0 {
            let prefix: u16 = self.bs.read_var(prefix_len as u32)?;
            checksum = crate::utils::crc::crc16(crc.poly, checksum ^ (prefix << (16 - prefix_len)), prefix_len as usize);
        }

        let bytes_len = middle_len >> 3;
        if bytes_len <= STACK_BUF_SIZE {
            let mut stack_buf = [0u8; STACK_BUF_SIZE];
            let buf = &mut stack_buf[..bytes_len];
            self.bs.read_bytes(buf)?;
            checksum = crc.update(checksum, buf);
        } else {
            let mut heap_buf = vec![0; bytes_len];
            self.bs.read_bytes(&mut heap_buf)?;
            checksum = crc.update(checksum, &heap_buf);
        };

        if suffix_len != 0 {
            let suffix: u16 = self.bs.read_var(suffix_len as u32)?;
            checksum =
                crate::utils::crc::crc16(crc.poly, checksum ^ (suffix << (16 - suffix_len)), suffix_len as usize);
        }

        self.bs.seek_bits(SeekFrom::Start(position))?;

        Ok(checksum)
    }

    #[inline(always)]
    pub fn available(&mut self) -> io::Result<u64> {
        self.bs.position_in_bits().map(|pos| self.len - pos)
    }

    #[inline(always)]
    pub fn position(&mut self) -> io::Result<u64> {
        self.bs.position_in_bits()
    }

    #[inline(always)]
    pub fn is_byte_aligned(&mut self) -> io::Result<bool> {
        Ok(self.bs.position_in_bits()? & 7 == 0)
    }
}

impl<'a> BsIoSliceReader<'a> {
    pub fn from_slice(buf: &'a [u8]) -> Self {
        let len = buf.len() as u64;
        let read = io::Cursor::new(buf);

        Self::new(read, len)
    }
}

impl Default for BsIoSliceReader<'_> {
    fn default() -> Self {
        Self::from_slice(&[])
    }
}

/// Bit-packing writer over a growable byte buffer.
///
/// Symmetric to [`BitstreamIoReader`]: MSB-first within each byte,
/// zero-padded on [`align`](Self::align).
pub struct BitstreamIoWriter {
    bw: BitWriter<Vec<u8>, BigEndian>,
    bits_written: u64,
    capacity_bytes: Option<u64>,
}

impl BitstreamIoWriter {
    pub fn new() -> Self {
        Self {
            bw: BitWriter::new(Vec::new()),
            bits_written: 0,
            capacity_bytes: None,
        }
    }

    /// Creates a writer with a declared capacity in bytes.
    pub fn with_capacity(capacity_bytes: u64) -> Self {
        Self {
            bw: BitWriter::new(Vec::with_capacity(capacity_bytes as usize)),
            bits_written: 0,
            capacity_bytes: Some(capacity_bytes),
        }
    }

    #[inline(always)]
    pub fn put(&mut self, bit: bool) -> io::Result<()> {
        self.bw.write_bit(bit)?;
        self.bits_written += 1;
        Ok(())
    }

    #[inline(always)]
    pub fn put_n<I: UnsignedInteger>(&mut self, n: u32, value: I) -> io::Result<()> {
        self.bw.write_unsigned_var(n, value)?;
        self.bits_written += n as u64;
        Ok(())
    }

    #[inline(always)]
    pub fn put_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.bw.write_bytes(bytes)?;
        self.bits_written += (bytes.len() as u64) << 3;
        Ok(())
    }

    /// Pads with zero bits to the next byte boundary.
    #[inline(always)]
    pub fn align(&mut self) -> io::Result<()> {
        self.bits_written = (self.bits_written + 7) & !7;
        self.bw.byte_align()
    }

    #[inline(always)]
    pub fn position(&self) -> u64 {
        self.bits_written
    }

    /// Lowers the declared capacity. Refuses to discard already-written bits.
    pub fn shrink_buffer(&mut self, capacity_bytes: u64) -> Result<(), ElementError> {
        if capacity_bytes << 3 < self.bits_written {
            return Err(ElementError::CapacityBelowWritten {
                capacity: capacity_bytes,
                written: self.bits_written,
            });
        }

        self.capacity_bytes = Some(capacity_bytes);
        Ok(())
    }

    pub fn capacity(&self) -> Option<u64> {
        self.capacity_bytes
    }

    /// Aligns and returns the packed bytes.
    pub fn into_bytes(mut self) -> io::Result<Vec<u8>> {
        self.bw.byte_align()?;
        Ok(self.bw.into_writer())
    }
}

impl Default for BitstreamIoWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::crc::{CRC_STREAM_ALG, Crc16};

    #[test]
    fn read_past_end_is_distinct() {
        let mut reader = BsIoSliceReader::from_slice(&[0xAB]);
        let byte: u8 = reader.get_n(8).unwrap();
        assert_eq!(byte, 0xAB);

        let err = reader.get_n::<u8>(1).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn peek_does_not_advance() {
        let mut reader = BsIoSliceReader::from_slice(&[0b1010_0110, 0x55]);
        let peeked: u8 = reader.peek_n(4).unwrap();
        assert_eq!(peeked, 0b1010);
        let read: u8 = reader.get_n(4).unwrap();
        assert_eq!(read, 0b1010);
        assert_eq!(reader.position().unwrap(), 4);
    }

    #[test]
    fn save_restore_round_trip() {
        let mut reader = BsIoSliceReader::from_slice(&[0xF0, 0x0F]);
        reader.skip_n(3).unwrap();
        let state = reader.save().unwrap();
        let _: u8 = reader.get_n(7).unwrap();
        reader.restore(state).unwrap();
        assert_eq!(reader.position().unwrap(), 3);
    }

    #[test]
    fn sync_finds_pattern_and_rests_on_it() {
        let data = [0x00, 0x12, 0x01, 0xAB, 0xCD];
        let mut reader = BsIoSliceReader::from_slice(&data);
        reader.sync(&[0x01], None).unwrap();
        assert_eq!(reader.position().unwrap(), 16);
        let tag: u8 = reader.get_n(8).unwrap();
        assert_eq!(tag, 0x01);
    }

    #[test]
    fn sync_with_mask() {
        let data = [0x00, 0x7F, 0xF3];
        let mut reader = BsIoSliceReader::from_slice(&data);
        reader.sync(&[0xF0], Some(&[0xF0])).unwrap();
        assert_eq!(reader.position().unwrap(), 16);
    }

    #[test]
    fn sync_failure_leaves_cursor_unchanged() {
        let data = [0x00, 0x11, 0x22];
        let mut reader = BsIoSliceReader::from_slice(&data);
        reader.skip_n(8).unwrap();
        assert!(reader.sync(&[0xEE], None).is_err());
        assert_eq!(reader.position().unwrap(), 8);
    }

    #[test]
    fn crc_over_consumed_range_matches_direct() {
        let data = [0x31, 0x32, 0x33, 0x34, 0x35, 0x36, 0x37, 0x38, 0x39];
        let crc = Crc16::new(&CRC_STREAM_ALG);

        let mut reader = BsIoSliceReader::from_slice(&data);
        reader.skip_n(72).unwrap();
        let checksum = reader.crc16_check(&crc, 0, 72).unwrap();
        assert_eq!(checksum, 0x29B1);
        assert_eq!(reader.position().unwrap(), 72);
    }

    #[test]
    fn writer_reader_symmetry() {
        let mut writer = BitstreamIoWriter::new();
        writer.put(true).unwrap();
        writer.put_n(7, 0x2Au32).unwrap();
        writer.put_n(16, 0xBEEFu32).unwrap();
        writer.align().unwrap();
        writer.put_bytes(&[0x01, 0x02]).unwrap();

        let bytes = writer.into_bytes().unwrap();
        let mut reader = BsIoSliceReader::from_slice(&bytes);
        assert!(reader.get().unwrap());
        assert_eq!(reader.get_n::<u8>(7).unwrap(), 0x2A);
        assert_eq!(reader.get_n::<u16>(16).unwrap(), 0xBEEF);
        reader.align();
        let mut tail = [0u8; 2];
        reader.get_aligned_bytes(&mut tail).unwrap();
        assert_eq!(tail, [0x01, 0x02]);
    }

    #[test]
    fn shrink_refuses_to_discard_written_bits() {
        let mut writer = BitstreamIoWriter::with_capacity(16);
        writer.put_bytes(&[0u8; 8]).unwrap();
        assert!(writer.shrink_buffer(4).is_err());
        writer.shrink_buffer(8).unwrap();
        assert_eq!(writer.capacity(), Some(8));
    }
}
