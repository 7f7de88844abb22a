//! Utility functions and supporting infrastructure.
//!
//! - **Bitstream I/O** ([`bitstream_io`]): Bit-level reading/writing
//! - **Variable-length codecs** ([`plex`]): Plex(N) and PackedLength integers
//! - **CRC Validation** ([`crc`]): Range checksums for stream integrity
//! - **Error Handling** ([`errors`]): Error types

pub mod bitstream_io;
pub mod crc;
pub mod errors;
pub mod plex;
