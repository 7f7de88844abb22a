//! Parser and multi-profile validator for SMPTE ST 2098-2 Immersive Audio
//! Bitstreams.
//!
//! ## Technical Overview
//!
//! An IAB stream is a sequence of frames, each a nested, length-prefixed,
//! bit-packed element tree: bed channel sets, dynamic objects with panning
//! trajectories, compressed (DLC) or packed PCM audio essence, and frame
//! metadata payloads.
//!
//! ### Pipeline
//!
//! 1. Parse frames into element trees using [`process::parse::Parser`]
//! 2. Validate frames against constraint-set profiles using
//!    [`process::validate::Validator`]
//! 3. Query per-profile results and issue lists from the validator
//!
//! ### Constraint sets
//!
//! Six profiles in two dependency chains:
//!
//! ```text
//! Cinema ST2098-2:2018 -> Cinema ST429-18:2019 -> DbyCinema
//! IMF    ST2098-2:2019 -> IMF  ST2067-201:2019 -> DbyIMF
//! ```
//!
//! A dependent profile inherits every issue of its bases through result
//! rollup; its own rules only tighten the chain.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use iab::process::parse::Parser;
//! use iab::process::validate::Validator;
//! use iab::validate::ConstraintSet;
//!
//! let data = std::fs::read("program.iab")?;
//! let mut parser = Parser::new_streaming(std::io::Cursor::new(data))?;
//! let mut validator = Validator::new();
//!
//! let mut frame_index = 0;
//! loop {
//!     match parser.parse_frame() {
//!         Ok(()) => {}
//!         Err(iab::utils::errors::ParseError::EndOfStream) => break,
//!         Err(e) => return Err(e.into()),
//!     }
//!
//!     validator.validate_frame(parser.get_frame()?, frame_index)?;
//!     frame_index += 1;
//! }
//!
//! let result = validator.result(ConstraintSet::DbyCinema);
//! println!("DbyCinema: {result}");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

/// Processing functionality for bitstreams.
///
/// 1. **Parsing** ([`process::parse`]): Decodes frames from byte sources
///    using preamble detection.
///
/// 2. **Validation** ([`process::validate`]): Enforces per-profile
///    conformance rules over parsed frames.
pub mod process;

/// Data structures representing bitstream elements.
///
/// - **Frames** ([`structs::frame`]): Presentation units
/// - **Beds** ([`structs::bed`]): Channel sets and remap matrices
/// - **Objects** ([`structs::object`]): Dynamic sources and zone gains
/// - **Essence** ([`structs::essence`]): DLC and PCM audio payloads
/// - **Metadata** ([`structs::userdata`]): Authoring info and user data
/// - **Code tables** ([`structs::types`]): Shared enumerated types
pub mod structs;

/// Conformance validation infrastructure.
///
/// - **Issues** ([`validate::issue`]): Constraint sets, error codes, events
/// - **Handler** ([`validate::handler`]): Cumulative aggregation and rollup
/// - **Registry** ([`validate::registry`]): Per-profile constraint tables
pub mod validate;

/// DLC codec seam ([`dlc::DlcCodec`]): opaque encode/decode oracle.
pub mod dlc;

/// Utility functions and supporting infrastructure.
///
/// - **Bitstream I/O** ([`utils::bitstream_io`]): Bit-level reading/writing
/// - **Variable-length codecs** ([`utils::plex`]): Plex and PackedLength
/// - **CRC Validation** ([`utils::crc`]): Stream integrity checks
/// - **Error Handling** ([`utils::errors`]): Error types
pub mod utils;
