//! Data structures representing bitstream elements.
//!
//! Contains the typed element tree the parser produces and the packer
//! consumes: frames, bed definitions and remaps, object definitions with
//! their pan sub-blocks, zone-19 refinements, audio essence and frame
//! metadata payloads, plus the primitive code tables they share.

pub mod bed;
pub mod element;
pub mod essence;
pub mod frame;
pub mod object;
pub mod types;
pub mod userdata;
