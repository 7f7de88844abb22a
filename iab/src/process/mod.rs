//! Processing pipeline for immersive audio bitstreams.
//!
//! 1. **Parsing** ([`parse`]): seeks frame preambles and decodes frame
//!    elements into [`Frame`](crate::structs::frame::Frame) trees.
//!
//! 2. **Validation** ([`validate`]): walks parsed frames, enforcing
//!    structural, referential and cross-frame persistence rules per
//!    constraint set.
//!
//! The stages are decoupled by design: `Parser::release_frame` transfers
//! exclusive ownership of a parsed frame, so parsing and validation can run
//! on separate threads joined by a bounded queue. Neither stage spawns
//! threads itself.

pub mod parse;
pub mod validate;
