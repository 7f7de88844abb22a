//! Conformance validation infrastructure.
//!
//! - **Issue model** ([`issue`]): constraint sets, error codes, issues and
//!   the event handler seam
//! - **Handler** ([`handler`]): cumulative per-set aggregation with
//!   hierarchical rollup
//! - **Registry** ([`registry`]): static per-profile allowed values and
//!   limits
//!
//! The frame-walking validator itself lives in
//! [`crate::process::validate`].

pub mod handler;
pub mod issue;
pub mod registry;

pub use handler::CumulativeEventHandler;
pub use issue::{
    ConstraintSet, ErrorCode, EventHandler, Issue, IssueId, Severity, StopRequested,
    ValidationCtx, ValidationResult,
};
