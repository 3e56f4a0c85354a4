//! Toolmend - structural repair for tool-augmented LLM transcripts
//!
//! Backends that support tool use enforce a strict pairing invariant: every
//! tool call emitted by an assistant turn must be answered by exactly one
//! tool result, placed immediately after that turn. A transcript that breaks
//! the invariant is rejected wholesale with an opaque error string.
//!
//! This crate provides the two halves a retry driver needs to recover:
//!
//! - [`classifier`] recognizes and parses the vendor error strings that
//!   signal a pairing violation.
//! - [`repair`] deterministically rewrites a transcript so the invariant
//!   holds, reporting what it changed.
//!
//! The two never call each other; both are pure, synchronous transforms the
//! caller sequences as classify, repair, retry.

pub mod classifier;
pub mod logging;
pub mod message;
pub mod repair;

pub use classifier::{
    is_orphan_tool_result_error, parse_orphan_tool_result_error, ParsedOrphanError,
};
pub use message::{ContentBlock, Message};
pub use repair::{
    repair_tool_use_result_pairing, sanitize_tool_use_result_pairing, RepairOutcome, RepairReport,
};
