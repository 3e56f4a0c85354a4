//! Vendor error classification for tool-use/tool-result pairing violations.
//!
//! Backends that enforce strict call/result pairing reject a conversation with
//! an opaque error string when the invariant is broken. This module recognizes
//! the known phrasings of that rejection and extracts the structured pieces
//! (offending tool_use_id, message/content indices) when they are present.

pub mod parsed;
pub mod rules;

// Re-export main types for convenient access
pub use parsed::ParsedOrphanError;
pub use rules::{is_orphan_tool_result_error, parse_orphan_tool_result_error};
