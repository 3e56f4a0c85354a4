//! Transcript repair for broken tool-use/tool-result pairing.
//!
//! Backends require every tool call in an assistant turn to be answered by
//! exactly one tool result, placed directly after that turn. Interrupted runs,
//! crashed tools, and resumed sessions routinely break this: results go
//! missing, arrive late, get duplicated, or reference calls that no longer
//! exist. This module rewrites a transcript so the invariant holds again and
//! reports what it changed.

pub mod engine;
pub mod report;

// Re-export main types for convenient access
pub use engine::{
    repair_tool_use_result_pairing, sanitize_tool_use_result_pairing, RepairOutcome,
    MISSING_RESULT_PLACEHOLDER,
};
pub use report::RepairReport;
