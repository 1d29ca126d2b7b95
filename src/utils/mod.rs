//! Small formatting helpers for log lines.

pub mod plural;
pub mod size;
