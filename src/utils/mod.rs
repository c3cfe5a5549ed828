//! Small helpers shared across modules.

pub mod format;
pub mod fs;
