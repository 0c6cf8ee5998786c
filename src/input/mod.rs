//! Input module orchestrator following the RSB module specification.
//!
//! The player's input line: buffer editing, submission side effects, and
//! the focus state the caret follows.

mod core;

pub use core::{Focus, InputLine, PROMPT};
