//! JSON helpers for the token file and console output.
//!
//! Output is pretty-printed with 2-space indentation and a trailing newline
//! so files stay readable and diffs stay small.

mod json;

pub use json::*;
