//! TUI features: the input box and the transcript.

pub mod input;
pub mod transcript;
