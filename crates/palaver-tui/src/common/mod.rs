//! Helpers shared by the TUI features.

pub mod text;

pub use text::{sanitize_paste, truncate_with_ellipsis};
