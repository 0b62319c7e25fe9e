//! Transcript feature: message list layout, markdown, scrolling.

pub mod markdown;
mod render;
mod scroll;
mod style;
pub mod wrap;

pub use render::{render_transcript, transcript_lines};
pub use scroll::{ScrollMode, ScrollState};
pub use style::{Style, StyledLine, StyledSpan, to_line, to_term_style};

/// Lines scrolled per mouse wheel notch.
pub const WHEEL_LINES: usize = 3;

#[derive(Debug, Default)]
pub struct TranscriptState {
    pub scroll: ScrollState,
}
