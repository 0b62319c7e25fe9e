//! Transcript view: turns session state into wrapped lines and draws them.

use palaver_core::session::{DeliveryStatus, Message, Sender, SessionState};
use ratatui::Frame;
use ratatui::layout::{Margin, Rect};
use ratatui::widgets::{Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState};

use super::ScrollState;
use super::markdown::render_markdown;
use super::style::{Style, StyledLine, StyledSpan, to_line};
use super::wrap::{WrapOptions, wrap_styled_spans};

const USER_PREFIX: &str = "│ ";
const FAILED_MARKER: &str = "  ✗ not delivered";
const LOADING_TEXT: &str = "Loading...";
const SPINNER_FRAMES: &[&str] = &["◐", "◓", "◑", "◒"];

/// Builds every transcript line for a viewport `width` columns wide.
pub fn transcript_lines(
    session: &SessionState,
    greeting: &str,
    spinner_frame: usize,
    width: usize,
) -> Vec<StyledLine> {
    let mut lines = Vec::new();

    if !greeting.is_empty() {
        lines.extend(wrap_styled_spans(
            &[StyledSpan::new(greeting, Style::Greeting)],
            &WrapOptions::new(width),
        ));
        lines.push(StyledLine::empty());
    }

    for message in session.messages() {
        lines.extend(message_lines(message, width));
        lines.push(StyledLine::empty());
    }

    if session.is_loading() {
        let frame = SPINNER_FRAMES[spinner_frame % SPINNER_FRAMES.len()];
        lines.push(StyledLine::single(
            format!("{frame} {LOADING_TEXT}"),
            Style::Loading,
        ));
    }

    if let Some(error) = session.error() {
        lines.extend(wrap_styled_spans(
            &[StyledSpan::new(error, Style::Error)],
            &WrapOptions::new(width),
        ));
    }

    while lines.last().is_some_and(StyledLine::is_empty) {
        lines.pop();
    }
    lines
}

fn message_lines(message: &Message, width: usize) -> Vec<StyledLine> {
    match message.sender() {
        Sender::Bot => render_markdown(message.text(), width),
        Sender::User => {
            let failed = message.status() == DeliveryStatus::Failed;
            let style = if failed { Style::UserFailed } else { Style::User };
            let opts =
                WrapOptions::with_prefix(width, vec![StyledSpan::new(USER_PREFIX, Style::UserPrefix)]);
            let mut lines = wrap_styled_spans(&[StyledSpan::new(message.text(), style)], &opts);
            if failed {
                lines.push(StyledLine::single(FAILED_MARKER, Style::FailedMarker));
            }
            lines
        }
    }
}

/// Draws the visible slice of `lines` plus a scrollbar when content overflows.
pub fn render_transcript(frame: &mut Frame, area: Rect, lines: &[StyledLine], scroll: &ScrollState) {
    let height = area.height as usize;
    let offset = scroll.offset();

    let visible: Vec<_> = lines.iter().skip(offset).take(height).map(to_line).collect();
    let text_area = area.inner(Margin {
        horizontal: 1,
        vertical: 0,
    });
    frame.render_widget(Paragraph::new(visible), text_area);

    if lines.len() > height {
        let mut state = ScrollbarState::new(lines.len().saturating_sub(height)).position(offset);
        frame.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .begin_symbol(None)
                .end_symbol(None),
            area,
            &mut state,
        );
    }
}
