//! Pure view/render functions for the TUI.
//!
//! Functions here take `&AppState`, draw to a ratatui `Frame`, and never
//! mutate state or return effects.

use palaver_core::session::CleanupStatus;
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use unicode_width::UnicodeWidthStr;

use crate::common::truncate_with_ellipsis;
use crate::input::{self, INPUT_HEIGHT, InputView};
use crate::state::AppState;
use crate::transcript;

const HEADER_HEIGHT: u16 = 1;
const STATUS_HEIGHT: u16 = 1;

/// Transcript horizontal margin (padding on each side).
pub const TRANSCRIPT_MARGIN: u16 = 1;

/// Column reserved for the scrollbar.
const SCROLLBAR_WIDTH: u16 = 1;

const KEY_HINTS: &str = "Enter send · Ctrl+D clear · Esc quit";

/// Returns the transcript text width and viewport height for a terminal size.
pub fn transcript_viewport(width: u16, height: u16) -> (usize, usize) {
    let text_width = width.saturating_sub(TRANSCRIPT_MARGIN * 2 + SCROLLBAR_WIDTH);
    let viewport = height.saturating_sub(HEADER_HEIGHT + INPUT_HEIGHT + STATUS_HEIGHT);
    (text_width as usize, viewport as usize)
}

/// Renders the entire TUI to the frame.
pub fn render(app: &AppState, frame: &mut Frame) {
    let area = frame.area();
    let [header, body, input_area, status] = Layout::vertical([
        Constraint::Length(HEADER_HEIGHT),
        Constraint::Min(1),
        Constraint::Length(INPUT_HEIGHT),
        Constraint::Length(STATUS_HEIGHT),
    ])
    .areas(area);

    render_header(app, frame, header);

    let (text_width, _) = transcript_viewport(area.width, area.height);
    let lines = transcript::transcript_lines(
        &app.session,
        &app.greeting,
        app.spinner_frame,
        text_width,
    );
    let mut scroll = app.transcript.scroll.clone();
    scroll.measure(lines.len(), body.height as usize);
    transcript::render_transcript(frame, body, &lines, &scroll);

    let view = InputView {
        draft: &app.session.draft,
        input: &app.input,
        placeholder: &app.placeholder,
        loading: app.session.is_loading(),
    };
    input::render_input(&view, frame, input_area);

    render_status(app, frame, status);
}

/// Columns left for the title after the key hints and spacing.
fn title_budget(width: u16) -> usize {
    (width as usize).saturating_sub(KEY_HINTS.width() + 3)
}

fn render_header(app: &AppState, frame: &mut Frame, area: Rect) {
    let title_width = title_budget(area.width);
    let line = Line::from(vec![
        Span::styled(
            format!(" {}", truncate_with_ellipsis(&app.title, title_width)),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(KEY_HINTS, Style::default().fg(Color::DarkGray)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

/// Status line text: service URL, conversation id and last delete outcome.
pub fn status_text(app: &AppState) -> String {
    let mut parts = vec![app.api_url.clone()];
    match app.session.conversation_id() {
        Some(id) => parts.push(format!("conversation {id}")),
        None => parts.push("new conversation".to_string()),
    }
    match app.session.cleanup() {
        CleanupStatus::NotRequested => {}
        CleanupStatus::Pending => parts.push("deleting…".to_string()),
        CleanupStatus::Acknowledged => parts.push("deleted".to_string()),
        CleanupStatus::Failed => parts.push("delete failed".to_string()),
    }
    parts.join(" · ")
}

fn render_status(app: &AppState, frame: &mut Frame, area: Rect) {
    let text = truncate_with_ellipsis(&status_text(app), (area.width as usize).saturating_sub(1));
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            format!(" {text}"),
            Style::default().fg(Color::DarkGray),
        ))),
        area,
    );
}
