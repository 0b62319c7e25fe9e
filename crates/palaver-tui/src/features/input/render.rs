//! Input feature view.

use ratatui::Frame;
use ratatui::layout::{Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use unicode_width::UnicodeWidthChar;

use super::state::InputState;

/// Height of the input box, borders included.
pub const INPUT_HEIGHT: u16 = 3;

/// What the input box needs to draw itself.
pub struct InputView<'a> {
    pub draft: &'a str,
    pub input: &'a InputState,
    pub placeholder: &'a str,
    pub loading: bool,
}

/// Returns the slice of `text` that keeps the cursor visible in `width` columns,
/// and the cursor column within that slice.
fn visible_window(text: &str, cursor: usize, width: usize) -> (String, usize) {
    let chars: Vec<char> = text.chars().collect();
    let cursor = cursor.min(chars.len());
    if width == 0 {
        return (String::new(), 0);
    }

    // Walk back from the cursor until the line before it fills all but one column.
    let mut start = cursor;
    let mut used = 0;
    while start > 0 {
        let w = chars[start - 1].width().unwrap_or(0);
        if used + w >= width {
            break;
        }
        used += w;
        start -= 1;
    }

    let mut visible = String::new();
    let mut total = 0;
    for &ch in &chars[start..] {
        let w = ch.width().unwrap_or(0);
        if total + w > width {
            break;
        }
        total += w;
        visible.push(ch);
    }
    (visible, used)
}

pub fn render_input(view: &InputView<'_>, frame: &mut Frame, area: Rect) {
    let border_style = if view.loading {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(Color::Cyan)
    };
    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);
    if view.loading {
        block = block.title_bottom(Line::from(Span::styled(
            " waiting for reply ",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )));
    }

    let inner = block.inner(area);
    let width = inner.width as usize;

    let (line, cursor_col) = if view.draft.is_empty() {
        let placeholder = Line::from(Span::styled(
            view.placeholder.to_string(),
            Style::default().fg(Color::DarkGray),
        ));
        (placeholder, 0)
    } else {
        let (visible, col) = visible_window(view.draft, view.input.cursor, width);
        (Line::from(visible), col)
    };

    frame.render_widget(Paragraph::new(line).block(block), area);

    if !view.loading && inner.width > 0 && inner.height > 0 {
        let x = inner.x + u16::try_from(cursor_col).unwrap_or(inner.width - 1);
        frame.set_cursor_position(Position::new(x.min(inner.right() - 1), inner.y));
    }
}

#[cfg(test)]
mod tests {
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    use super::*;

    #[test]
    fn test_visible_window_short_text() {
        assert_eq!(visible_window("hello", 5, 20), ("hello".to_string(), 5));
    }

    #[test]
    fn test_visible_window_scrolls_to_cursor() {
        let (visible, col) = visible_window("abcdefghij", 10, 5);
        assert_eq!(visible, "ghij");
        assert_eq!(col, 4);

        let (visible, col) = visible_window("abcdefghij", 0, 5);
        assert_eq!(visible, "abcde");
        assert_eq!(col, 0);
    }

    fn draw(view: &InputView<'_>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(30, INPUT_HEIGHT)).unwrap();
        terminal
            .draw(|frame| render_input(view, frame, frame.area()))
            .unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer
            .content()
            .iter()
            .map(ratatui::buffer::Cell::symbol)
            .collect()
    }

    #[test]
    fn test_placeholder_when_empty() {
        let input = InputState::default();
        let view = InputView {
            draft: "",
            input: &input,
            placeholder: "Ask away",
            loading: false,
        };
        assert!(draw(&view).contains("Ask away"));
    }

    #[test]
    fn test_waiting_hint_while_loading() {
        let input = InputState::default();
        let view = InputView {
            draft: "",
            input: &input,
            placeholder: "Ask away",
            loading: true,
        };
        assert!(draw(&view).contains("waiting for reply"));
    }
}
