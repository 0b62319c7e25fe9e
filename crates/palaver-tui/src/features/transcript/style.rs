//! Styled text model for the transcript.
//!
//! Lines are built from semantic styles and converted to ratatui types only
//! when drawn, so layout code stays testable without a terminal.

use ratatui::style::{Color, Modifier, Style as TermStyle};
use ratatui::text::{Line, Span};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledSpan {
    pub text: String,
    pub style: Style,
}

impl StyledSpan {
    pub fn new(text: impl Into<String>, style: Style) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StyledLine {
    pub spans: Vec<StyledSpan>,
}

impl StyledLine {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn single(text: impl Into<String>, style: Style) -> Self {
        Self {
            spans: vec![StyledSpan::new(text, style)],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.spans.iter().all(|s| s.text.is_empty())
    }

    /// Concatenated text of all spans.
    pub fn text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }
}

/// Semantic styles, mapped to terminal styles in [`to_term_style`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Plain,
    Greeting,
    /// The `│ ` gutter in front of user messages.
    UserPrefix,
    User,
    /// A user message the service never acknowledged.
    UserFailed,
    /// The `✗ not delivered` marker.
    FailedMarker,
    Bot,
    Loading,
    Error,

    // Markdown
    CodeInline,
    CodeBlock,
    CodeFence,
    Emphasis,
    Strong,
    Strikethrough,
    H1,
    H2,
    H3,
    Link,
    LinkUrl,
    QuoteMarker,
    Quote,
    ListMarker,
    Rule,
}

impl Style {
    /// Code keeps its whitespace and is broken by character when wrapped.
    pub fn is_code(self) -> bool {
        matches!(self, Style::CodeInline | Style::CodeBlock)
    }
}

pub fn to_term_style(style: Style) -> TermStyle {
    let base = TermStyle::default();
    match style {
        Style::Plain | Style::Bot => base,
        Style::Greeting => base.fg(Color::Cyan).add_modifier(Modifier::BOLD),
        Style::UserPrefix => base.fg(Color::Cyan),
        Style::User => base.add_modifier(Modifier::ITALIC),
        Style::UserFailed => base.fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        Style::FailedMarker | Style::Error => base.fg(Color::Red),
        Style::Loading => base.fg(Color::Yellow),
        Style::CodeInline => base.fg(Color::Yellow),
        Style::CodeBlock => base.fg(Color::LightYellow),
        Style::CodeFence | Style::Rule | Style::LinkUrl => base.fg(Color::DarkGray),
        Style::Emphasis => base.add_modifier(Modifier::ITALIC),
        Style::Strong => base.add_modifier(Modifier::BOLD),
        Style::Strikethrough => base.add_modifier(Modifier::CROSSED_OUT),
        Style::H1 => base
            .fg(Color::Magenta)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        Style::H2 => base.fg(Color::Magenta).add_modifier(Modifier::BOLD),
        Style::H3 => base.add_modifier(Modifier::BOLD),
        Style::Link => base.fg(Color::Blue).add_modifier(Modifier::UNDERLINED),
        Style::QuoteMarker => base.fg(Color::Green),
        Style::Quote => base.fg(Color::Green).add_modifier(Modifier::ITALIC),
        Style::ListMarker => base.fg(Color::Cyan),
    }
}

pub fn to_line(line: &StyledLine) -> Line<'static> {
    Line::from(
        line.spans
            .iter()
            .map(|s| Span::styled(s.text.clone(), to_term_style(s.style)))
            .collect::<Vec<_>>(),
    )
}
