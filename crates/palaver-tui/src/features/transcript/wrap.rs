//! Word wrapping for styled spans with hanging indents.
//!
//! Prose wraps at whitespace and runs of whitespace collapse to one space.
//! Code spans keep their whitespace and, when too long, break by character.
//! A `\n` inside any span forces a line break.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use super::style::{Style, StyledLine, StyledSpan};

#[derive(Debug, Clone, Default)]
pub struct WrapOptions {
    /// Total line width in columns, prefixes included.
    pub width: usize,
    /// Spans placed before the first line (a list bullet, a quote bar).
    pub first_prefix: Vec<StyledSpan>,
    /// Spans placed before every following line.
    pub rest_prefix: Vec<StyledSpan>,
}

impl WrapOptions {
    pub fn new(width: usize) -> Self {
        Self {
            width,
            ..Self::default()
        }
    }

    /// Same prefix on every line.
    pub fn with_prefix(width: usize, prefix: Vec<StyledSpan>) -> Self {
        Self {
            width,
            first_prefix: prefix.clone(),
            rest_prefix: prefix,
        }
    }
}

fn prefix_width(prefix: &[StyledSpan]) -> usize {
    prefix.iter().map(|s| s.text.width()).sum()
}

enum Token<'a> {
    Word(&'a str, Style),
    Space(Style),
    Code(&'a str, Style),
    Break,
}

fn tokenize(spans: &[StyledSpan]) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    for span in spans {
        for (i, part) in span.text.split('\n').enumerate() {
            if i > 0 {
                tokens.push(Token::Break);
            }
            if part.is_empty() {
                continue;
            }
            if span.style.is_code() {
                tokens.push(Token::Code(part, span.style));
                continue;
            }
            let mut rest = part;
            while !rest.is_empty() {
                let ws_len = rest.len() - rest.trim_start().len();
                if ws_len > 0 {
                    tokens.push(Token::Space(span.style));
                    rest = &rest[ws_len..];
                    continue;
                }
                let word_len = rest.find(char::is_whitespace).unwrap_or(rest.len());
                tokens.push(Token::Word(&rest[..word_len], span.style));
                rest = &rest[word_len..];
            }
        }
    }
    tokens
}

struct LineBuilder<'a> {
    opts: &'a WrapOptions,
    lines: Vec<StyledLine>,
    spans: Vec<StyledSpan>,
    used: usize,
    pending_space: Option<Style>,
}

impl<'a> LineBuilder<'a> {
    fn new(opts: &'a WrapOptions) -> Self {
        Self {
            opts,
            lines: Vec::new(),
            spans: Vec::new(),
            used: 0,
            pending_space: None,
        }
    }

    /// Content width of the line currently being built.
    fn avail(&self) -> usize {
        let prefix = if self.lines.is_empty() {
            &self.opts.first_prefix
        } else {
            &self.opts.rest_prefix
        };
        self.opts.width.saturating_sub(prefix_width(prefix)).max(1)
    }

    fn push(&mut self, text: &str, style: Style) {
        self.used += text.width();
        match self.spans.last_mut() {
            Some(last) if last.style == style => last.text.push_str(text),
            _ => self.spans.push(StyledSpan::new(text, style)),
        }
    }

    fn flush(&mut self) {
        let prefix = if self.lines.is_empty() {
            &self.opts.first_prefix
        } else {
            &self.opts.rest_prefix
        };
        let mut spans = prefix.clone();
        spans.append(&mut self.spans);
        self.lines.push(StyledLine { spans });
        self.used = 0;
        self.pending_space = None;
    }

    /// Width the pending space would add before the next token.
    fn space_width(&self) -> usize {
        usize::from(self.pending_space.is_some() && self.used > 0)
    }

    fn emit_pending_space(&mut self) {
        if let Some(style) = self.pending_space.take()
            && self.used > 0
        {
            self.push(" ", style);
        }
    }

    fn place(&mut self, text: &str, style: Style) {
        let width = text.width();
        if self.used > 0 && self.used + self.space_width() + width > self.avail() {
            self.flush();
        }
        self.emit_pending_space();

        if self.used + width <= self.avail() {
            self.push(text, style);
        } else {
            self.place_by_char(text, style);
        }
    }

    /// Fills the current line character by character, wrapping as needed.
    fn place_by_char(&mut self, text: &str, style: Style) {
        let mut chunk = String::new();
        let mut chunk_width = 0;
        for ch in text.chars() {
            let w = ch.width().unwrap_or(0);
            if self.used + chunk_width + w > self.avail() && self.used + chunk_width > 0 {
                if !chunk.is_empty() {
                    self.push(&chunk, style);
                    chunk.clear();
                    chunk_width = 0;
                }
                self.flush();
            }
            chunk.push(ch);
            chunk_width += w;
        }
        if !chunk.is_empty() {
            self.push(&chunk, style);
        }
    }

    fn finish(mut self) -> Vec<StyledLine> {
        if !self.spans.is_empty() || self.lines.is_empty() {
            self.flush();
        }
        self.lines
    }
}

/// Wraps `spans` to `opts.width` columns, keeping styles intact.
pub fn wrap_styled_spans(spans: &[StyledSpan], opts: &WrapOptions) -> Vec<StyledLine> {
    let mut builder = LineBuilder::new(opts);
    for token in tokenize(spans) {
        match token {
            Token::Word(text, style) | Token::Code(text, style) => builder.place(text, style),
            Token::Space(style) => builder.pending_space = Some(style),
            Token::Break => builder.flush(),
        }
    }
    builder.finish()
}
