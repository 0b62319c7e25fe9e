//! Markdown rendering for bot replies.
//!
//! Parses with pulldown-cmark and produces pre-wrapped `StyledLine`s. Raw
//! HTML is dropped so replies cannot inject terminal sequences.

use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{ContentArrangement, Table};
use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use unicode_width::UnicodeWidthStr;

use super::style::{Style, StyledLine, StyledSpan};
use super::wrap::{WrapOptions, wrap_styled_spans};

const QUOTE_BAR: &str = "▎ ";
const BULLET: &str = "• ";
const RULE_MAX_WIDTH: usize = 40;

/// Renders markdown `text` into lines at most `width` columns wide
/// (code blocks excepted, they are never wrapped).
pub fn render_markdown(text: &str, width: usize) -> Vec<StyledLine> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let mut writer = Writer::new(width);
    for event in Parser::new_ext(text, options) {
        writer.event(event);
    }
    writer.finish()
}

#[derive(Debug)]
struct ListLevel {
    /// Next number for ordered lists, `None` for bullets.
    next: Option<u64>,
    /// Marker text of the current item, waiting for its first line.
    marker: Option<String>,
    /// Width of the current item's marker, for continuation indent.
    marker_width: usize,
}

#[derive(Debug, Default)]
struct TableBuffer {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
    row: Vec<String>,
    cell: String,
    in_head: bool,
}

impl TableBuffer {
    fn end_cell(&mut self) {
        self.row.push(std::mem::take(&mut self.cell).trim().to_string());
    }

    fn end_row(&mut self) {
        let row = std::mem::take(&mut self.row);
        if self.in_head {
            self.header = row;
        } else {
            self.rows.push(row);
        }
    }

    fn render(&self, width: usize) -> Vec<String> {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL_CONDENSED)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_width(width.min(usize::from(u16::MAX)) as u16);
        if !self.header.is_empty() {
            table.set_header(&self.header);
        }
        for row in &self.rows {
            table.add_row(row);
        }
        table.lines().collect()
    }
}

struct Writer {
    width: usize,
    lines: Vec<StyledLine>,
    inline: Vec<StyledSpan>,
    styles: Vec<Style>,
    lists: Vec<ListLevel>,
    quote_depth: usize,
    /// Language and collected text of the open code block.
    code: Option<(Option<String>, String)>,
    table: Option<TableBuffer>,
    /// Destination and start index (into `inline`) of open links.
    links: Vec<(String, usize)>,
}

impl Writer {
    fn new(width: usize) -> Self {
        Self {
            width,
            lines: Vec::new(),
            inline: Vec::new(),
            styles: vec![Style::Bot],
            lists: Vec::new(),
            quote_depth: 0,
            code: None,
            table: None,
            links: Vec::new(),
        }
    }

    fn style(&self) -> Style {
        self.styles.last().copied().unwrap_or(Style::Bot)
    }

    fn pop_style(&mut self) {
        if self.styles.len() > 1 {
            self.styles.pop();
        }
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => self.inline_code(&code),
            Event::SoftBreak => self.text(" "),
            Event::HardBreak => {
                if let Some(table) = &mut self.table {
                    table.cell.push(' ');
                } else {
                    self.inline.push(StyledSpan::new("\n", self.style()));
                }
            }
            Event::Rule => {
                self.flush_block();
                let width = self.width.clamp(1, RULE_MAX_WIDTH);
                self.lines
                    .push(StyledLine::single("─".repeat(width), Style::Rule));
                self.blank();
            }
            Event::TaskListMarker(done) => {
                let marker = if done { "[x] " } else { "[ ] " };
                self.inline.push(StyledSpan::new(marker, Style::ListMarker));
            }
            // Raw HTML, footnotes and math are not shown.
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading { level, .. } => {
                self.flush_block();
                self.styles.push(match level {
                    HeadingLevel::H1 => Style::H1,
                    HeadingLevel::H2 => Style::H2,
                    _ => Style::H3,
                });
            }
            Tag::BlockQuote(_) => {
                self.flush_block();
                self.quote_depth += 1;
                self.styles.push(Style::Quote);
            }
            Tag::CodeBlock(kind) => {
                self.flush_block();
                let lang = match kind {
                    CodeBlockKind::Fenced(lang) if !lang.is_empty() => Some(lang.to_string()),
                    _ => None,
                };
                self.code = Some((lang, String::new()));
            }
            Tag::List(start) => {
                self.flush_block();
                self.lists.push(ListLevel {
                    next: start,
                    marker: None,
                    marker_width: 0,
                });
            }
            Tag::Item => {
                self.flush_block();
                if let Some(level) = self.lists.last_mut() {
                    let marker = match &mut level.next {
                        Some(n) => {
                            let marker = format!("{n}. ");
                            *n += 1;
                            marker
                        }
                        None => BULLET.to_string(),
                    };
                    level.marker_width = marker.width();
                    level.marker = Some(marker);
                }
            }
            Tag::Emphasis => self.styles.push(Style::Emphasis),
            Tag::Strong => self.styles.push(Style::Strong),
            Tag::Strikethrough => self.styles.push(Style::Strikethrough),
            Tag::Link { dest_url, .. } => {
                self.links.push((dest_url.to_string(), self.inline.len()));
                self.styles.push(Style::Link);
            }
            Tag::Table(_) => {
                self.flush_block();
                self.table = Some(TableBuffer::default());
            }
            Tag::TableHead => {
                if let Some(table) = &mut self.table {
                    table.in_head = true;
                }
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                self.flush_block();
                if self.lists.is_empty() {
                    self.blank();
                }
            }
            TagEnd::Heading(_) => {
                self.flush_block();
                self.pop_style();
                self.blank();
            }
            TagEnd::BlockQuote(_) => {
                self.flush_block();
                self.quote_depth = self.quote_depth.saturating_sub(1);
                self.pop_style();
                self.blank();
            }
            TagEnd::CodeBlock => {
                self.flush_code();
                self.blank();
            }
            TagEnd::List(_) => {
                self.flush_block();
                self.lists.pop();
                if self.lists.is_empty() {
                    self.blank();
                }
            }
            TagEnd::Item => self.flush_block(),
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough => self.pop_style(),
            TagEnd::Link => {
                self.pop_style();
                self.end_link();
            }
            TagEnd::TableCell => {
                if let Some(table) = &mut self.table {
                    table.end_cell();
                }
            }
            TagEnd::TableRow => {
                if let Some(table) = &mut self.table {
                    table.end_row();
                }
            }
            TagEnd::TableHead => {
                if let Some(table) = &mut self.table {
                    // Header cells arrive without a surrounding TableRow.
                    if !table.row.is_empty() {
                        table.end_row();
                    }
                    table.in_head = false;
                }
            }
            TagEnd::Table => {
                if let Some(table) = self.table.take() {
                    let quote = self.quote_prefix();
                    for line in table.render(self.width) {
                        let mut spans = quote.clone();
                        spans.push(StyledSpan::new(line, Style::Plain));
                        self.lines.push(StyledLine { spans });
                    }
                }
                self.blank();
            }
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        if let Some((_, code)) = &mut self.code {
            code.push_str(text);
        } else if let Some(table) = &mut self.table {
            table.cell.push_str(&text.replace('\n', " "));
        } else {
            self.inline.push(StyledSpan::new(text, self.style()));
        }
    }

    fn inline_code(&mut self, code: &str) {
        if let Some(table) = &mut self.table {
            table.cell.push('`');
            table.cell.push_str(code);
            table.cell.push('`');
        } else {
            self.inline.push(StyledSpan::new(code, Style::CodeInline));
        }
    }

    /// Appends the destination after link text when it adds information.
    fn end_link(&mut self) {
        let Some((dest, start)) = self.links.pop() else {
            return;
        };
        if dest.is_empty() || self.table.is_some() {
            return;
        }
        let label: String = self.inline[start.min(self.inline.len())..]
            .iter()
            .map(|s| s.text.as_str())
            .collect();
        if label.trim() != dest {
            self.inline
                .push(StyledSpan::new(format!(" ({dest})"), Style::LinkUrl));
        }
    }

    fn quote_prefix(&self) -> Vec<StyledSpan> {
        if self.quote_depth == 0 {
            return Vec::new();
        }
        vec![StyledSpan::new(
            QUOTE_BAR.repeat(self.quote_depth),
            Style::QuoteMarker,
        )]
    }

    /// Wraps the pending inline spans into lines, with quote and list prefixes.
    fn flush_block(&mut self) {
        if self.inline.is_empty() {
            return;
        }
        let spans = std::mem::take(&mut self.inline);

        let quote = self.quote_prefix();
        let mut first = quote.clone();
        let mut rest = quote;

        let outer_indent: usize = self
            .lists
            .iter()
            .rev()
            .skip(1)
            .map(|level| level.marker_width)
            .sum();
        if let Some(level) = self.lists.last_mut() {
            let indent = " ".repeat(outer_indent);
            let hang = " ".repeat(level.marker_width);
            match level.marker.take() {
                Some(marker) => {
                    first.push(StyledSpan::new(indent.clone(), Style::Plain));
                    first.push(StyledSpan::new(marker, Style::ListMarker));
                }
                None => first.push(StyledSpan::new(format!("{indent}{hang}"), Style::Plain)),
            }
            rest.push(StyledSpan::new(format!("{indent}{hang}"), Style::Plain));
        }

        let opts = WrapOptions {
            width: self.width,
            first_prefix: first,
            rest_prefix: rest,
        };
        self.lines.extend(wrap_styled_spans(&spans, &opts));
    }

    fn flush_code(&mut self) {
        let Some((lang, code)) = self.code.take() else {
            return;
        };
        let quote = self.quote_prefix();
        let with_quote = |mut spans: Vec<StyledSpan>| {
            let mut line = quote.clone();
            line.append(&mut spans);
            StyledLine { spans: line }
        };

        let fence = format!("```{}", lang.unwrap_or_default());
        self.lines
            .push(with_quote(vec![StyledSpan::new(fence, Style::CodeFence)]));
        for line in code.trim_end_matches('\n').split('\n') {
            self.lines.push(with_quote(vec![
                StyledSpan::new("  ", Style::Plain),
                StyledSpan::new(line, Style::CodeBlock),
            ]));
        }
        self.lines
            .push(with_quote(vec![StyledSpan::new("```", Style::CodeFence)]));
    }

    /// Adds a separating blank line unless one is already there.
    fn blank(&mut self) {
        if self.lines.last().is_some_and(|l| !l.is_empty()) {
            self.lines.push(StyledLine::empty());
        }
    }

    fn finish(mut self) -> Vec<StyledLine> {
        if self.code.is_some() {
            self.flush_code();
        }
        self.flush_block();
        while self.lines.last().is_some_and(StyledLine::is_empty) {
            self.lines.pop();
        }
        if self.lines.is_empty() {
            self.lines.push(StyledLine::empty());
        }
        self.lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(lines: &[StyledLine]) -> Vec<String> {
        lines.iter().map(StyledLine::text).collect()
    }

    fn has_style(lines: &[StyledLine], style: Style) -> bool {
        lines
            .iter()
            .any(|l| l.spans.iter().any(|s| s.style == style))
    }

    #[test]
    fn test_plain_text_uses_bot_style() {
        let lines = render_markdown("Just a plain reply", 80);
        assert_eq!(texts(&lines), vec!["Just a plain reply"]);
        assert!(has_style(&lines, Style::Bot));
    }

    #[test]
    fn test_paragraphs_are_separated_by_blank_line() {
        let lines = render_markdown("first\n\nsecond", 80);
        assert_eq!(texts(&lines), vec!["first", "", "second"]);
    }

    #[test]
    fn test_inline_styles() {
        let lines = render_markdown("**bold**, *italic*, ~~gone~~ and `code`", 80);
        assert!(has_style(&lines, Style::Strong));
        assert!(has_style(&lines, Style::Emphasis));
        assert!(has_style(&lines, Style::Strikethrough));
        assert!(has_style(&lines, Style::CodeInline));
        assert_eq!(texts(&lines), vec!["bold, italic, gone and code"]);
    }

    #[test]
    fn test_headings() {
        let lines = render_markdown("# One\n\n## Two\n\n### Three", 80);
        assert!(has_style(&lines, Style::H1));
        assert!(has_style(&lines, Style::H2));
        assert!(has_style(&lines, Style::H3));
    }

    #[test]
    fn test_code_block_is_fenced_and_not_wrapped() {
        let md = "```rust\nfn main() {\n    println!(\"a very long line that will not wrap\");\n}\n```";
        let lines = render_markdown(md, 20);
        let texts = texts(&lines);
        assert_eq!(texts.first().map(String::as_str), Some("```rust"));
        assert_eq!(texts.last().map(String::as_str), Some("```"));
        assert!(texts.iter().any(|t| t.starts_with("      println!")));
        assert!(texts.iter().any(|t| t.width() > 20));
    }

    #[test]
    fn test_bullet_list_with_hanging_indent() {
        let lines = render_markdown("- alpha beta gamma\n- delta", 12);
        assert_eq!(texts(&lines), vec!["• alpha beta", "  gamma", "• delta"]);
        assert!(has_style(&lines, Style::ListMarker));
    }

    #[test]
    fn test_ordered_list_numbers() {
        let lines = render_markdown("3. three\n4. four", 80);
        assert_eq!(texts(&lines), vec!["3. three", "4. four"]);
    }

    #[test]
    fn test_nested_list_indents() {
        let lines = render_markdown("- outer\n  - inner", 80);
        assert_eq!(texts(&lines), vec!["• outer", "  • inner"]);
    }

    #[test]
    fn test_blockquote_has_bar() {
        let lines = render_markdown("> quoted words", 80);
        assert_eq!(texts(&lines), vec!["▎ quoted words"]);
        assert!(has_style(&lines, Style::QuoteMarker));
    }

    #[test]
    fn test_link_shows_destination() {
        let lines = render_markdown("[docs](https://example.com/docs)", 80);
        assert_eq!(texts(&lines), vec!["docs (https://example.com/docs)"]);

        let lines = render_markdown("<https://example.com>", 80);
        assert_eq!(texts(&lines), vec!["https://example.com"]);
    }

    #[test]
    fn test_table_renders_cells() {
        let lines = render_markdown("| A | B |\n|---|---|\n| 1 | 2 |", 40);
        let joined = texts(&lines).join("\n");
        assert!(lines.len() >= 3);
        for needle in ["A", "B", "1", "2"] {
            assert!(joined.contains(needle), "missing {needle} in {joined}");
        }
    }

    #[test]
    fn test_html_is_dropped() {
        let lines = render_markdown("before <b>bold</b> after", 80);
        let text = texts(&lines).join("");
        assert!(!text.contains("<b>"));
        assert!(text.contains("before"));
    }

    #[test]
    fn test_empty_input_yields_one_line() {
        assert_eq!(render_markdown("", 80).len(), 1);
    }
}
