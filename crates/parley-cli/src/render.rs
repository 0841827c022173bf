//! Renders assistant markup as ANSI-styled terminal text.

use colored::{ColoredString, Colorize};
use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};

/// Renders CommonMark (with GFM tables and strikethrough) for the terminal.
pub fn render_markdown(input: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let mut renderer = Renderer::default();
    for event in Parser::new_ext(input, options) {
        renderer.handle(event);
    }
    renderer.finish()
}

#[derive(Default)]
struct Renderer {
    out: String,
    strong: usize,
    emphasis: usize,
    strikethrough: usize,
    heading: Option<HeadingLevel>,
    code_block: bool,
    quote_depth: usize,
    /// One entry per open list; `Some(n)` is the next ordered number
    lists: Vec<Option<u64>>,
    links: Vec<String>,
    table_row: Option<Vec<String>>,
    table_cell: Option<String>,
    table_columns: usize,
}

impl Renderer {
    fn handle(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => {
                if self.code_block {
                    self.code_text(&text);
                } else {
                    let styled = self.style(&text);
                    self.write(&styled);
                }
            }
            Event::Code(code) => {
                let code: &str = &code;
                let styled = code.yellow().to_string();
                self.write(&styled);
            }
            Event::SoftBreak | Event::HardBreak => self.write("\n"),
            Event::Rule => {
                self.ensure_newline();
                let rule = "────────".bright_black().to_string();
                self.write(&rule);
                self.write("\n\n");
            }
            Event::TaskListMarker(done) => self.write(if done { "[x] " } else { "[ ] " }),
            Event::Html(html) | Event::InlineHtml(html) => self.write(&html),
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading { level, .. } => {
                self.ensure_newline();
                self.heading = Some(level);
            }
            Tag::BlockQuote { .. } => {
                self.ensure_newline();
                self.quote_depth += 1;
            }
            Tag::CodeBlock(kind) => {
                self.ensure_newline();
                self.code_block = true;
                if let CodeBlockKind::Fenced(lang) = kind {
                    if !lang.is_empty() {
                        let label = format!("    [{lang}]").bright_black().to_string();
                        self.write(&label);
                        self.write("\n");
                    }
                }
            }
            Tag::List(start) => {
                self.ensure_newline();
                self.lists.push(start);
            }
            Tag::Item => {
                self.ensure_newline();
                let depth = self.lists.len().saturating_sub(1);
                let marker = match self.lists.last_mut() {
                    Some(Some(number)) => {
                        let marker = format!("{number}. ");
                        *number += 1;
                        marker
                    }
                    _ => "• ".to_string(),
                };
                self.write(&"  ".repeat(depth));
                self.write(&marker);
            }
            Tag::Emphasis => self.emphasis += 1,
            Tag::Strong => self.strong += 1,
            Tag::Strikethrough => self.strikethrough += 1,
            Tag::Link { dest_url, .. } => self.links.push(dest_url.to_string()),
            Tag::Table(alignments) => {
                self.ensure_newline();
                self.table_columns = alignments.len();
            }
            Tag::TableHead | Tag::TableRow => self.table_row = Some(Vec::new()),
            Tag::TableCell => self.table_cell = Some(String::new()),
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                self.write("\n");
                if self.lists.is_empty() {
                    self.write("\n");
                }
            }
            TagEnd::Heading(_) => {
                self.heading = None;
                self.write("\n\n");
            }
            TagEnd::BlockQuote { .. } => {
                self.quote_depth = self.quote_depth.saturating_sub(1);
            }
            TagEnd::CodeBlock => {
                self.code_block = false;
                self.write("\n");
            }
            TagEnd::List(_) => {
                self.lists.pop();
                if self.lists.is_empty() {
                    self.ensure_newline();
                    self.write("\n");
                }
            }
            TagEnd::Item => self.ensure_newline(),
            TagEnd::Emphasis => self.emphasis = self.emphasis.saturating_sub(1),
            TagEnd::Strong => self.strong = self.strong.saturating_sub(1),
            TagEnd::Strikethrough => self.strikethrough = self.strikethrough.saturating_sub(1),
            TagEnd::Link => {
                if let Some(dest) = self.links.pop() {
                    let dest = format!(" ({dest})").bright_black().to_string();
                    self.write(&dest);
                }
            }
            TagEnd::TableCell => {
                if let (Some(cell), Some(row)) = (self.table_cell.take(), self.table_row.as_mut()) {
                    row.push(cell);
                }
            }
            TagEnd::TableHead => {
                self.flush_table_row();
                let separator = format!("|{}", "---|".repeat(self.table_columns));
                self.write(&separator);
                self.write("\n");
            }
            TagEnd::TableRow => self.flush_table_row(),
            TagEnd::Table => self.write("\n"),
            _ => {}
        }
    }

    fn style(&self, text: &str) -> String {
        let mut styled: ColoredString = text.normal();
        if let Some(level) = self.heading {
            styled = styled.bold();
            if level == HeadingLevel::H1 {
                styled = styled.underline().bright_cyan();
            } else {
                styled = styled.cyan();
            }
        }
        if self.strong > 0 {
            styled = styled.bold();
        }
        if self.emphasis > 0 {
            styled = styled.italic();
        }
        if self.strikethrough > 0 {
            styled = styled.strikethrough();
        }
        if !self.links.is_empty() {
            styled = styled.underline().blue();
        }
        styled.to_string()
    }

    fn code_text(&mut self, text: &str) {
        for line in text.lines() {
            let styled = format!("    {}", line.yellow());
            self.write(&styled);
            self.write("\n");
        }
    }

    fn flush_table_row(&mut self) {
        if let Some(row) = self.table_row.take() {
            let line = format!("| {} |", row.join(" | "));
            self.write(&line);
            self.write("\n");
        }
    }

    /// Appends text, routing it into the open table cell if there is one.
    fn write(&mut self, text: &str) {
        if let Some(cell) = self.table_cell.as_mut() {
            cell.push_str(text);
            return;
        }

        for (i, piece) in text.split('\n').enumerate() {
            if i > 0 {
                self.out.push('\n');
            }
            if piece.is_empty() {
                continue;
            }
            if self.at_line_start() && self.quote_depth > 0 {
                let bar = "│ ".repeat(self.quote_depth).bright_black().to_string();
                self.out.push_str(&bar);
            }
            self.out.push_str(piece);
        }
    }

    fn at_line_start(&self) -> bool {
        self.out.is_empty() || self.out.ends_with('\n')
    }

    fn ensure_newline(&mut self) {
        if !self.at_line_start() {
            self.out.push('\n');
        }
    }

    fn finish(self) -> String {
        self.out.trim_end().to_string()
    }
}
