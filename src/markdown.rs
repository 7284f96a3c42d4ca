use pulldown_cmark::{CodeBlockKind, CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

/// Renders a markdown body into terminal lines. Empty input yields no lines.
pub fn render_markdown(input: &str) -> Vec<Line<'static>> {
    let mut opts = Options::empty();
    opts.insert(Options::ENABLE_STRIKETHROUGH);
    opts.insert(Options::ENABLE_TABLES);
    opts.insert(Options::ENABLE_TASKLISTS);

    let mut writer = BlockWriter::default();
    for event in Parser::new_ext(input, opts) {
        writer.event(event);
    }
    writer.finish()
}

#[derive(Default)]
struct BlockWriter {
    blocks: Vec<Block>,
    buffer: String,
    lists: Vec<Option<u64>>,
    item_marker: Option<(usize, String)>,
    quote_depth: usize,
    heading: Option<u8>,
    code: Option<String>,
    links: Vec<String>,
}

enum Block {
    Text(String),
    Heading(u8, String),
    Item {
        indent: usize,
        marker: String,
        text: String,
    },
    Quote(usize, String),
    Fence(String),
    Code(String),
    Rule,
    Blank,
}

impl BlockWriter {
    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => self.text(text),
            Event::Code(code) => self.buffer.push_str(&format!("`{code}`")),
            Event::Html(_) | Event::InlineHtml(_) => {}
            Event::FootnoteReference(name) => self.buffer.push_str(&format!("[{name}]")),
            Event::HardBreak => self.flush(),
            Event::SoftBreak => self.buffer.push(' '),
            Event::Rule => {
                self.flush();
                self.blocks.push(Block::Rule);
                self.blocks.push(Block::Blank);
            }
            Event::TaskListMarker(done) => {
                self.buffer.push_str(if done { "[x] " } else { "[ ] " });
            }
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph | Tag::TableRow | Tag::TableHead => self.flush(),
            Tag::Heading { level, .. } => {
                self.flush();
                self.heading = Some(heading_rank(level));
            }
            Tag::BlockQuote => {
                self.flush();
                self.quote_depth += 1;
            }
            Tag::CodeBlock(kind) => {
                self.flush();
                let fence = match kind {
                    CodeBlockKind::Fenced(lang) if !lang.is_empty() => format!("```{lang}"),
                    _ => "```".to_string(),
                };
                self.blocks.push(Block::Fence(fence));
                self.code = Some(String::new());
            }
            Tag::List(start) => {
                self.flush();
                self.lists.push(start);
            }
            Tag::Item => {
                self.flush();
                let indent = self.lists.len().saturating_sub(1);
                let marker = match self.lists.last_mut() {
                    Some(Some(index)) => {
                        let marker = format!("{index}.");
                        *index += 1;
                        marker
                    }
                    _ => "•".to_string(),
                };
                self.item_marker = Some((indent, marker));
            }
            Tag::Link { dest_url, .. } => self.links.push(dest_url.into_string()),
            Tag::Image { dest_url, .. } => {
                self.buffer.push_str(&format!("[image: {dest_url}]"));
            }
            Tag::TableCell => {
                if !self.buffer.is_empty() {
                    self.buffer.push_str(" | ");
                }
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                self.flush();
                self.blocks.push(Block::Blank);
            }
            TagEnd::Heading(_) => {
                self.flush();
                self.heading = None;
                self.blocks.push(Block::Blank);
            }
            TagEnd::BlockQuote => {
                self.flush();
                self.quote_depth = self.quote_depth.saturating_sub(1);
                self.blocks.push(Block::Blank);
            }
            TagEnd::CodeBlock => {
                if let Some(code) = self.code.take() {
                    for line in code.trim_end_matches('\n').split('\n') {
                        self.blocks.push(Block::Code(line.to_string()));
                    }
                }
                self.blocks.push(Block::Fence("```".to_string()));
                self.blocks.push(Block::Blank);
            }
            TagEnd::List(_) => {
                self.flush();
                self.lists.pop();
                if self.lists.is_empty() {
                    self.blocks.push(Block::Blank);
                }
            }
            TagEnd::Item => {
                self.flush();
                self.item_marker = None;
            }
            TagEnd::Link => {
                if let Some(url) = self.links.pop() {
                    if !url.is_empty() && !self.buffer.trim_end().ends_with(url.as_str()) {
                        self.buffer.push_str(&format!(" ({url})"));
                    }
                }
            }
            TagEnd::TableRow | TagEnd::TableHead => self.flush(),
            TagEnd::Table => self.blocks.push(Block::Blank),
            _ => {}
        }
    }

    fn text(&mut self, text: CowStr<'_>) {
        match self.code.as_mut() {
            Some(code) => code.push_str(&text),
            None => self.buffer.push_str(&text),
        }
    }

    fn flush(&mut self) {
        let text = self.buffer.trim().to_string();
        self.buffer.clear();
        if text.is_empty() {
            return;
        }

        let block = if let Some(level) = self.heading {
            Block::Heading(level, text)
        } else if let Some((indent, marker)) = self.item_marker.as_mut() {
            // Continuation paragraphs of an item keep the indent, not the marker.
            let marker = std::mem::replace(marker, " ".repeat(marker.chars().count()));
            Block::Item {
                indent: *indent,
                marker,
                text,
            }
        } else if self.quote_depth > 0 {
            Block::Quote(self.quote_depth, text)
        } else {
            Block::Text(text)
        };
        self.blocks.push(block);
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        self.flush();
        while matches!(self.blocks.last(), Some(Block::Blank)) {
            self.blocks.pop();
        }

        self.blocks
            .into_iter()
            .map(|block| match block {
                Block::Text(text) => Line::from(text),
                Block::Heading(level, text) => Line::from(Span::styled(text, heading_style(level))),
                Block::Item {
                    indent,
                    marker,
                    text,
                } => Line::from(vec![
                    Span::raw("  ".repeat(indent)),
                    Span::styled(format!("{marker} "), Style::default().fg(Color::Yellow)),
                    Span::raw(text),
                ]),
                Block::Quote(depth, text) => Line::from(Span::styled(
                    format!("{} {text}", ">".repeat(depth)),
                    Style::default().fg(Color::Green),
                )),
                Block::Fence(fence) => {
                    Line::from(Span::styled(fence, Style::default().fg(Color::DarkGray)))
                }
                Block::Code(code) => Line::from(Span::styled(code, Style::default().fg(Color::Cyan))),
                Block::Rule => Line::from("―".repeat(20)),
                Block::Blank => Line::default(),
            })
            .collect()
    }
}

fn heading_style(level: u8) -> Style {
    match level {
        1 => Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        2 => Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
        3 => Style::default()
            .fg(Color::Magenta)
            .add_modifier(Modifier::BOLD),
        _ => Style::default().fg(Color::Magenta),
    }
}

fn heading_rank(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(lines: &[Line<'_>]) -> Vec<String> {
        lines
            .iter()
            .map(|line| line.spans.iter().map(|span| span.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn empty_body_has_no_lines() {
        assert!(render_markdown("").is_empty());
        assert!(render_markdown("   \n\n").is_empty());
    }

    #[test]
    fn paragraphs_are_separated_by_blank_line() {
        let lines = render_markdown("first\nline\n\nsecond");
        assert_eq!(plain(&lines), vec!["first line", "", "second"]);
    }

    #[test]
    fn heading_is_styled() {
        let lines = render_markdown("# Title\n\nbody");
        assert_eq!(plain(&lines)[0], "Title");
        assert!(lines[0].spans[0]
            .style
            .add_modifier
            .contains(Modifier::BOLD));
    }

    #[test]
    fn lists_number_and_nest() {
        let lines = render_markdown("1. one\n2. two\n   - inner\n");
        assert_eq!(plain(&lines), vec!["1. one", "2. two", "  • inner"]);
    }

    #[test]
    fn links_show_their_target() {
        let lines = render_markdown("see [docs](https://example.com)");
        assert_eq!(plain(&lines), vec!["see docs (https://example.com)"]);
    }

    #[test]
    fn bare_autolinks_are_not_duplicated() {
        let lines = render_markdown("<https://example.com>");
        assert_eq!(plain(&lines), vec!["https://example.com"]);
    }

    #[test]
    fn code_blocks_keep_lines() {
        let lines = render_markdown("```rust\nfn a() {}\nfn b() {}\n```");
        assert_eq!(
            plain(&lines),
            vec!["```rust", "fn a() {}", "fn b() {}", "```"]
        );
    }

    #[test]
    fn quotes_are_prefixed() {
        let lines = render_markdown("> quoted");
        assert_eq!(plain(&lines), vec!["> quoted"]);
    }
}
