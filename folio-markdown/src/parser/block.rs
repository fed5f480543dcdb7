//! Block-level parsing.
//!
//! The parser walks the lines of a fragment with a [`Cursor`] passed by value:
//! every `parse_*` method takes the cursor at the first line of its construct
//! and returns the node together with the cursor just past it. Blockquotes and
//! list items are parsed recursively as nested fragments whose lines map
//! one-to-one onto source lines, so warnings always carry source line numbers.
use std::sync::LazyLock;

use log::{error, trace, warn};
use regex::Regex;

use super::inline::parse_inlines;
use crate::{
  error::{BlockKind, Warning},
  markup,
  processor::TabStyle,
  types::{Alignment, BlockNode, InlineNode, RawKind},
  utils::{codeblock::apply_tab_style, never_matching_regex},
};

/// Trailing `{#id}` on a heading line.
static HEADING_ANCHOR: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"[ \t]*\{#([A-Za-z0-9_-]+)\}[ \t]*$").unwrap_or_else(|e| {
    error!("Failed to compile HEADING_ANCHOR regex: {e}");
    never_matching_regex()
  })
});

/// `1.` or `1)` followed by whitespace or end of line.
static ORDERED_MARKER: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^([0-9]{1,9})([.)])(?:[ \t]|$)").unwrap_or_else(|e| {
    error!("Failed to compile ORDERED_MARKER regex: {e}");
    never_matching_regex()
  })
});

/// Cell of a table delimiter row: `---`, `:--`, `--:` or `:-:`.
static DELIMITER_CELL: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^:?-+:?$").unwrap_or_else(|e| {
    error!("Failed to compile DELIMITER_CELL regex: {e}");
    never_matching_regex()
  })
});

/// Parse a body fragment into blocks.
///
/// `first_line` is the 1-based source line of the fragment's first line; it
/// is only used to number warnings.
pub fn parse_blocks(
  text: &str,
  first_line: usize,
  warnings: &mut Vec<Warning>,
) -> Vec<BlockNode> {
  parse_blocks_with(text, first_line, TabStyle::None, warnings)
}

/// Parse a body fragment, applying `tab_style` to the text of every fenced
/// code block, nested ones included.
pub fn parse_blocks_with(
  text: &str,
  first_line: usize,
  tab_style: TabStyle,
  warnings: &mut Vec<Warning>,
) -> Vec<BlockNode> {
  let blocks = BlockParser::new(text, first_line, tab_style, warnings).parse();
  trace!("Parsed {} top-level blocks", blocks.len());
  blocks
}

/// Position in a fragment, as a 0-based line index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Cursor {
  line: usize,
}

impl Cursor {
  const fn at(line: usize) -> Self {
    Self { line }
  }

  const fn advance(self, lines: usize) -> Self {
    Self {
      line: self.line + lines,
    }
  }
}

struct BlockParser<'a, 'w> {
  text:       &'a str,
  lines:      Vec<&'a str>,
  starts:     Vec<usize>,
  first_line: usize,
  tab_style:  TabStyle,
  warnings:   &'w mut Vec<Warning>,
}

impl<'a, 'w> BlockParser<'a, 'w> {
  fn new(
    text: &'a str,
    first_line: usize,
    tab_style: TabStyle,
    warnings: &'w mut Vec<Warning>,
  ) -> Self {
    let mut lines = Vec::new();
    let mut starts = Vec::new();
    let mut offset = 0;
    for line in text.split('\n') {
      starts.push(offset);
      offset += line.len() + 1;
      lines.push(line.strip_suffix('\r').unwrap_or(line));
    }

    Self {
      text,
      lines,
      starts,
      first_line,
      tab_style,
      warnings,
    }
  }

  fn parse(mut self) -> Vec<BlockNode> {
    let mut blocks = Vec::new();
    let mut cur = Cursor::default();
    while !self.at_end(cur) {
      if is_blank(self.line(cur)) {
        cur = cur.advance(1);
        continue;
      }
      let (block, next) = self.parse_block(cur);
      blocks.push(block);
      cur = next;
    }
    blocks
  }

  fn at_end(&self, cur: Cursor) -> bool {
    cur.line >= self.lines.len()
  }

  fn line(&self, cur: Cursor) -> &'a str {
    self.lines.get(cur.line).copied().unwrap_or_default()
  }

  const fn source_line(&self, cur: Cursor) -> usize {
    self.first_line + cur.line
  }

  /// Byte offset just past the content of line `idx`.
  fn line_end(&self, idx: usize) -> usize {
    self.starts[idx] + self.lines[idx].len()
  }

  /// Index of the line containing byte offset `byte`.
  fn line_of(&self, byte: usize) -> usize {
    self
      .starts
      .partition_point(|&start| start <= byte)
      .saturating_sub(1)
  }

  fn parse_block(&mut self, cur: Cursor) -> (BlockNode, Cursor) {
    let line = self.line(cur);

    if let Some(fence) = Fence::open(line) {
      return self.parse_fence(cur, &fence);
    }
    if let Some((level, content)) = atx_heading(line) {
      return (heading(level, content), cur.advance(1));
    }
    if is_thematic_break(line) {
      return (BlockNode::ThematicBreak, cur.advance(1));
    }
    if blockquote_content(line).is_some() {
      return self.parse_blockquote(cur);
    }
    if self.starts_raw_block(cur, false) {
      return self.parse_raw(cur);
    }
    if let Some(marker) = ListMarker::parse(line) {
      return self.parse_list(cur, marker);
    }
    if let Some(table) = self.parse_table(cur) {
      return table;
    }
    self.parse_paragraph(cur)
  }

  fn parse_fence(&mut self, cur: Cursor, fence: &Fence<'_>) -> (BlockNode, Cursor) {
    let mut content: Vec<&str> = Vec::new();
    let mut next = cur.advance(1);
    let mut closed = false;

    while !self.at_end(next) {
      let line = self.line(next);
      next = next.advance(1);
      if fence.closes(line) {
        closed = true;
        break;
      }
      content.push(strip_spaces(line, fence.indent));
    }

    if !closed {
      let line = self.source_line(cur);
      warn!("Code fence opened on line {line} is never closed");
      self.warnings.push(Warning::UnterminatedBlock {
        block: BlockKind::Fence,
        line,
      });
      while content.last().is_some_and(|l| is_blank(l)) {
        content.pop();
      }
    }

    let text = content.join("\n");
    let text = apply_tab_style(&text, self.source_line(cur), self.tab_style, self.warnings)
      .into_owned();
    let (language, meta) = split_info(fence.info);
    let block = BlockNode::FencedCode {
      language,
      text,
      meta,
    };
    (block, next)
  }

  fn parse_blockquote(&mut self, cur: Cursor) -> (BlockNode, Cursor) {
    let mut inner: Vec<&str> = Vec::new();
    let mut next = cur;

    while !self.at_end(next) {
      let line = self.line(next);
      if let Some(content) = blockquote_content(line) {
        inner.push(content);
      } else if !is_blank(line)
        && inner.last().is_some_and(|prev| !is_blank(prev))
        && !self.interrupts_paragraph(next)
      {
        // Lazy continuation of a paragraph inside the quote.
        inner.push(line.trim_start());
      } else {
        break;
      }
      next = next.advance(1);
    }

    let fragment = inner.join("\n");
    let blocks = BlockParser::new(
      &fragment,
      self.source_line(cur),
      self.tab_style,
      self.warnings,
    )
    .parse();
    (BlockNode::BlockQuote { blocks }, next)
  }

  /// Whether the line at `cur` opens a raw HTML/JSX block.
  ///
  /// When interrupting a paragraph only comments, block-level elements and
  /// components count; otherwise a line holding a single complete tag does
  /// too.
  fn starts_raw_block(&self, cur: Cursor, interrupting: bool) -> bool {
    let line = self.line(cur);
    let indent = leading_spaces(line);
    if indent > 3 {
      return false;
    }
    let head = &line[indent..];
    if !head.starts_with('<') {
      return false;
    }
    if head.starts_with("<!--") {
      return true;
    }

    let rest = &self.text[self.starts[cur.line] + indent..];
    let Some(tag) = markup::scan_tag(rest) else {
      return false;
    };
    if markup::is_block_element(tag.name) || markup::is_component_name(tag.name)
    {
      return true;
    }
    if interrupting {
      return false;
    }

    let after = &rest[tag.raw.len()..];
    let eol = after.find('\n').unwrap_or(after.len());
    after[..eol].trim().is_empty()
  }

  fn parse_raw(&mut self, cur: Cursor) -> (BlockNode, Cursor) {
    let indent = leading_spaces(self.line(cur));
    let start = self.starts[cur.line] + indent;
    let extent = markup::element_extent(&self.text[start..]);

    let last_line = if extent.terminated {
      self.line_of(start + extent.len.saturating_sub(1))
    } else {
      let line = self.source_line(cur);
      warn!("Raw markup block opened on line {line} is never closed");
      self.warnings.push(Warning::UnterminatedBlock {
        block: BlockKind::RawMarkup,
        line,
      });
      self.lines.len() - 1
    };

    let text = self.text[start..self.line_end(last_line)].trim_end();
    let kind = raw_kind(text);
    let block = BlockNode::RawMarkup {
      text: text.to_string(),
      kind,
    };
    (block, Cursor::at(last_line + 1))
  }

  fn parse_list(&mut self, cur: Cursor, first: ListMarker) -> (BlockNode, Cursor) {
    let mut items = Vec::new();
    let mut tight = true;
    let mut marker = first;
    let mut next = cur;

    loop {
      let item_start = next;
      let first_line = self.line(next);
      let mut item: Vec<&str> = vec![first_line.get(marker.content..).unwrap_or_default()];
      next = next.advance(1);

      while !self.at_end(next) {
        let line = self.line(next);
        if is_blank(line) {
          item.push("");
        } else if indent_columns(line) >= marker.content {
          item.push(strip_columns(line, marker.content));
        } else if item.last().is_some_and(|prev| !is_blank(prev))
          && ListMarker::parse(line).is_none()
          && !self.interrupts_paragraph(next)
        {
          item.push(line.trim_start());
        } else {
          break;
        }
        next = next.advance(1);
      }

      let mut trailing_blanks = 0;
      while item.len() > 1 && item.last().is_some_and(|l| is_blank(l)) {
        item.pop();
        trailing_blanks += 1;
      }
      let inner_blank = item.iter().skip(1).any(|l| is_blank(l));

      let fragment = item.join("\n");
      let blocks = BlockParser::new(
        &fragment,
        self.source_line(item_start),
        self.tab_style,
        self.warnings,
      )
      .parse();
      if inner_blank && blocks.len() > 1 {
        tight = false;
      }
      items.push(blocks);

      let continues = !self.at_end(next)
        && !is_thematic_break(self.line(next))
        && ListMarker::parse(self.line(next)).is_some_and(|m| m.same_type(&marker));
      if !continues {
        // Blank lines after the last item belong to nobody.
        next = Cursor::at(next.line - trailing_blanks);
        break;
      }
      if trailing_blanks > 0 {
        tight = false;
      }
      if let Some(m) = ListMarker::parse(self.line(next)) {
        marker = m;
      }
    }

    let block = BlockNode::List {
      ordered: first.ordered,
      start: first.ordered.then_some(first.start),
      tight,
      items,
    };
    (block, next)
  }

  fn parse_table(&self, cur: Cursor) -> Option<(BlockNode, Cursor)> {
    let header_line = self.line(cur);
    if !header_line.contains('|') {
      return None;
    }
    let delimiter = self.lines.get(cur.line + 1)?;
    let alignments = parse_delimiter_row(delimiter)?;
    let header_cells = split_row(header_line);
    if header_cells.len() != alignments.len() {
      return None;
    }

    let columns = alignments.len();
    let mut rows = Vec::new();
    let mut next = cur.advance(2);
    while !self.at_end(next) {
      let line = self.line(next);
      if is_blank(line) || !line.contains('|') || self.interrupts_paragraph(next) {
        break;
      }
      let mut cells = split_row(line);
      cells.resize(columns, String::new());
      rows.push(cells.iter().map(|c| parse_inlines(c)).collect());
      next = next.advance(1);
    }

    let block = BlockNode::Table {
      alignments,
      header: header_cells.iter().map(|c| parse_inlines(c)).collect(),
      rows,
    };
    Some((block, next))
  }

  fn parse_paragraph(&self, cur: Cursor) -> (BlockNode, Cursor) {
    let mut lines = vec![self.line(cur).trim_start()];
    let mut next = cur.advance(1);

    while !self.at_end(next) {
      let line = self.line(next);
      if is_blank(line) {
        break;
      }
      if let Some(level) = setext_level(line) {
        return (heading(level, &lines.join("\n")), next.advance(1));
      }
      if self.interrupts_paragraph(next) {
        break;
      }
      lines.push(line.trim_start());
      next = next.advance(1);
    }

    let text = lines.join("\n");
    let content = parse_inlines(text.trim_end());

    if lines.len() == 1 {
      if let [InlineNode::InlineImage { alt, source, title }] = content.as_slice() {
        let block = BlockNode::Image {
          alt:    alt.clone(),
          source: source.clone(),
          title:  title.clone(),
        };
        return (block, next);
      }
    }

    (BlockNode::Paragraph { content }, next)
  }

  /// Whether the line at `cur` ends a running paragraph by starting a new
  /// block.
  fn interrupts_paragraph(&self, cur: Cursor) -> bool {
    let line = self.line(cur);
    Fence::open(line).is_some()
      || atx_heading(line).is_some()
      || is_thematic_break(line)
      || blockquote_content(line).is_some()
      || self.starts_raw_block(cur, true)
      || ListMarker::parse(line)
        .is_some_and(|m| !m.empty && (!m.ordered || m.start == 1))
  }
}

fn is_blank(line: &str) -> bool {
  line.trim().is_empty()
}

fn leading_spaces(line: &str) -> usize {
  line.bytes().take_while(|&b| b == b' ').count()
}

/// Width of the leading whitespace, with tabs advancing to the next multiple
/// of four.
fn indent_columns(line: &str) -> usize {
  let mut cols = 0;
  for b in line.bytes() {
    match b {
      b' ' => cols += 1,
      b'\t' => cols += 4 - cols % 4,
      _ => break,
    }
  }
  cols
}

/// Remove up to `n` leading spaces.
fn strip_spaces(line: &str, n: usize) -> &str {
  let strip = leading_spaces(line).min(n);
  &line[strip..]
}

/// Remove up to `n` columns of leading whitespace.
fn strip_columns(line: &str, n: usize) -> &str {
  let mut cols = 0;
  for (idx, b) in line.bytes().enumerate() {
    if cols >= n {
      return &line[idx..];
    }
    match b {
      b' ' => cols += 1,
      b'\t' => cols += 4 - cols % 4,
      _ => return &line[idx..],
    }
  }
  ""
}

struct Fence<'a> {
  ch:     u8,
  len:    usize,
  indent: usize,
  info:   &'a str,
}

impl<'a> Fence<'a> {
  fn open(line: &'a str) -> Option<Self> {
    let indent = leading_spaces(line);
    if indent > 3 {
      return None;
    }
    let rest = &line[indent..];
    let ch = rest.bytes().next()?;
    if ch != b'`' && ch != b'~' {
      return None;
    }
    let len = rest.bytes().take_while(|&b| b == ch).count();
    if len < 3 {
      return None;
    }
    let info = rest[len..].trim();
    if ch == b'`' && info.contains('`') {
      return None;
    }
    Some(Self {
      ch,
      len,
      indent,
      info,
    })
  }

  fn closes(&self, line: &str) -> bool {
    let indent = leading_spaces(line);
    if indent > 3 {
      return false;
    }
    let rest = &line[indent..];
    let len = rest.bytes().take_while(|&b| b == self.ch).count();
    len >= self.len && rest[len..].trim().is_empty()
  }
}

/// Split a fence info string into language and meta.
fn split_info(info: &str) -> (Option<String>, Option<String>) {
  let info = info.trim();
  if info.is_empty() {
    return (None, None);
  }
  let (language, meta) = match info.find(|c: char| c.is_whitespace() || c == '{') {
    Some(idx) => (&info[..idx], info[idx..].trim()),
    None => (info, ""),
  };
  let language = (!language.is_empty()).then(|| language.to_string());
  let meta = (!meta.is_empty()).then(|| meta.to_string());
  (language, meta)
}

/// Level and raw content of an ATX heading line.
fn atx_heading(line: &str) -> Option<(u8, &str)> {
  let indent = leading_spaces(line);
  if indent > 3 {
    return None;
  }
  let rest = &line[indent..];
  let hashes = rest.bytes().take_while(|&b| b == b'#').count();
  if !(1..=6).contains(&hashes) {
    return None;
  }
  let after = &rest[hashes..];
  if !after.is_empty() && !after.starts_with([' ', '\t']) {
    return None;
  }

  let content = after.trim();
  let without_closing = content.trim_end_matches('#');
  let content = if without_closing.is_empty() {
    ""
  } else if without_closing.ends_with([' ', '\t']) {
    without_closing.trim_end()
  } else {
    content
  };

  #[allow(
    clippy::cast_possible_truncation,
    reason = "Heading level is at most 6"
  )]
  Some((hashes as u8, content))
}

/// Build a heading, splitting off a trailing `{#id}` anchor.
fn heading(level: u8, content: &str) -> BlockNode {
  let (content, id) = match HEADING_ANCHOR.captures(content) {
    Some(caps) => {
      let start = caps.get(0).map_or(content.len(), |m| m.start());
      (&content[..start], caps.get(1).map(|m| m.as_str().to_string()))
    },
    None => (content, None),
  };
  BlockNode::Heading {
    level,
    content: parse_inlines(content.trim()),
    id,
  }
}

fn setext_level(line: &str) -> Option<u8> {
  if leading_spaces(line) > 3 {
    return None;
  }
  let trimmed = line.trim();
  if trimmed.is_empty() {
    None
  } else if trimmed.bytes().all(|b| b == b'=') {
    Some(1)
  } else if trimmed.bytes().all(|b| b == b'-') {
    Some(2)
  } else {
    None
  }
}

fn is_thematic_break(line: &str) -> bool {
  if leading_spaces(line) > 3 {
    return false;
  }
  let mut marks = line.bytes().filter(|b| !matches!(b, b' ' | b'\t'));
  let Some(first) = marks.next() else {
    return false;
  };
  if !matches!(first, b'-' | b'*' | b'_') {
    return false;
  }
  let mut count = 1;
  for b in marks {
    if b != first {
      return false;
    }
    count += 1;
  }
  count >= 3
}

/// Content of a `>` line with the marker and one optional space removed.
fn blockquote_content(line: &str) -> Option<&str> {
  let indent = leading_spaces(line);
  if indent > 3 {
    return None;
  }
  let rest = line[indent..].strip_prefix('>')?;
  Some(rest.strip_prefix([' ', '\t']).unwrap_or(rest))
}

fn raw_kind(text: &str) -> RawKind {
  let jsx = markup::tokenize(text).iter().any(|token| {
    matches!(token, markup::Token::Tag(tag) if tag.kind() == RawKind::Jsx)
  });
  if jsx { RawKind::Jsx } else { RawKind::Html }
}

#[derive(Debug, Clone, Copy)]
struct ListMarker {
  ordered: bool,
  /// Bullet character, or the delimiter after the number.
  symbol:  u8,
  start:   u64,
  /// Column where item content starts.
  content: usize,
  /// Marker with nothing after it.
  empty:   bool,
}

impl ListMarker {
  fn parse(line: &str) -> Option<Self> {
    let indent = leading_spaces(line);
    if indent > 3 {
      return None;
    }
    let rest = &line[indent..];

    let (ordered, symbol, start, width) = match rest.bytes().next()? {
      b @ (b'-' | b'*' | b'+') => {
        if !(rest.len() == 1 || rest[1..].starts_with([' ', '\t'])) {
          return None;
        }
        (false, b, 0, 1)
      },
      b'0'..=b'9' => {
        let caps = ORDERED_MARKER.captures(rest)?;
        let digits = caps.get(1)?.as_str();
        let delim = caps.get(2)?.as_str().bytes().next()?;
        let start = digits.parse().ok()?;
        (true, delim, start, digits.len() + 1)
      },
      _ => return None,
    };

    let after = &rest[width..];
    let empty = after.trim().is_empty();
    let spaces = leading_spaces(after);
    // Five or more spaces means the content is indented code in CommonMark;
    // without indented code it is still content one column past the marker.
    let gap = if empty || spaces > 4 { 1 } else { spaces.max(1) };

    Some(Self {
      ordered,
      symbol,
      start,
      content: indent + width + gap,
      empty,
    })
  }

  const fn same_type(&self, other: &Self) -> bool {
    self.ordered == other.ordered && self.symbol == other.symbol
  }
}

/// Split a pipe table row into trimmed cells, honoring `\|` escapes.
fn split_row(line: &str) -> Vec<String> {
  let trimmed = line.trim();
  let trimmed = trimmed.strip_prefix('|').unwrap_or(trimmed);
  let trimmed = match trimmed.strip_suffix('|') {
    Some(inner) if !inner.ends_with('\\') => inner,
    _ => trimmed,
  };

  let mut cells = Vec::new();
  let mut cell = String::new();
  let mut chars = trimmed.chars().peekable();
  while let Some(c) = chars.next() {
    match c {
      '\\' if chars.peek() == Some(&'|') => {
        cell.push('|');
        chars.next();
      },
      '|' => cells.push(std::mem::take(&mut cell).trim().to_string()),
      other => cell.push(other),
    }
  }
  cells.push(cell.trim().to_string());
  cells
}

fn parse_delimiter_row(line: &str) -> Option<Vec<Alignment>> {
  if !line.contains('|') && !line.contains('-') {
    return None;
  }
  split_row(line)
    .iter()
    .map(|cell| {
      if !DELIMITER_CELL.is_match(cell) {
        return None;
      }
      let alignment = match (cell.starts_with(':'), cell.ends_with(':')) {
        (true, true) => Alignment::Center,
        (true, false) => Alignment::Left,
        (false, true) => Alignment::Right,
        (false, false) => Alignment::None,
      };
      Some(alignment)
    })
    .collect()
}
