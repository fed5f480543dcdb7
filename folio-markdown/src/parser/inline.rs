//! Inline parsing.
//!
//! A single left-to-right scan turns text into a list of pieces: finished
//! nodes, emphasis delimiter runs and link bracket openers. Brackets are
//! resolved as soon as their `]` is seen; emphasis is resolved with the
//! delimiter algorithm once the enclosing span (a link or the whole block) is
//! complete.
use crate::{
  markup,
  types::{InlineNode, SourceRef},
  utils::inline_text,
};

/// Parse the inline content of a block.
#[must_use]
pub fn parse_inlines(text: &str) -> Vec<InlineNode> {
  InlineScanner::new(text).run()
}

#[derive(Debug)]
enum Piece {
  Node(InlineNode),
  Delim {
    ch:        char,
    count:     usize,
    /// Run length as written, used by the rule of three.
    orig:      usize,
    can_open:  bool,
    can_close: bool,
  },
  Bracket {
    image:  bool,
    /// Cleared for `[` openers once a link closes after them.
    active: bool,
  },
}

struct InlineScanner<'a> {
  src:    &'a str,
  pos:    usize,
  buf:    String,
  pieces: Vec<Piece>,
}

impl<'a> InlineScanner<'a> {
  fn new(src: &'a str) -> Self {
    Self {
      src,
      pos: 0,
      buf: String::new(),
      pieces: Vec::new(),
    }
  }

  fn run(mut self) -> Vec<InlineNode> {
    while let Some(c) = self.peek() {
      match c {
        '\\' => self.scan_backslash(),
        '`' => self.scan_code_span(),
        '<' => self.scan_angle(),
        '*' | '_' => self.scan_delimiter(c),
        '!' if self.src[self.pos + 1..].starts_with('[') => {
          self.flush();
          self.pieces.push(Piece::Bracket {
            image:  true,
            active: true,
          });
          self.pos += 2;
        },
        '[' => {
          self.flush();
          self.pieces.push(Piece::Bracket {
            image:  false,
            active: true,
          });
          self.pos += 1;
        },
        ']' => self.scan_close_bracket(),
        '\n' => self.scan_newline(),
        other => {
          self.buf.push(other);
          self.pos += other.len_utf8();
        },
      }
    }
    self.flush();
    into_nodes(self.pieces)
  }

  fn peek(&self) -> Option<char> {
    self.src[self.pos..].chars().next()
  }

  fn flush(&mut self) {
    if !self.buf.is_empty() {
      let text = std::mem::take(&mut self.buf);
      self.pieces.push(Piece::Node(InlineNode::Text { text }));
    }
  }

  fn push_node(&mut self, node: InlineNode) {
    self.flush();
    self.pieces.push(Piece::Node(node));
  }

  fn scan_backslash(&mut self) {
    let next = self.src[self.pos + 1..].chars().next();
    match next {
      Some(c) if c.is_ascii_punctuation() => {
        self.buf.push(c);
        self.pos += 2;
      },
      Some('\n') => {
        self.push_node(InlineNode::LineBreak);
        self.pos += 2;
        self.skip_spaces();
      },
      _ => {
        self.buf.push('\\');
        self.pos += 1;
      },
    }
  }

  fn scan_code_span(&mut self) {
    let rest = &self.src[self.pos..];
    let run = rest.bytes().take_while(|&b| b == b'`').count();

    let mut search = run;
    while let Some(rel) = rest[search..].find('`') {
      let start = search + rel;
      let len = rest[start..].bytes().take_while(|&b| b == b'`').count();
      if len == run {
        let code = normalize_code_span(&rest[run..start]);
        self.push_node(InlineNode::InlineCode { text: code });
        self.pos += start + len;
        return;
      }
      search = start + len;
    }

    // No matching closer: the run is literal text.
    self.buf.push_str(&rest[..run]);
    self.pos += run;
  }

  fn scan_angle(&mut self) {
    let rest = &self.src[self.pos..];

    if let Some((len, dest, label)) = autolink(rest) {
      self.push_node(InlineNode::Link {
        children: vec![InlineNode::text(label)],
        dest:     SourceRef::parse(&dest),
        title:    None,
      });
      self.pos += len;
      return;
    }

    let raw_len = markup::scan_comment(rest)
      .or_else(|| markup::scan_tag(rest).map(|tag| tag.raw.len()));
    match raw_len {
      Some(len) => {
        self.push_node(InlineNode::RawInline {
          text: rest[..len].to_string(),
        });
        self.pos += len;
      },
      None => {
        self.buf.push('<');
        self.pos += 1;
      },
    }
  }

  fn scan_delimiter(&mut self, ch: char) {
    let rest = &self.src[self.pos..];
    let count = rest.chars().take_while(|&c| c == ch).count();
    let before = self.src[..self.pos].chars().next_back();
    let after = rest[count..].chars().next();

    let before_ws = before.is_none_or(char::is_whitespace);
    let after_ws = after.is_none_or(char::is_whitespace);
    let before_punct = before.is_some_and(is_punctuation);
    let after_punct = after.is_some_and(is_punctuation);

    let left = !after_ws && (!after_punct || before_ws || before_punct);
    let right = !before_ws && (!before_punct || after_ws || after_punct);

    let (can_open, can_close) = if ch == '*' {
      (left, right)
    } else {
      (left && (!right || before_punct), right && (!left || after_punct))
    };

    self.flush();
    self.pieces.push(Piece::Delim {
      ch,
      count,
      orig: count,
      can_open,
      can_close,
    });
    self.pos += count;
  }

  fn scan_close_bracket(&mut self) {
    self.flush();
    self.pos += 1;

    let opener = self
      .pieces
      .iter()
      .rposition(|p| matches!(p, Piece::Bracket { .. }));
    let Some(opener) = opener else {
      self.buf.push(']');
      return;
    };
    let Piece::Bracket { image, active } = self.pieces[opener] else {
      return;
    };

    let tail = active
      .then(|| parse_link_tail(&self.src[self.pos..]))
      .flatten();
    let Some(tail) = tail else {
      // Not a link: the opener turns into literal text.
      self.pieces[opener] = Piece::Node(InlineNode::text(bracket_text(image)));
      self.buf.push(']');
      return;
    };
    self.pos += tail.len;

    let inner: Vec<Piece> = self.pieces.drain(opener + 1..).collect();
    self.pieces.pop();
    let children = into_nodes(inner);
    let source = SourceRef::parse(&tail.dest);

    let node = if image {
      InlineNode::InlineImage {
        alt: inline_text(&children),
        source,
        title: tail.title,
      }
    } else {
      // Links may not contain other links.
      for piece in &mut self.pieces {
        if let Piece::Bracket {
          image: false,
          active,
        } = piece
        {
          *active = false;
        }
      }
      InlineNode::Link {
        children,
        dest: source,
        title: tail.title,
      }
    };
    self.pieces.push(Piece::Node(node));
  }

  fn scan_newline(&mut self) {
    let trailing = self.buf.len() - self.buf.trim_end_matches(' ').len();
    self.buf.truncate(self.buf.len() - trailing);
    self.pos += 1;

    if trailing >= 2 {
      self.push_node(InlineNode::LineBreak);
    } else {
      self.buf.push('\n');
    }
    self.skip_spaces();
  }

  fn skip_spaces(&mut self) {
    let rest = &self.src[self.pos..];
    self.pos += rest.len() - rest.trim_start_matches([' ', '\t']).len();
  }
}

fn is_punctuation(c: char) -> bool {
  c.is_ascii_punctuation()
    || (!c.is_alphanumeric() && !c.is_whitespace() && !c.is_control())
}

const fn bracket_text(image: bool) -> &'static str {
  if image { "![" } else { "[" }
}

/// Line endings become spaces; one leading and trailing space is stripped
/// when both are present and the span is not all spaces.
fn normalize_code_span(raw: &str) -> String {
  let code = raw.replace('\n', " ");
  if code.len() >= 2
    && code.starts_with(' ')
    && code.ends_with(' ')
    && !code.bytes().all(|b| b == b' ')
  {
    code[1..code.len() - 1].to_string()
  } else {
    code
  }
}

/// `<scheme:...>` or `<user@host>` at the start of `s`: total length,
/// destination and label.
fn autolink(s: &str) -> Option<(usize, String, String)> {
  let end = s.find('>')?;
  let inner = &s[1..end];
  if inner.is_empty() || inner.contains(|c: char| c.is_whitespace() || c == '<') {
    return None;
  }

  if let Some((scheme, _)) = inner.split_once(':') {
    let valid_scheme = (2..=32).contains(&scheme.len())
      && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
      && scheme
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    if valid_scheme {
      return Some((end + 1, inner.to_string(), inner.to_string()));
    }
    return None;
  }

  let (user, host) = inner.split_once('@')?;
  let valid_email = !user.is_empty()
    && host.contains('.')
    && !host.starts_with('.')
    && !host.ends_with('.')
    && user
      .chars()
      .all(|c| c.is_ascii_alphanumeric() || ".!#$%&'*+/=?^_`{|}~-".contains(c))
    && host
      .chars()
      .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.'));
  valid_email.then(|| (end + 1, format!("mailto:{inner}"), inner.to_string()))
}

struct LinkTail {
  dest:  String,
  title: Option<String>,
  /// Bytes consumed, `(` through `)`.
  len:   usize,
}

/// Parse `(dest "title")` right after a closing bracket.
fn parse_link_tail(s: &str) -> Option<LinkTail> {
  let bytes = s.as_bytes();
  if bytes.first() != Some(&b'(') {
    return None;
  }
  let mut i = skip_link_space(s, 1);

  let dest = if bytes.get(i) == Some(&b'<') {
    let close = s[i + 1..].find(['>', '\n'])?;
    if bytes.get(i + 1 + close) != Some(&b'>') {
      return None;
    }
    let dest = &s[i + 1..i + 1 + close];
    i += close + 2;
    dest
  } else {
    let start = i;
    let mut depth = 0usize;
    while let Some(&b) = bytes.get(i) {
      match b {
        b'\\' if bytes.get(i + 1).is_some_and(u8::is_ascii_punctuation) => i += 1,
        b'(' => depth += 1,
        b')' if depth == 0 => break,
        b')' => depth -= 1,
        b if b.is_ascii_whitespace() || b.is_ascii_control() => break,
        _ => {},
      }
      i += 1;
    }
    if depth != 0 {
      return None;
    }
    &s[start..i]
  };

  let before_title = i;
  i = skip_link_space(s, i);
  let mut title = None;
  if let Some(&open @ (b'"' | b'\'' | b'(')) = bytes.get(i) {
    if i == before_title && !dest.is_empty() {
      return None;
    }
    let close = if open == b'(' { b')' } else { open };
    let start = i + 1;
    let mut j = start;
    loop {
      match bytes.get(j) {
        None => return None,
        Some(b'\\') => j += 2,
        Some(&b) if b == close => break,
        Some(_) => j += 1,
      }
    }
    title = Some(unescape(&s[start..j]));
    i = skip_link_space(s, j + 1);
  }

  if bytes.get(i) != Some(&b')') {
    return None;
  }

  Some(LinkTail {
    dest: unescape(dest),
    title,
    len: i + 1,
  })
}

/// Skip spaces and tabs plus at most one line ending.
fn skip_link_space(s: &str, mut i: usize) -> usize {
  let bytes = s.as_bytes();
  let mut newline = false;
  while let Some(&b) = bytes.get(i) {
    match b {
      b' ' | b'\t' => {},
      b'\n' if !newline => newline = true,
      _ => break,
    }
    i += 1;
  }
  i
}

/// Resolve backslash escapes of ASCII punctuation.
fn unescape(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  let mut chars = s.chars().peekable();
  while let Some(c) = chars.next() {
    if c == '\\' {
      if let Some(&next) = chars.peek() {
        if next.is_ascii_punctuation() {
          out.push(next);
          chars.next();
          continue;
        }
      }
    }
    out.push(c);
  }
  out
}

/// Resolve emphasis over a run of pieces and flatten it into nodes.
fn into_nodes(mut pieces: Vec<Piece>) -> Vec<InlineNode> {
  resolve_emphasis(&mut pieces);

  let mut nodes = Vec::with_capacity(pieces.len());
  for piece in pieces {
    let node = match piece {
      Piece::Node(node) => node,
      Piece::Delim { ch, count, .. } => {
        InlineNode::text(std::iter::repeat_n(ch, count).collect::<String>())
      },
      Piece::Bracket { image, .. } => InlineNode::text(bracket_text(image)),
    };
    match (nodes.last_mut(), node) {
      (Some(InlineNode::Text { text }), InlineNode::Text { text: more }) => {
        text.push_str(&more);
      },
      (_, node) => nodes.push(node),
    }
  }
  nodes
}

/// The delimiter-run algorithm: for each closer, left to right, find the
/// nearest compatible opener and wrap everything between them.
fn resolve_emphasis(pieces: &mut Vec<Piece>) {
  let mut idx = 0;
  while idx < pieces.len() {
    let Piece::Delim {
      ch,
      count,
      orig,
      can_open: closer_can_open,
      can_close: true,
    } = pieces[idx]
    else {
      idx += 1;
      continue;
    };

    let opener = (0..idx).rev().find_map(|j| {
      match pieces[j] {
        Piece::Delim {
          ch: open_ch,
          count: open_count,
          orig: open_orig,
          can_open: true,
          can_close: open_can_close,
        } if open_ch == ch => {
          let both_ways = open_can_close || closer_can_open;
          let rule_of_three = (open_orig + orig) % 3 == 0
            && !(open_orig % 3 == 0 && orig % 3 == 0);
          (!(both_ways && rule_of_three)).then_some((j, open_count))
        },
        _ => None,
      }
    });

    let Some((open_idx, open_count)) = opener else {
      if let Piece::Delim { can_close, .. } = &mut pieces[idx] {
        *can_close = false;
      }
      idx += 1;
      continue;
    };

    let used = if count >= 2 && open_count >= 2 { 2 } else { 1 };
    let inner: Vec<Piece> = pieces.drain(open_idx + 1..idx).collect();
    let children = into_nodes(inner);
    let node = if used == 2 {
      InlineNode::Strong { children }
    } else {
      InlineNode::Emphasis { children }
    };

    // Layout is now [.., opener, closer, ..] with the opener at open_idx.
    let mut closer_idx = open_idx + 1;
    pieces.insert(closer_idx, Piece::Node(node));
    closer_idx += 1;

    let opener_left = shrink(&mut pieces[open_idx], used);
    let closer_left = shrink(&mut pieces[closer_idx], used);
    if opener_left == 0 {
      pieces.remove(open_idx);
      closer_idx -= 1;
    }
    if closer_left == 0 {
      pieces.remove(closer_idx);
      idx = closer_idx;
    } else {
      idx = closer_idx;
    }
  }
}

/// Remove `used` characters from a delimiter run, returning what is left.
fn shrink(piece: &mut Piece, used: usize) -> usize {
  match piece {
    Piece::Delim { count, .. } => {
      *count -= used;
      *count
    },
    _ => 0,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn text(s: &str) -> InlineNode {
    InlineNode::text(s)
  }

  #[test]
  fn test_plain_text_and_soft_breaks() {
    assert_eq!(parse_inlines("one\ntwo"), vec![text("one\ntwo")]);
    assert_eq!(parse_inlines(""), Vec::<InlineNode>::new());
  }

  #[test]
  fn test_emphasis_and_strong() {
    assert_eq!(parse_inlines("*a* **b** _c_ __d__"), vec![
      InlineNode::Emphasis {
        children: vec![text("a")],
      },
      text(" "),
      InlineNode::Strong {
        children: vec![text("b")],
      },
      text(" "),
      InlineNode::Emphasis {
        children: vec![text("c")],
      },
      text(" "),
      InlineNode::Strong {
        children: vec![text("d")],
      },
    ]);
  }

  #[test]
  fn test_nested_emphasis() {
    assert_eq!(parse_inlines("***both***"), vec![InlineNode::Emphasis {
      children: vec![InlineNode::Strong {
        children: vec![text("both")],
      }],
    }]);
    assert_eq!(parse_inlines("*a **b** c*"), vec![InlineNode::Emphasis {
      children: vec![
        text("a "),
        InlineNode::Strong {
          children: vec![text("b")],
        },
        text(" c"),
      ],
    }]);
  }

  #[test]
  fn test_mixed_delimiters_nest() {
    assert_eq!(parse_inlines("**bold _and italic_**"), vec![InlineNode::Strong {
      children: vec![text("bold "), InlineNode::Emphasis {
        children: vec![text("and italic")],
      }],
    }]);
  }

  #[test]
  fn test_intraword_underscore_is_literal() {
    assert_eq!(parse_inlines("snake_case_name"), vec![text("snake_case_name")]);
    assert_eq!(parse_inlines("a*b*c"), vec![
      text("a"),
      InlineNode::Emphasis {
        children: vec![text("b")],
      },
      text("c"),
    ]);
  }

  #[test]
  fn test_unmatched_delimiters_are_text() {
    assert_eq!(parse_inlines("2 * 3 * 4"), vec![text("2 * 3 * 4")]);
    assert_eq!(parse_inlines("**open"), vec![text("**open")]);
    assert_eq!(parse_inlines("*a **b*"), vec![
      text("*a *"),
      InlineNode::Emphasis {
        children: vec![text("b")],
      },
    ]);
  }

  #[test]
  fn test_code_span_precedence() {
    assert_eq!(parse_inlines("`*not emphasis*` *yes*"), vec![
      InlineNode::InlineCode {
        text: "*not emphasis*".to_string(),
      },
      text(" "),
      InlineNode::Emphasis {
        children: vec![text("yes")],
      },
    ]);
    assert_eq!(parse_inlines("`` a ` b ``"), vec![InlineNode::InlineCode {
      text: "a ` b".to_string(),
    }]);
    assert_eq!(parse_inlines("`open"), vec![text("`open")]);
  }

  #[test]
  fn test_backslash_escapes() {
    assert_eq!(parse_inlines(r"\*not\* \a"), vec![text(r"*not* \a")]);
  }

  #[test]
  fn test_hard_line_breaks() {
    assert_eq!(parse_inlines("a  \nb\\\nc"), vec![
      text("a"),
      InlineNode::LineBreak,
      text("b"),
      InlineNode::LineBreak,
      text("c"),
    ]);
  }

  #[test]
  fn test_links() {
    assert_eq!(
      parse_inlines("see [the *docs*](https://example.com \"Docs\")"),
      vec![text("see "), InlineNode::Link {
        children: vec![text("the "), InlineNode::Emphasis {
          children: vec![text("docs")],
        }],
        dest:     SourceRef::Absolute("https://example.com".to_string()),
        title:    Some("Docs".to_string()),
      }]
    );
    assert_eq!(parse_inlines("[rel](./other.md)"), vec![InlineNode::Link {
      children: vec![text("rel")],
      dest:     SourceRef::RepoRelative("./other.md".to_string()),
      title:    None,
    }]);
  }

  #[test]
  fn test_link_destination_with_parens() {
    assert_eq!(parse_inlines("[w](https://en.wikipedia.org/wiki/Rust_(language))"), vec![
      InlineNode::Link {
        children: vec![text("w")],
        dest:     SourceRef::Absolute(
          "https://en.wikipedia.org/wiki/Rust_(language)".to_string(),
        ),
        title:    None,
      },
    ]);
  }

  #[test]
  fn test_links_do_not_nest() {
    assert_eq!(parse_inlines("[a [b](x) c](y)"), vec![
      text("[a "),
      InlineNode::Link {
        children: vec![text("b")],
        dest:     SourceRef::RepoRelative("x".to_string()),
        title:    None,
      },
      text(" c](y)"),
    ]);
  }

  #[test]
  fn test_unmatched_brackets_are_text() {
    assert_eq!(parse_inlines("[not a link] and ]"), vec![text(
      "[not a link] and ]"
    )]);
    assert_eq!(parse_inlines("![alt] text"), vec![text("![alt] text")]);
  }

  #[test]
  fn test_inline_image() {
    assert_eq!(parse_inlines("![a *b*](img.png 'T')"), vec![InlineNode::InlineImage {
      alt:    "a b".to_string(),
      source: SourceRef::RepoRelative("img.png".to_string()),
      title:  Some("T".to_string()),
    }]);
  }

  #[test]
  fn test_autolinks() {
    assert_eq!(parse_inlines("<https://example.com/a?b=c>"), vec![
      InlineNode::Link {
        children: vec![text("https://example.com/a?b=c")],
        dest:     SourceRef::Absolute("https://example.com/a?b=c".to_string()),
        title:    None,
      },
    ]);
    assert_eq!(parse_inlines("<me@example.com>"), vec![InlineNode::Link {
      children: vec![text("me@example.com")],
      dest:     SourceRef::Absolute("mailto:me@example.com".to_string()),
      title:    None,
    }]);
  }

  #[test]
  fn test_raw_inline_tags() {
    assert_eq!(parse_inlines("x <script>alert(1)</script> y"), vec![
      text("x "),
      InlineNode::RawInline {
        text: "<script>".to_string(),
      },
      text("alert(1)"),
      InlineNode::RawInline {
        text: "</script>".to_string(),
      },
      text(" y"),
    ]);
    assert_eq!(parse_inlines("<Badge color={c} /> <!-- hi -->"), vec![
      InlineNode::RawInline {
        text: "<Badge color={c} />".to_string(),
      },
      text(" "),
      InlineNode::RawInline {
        text: "<!-- hi -->".to_string(),
      },
    ]);
  }

  #[test]
  fn test_stray_angle_bracket_is_text() {
    assert_eq!(parse_inlines("a < b > c"), vec![text("a < b > c")]);
  }
}
