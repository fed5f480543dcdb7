//! Lexer for embedded HTML and JSX tags.
//!
//! Shared by the block parser (to find the extent of raw blocks), the inline
//! parser (to recognize raw inline tags) and the sanitizer (to judge every tag
//! inside a raw fragment). Nothing here interprets markup semantically.
use crate::types::RawKind;

/// Elements whose body is raw text and must not be tokenized.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea"];

/// Elements that never have a closing tag.
const VOID_ELEMENTS: &[&str] = &[
  "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta",
  "param", "source", "track", "wbr",
];

/// Tags that open a raw block when they start a line.
const BLOCK_ELEMENTS: &[&str] = &[
  "address",
  "article",
  "aside",
  "audio",
  "blockquote",
  "body",
  "caption",
  "center",
  "col",
  "colgroup",
  "dd",
  "details",
  "dialog",
  "div",
  "dl",
  "dt",
  "fieldset",
  "figcaption",
  "figure",
  "footer",
  "form",
  "h1",
  "h2",
  "h3",
  "h4",
  "h5",
  "h6",
  "head",
  "header",
  "hr",
  "html",
  "iframe",
  "legend",
  "li",
  "link",
  "main",
  "menu",
  "nav",
  "ol",
  "optgroup",
  "option",
  "p",
  "picture",
  "pre",
  "script",
  "section",
  "source",
  "style",
  "summary",
  "table",
  "tbody",
  "td",
  "textarea",
  "tfoot",
  "th",
  "thead",
  "tr",
  "track",
  "ul",
  "video",
];

/// Value of a tag attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrValue<'a> {
  /// Attribute written without a value (`allowfullscreen`).
  Bare,
  /// Quoted or unquoted literal value, exactly as written (not decoded).
  Text(&'a str),
  /// JSX expression value (`width={560}`), without the braces.
  Expression(&'a str),
}

/// A single attribute. JSX spreads (`{...props}`) have an empty name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attribute<'a> {
  pub name:  &'a str,
  pub value: AttrValue<'a>,
}

impl Attribute<'_> {
  #[must_use]
  pub fn is_spread(&self) -> bool {
    self.name.is_empty()
  }
}

/// A lexed opening, closing or self-closing tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag<'a> {
  pub name:         &'a str,
  pub attrs:        Vec<Attribute<'a>>,
  pub closing:      bool,
  pub self_closing: bool,
  /// Source text of the whole tag, `<` through `>`.
  pub raw:          &'a str,
}

impl Tag<'_> {
  /// Lowercased tag name for policy lookups. JSX component names keep their
  /// case.
  #[must_use]
  pub fn normalized_name(&self) -> String {
    if is_component_name(self.name) {
      self.name.to_string()
    } else {
      self.name.to_ascii_lowercase()
    }
  }

  #[must_use]
  pub fn is_void(&self) -> bool {
    VOID_ELEMENTS
      .iter()
      .any(|v| v.eq_ignore_ascii_case(self.name))
  }

  /// Whether this tag ends its element on its own.
  #[must_use]
  pub fn is_standalone(&self) -> bool {
    self.closing || self.self_closing || self.is_void()
  }

  /// HTML or JSX, judged from the tag name and attribute syntax.
  #[must_use]
  pub fn kind(&self) -> RawKind {
    let jsx_attrs = self.attrs.iter().any(|a| {
      a.is_spread()
        || a.name == "className"
        || matches!(a.value, AttrValue::Expression(_))
    });
    if is_component_name(self.name) || jsx_attrs {
      RawKind::Jsx
    } else {
      RawKind::Html
    }
  }
}

/// Capitalized or dotted names (`Tweet`, `Tabs.Item`) are JSX components.
#[must_use]
pub fn is_component_name(name: &str) -> bool {
  name.starts_with(|c: char| c.is_ascii_uppercase()) || name.contains('.')
}

#[must_use]
pub fn is_block_element(name: &str) -> bool {
  BLOCK_ELEMENTS.iter().any(|b| b.eq_ignore_ascii_case(name))
}

fn is_raw_text_element(name: &str) -> bool {
  RAW_TEXT_ELEMENTS
    .iter()
    .any(|r| r.eq_ignore_ascii_case(name))
}

/// Piece of a tokenized fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
  Text(&'a str),
  Tag(Tag<'a>),
  Comment(&'a str),
  /// A `<` that does not start a tag or comment.
  Stray(&'a str),
}

/// Length of the HTML comment at the start of `s`, if it is terminated.
#[must_use]
pub fn scan_comment(s: &str) -> Option<usize> {
  let rest = s.strip_prefix("<!--")?;
  rest.find("-->").map(|end| 4 + end + 3)
}

/// Lex the tag at the start of `s`. Attribute lists may span lines.
#[must_use]
pub fn scan_tag(s: &str) -> Option<Tag<'_>> {
  let bytes = s.as_bytes();
  if bytes.first() != Some(&b'<') {
    return None;
  }

  let mut i = 1;
  let closing = bytes.get(i) == Some(&b'/');
  if closing {
    i += 1;
  }

  let name_start = i;
  if !bytes.get(i).is_some_and(u8::is_ascii_alphabetic) {
    return None;
  }
  while bytes
    .get(i)
    .is_some_and(|&b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b':'))
  {
    i += 1;
  }
  let name = &s[name_start..i];

  if closing {
    i = skip_whitespace(bytes, i);
    return (bytes.get(i) == Some(&b'>')).then(|| {
      Tag {
        name,
        attrs: Vec::new(),
        closing: true,
        self_closing: false,
        raw: &s[..=i],
      }
    });
  }

  // Something other than whitespace or the tag end right after the name means
  // this is not a tag (`<a+b`).
  if !bytes
    .get(i)
    .is_some_and(|&b| b.is_ascii_whitespace() || matches!(b, b'>' | b'/'))
  {
    return None;
  }

  let mut attrs = Vec::new();
  loop {
    i = skip_whitespace(bytes, i);
    match bytes.get(i).copied()? {
      b'>' => {
        return Some(Tag {
          name,
          attrs,
          closing: false,
          self_closing: false,
          raw: &s[..=i],
        });
      },
      b'/' => {
        if bytes.get(i + 1) != Some(&b'>') {
          return None;
        }
        return Some(Tag {
          name,
          attrs,
          closing: false,
          self_closing: true,
          raw: &s[..i + 2],
        });
      },
      b'{' => {
        let end = scan_braces(bytes, i)?;
        attrs.push(Attribute {
          name:  "",
          value: AttrValue::Expression(&s[i + 1..end - 1]),
        });
        i = end;
      },
      _ => {
        let attr_start = i;
        while bytes.get(i).is_some_and(|&b| {
          !b.is_ascii_whitespace()
            && !matches!(b, b'"' | b'\'' | b'>' | b'/' | b'=' | b'<' | b'{' | b'}')
        }) {
          i += 1;
        }
        if i == attr_start {
          return None;
        }
        let attr_name = &s[attr_start..i];

        let after_name = skip_whitespace(bytes, i);
        if bytes.get(after_name) != Some(&b'=') {
          attrs.push(Attribute {
            name:  attr_name,
            value: AttrValue::Bare,
          });
          continue;
        }

        i = skip_whitespace(bytes, after_name + 1);
        let value = match bytes.get(i).copied()? {
          quote @ (b'"' | b'\'') => {
            let len = s[i + 1..].find(char::from(quote))?;
            let value = &s[i + 1..i + 1 + len];
            i += len + 2;
            AttrValue::Text(value)
          },
          b'{' => {
            let end = scan_braces(bytes, i)?;
            let value = &s[i + 1..end - 1];
            i = end;
            AttrValue::Expression(value)
          },
          _ => {
            let value_start = i;
            while bytes.get(i).is_some_and(|&b| {
              !b.is_ascii_whitespace()
                && !matches!(b, b'"' | b'\'' | b'=' | b'<' | b'>' | b'`')
            }) {
              i += 1;
            }
            if i == value_start {
              return None;
            }
            AttrValue::Text(&s[value_start..i])
          },
        };
        attrs.push(Attribute {
          name: attr_name,
          value,
        });
      },
    }
  }
}

fn skip_whitespace(bytes: &[u8], mut i: usize) -> usize {
  while bytes.get(i).is_some_and(u8::is_ascii_whitespace) {
    i += 1;
  }
  i
}

/// Index just past the `}` matching the `{` at `start`, skipping string and
/// template literals.
fn scan_braces(bytes: &[u8], start: usize) -> Option<usize> {
  let mut depth = 0usize;
  let mut i = start;
  let mut quote: Option<u8> = None;

  while let Some(&b) = bytes.get(i) {
    if let Some(q) = quote {
      if b == b'\\' {
        i += 1;
      } else if b == q {
        quote = None;
      }
    } else {
      match b {
        b'"' | b'\'' | b'`' => quote = Some(b),
        b'{' => depth += 1,
        b'}' => {
          depth -= 1;
          if depth == 0 {
            return Some(i + 1);
          }
        },
        _ => {},
      }
    }
    i += 1;
  }
  None
}

/// Find the closing tag of a raw text element (`</script>`), returning the
/// index just past it.
fn raw_text_end(s: &str, from: usize, name: &str) -> Option<usize> {
  let lower = s[from..].to_ascii_lowercase();
  let needle = format!("</{}", name.to_ascii_lowercase());
  let mut search = 0;
  while let Some(pos) = lower[search..].find(&needle) {
    let at = from + search + pos;
    if let Some(tag) = scan_tag(&s[at..]) {
      return Some(at + tag.raw.len());
    }
    search += pos + needle.len();
  }
  None
}

/// Split a raw fragment into text, tags, comments and stray `<` characters.
#[must_use]
pub fn tokenize(s: &str) -> Vec<Token<'_>> {
  let mut tokens = Vec::new();
  let mut pos = 0;
  let mut text_start = 0;

  while let Some(rel) = s[pos..].find('<') {
    let at = pos + rel;
    let rest = &s[at..];

    let (token, len) = if rest.starts_with("<!--") {
      match scan_comment(rest) {
        Some(len) => (Token::Comment(&rest[..len]), len),
        None => (Token::Stray(&rest[..1]), 1),
      }
    } else if let Some(tag) = scan_tag(rest) {
      let len = tag.raw.len();
      (Token::Tag(tag), len)
    } else {
      (Token::Stray(&rest[..1]), 1)
    };

    if at > text_start {
      tokens.push(Token::Text(&s[text_start..at]));
    }
    pos = at + len;

    // The body of <script> and friends is text up to its closing tag.
    let raw_body = match &token {
      Token::Tag(tag) if !tag.is_standalone() && is_raw_text_element(tag.name) => {
        Some(tag.name)
      },
      _ => None,
    };
    tokens.push(token);

    if let Some(name) = raw_body {
      let close_start = raw_text_end(s, pos, name)
        .map_or(s.len(), |end| end - close_tag_len(&s[..end]));
      if close_start > pos {
        tokens.push(Token::Text(&s[pos..close_start]));
      }
      pos = close_start;
    }
    text_start = pos;
  }

  if text_start < s.len() {
    tokens.push(Token::Text(&s[text_start..]));
  }
  tokens
}

/// Length of the closing tag that ends `s`.
fn close_tag_len(s: &str) -> usize {
  s.rfind("</").map_or(0, |start| s.len() - start)
}

/// How far a raw block starting at the beginning of `s` extends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extent {
  /// Byte length of the element (not including the rest of its last line).
  pub len:        usize,
  /// `false` when the element runs to the end of input unclosed.
  pub terminated: bool,
}

/// Find the end of the element or comment that starts `s`.
///
/// Nested elements with the same name are balanced; void and self-closing
/// tags end at their own `>`.
#[must_use]
pub fn element_extent(s: &str) -> Extent {
  let unterminated = Extent {
    len:        s.len(),
    terminated: false,
  };

  if s.starts_with("<!--") {
    return scan_comment(s).map_or(unterminated, |len| {
      Extent {
        len,
        terminated: true,
      }
    });
  }

  let Some(open) = scan_tag(s) else {
    return unterminated;
  };
  if open.is_standalone() {
    return Extent {
      len:        open.raw.len(),
      terminated: true,
    };
  }
  if is_raw_text_element(open.name) {
    return raw_text_end(s, open.raw.len(), open.name).map_or(
      unterminated,
      |len| {
        Extent {
          len,
          terminated: true,
        }
      },
    );
  }

  let mut depth = 1usize;
  let mut pos = open.raw.len();
  while let Some(rel) = s[pos..].find('<') {
    let at = pos + rel;
    let rest = &s[at..];
    if let Some(len) = scan_comment(rest) {
      pos = at + len;
      continue;
    }
    let Some(tag) = scan_tag(rest) else {
      pos = at + 1;
      continue;
    };
    pos = at + tag.raw.len();

    if !tag.closing && !tag.is_standalone() && is_raw_text_element(tag.name) {
      match raw_text_end(s, pos, tag.name) {
        Some(end) => pos = end,
        None => return unterminated,
      }
      continue;
    }

    if tag.name.eq_ignore_ascii_case(open.name) {
      if tag.closing {
        depth -= 1;
        if depth == 0 {
          return Extent {
            len:        pos,
            terminated: true,
          };
        }
      } else if !tag.self_closing {
        depth += 1;
      }
    }
  }

  unterminated
}
