//! Frontmatter extraction.
//!
//! A document may open with a `---` delimited metadata block written in a
//! restricted YAML-like grammar: `key: value` scalars (bare, `"double"` or
//! `'single'` quoted), flow lists (`[a, b]`), block lists (indented `- item`
//! lines under an empty key) and comma-separated `tags`. Dates are kept as
//! opaque strings. Anything else is skipped with a warning.
use indexmap::IndexMap;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::{
  error::{IngestError, IngestResult, Warning},
  utils::slugify,
};

/// Keys whose unquoted values are split on commas.
const COMMA_LIST_KEYS: &[&str] = &["tags"];

/// A single frontmatter value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FrontmatterValue {
  String(String),
  List(Vec<String>),
}

impl FrontmatterValue {
  /// The scalar value, if this is one.
  #[must_use]
  pub fn as_str(&self) -> Option<&str> {
    match self {
      Self::String(s) => Some(s),
      Self::List(_) => None,
    }
  }
}

/// Document metadata in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Frontmatter {
  entries: IndexMap<String, FrontmatterValue>,
}

impl Frontmatter {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// Insert or replace a value, keeping the original position of the key.
  pub fn insert(&mut self, key: impl Into<String>, value: FrontmatterValue) {
    self.entries.insert(key.into(), value);
  }

  #[must_use]
  pub fn get(&self, key: &str) -> Option<&FrontmatterValue> {
    self.entries.get(key)
  }

  /// A scalar value by key. Lists yield `None`.
  #[must_use]
  pub fn get_str(&self, key: &str) -> Option<&str> {
    self.get(key).and_then(FrontmatterValue::as_str)
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  #[must_use]
  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &FrontmatterValue)> {
    self.entries.iter().map(|(k, v)| (k.as_str(), v))
  }

  #[must_use]
  pub fn title(&self) -> Option<&str> {
    self.get_str("title").filter(|t| !t.trim().is_empty())
  }

  /// The declared slug, or one derived from the title.
  #[must_use]
  pub fn slug(&self) -> Option<String> {
    self
      .get_str("slug")
      .map(str::trim)
      .filter(|s| !s.is_empty())
      .map(str::to_string)
      .or_else(|| self.title().map(slugify).filter(|s| !s.is_empty()))
  }

  /// Tags, accepting either a list or a single comma-separated string.
  #[must_use]
  pub fn tags(&self) -> Vec<String> {
    match self.get("tags") {
      Some(FrontmatterValue::List(items)) => items.clone(),
      Some(FrontmatterValue::String(s)) => split_comma_list(s),
      None => Vec::new(),
    }
  }

  #[must_use]
  pub fn cover(&self) -> Option<&str> {
    self.get_str("cover").filter(|c| !c.is_empty())
  }

  /// Publication date as written; never parsed into a calendar type.
  #[must_use]
  pub fn date_published(&self) -> Option<&str> {
    self.get_str("datePublished")
  }

  #[must_use]
  pub fn canonical_url(&self) -> Option<&str> {
    self.get_str("canonical_url").filter(|c| !c.is_empty())
  }

  /// Serialize into a delimited block that [`extract`] reads back unchanged.
  #[must_use]
  pub fn serialize(&self) -> String {
    let mut out = String::from("---\n");
    for (key, value) in &self.entries {
      let rendered = match value {
        FrontmatterValue::String(s) => quote(s),
        FrontmatterValue::List(items) => {
          let items: Vec<String> =
            items.iter().map(String::as_str).map(quote).collect();
          format!("[{}]", items.join(", "))
        },
      };
      out.push_str(key);
      out.push_str(": ");
      out.push_str(&rendered);
      out.push('\n');
    }
    out.push_str("---\n");
    out
  }
}

/// Output of [`extract`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted<'a> {
  pub frontmatter: Frontmatter,
  /// Everything after the closing delimiter line.
  pub body:        &'a str,
  /// 1-based line number of the first body line in the original text.
  pub body_line:   usize,
  pub warnings:    Vec<Warning>,
}

/// Split a raw document into frontmatter and body.
///
/// # Errors
///
/// Returns [`IngestError::MalformedFrontmatter`] if the opening delimiter has
/// no matching closing delimiter.
pub fn extract(raw: &str) -> IngestResult<Extracted<'_>> {
  let text = raw.strip_prefix('\u{feff}').unwrap_or(raw);

  let mut lines = text.split_inclusive('\n');
  let is_open = lines
    .next()
    .is_some_and(|first| trim_newline(first).trim_end() == "---");
  if !is_open {
    return Ok(Extracted {
      frontmatter: Frontmatter::default(),
      body:        text,
      body_line:   1,
      warnings:    Vec::new(),
    });
  }

  let mut offset = text.find('\n').map_or(text.len(), |i| i + 1);
  let mut block = Vec::new();
  let mut closed_at = None;
  for (idx, line) in lines.enumerate() {
    let line_no = idx + 2;
    offset += line.len();
    let content = trim_newline(line);
    if matches!(content.trim_end(), "---" | "...") {
      closed_at = Some(line_no);
      break;
    }
    block.push((line_no, content));
  }

  let Some(close_line) = closed_at else {
    warn!("Frontmatter opened on line 1 is never closed");
    return Err(IngestError::MalformedFrontmatter { line: 1 });
  };

  let mut warnings = Vec::new();
  let frontmatter = parse_block(&block, &mut warnings);
  debug!(
    "Extracted {} frontmatter entries ({} lines)",
    frontmatter.len(),
    block.len()
  );

  Ok(Extracted {
    frontmatter,
    body: &text[offset.min(text.len())..],
    body_line: close_line + 1,
    warnings,
  })
}

fn trim_newline(line: &str) -> &str {
  line.strip_suffix('\n').map_or(line, |l| l.strip_suffix('\r').unwrap_or(l))
}

fn parse_block(
  lines: &[(usize, &str)],
  warnings: &mut Vec<Warning>,
) -> Frontmatter {
  let mut fm = Frontmatter::new();
  let mut i = 0;

  while i < lines.len() {
    let (line_no, line) = lines[i];
    i += 1;

    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
      continue;
    }

    let Some((key, value)) = split_key(line) else {
      warnings.push(Warning::FrontmatterLineIgnored {
        line: line_no,
        text: trimmed.to_string(),
      });
      continue;
    };

    let value = value.trim();
    let parsed = if value.is_empty() {
      let mut items = Vec::new();
      while let Some(item) = lines.get(i).and_then(|(_, l)| block_list_item(l))
      {
        items.push(parse_scalar(item));
        i += 1;
      }
      if items.is_empty() {
        FrontmatterValue::String(String::new())
      } else {
        FrontmatterValue::List(items)
      }
    } else if value.starts_with('[') && value.ends_with(']') {
      FrontmatterValue::List(parse_flow_list(&value[1..value.len() - 1]))
    } else if COMMA_LIST_KEYS.contains(&key) && !is_quoted(value) {
      FrontmatterValue::List(split_comma_list(strip_comment(value)))
    } else {
      FrontmatterValue::String(parse_scalar(value))
    };

    fm.insert(key, parsed);
  }

  fm
}

/// `key: rest` at column zero, where key is `[A-Za-z0-9_-]+`.
fn split_key(line: &str) -> Option<(&str, &str)> {
  let (key, rest) = line.split_once(':')?;
  let valid_key = !key.is_empty()
    && key
      .chars()
      .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
  let valid_rest = rest.is_empty() || rest.starts_with([' ', '\t']);
  (valid_key && valid_rest).then_some((key, rest))
}

fn block_list_item(line: &str) -> Option<&str> {
  let trimmed = line.trim_start();
  if trimmed == "-" {
    return Some("");
  }
  trimmed.strip_prefix("- ").map(str::trim)
}

fn is_quoted(value: &str) -> bool {
  value.len() >= 2
    && ((value.starts_with('"') && value.ends_with('"'))
      || (value.starts_with('\'') && value.ends_with('\'')))
}

/// Strip a trailing ` # comment` from a bare value.
fn strip_comment(value: &str) -> &str {
  value.find(" #").map_or(value, |idx| value[..idx].trim_end())
}

fn parse_scalar(value: &str) -> String {
  let value = value.trim();
  let value = if is_quoted(value) {
    value
  } else {
    strip_comment(value)
  };
  if is_quoted(value) {
    let inner = &value[1..value.len() - 1];
    if value.starts_with('"') {
      unescape_double(inner)
    } else {
      inner.replace("''", "'")
    }
  } else {
    value.to_string()
  }
}

fn unescape_double(inner: &str) -> String {
  let mut out = String::with_capacity(inner.len());
  let mut chars = inner.chars();
  while let Some(c) = chars.next() {
    if c != '\\' {
      out.push(c);
      continue;
    }
    match chars.next() {
      Some('n') => out.push('\n'),
      Some('t') => out.push('\t'),
      Some('r') => out.push('\r'),
      Some(other) => out.push(other),
      None => out.push('\\'),
    }
  }
  out
}

fn quote(value: &str) -> String {
  let mut out = String::with_capacity(value.len() + 2);
  out.push('"');
  for c in value.chars() {
    match c {
      '"' => out.push_str("\\\""),
      '\\' => out.push_str("\\\\"),
      '\n' => out.push_str("\\n"),
      '\t' => out.push_str("\\t"),
      '\r' => out.push_str("\\r"),
      other => out.push(other),
    }
  }
  out.push('"');
  out
}

/// Split the inside of a `[...]` flow list, respecting quotes.
fn parse_flow_list(inner: &str) -> Vec<String> {
  let mut items = Vec::new();
  let mut current = String::new();
  let mut quote_char: Option<char> = None;
  let mut escaped = false;

  for c in inner.chars() {
    match quote_char {
      Some(q) => {
        current.push(c);
        if escaped {
          escaped = false;
        } else if c == '\\' && q == '"' {
          escaped = true;
        } else if c == q {
          quote_char = None;
        }
      },
      None => {
        match c {
          '"' | '\'' => {
            quote_char = Some(c);
            current.push(c);
          },
          ',' => {
            items.push(std::mem::take(&mut current));
          },
          _ => current.push(c),
        }
      },
    }
  }
  items.push(current);

  items
    .iter()
    .map(|item| item.trim())
    .filter(|item| !item.is_empty())
    .map(parse_scalar)
    .collect()
}

fn split_comma_list(value: &str) -> Vec<String> {
  value
    .split(',')
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(str::to_string)
    .collect()
}
