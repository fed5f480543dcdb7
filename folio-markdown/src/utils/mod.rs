pub mod codeblock;

use std::path::{Path, PathBuf};

use log::trace;
use walkdir::WalkDir;

use crate::types::InlineNode;

/// File extensions treated as post sources.
pub const POST_EXTENSIONS: &[&str] = &["md", "mdx", "markdown"];

/// Slugify a string for use as a URL slug or anchor ID.
///
/// Lowercases, replaces every run of non-alphanumeric characters with a single
/// dash and trims leading/trailing dashes.
#[must_use]
pub fn slugify(text: &str) -> String {
  let mut slug = String::with_capacity(text.len());
  let mut pending_dash = false;
  for c in text.chars().flat_map(char::to_lowercase) {
    if c.is_alphanumeric() {
      if pending_dash && !slug.is_empty() {
        slug.push('-');
      }
      pending_dash = false;
      slug.push(c);
    } else {
      pending_dash = true;
    }
  }
  slug
}

/// Escape text for HTML output while keeping valid entity references intact.
///
/// Keeping `&amp;`, `&#39;` and friends as written is what makes rendering
/// idempotent: escaped output parsed again yields the same text.
#[must_use]
pub fn escape_text(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  for (idx, c) in text.char_indices() {
    match c {
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '&' if entity_len(&text[idx..]).is_none() => out.push_str("&amp;"),
      other => out.push(other),
    }
  }
  out
}

/// Escape a value for a double-quoted attribute, keeping entity references.
#[must_use]
pub fn escape_attr(value: &str) -> String {
  let mut out = String::with_capacity(value.len());
  for (idx, c) in value.char_indices() {
    match c {
      '"' => out.push_str("&quot;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '&' if entity_len(&value[idx..]).is_none() => out.push_str("&amp;"),
      other => out.push(other),
    }
  }
  out
}

/// Length of the entity reference at the start of `s` (`&name;`, `&#123;`,
/// `&#x1F;`), if there is one.
#[must_use]
pub fn entity_len(s: &str) -> Option<usize> {
  let rest = s.strip_prefix('&')?;
  let end = rest.find(';')?;
  let body = &rest[..end];
  let valid = if let Some(num) = body.strip_prefix('#') {
    if let Some(hex) = num.strip_prefix(['x', 'X']) {
      (1..=6).contains(&hex.len()) && hex.chars().all(|c| c.is_ascii_hexdigit())
    } else {
      (1..=7).contains(&num.len()) && num.chars().all(|c| c.is_ascii_digit())
    }
  } else {
    (1..=32).contains(&body.len())
      && body.starts_with(|c: char| c.is_ascii_alphabetic())
      && body.chars().all(|c| c.is_ascii_alphanumeric())
  };
  valid.then_some(end + 2)
}

/// Concatenate the plain text of inline nodes, dropping formatting and raw
/// markup.
#[must_use]
pub fn inline_text(nodes: &[InlineNode]) -> String {
  let mut text = String::new();
  push_inline_text(nodes, &mut text);
  text
}

fn push_inline_text(nodes: &[InlineNode], out: &mut String) {
  for node in nodes {
    match node {
      InlineNode::Text { text } | InlineNode::InlineCode { text } => {
        out.push_str(text);
      },
      InlineNode::Emphasis { children }
      | InlineNode::Strong { children }
      | InlineNode::Link { children, .. } => push_inline_text(children, out),
      InlineNode::InlineImage { alt, .. } => out.push_str(alt),
      InlineNode::LineBreak => out.push(' '),
      InlineNode::RawInline { .. } => {},
    }
  }
}

/// Collect all post sources below `input_dir`, sorted for deterministic
/// output.
#[must_use]
pub fn collect_markdown_files(input_dir: &Path) -> Vec<PathBuf> {
  let mut files: Vec<PathBuf> = WalkDir::new(input_dir)
    .follow_links(true)
    .into_iter()
    .filter_map(Result::ok)
    .filter(|entry| entry.file_type().is_file())
    .map(walkdir::DirEntry::into_path)
    .filter(|path| {
      path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| POST_EXTENSIONS.contains(&ext))
    })
    .collect();
  files.sort();

  trace!("Found {} post files to process", files.len());
  files
}

/// Create a regex that never matches anything.
///
/// Used as a fallback when a pattern fails to compile.
#[must_use]
pub fn never_matching_regex() -> regex::Regex {
  regex::Regex::new(r"[^\s\S]").unwrap_or_else(|_| {
    #[allow(
      clippy::expect_used,
      reason = "This pattern is guaranteed to be valid"
    )]
    regex::Regex::new(r"^\b$").expect("regex pattern ^\\b$ should compile")
  })
}
