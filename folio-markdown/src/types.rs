//! Document model produced by the parser and consumed by the renderer.
//!
//! Every node is built once while a document is parsed and never mutated
//! afterwards. A [`Document`] exclusively owns its tree; nothing is shared
//! between documents.
use serde::{Deserialize, Serialize};

use crate::{error::Warning, frontmatter::Frontmatter};

/// A parsed post: metadata plus the ordered block tree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Document {
  /// Metadata extracted from the frontmatter block.
  pub metadata: Frontmatter,

  /// Top-level blocks in source order.
  pub body: Vec<BlockNode>,

  /// Non-fatal issues found while parsing.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub warnings: Vec<Warning>,
}

impl Document {
  /// Slug declared in the frontmatter, or derived from the title.
  #[must_use]
  pub fn slug(&self) -> Option<String> {
    self.metadata.slug()
  }

  /// The frontmatter title, falling back to the first level-1 heading.
  #[must_use]
  pub fn title(&self) -> Option<String> {
    self.metadata.title().map(str::to_string).or_else(|| {
      self.body.iter().find_map(|block| {
        match block {
          BlockNode::Heading { level: 1, content, .. } => {
            Some(crate::utils::inline_text(content))
          },
          _ => None,
        }
      })
    })
  }
}

/// Block-level node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockNode {
  Heading {
    level:   u8,
    content: Vec<InlineNode>,
    /// Explicit anchor written as a trailing `{#id}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id:      Option<String>,
  },
  Paragraph {
    content: Vec<InlineNode>,
  },
  FencedCode {
    language: Option<String>,
    text:     String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    meta:     Option<String>,
  },
  BlockQuote {
    blocks: Vec<BlockNode>,
  },
  List {
    ordered: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    start:   Option<u64>,
    tight:   bool,
    items:   Vec<Vec<BlockNode>>,
  },
  Image {
    alt:    String,
    source: SourceRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    title:  Option<String>,
  },
  RawMarkup {
    text: String,
    kind: RawKind,
  },
  ThematicBreak,
  Table {
    alignments: Vec<Alignment>,
    header:     Vec<Vec<InlineNode>>,
    rows:       Vec<Vec<Vec<InlineNode>>>,
  },
}

/// Inline-level node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InlineNode {
  Text {
    text: String,
  },
  Emphasis {
    children: Vec<InlineNode>,
  },
  Strong {
    children: Vec<InlineNode>,
  },
  InlineCode {
    text: String,
  },
  Link {
    children: Vec<InlineNode>,
    dest:     SourceRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    title:    Option<String>,
  },
  InlineImage {
    alt:    String,
    source: SourceRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    title:  Option<String>,
  },
  RawInline {
    text: String,
  },
  LineBreak,
}

impl InlineNode {
  /// Shorthand for a text node.
  pub fn text(text: impl Into<String>) -> Self {
    Self::Text { text: text.into() }
  }
}

/// Flavour of an embedded raw fragment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RawKind {
  Html,
  Jsx,
}

/// Column alignment of a pipe table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
  #[default]
  None,
  Left,
  Center,
  Right,
}

impl Alignment {
  /// Value for the `align` attribute, if any.
  #[must_use]
  pub const fn as_attr(self) -> Option<&'static str> {
    match self {
      Self::None => None,
      Self::Left => Some("left"),
      Self::Center => Some("center"),
      Self::Right => Some("right"),
    }
  }
}

/// A reference to an image or link target, as written in the source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SourceRef {
  /// A fully qualified reference: has a scheme, is protocol-relative
  /// (`//host/...`) or only names a fragment (`#id`).
  Absolute(String),
  /// A path inside the content repository.
  RepoRelative(String),
}

impl SourceRef {
  /// Classify a raw destination string.
  #[must_use]
  pub fn parse(raw: &str) -> Self {
    let raw = raw.trim();
    if raw.starts_with('#') || raw.starts_with("//") || has_scheme(raw) {
      Self::Absolute(raw.to_string())
    } else {
      Self::RepoRelative(raw.to_string())
    }
  }

  /// The reference text as written.
  #[must_use]
  pub fn as_str(&self) -> &str {
    match self {
      Self::Absolute(s) | Self::RepoRelative(s) => s,
    }
  }
}

/// `scheme ":"` where scheme is `ALPHA *( ALPHA / DIGIT / "+" / "-" / "." )`.
///
/// Single-letter schemes are rejected so Windows drive paths stay relative.
fn has_scheme(raw: &str) -> bool {
  let Some((scheme, _)) = raw.split_once(':') else {
    return false;
  };
  let mut chars = scheme.chars();
  scheme.len() > 1
    && chars.next().is_some_and(|c| c.is_ascii_alphabetic())
    && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// A heading collected for navigation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Header {
  /// Heading text with inline formatting removed.
  pub text:  String,
  /// Heading level (1-6).
  pub level: u8,
  /// Anchor id emitted on the heading element.
  pub id:    String,
}

/// Result of rendering one document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rendered {
  /// Sanitized HTML fragment.
  pub html: String,

  /// Headings in document order.
  pub headers: Vec<Header>,

  /// Title from the frontmatter or the first level-1 heading.
  pub title: Option<String>,

  /// Declared or derived slug.
  pub slug: Option<String>,

  /// Resolved cover image URL, if the frontmatter names one.
  pub cover: Option<String>,

  /// The frontmatter as parsed.
  pub metadata: Frontmatter,

  /// Parse and render warnings, in the order they were found.
  pub warnings: Vec<Warning>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_source_ref_classification() {
    assert_eq!(
      SourceRef::parse("https://cdn.example.com/a.png"),
      SourceRef::Absolute("https://cdn.example.com/a.png".to_string())
    );
    assert_eq!(
      SourceRef::parse("mailto:me@example.com"),
      SourceRef::Absolute("mailto:me@example.com".to_string())
    );
    assert_eq!(
      SourceRef::parse("#section"),
      SourceRef::Absolute("#section".to_string())
    );
    assert_eq!(
      SourceRef::parse("//cdn.example.com/x.png"),
      SourceRef::Absolute("//cdn.example.com/x.png".to_string())
    );
    assert_eq!(
      SourceRef::parse("./images/cover.png"),
      SourceRef::RepoRelative("./images/cover.png".to_string())
    );
    assert_eq!(
      SourceRef::parse("C:/images/x.png"),
      SourceRef::RepoRelative("C:/images/x.png".to_string())
    );
  }

  #[test]
  fn test_source_ref_path_with_colon_is_relative() {
    assert_eq!(
      SourceRef::parse("images/a:b.png"),
      SourceRef::RepoRelative("images/a:b.png".to_string())
    );
  }
}
