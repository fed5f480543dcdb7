//! Errors and warnings reported by the ingestion pipeline.
use serde::{Deserialize, Serialize};

/// Result type for ingestion operations.
pub type IngestResult<T> = Result<T, IngestError>;

/// Fatal errors. Each aborts ingestion of a single document only.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IngestError {
  #[error(
    "Malformed frontmatter: opening delimiter on line {line} has no closing \
     delimiter"
  )]
  MalformedFrontmatter { line: usize },

  #[error("Internal error while processing document: {0}")]
  Internal(String),
}

/// Non-fatal issues. Processing continues with the documented fallback.
#[derive(
  Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error,
)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
  #[error("Unknown code block language '{language}', rendered as plain text")]
  UnknownLanguage { language: String },

  #[error("Unterminated {block} starting on line {line} runs to end of document")]
  UnterminatedBlock { block: BlockKind, line: usize },

  #[error("Disallowed tag neutralized: <{tag}>")]
  DisallowedTag { tag: String },

  #[error("Dropped attribute '{attribute}' on <{tag}>")]
  DroppedAttribute { tag: String, attribute: String },

  #[error("Asset reference '{reference}' escapes the asset root")]
  PathEscape { reference: String },

  #[error("Ignored frontmatter line {line}: {text}")]
  FrontmatterLineIgnored { line: usize, text: String },

  #[error("Hard tabs found in code block starting on line {line}")]
  HardTabs { line: usize },
}

/// Which block construct a [`Warning::UnterminatedBlock`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
  Fence,
  RawMarkup,
}

impl std::fmt::Display for BlockKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Fence => f.write_str("code fence"),
      Self::RawMarkup => f.write_str("raw markup block"),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_warning_messages() {
    let w = Warning::UnterminatedBlock {
      block: BlockKind::Fence,
      line:  3,
    };
    assert_eq!(
      w.to_string(),
      "Unterminated code fence starting on line 3 runs to end of document"
    );

    let w = Warning::DisallowedTag {
      tag: "script".to_string(),
    };
    assert_eq!(w.to_string(), "Disallowed tag neutralized: <script>");
  }

  #[test]
  fn test_warning_serializes_with_kind_tag() {
    let w = Warning::UnknownLanguage {
      language: "cobol".to_string(),
    };
    let json = serde_json::to_string(&w).expect("Failed to serialize warning");
    assert_eq!(json, r#"{"kind":"unknown_language","language":"cobol"}"#);
  }
}
