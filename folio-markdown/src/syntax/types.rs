//! Core types and traits for syntax highlighting.

use std::collections::HashMap;

use log::warn;
use serde::{Deserialize, Serialize};

use super::error::{SyntaxError, SyntaxResult};

/// Semantic category of a highlighted span.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum TokenCategory {
  Keyword,
  String,
  Comment,
  Punctuation,
  Identifier,
  Literal,
  Plain,
}

impl TokenCategory {
  /// Name used in CSS classes (`tok-keyword`).
  #[must_use]
  pub const fn as_str(self) -> &'static str {
    match self {
      Self::Keyword => "keyword",
      Self::String => "string",
      Self::Comment => "comment",
      Self::Punctuation => "punctuation",
      Self::Identifier => "identifier",
      Self::Literal => "literal",
      Self::Plain => "plain",
    }
  }
}

/// A highlighted span of source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
  pub text:     String,
  pub category: TokenCategory,
}

impl Token {
  pub fn new(text: impl Into<String>, category: TokenCategory) -> Self {
    Self {
      text: text.into(),
      category,
    }
  }
}

/// Push a span, merging it into the previous one when the category matches.
pub(crate) fn push_token(
  tokens: &mut Vec<Token>,
  text: &str,
  category: TokenCategory,
) {
  if text.is_empty() {
    return;
  }
  match tokens.last_mut() {
    Some(last) if last.category == category => last.text.push_str(text),
    _ => tokens.push(Token::new(text, category)),
  }
}

/// Trait for syntax highlighting backends.
///
/// Implementations must be pure: the same `(code, language)` pair always
/// yields the same token sequence, and code is never evaluated.
pub trait SyntaxHighlighter: Send + Sync {
  /// Get the name of this highlighter backend
  fn name(&self) -> &'static str;

  /// Get a list of supported languages
  fn supported_languages(&self) -> Vec<String>;

  /// Check if a language is supported
  fn supports_language(&self, language: &str) -> bool {
    self
      .supported_languages()
      .iter()
      .any(|lang| lang.eq_ignore_ascii_case(language))
  }

  /// Split code into categorized spans.
  ///
  /// # Errors
  ///
  /// Returns an error if the language is not supported or the backend fails.
  fn tokenize(&self, code: &str, language: &str) -> SyntaxResult<Vec<Token>>;
}

/// Configuration for syntax highlighting
#[derive(Debug, Clone)]
pub struct SyntaxConfig {
  /// Language aliases for mapping common names to supported languages
  pub language_aliases: HashMap<String, String>,

  /// Whether to fall back to plain text for unsupported languages
  pub fallback_to_plain: bool,
}

impl Default for SyntaxConfig {
  fn default() -> Self {
    let aliases = [
      ("js", "javascript"),
      ("jsx", "javascript"),
      ("mjs", "javascript"),
      ("cjs", "javascript"),
      ("ts", "typescript"),
      ("tsx", "typescript"),
      ("mts", "typescript"),
      ("cts", "typescript"),
      ("py", "python"),
      ("sh", "bash"),
      ("shell", "bash"),
      ("zsh", "bash"),
      ("console", "bash"),
      ("yml", "yaml"),
      ("jsonc", "json"),
      ("json5", "json"),
      ("rs", "rust"),
    ];
    let language_aliases = aliases
      .into_iter()
      .map(|(alias, lang)| (alias.to_string(), lang.to_string()))
      .collect();

    Self {
      language_aliases,
      fallback_to_plain: true,
    }
  }
}

/// Output of [`SyntaxManager::highlight`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Highlighted {
  /// Language the code was highlighted as, after alias resolution. `None`
  /// when the code was rendered as plain text.
  pub language: Option<String>,
  pub tokens:   Vec<Token>,
}

/// High-level syntax highlighting manager.
///
/// Wraps a backend with alias resolution and the plain-text fallback.
pub struct SyntaxManager {
  highlighter: Box<dyn SyntaxHighlighter>,
  config:      SyntaxConfig,
}

impl std::fmt::Debug for SyntaxManager {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SyntaxManager")
      .field("highlighter", &self.highlighter.name())
      .field("config", &self.config)
      .finish()
  }
}

impl SyntaxManager {
  /// Create a new syntax manager with the given highlighter and config
  #[must_use]
  pub fn new(
    highlighter: Box<dyn SyntaxHighlighter>,
    config: SyntaxConfig,
  ) -> Self {
    Self {
      highlighter,
      config,
    }
  }

  /// Create a new syntax manager with the default configuration
  #[must_use]
  pub fn with_highlighter(highlighter: Box<dyn SyntaxHighlighter>) -> Self {
    Self::new(highlighter, SyntaxConfig::default())
  }

  /// Get the underlying highlighter
  #[must_use]
  pub fn highlighter(&self) -> &dyn SyntaxHighlighter {
    self.highlighter.as_ref()
  }

  /// Get the configuration
  #[must_use]
  pub const fn config(&self) -> &SyntaxConfig {
    &self.config
  }

  /// Resolve a language name using aliases. Matching is case-insensitive.
  #[must_use]
  pub fn resolve_language(&self, language: &str) -> String {
    let lower = language.to_ascii_lowercase();
    self
      .config
      .language_aliases
      .get(&lower)
      .cloned()
      .unwrap_or(lower)
  }

  /// Tokenize code strictly, without the plain-text fallback.
  ///
  /// # Errors
  ///
  /// Returns [`SyntaxError::UnsupportedLanguage`] for unknown languages and
  /// propagates backend failures.
  pub fn tokenize(
    &self,
    code: &str,
    language: &str,
  ) -> SyntaxResult<Vec<Token>> {
    let resolved = self.resolve_language(language);
    if !self.highlighter.supports_language(&resolved) {
      return Err(SyntaxError::UnsupportedLanguage(resolved));
    }
    self.highlighter.tokenize(code, &resolved)
  }

  /// Highlight code, falling back to a single plain span when the language is
  /// absent or unsupported (and fallback is enabled), or when the backend
  /// fails.
  #[must_use]
  pub fn highlight(&self, code: &str, language: Option<&str>) -> Highlighted {
    let Some(language) = language.filter(|l| !l.is_empty()) else {
      return plain(code);
    };

    match self.tokenize(code, language) {
      Ok(tokens) => {
        Highlighted {
          language: Some(self.resolve_language(language)),
          tokens,
        }
      },
      Err(SyntaxError::UnsupportedLanguage(_)) if self.config.fallback_to_plain => {
        plain(code)
      },
      Err(e) => {
        warn!("Falling back to plain text for '{language}': {e}");
        plain(code)
      },
    }
  }
}

fn plain(code: &str) -> Highlighted {
  Highlighted {
    language: None,
    tokens:   vec![Token::new(code, TokenCategory::Plain)],
  }
}
