//! Syntect-based syntax highlighting backend enhanced with two-face.
//!
//! Syntect parses code with Sublime Text grammars (two-face contributes the
//! extended grammar set) and reports a scope stack for every span. The scopes
//! are folded into the same categories the built-in highlighter uses, so both
//! backends render through the same `tok-*` classes.

use std::sync::OnceLock;

use syntect::{
  easy::ScopeRegionIterator,
  parsing::{ParseState, ScopeStack, SyntaxSet},
  util::LinesWithEndings,
};

use super::{
  error::{SyntaxError, SyntaxResult},
  types::{
    SyntaxConfig,
    SyntaxHighlighter,
    SyntaxManager,
    Token,
    TokenCategory,
    push_token,
  },
};

/// Syntect-based syntax highlighter
#[derive(Debug, Default, Clone, Copy)]
pub struct SyntectHighlighter;

impl SyntectHighlighter {
  /// Get the syntect `SyntaxSet`.
  fn syntax_set() -> &'static SyntaxSet {
    static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
    SYNTAX_SET.get_or_init(two_face::syntax::extra_newlines)
  }
}

impl SyntaxHighlighter for SyntectHighlighter {
  fn name(&self) -> &'static str {
    "Syntect"
  }

  fn supported_languages(&self) -> Vec<String> {
    Self::syntax_set()
      .syntaxes()
      .iter()
      .flat_map(|syntax| {
        std::iter::once(syntax.name.to_lowercase())
          .chain(syntax.file_extensions.iter().map(|ext| ext.to_lowercase()))
      })
      .collect()
  }

  fn supports_language(&self, language: &str) -> bool {
    Self::syntax_set().find_syntax_by_token(language).is_some()
  }

  fn tokenize(&self, code: &str, language: &str) -> SyntaxResult<Vec<Token>> {
    let syntax_set = Self::syntax_set();
    let syntax = syntax_set
      .find_syntax_by_token(language)
      .ok_or_else(|| SyntaxError::UnsupportedLanguage(language.to_string()))?;

    let mut state = ParseState::new(syntax);
    let mut stack = ScopeStack::new();
    let mut tokens = Vec::new();

    for line in LinesWithEndings::from(code) {
      let ops = state
        .parse_line(line, syntax_set)
        .map_err(|e| SyntaxError::HighlightingFailed(e.to_string()))?;
      for (region, op) in ScopeRegionIterator::new(&ops, line) {
        stack
          .apply(op)
          .map_err(|e| SyntaxError::HighlightingFailed(format!("{e:?}")))?;
        push_token(&mut tokens, region, category_for(&stack));
      }
    }

    Ok(tokens)
  }
}

/// Fold a scope stack into a token category.
///
/// Comments and strings win over anything nested inside them; otherwise the
/// innermost recognized scope decides.
fn category_for(stack: &ScopeStack) -> TokenCategory {
  let names: Vec<String> = stack
    .as_slice()
    .iter()
    .map(syntect::parsing::Scope::build_string)
    .collect();

  if names.iter().any(|n| n.starts_with("comment")) {
    return TokenCategory::Comment;
  }
  if names.iter().any(|n| n.starts_with("string")) {
    return TokenCategory::String;
  }

  for name in names.iter().rev() {
    if name.starts_with("keyword.operator") {
      return TokenCategory::Punctuation;
    }
    match name.split('.').next() {
      Some("constant") => return TokenCategory::Literal,
      Some("keyword" | "storage") => return TokenCategory::Keyword,
      Some("punctuation") => return TokenCategory::Punctuation,
      Some("entity" | "variable" | "support") => {
        return TokenCategory::Identifier;
      },
      _ => {},
    }
  }
  TokenCategory::Plain
}

/// Create a Syntect-based syntax manager with configuration
#[must_use]
pub fn create_syntect_manager() -> SyntaxManager {
  SyntaxManager::new(Box::new(SyntectHighlighter), SyntaxConfig::default())
}
