//! Provides a trait-based architecture for syntax highlighting that allows
//! multiple backends to be plugged in.
//! Currently supported backends:
//! - **Builtin** - Table-driven lexer for the languages common in technical
//!   posts, always available
//! - **Syntect** - Uses Sublime Text syntax definitions, with two-face added
//!   for extended syntax definitions

mod builtin;
pub mod error;
pub mod types;

pub use builtin::{BuiltinHighlighter, create_builtin_manager};
// Re-export commonly used types
pub use error::{SyntaxError, SyntaxResult};
pub use types::{
  Highlighted,
  SyntaxConfig,
  SyntaxHighlighter,
  SyntaxManager,
  Token,
  TokenCategory,
};

// Syntect backend implementation
#[cfg(feature = "syntect")] mod syntect;
#[cfg(feature = "syntect")] pub use syntect::*;

/// Create the default syntax manager based on available features.
///
/// Uses **Syntect** when the `syntect` feature is enabled and the built-in
/// highlighter otherwise. Both report the same token categories.
#[must_use]
pub fn create_default_manager() -> SyntaxManager {
  #[cfg(feature = "syntect")]
  {
    create_syntect_manager()
  }

  #[cfg(not(feature = "syntect"))]
  {
    create_builtin_manager()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_syntax_config_default() {
    let config = SyntaxConfig::default();
    assert!(config.fallback_to_plain);
    assert!(config.language_aliases.contains_key("js"));
    assert_eq!(config.language_aliases["ts"], "typescript");
  }

  #[test]
  fn test_manager_resolves_aliases() {
    let manager = create_builtin_manager();
    assert_eq!(manager.resolve_language("TS"), "typescript");
    assert_eq!(manager.resolve_language("yml"), "yaml");
    assert_eq!(manager.resolve_language("toml"), "toml");

    let highlighted = manager.highlight("const a = 1", Some("ts"));
    assert_eq!(highlighted.language.as_deref(), Some("typescript"));
    assert_eq!(highlighted.tokens[0], Token::new("const", TokenCategory::Keyword));
  }

  #[test]
  fn test_manager_falls_back_to_plain() {
    let manager = create_builtin_manager();
    let code = "IDENTIFICATION DIVISION.";
    let highlighted = manager.highlight(code, Some("cobol"));
    assert_eq!(highlighted.language, None);
    assert_eq!(highlighted.tokens, vec![Token::new(code, TokenCategory::Plain)]);

    let highlighted = manager.highlight(code, None);
    assert_eq!(highlighted.tokens.len(), 1);
  }

  #[test]
  fn test_strict_tokenize_reports_unsupported() {
    let manager = create_builtin_manager();
    assert!(matches!(
      manager.tokenize("x", "brainfuck"),
      Err(SyntaxError::UnsupportedLanguage(lang)) if lang == "brainfuck"
    ));
  }

  #[test]
  fn test_highlighting_is_deterministic() {
    let manager = create_default_manager();
    let code = "fn main() {\n    println!(\"hi\");\n}\n";
    assert_eq!(
      manager.highlight(code, Some("rust")),
      manager.highlight(code, Some("rust"))
    );
  }

  #[cfg(feature = "syntect")]
  #[test]
  fn test_syntect_categories() {
    let highlighter = SyntectHighlighter;
    assert_eq!(highlighter.name(), "Syntect");
    let tokens = highlighter
      .tokenize("// note\nlet x = \"s\";", "rust")
      .unwrap_or_default();
    assert!(tokens.iter().any(|t| t.category == TokenCategory::Comment));
    assert!(tokens.iter().any(|t| t.category == TokenCategory::String));
    let joined: String = tokens.iter().map(|t| t.text.as_str()).collect();
    assert_eq!(joined, "// note\nlet x = \"s\";");
  }
}
