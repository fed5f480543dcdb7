//! Built-in rule-based highlighter.
//!
//! Each supported language is described by a small [`Grammar`] table:
//! keywords, literal words, comment and string delimiters. The lexer walks the
//! code once, character by character, and never looks further back than the
//! previous token, so its output depends only on `(code, language)`.
use super::{
  error::{SyntaxError, SyntaxResult},
  types::{SyntaxConfig, SyntaxHighlighter, SyntaxManager, Token, TokenCategory, push_token},
};

/// How bare words that are not keywords are classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Words {
  /// Every word is an identifier.
  Identifiers,
  /// Words before `:` (YAML) or `=` (TOML) are keys, others are plain.
  KeysBefore(char),
  /// Words are plain; quoted strings before `:` are keys (JSON).
  QuotedKeys,
}

#[derive(Debug)]
struct Grammar {
  name:          &'static str,
  keywords:      &'static [&'static str],
  literals:      &'static [&'static str],
  line_comments: &'static [&'static str],
  block_comment: Option<(&'static str, &'static str)>,
  quotes:        &'static [char],
  /// Python-style `"""` strings.
  triple_quotes: bool,
  /// Whether `$` may appear in identifiers (JavaScript) or starts a variable
  /// (shell).
  dollar:        Dollar,
  words:         Words,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dollar {
  Punctuation,
  InIdentifiers,
  Variable,
}

const JS_KEYWORDS: &[&str] = &[
  "async", "await", "break", "case", "catch", "class", "const", "continue",
  "debugger", "default", "delete", "do", "else", "export", "extends",
  "finally", "for", "from", "function", "get", "if", "import", "in",
  "instanceof", "let", "new", "of", "return", "set", "static", "super",
  "switch", "this", "throw", "try", "typeof", "var", "void", "while", "with",
  "yield",
];

const TS_KEYWORDS: &[&str] = &[
  "abstract", "any", "as", "asserts", "async", "await", "bigint", "boolean",
  "break", "case", "catch", "class", "const", "continue", "debugger", "declare",
  "default", "delete", "do", "else", "enum", "export", "extends", "finally",
  "for", "from", "function", "get", "if", "implements", "import", "in",
  "infer", "instanceof", "interface", "is", "keyof", "let", "module",
  "namespace", "never", "new", "number", "object", "of", "private",
  "protected", "public", "readonly", "return", "satisfies", "set", "static",
  "string", "super", "switch", "symbol", "this", "throw", "try", "type",
  "typeof", "unique", "unknown", "var", "void", "while", "with", "yield",
];

const JS_LITERALS: &[&str] = &["true", "false", "null", "undefined", "NaN", "Infinity"];

const BASH_KEYWORDS: &[&str] = &[
  "alias", "case", "cd", "declare", "do", "done", "echo", "elif", "else",
  "esac", "eval", "exec", "exit", "export", "fi", "for", "function", "if",
  "in", "local", "read", "readonly", "return", "select", "set", "shift",
  "source", "then", "time", "trap", "unset", "until", "while",
];

const RUST_KEYWORDS: &[&str] = &[
  "as", "async", "await", "break", "const", "continue", "crate", "dyn",
  "else", "enum", "extern", "fn", "for", "if", "impl", "in", "let", "loop",
  "match", "mod", "move", "mut", "pub", "ref", "return", "self", "Self",
  "static", "struct", "super", "trait", "type", "unsafe", "use", "where",
  "while",
];

const PYTHON_KEYWORDS: &[&str] = &[
  "and", "as", "assert", "async", "await", "break", "class", "continue",
  "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
  "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass",
  "raise", "return", "try", "while", "with", "yield",
];

const GRAMMARS: &[Grammar] = &[
  Grammar {
    name:          "typescript",
    keywords:      TS_KEYWORDS,
    literals:      JS_LITERALS,
    line_comments: &["//"],
    block_comment: Some(("/*", "*/")),
    quotes:        &['"', '\'', '`'],
    triple_quotes: false,
    dollar:        Dollar::InIdentifiers,
    words:         Words::Identifiers,
  },
  Grammar {
    name:          "javascript",
    keywords:      JS_KEYWORDS,
    literals:      JS_LITERALS,
    line_comments: &["//"],
    block_comment: Some(("/*", "*/")),
    quotes:        &['"', '\'', '`'],
    triple_quotes: false,
    dollar:        Dollar::InIdentifiers,
    words:         Words::Identifiers,
  },
  Grammar {
    name:          "bash",
    keywords:      BASH_KEYWORDS,
    literals:      &["true", "false"],
    line_comments: &["#"],
    block_comment: None,
    quotes:        &['"', '\''],
    triple_quotes: false,
    dollar:        Dollar::Variable,
    words:         Words::Identifiers,
  },
  Grammar {
    name:          "json",
    keywords:      &[],
    literals:      &["true", "false", "null"],
    line_comments: &["//"],
    block_comment: Some(("/*", "*/")),
    quotes:        &['"'],
    triple_quotes: false,
    dollar:        Dollar::Punctuation,
    words:         Words::QuotedKeys,
  },
  Grammar {
    name:          "yaml",
    keywords:      &[],
    literals:      &["true", "false", "null", "yes", "no", "on", "off", "~"],
    line_comments: &["#"],
    block_comment: None,
    quotes:        &['"', '\''],
    triple_quotes: false,
    dollar:        Dollar::Punctuation,
    words:         Words::KeysBefore(':'),
  },
  Grammar {
    name:          "toml",
    keywords:      &[],
    literals:      &["true", "false", "inf", "nan"],
    line_comments: &["#"],
    block_comment: None,
    quotes:        &['"', '\''],
    triple_quotes: false,
    dollar:        Dollar::Punctuation,
    words:         Words::KeysBefore('='),
  },
  Grammar {
    name:          "rust",
    keywords:      RUST_KEYWORDS,
    literals:      &["true", "false", "None", "Some", "Ok", "Err"],
    line_comments: &["//"],
    block_comment: Some(("/*", "*/")),
    quotes:        &['"'],
    triple_quotes: false,
    dollar:        Dollar::Punctuation,
    words:         Words::Identifiers,
  },
  Grammar {
    name:          "python",
    keywords:      PYTHON_KEYWORDS,
    literals:      &["True", "False", "None"],
    line_comments: &["#"],
    block_comment: None,
    quotes:        &['"', '\''],
    triple_quotes: true,
    dollar:        Dollar::Punctuation,
    words:         Words::Identifiers,
  },
];

fn grammar(language: &str) -> Option<&'static Grammar> {
  GRAMMARS
    .iter()
    .find(|g| g.name.eq_ignore_ascii_case(language))
}

/// Table-driven highlighter for the languages common in technical posts.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinHighlighter;

impl SyntaxHighlighter for BuiltinHighlighter {
  fn name(&self) -> &'static str {
    "Builtin"
  }

  fn supported_languages(&self) -> Vec<String> {
    GRAMMARS.iter().map(|g| g.name.to_string()).collect()
  }

  fn tokenize(&self, code: &str, language: &str) -> SyntaxResult<Vec<Token>> {
    let grammar = grammar(language)
      .ok_or_else(|| SyntaxError::UnsupportedLanguage(language.to_string()))?;
    Ok(Lexer::new(grammar, code).run())
  }
}

/// Create a syntax manager backed by the built-in highlighter.
#[must_use]
pub fn create_builtin_manager() -> SyntaxManager {
  SyntaxManager::new(Box::new(BuiltinHighlighter), SyntaxConfig::default())
}

struct Lexer<'a> {
  grammar: &'static Grammar,
  code:    &'a str,
  pos:     usize,
  tokens:  Vec<Token>,
}

impl<'a> Lexer<'a> {
  const fn new(grammar: &'static Grammar, code: &'a str) -> Self {
    Self {
      grammar,
      code,
      pos: 0,
      tokens: Vec::new(),
    }
  }

  fn rest(&self) -> &'a str {
    &self.code[self.pos..]
  }

  fn emit(&mut self, len: usize, category: TokenCategory) {
    let end = (self.pos + len).min(self.code.len());
    let text = &self.code[self.pos..end];
    push_token(&mut self.tokens, text, category);
    self.pos = end;
  }

  fn run(mut self) -> Vec<Token> {
    while let Some(c) = self.rest().chars().next() {
      let rest = self.rest();

      if let Some(len) = self.comment_len(rest) {
        self.emit(len, TokenCategory::Comment);
      } else if self.grammar.quotes.contains(&c) {
        let len = self.string_len(rest, c);
        let category = if self.grammar.words == Words::QuotedKeys
          && next_significant(&rest[len..]) == Some(':')
        {
          TokenCategory::Identifier
        } else {
          TokenCategory::String
        };
        self.emit(len, category);
      } else if c.is_ascii_digit()
        || (c == '.' && rest[1..].starts_with(|n: char| n.is_ascii_digit()))
        || (c == '-' && self.starts_number_after_sign(rest))
      {
        let len = 1 + rest[1..]
          .find(|n: char| !(n.is_ascii_alphanumeric() || matches!(n, '_' | '.')))
          .unwrap_or(rest.len() - 1);
        self.emit(len, TokenCategory::Literal);
      } else if c == '$' && self.grammar.dollar == Dollar::Variable {
        let len = variable_len(rest);
        self.emit(len, TokenCategory::Identifier);
      } else if self.is_word_start(c) {
        let first = c.len_utf8();
        let len = first
          + rest[first..]
            .find(|n: char| !self.is_word_char(n))
            .unwrap_or(rest.len() - first);
        let category = self.classify_word(&rest[..len], &rest[len..]);
        self.emit(len, category);
      } else if c.is_ascii_punctuation() {
        self.emit(1, TokenCategory::Punctuation);
      } else {
        self.emit(c.len_utf8(), TokenCategory::Plain);
      }
    }
    self.tokens
  }

  fn comment_len(&self, rest: &str) -> Option<usize> {
    if let Some((open, close)) = self.grammar.block_comment {
      if rest.starts_with(open) {
        let body = &rest[open.len()..];
        return Some(body.find(close).map_or(rest.len(), |end| {
          open.len() + end + close.len()
        }));
      }
    }

    let opens_line_comment = self.grammar.line_comments.iter().any(|marker| {
      rest.starts_with(marker)
        && (*marker != "#" || self.hash_starts_comment())
    });
    opens_line_comment.then(|| rest.find('\n').unwrap_or(rest.len()))
  }

  /// In shells `#` only starts a comment at a word boundary (`$#` is a
  /// variable, `a#b` a word).
  fn hash_starts_comment(&self) -> bool {
    self.grammar.dollar != Dollar::Variable
      || self.code[..self.pos]
        .chars()
        .next_back()
        .is_none_or(char::is_whitespace)
  }

  fn string_len(&self, rest: &str, quote: char) -> usize {
    if self.grammar.triple_quotes {
      let triple: String = std::iter::repeat_n(quote, 3).collect();
      if rest.starts_with(&triple) {
        return rest[3..]
          .find(&triple)
          .map_or(rest.len(), |end| 3 + end + 3);
      }
    }

    // Single-quoted shell strings have no escapes; template literals may span
    // lines, other strings end at the line.
    let escapes = !(quote == '\'' && self.grammar.dollar == Dollar::Variable);
    let multiline = quote == '`';
    let mut chars = rest.char_indices().skip(1);
    while let Some((idx, c)) = chars.next() {
      match c {
        '\\' if escapes => {
          chars.next();
        },
        '\n' if !multiline => return idx,
        c if c == quote => return idx + 1,
        _ => {},
      }
    }
    rest.len()
  }

  fn starts_number_after_sign(&self, rest: &str) -> bool {
    // `-1` is a number in data formats; in code it is an operator.
    matches!(self.grammar.words, Words::QuotedKeys | Words::KeysBefore(_))
      && rest[1..].starts_with(|n: char| n.is_ascii_digit())
  }

  fn is_word_start(&self, c: char) -> bool {
    c.is_alphabetic()
      || c == '_'
      || (c == '$' && self.grammar.dollar == Dollar::InIdentifiers)
      || (c == '~' && self.grammar.literals.contains(&"~"))
  }

  fn is_word_char(&self, c: char) -> bool {
    c.is_alphanumeric()
      || c == '_'
      || (c == '$' && self.grammar.dollar == Dollar::InIdentifiers)
      || (c == '-' && self.grammar.words != Words::Identifiers)
  }

  fn classify_word(&self, word: &str, after: &str) -> TokenCategory {
    if self.grammar.keywords.contains(&word) {
      return TokenCategory::Keyword;
    }
    if self.grammar.literals.contains(&word) {
      return TokenCategory::Literal;
    }
    match self.grammar.words {
      Words::Identifiers => TokenCategory::Identifier,
      Words::KeysBefore(sep) if next_significant(after) == Some(sep) => {
        TokenCategory::Identifier
      },
      Words::KeysBefore(_) | Words::QuotedKeys => TokenCategory::Plain,
    }
  }
}

/// First non-space character on the same line.
fn next_significant(s: &str) -> Option<char> {
  s.chars().find(|c| !matches!(c, ' ' | '\t'))
}

/// Length of a shell variable reference: `$NAME`, `${...}`, `$1`, `$?`.
fn variable_len(rest: &str) -> usize {
  let after = &rest[1..];
  if after.starts_with('{') {
    return after.find('}').map_or(rest.len(), |end| end + 2);
  }
  match after.chars().next() {
    Some(c) if c.is_alphabetic() || c == '_' => {
      1 + after
        .find(|n: char| !(n.is_alphanumeric() || n == '_'))
        .unwrap_or(after.len())
    },
    Some(c) if c.is_ascii_digit() || "?#@*!$-".contains(c) => 2,
    _ => 1,
  }
}

#[cfg(test)]
mod tests {
  #![allow(clippy::expect_used, reason = "Fine in tests")]
  use super::*;

  fn tokens(code: &str, language: &str) -> Vec<(String, TokenCategory)> {
    BuiltinHighlighter
      .tokenize(code, language)
      .expect("Failed to tokenize")
      .into_iter()
      .map(|t| (t.text, t.category))
      .collect()
  }

  fn categories_of<'a>(
    toks: &'a [(String, TokenCategory)],
    category: TokenCategory,
  ) -> Vec<&'a str> {
    toks
      .iter()
      .filter(|(_, c)| *c == category)
      .map(|(t, _)| t.as_str())
      .collect()
  }

  #[test]
  fn test_tokens_cover_input() {
    let code = "const x: number = 42; // answer\nlet s = `a\nb`;";
    let joined: String = tokens(code, "typescript")
      .into_iter()
      .map(|(t, _)| t)
      .collect();
    assert_eq!(joined, code);
  }

  #[test]
  fn test_typescript_categories() {
    let toks = tokens("const x: number = 42; // answer", "typescript");
    assert_eq!(categories_of(&toks, TokenCategory::Keyword), vec![
      "const", "number"
    ]);
    assert_eq!(categories_of(&toks, TokenCategory::Identifier), vec!["x"]);
    assert_eq!(categories_of(&toks, TokenCategory::Literal), vec!["42"]);
    assert_eq!(categories_of(&toks, TokenCategory::Comment), vec![
      "// answer"
    ]);
  }

  #[test]
  fn test_adjacent_tokens_merge() {
    let toks = tokens("a();", "javascript");
    assert_eq!(toks, vec![
      ("a".to_string(), TokenCategory::Identifier),
      ("();".to_string(), TokenCategory::Punctuation),
    ]);
  }

  #[test]
  fn test_bash_variables_and_comments() {
    let toks = tokens("echo \"$HOME\" $# # done\nls -la", "bash");
    assert_eq!(categories_of(&toks, TokenCategory::Keyword), vec!["echo"]);
    assert_eq!(categories_of(&toks, TokenCategory::String), vec!["\"$HOME\""]);
    assert!(categories_of(&toks, TokenCategory::Identifier).contains(&"$#"));
    assert_eq!(categories_of(&toks, TokenCategory::Comment), vec!["# done"]);
  }

  #[test]
  fn test_json_keys_and_values() {
    let toks = tokens(r#"{"name": "folio", "n": -1.5, "ok": true}"#, "json");
    assert_eq!(categories_of(&toks, TokenCategory::Identifier), vec![
      "\"name\"", "\"n\"", "\"ok\""
    ]);
    assert_eq!(categories_of(&toks, TokenCategory::String), vec!["\"folio\""]);
    assert_eq!(categories_of(&toks, TokenCategory::Literal), vec![
      "-1.5", "true"
    ]);
  }

  #[test]
  fn test_yaml_keys() {
    let toks = tokens("title: Hello world\ndraft: false # wip", "yaml");
    assert_eq!(categories_of(&toks, TokenCategory::Identifier), vec![
      "title", "draft"
    ]);
    assert_eq!(categories_of(&toks, TokenCategory::Literal), vec!["false"]);
    assert_eq!(categories_of(&toks, TokenCategory::Comment), vec!["# wip"]);
  }

  #[test]
  fn test_python_triple_quotes() {
    let toks = tokens("def f():\n    \"\"\"Doc\n    string\"\"\"\n    return None", "python");
    assert_eq!(categories_of(&toks, TokenCategory::String), vec![
      "\"\"\"Doc\n    string\"\"\""
    ]);
    assert_eq!(categories_of(&toks, TokenCategory::Keyword), vec!["def", "return"]);
    assert_eq!(categories_of(&toks, TokenCategory::Literal), vec!["None"]);
  }

  #[test]
  fn test_unterminated_block_comment_runs_to_end() {
    let toks = tokens("fn a() {} /* open", "rust");
    assert_eq!(toks.last(), Some(&("/* open".to_string(), TokenCategory::Comment)));
  }

  #[test]
  fn test_unknown_language_is_error() {
    assert!(matches!(
      BuiltinHighlighter.tokenize("x", "cobol"),
      Err(SyntaxError::UnsupportedLanguage(_))
    ));
  }

  #[test]
  fn test_deterministic() {
    let code = "export async function load({ params }) { return params.slug; }";
    assert_eq!(tokens(code, "javascript"), tokens(code, "javascript"));
  }
}
