//! Fenced code block output.
use log::trace;

use crate::{
  error::Warning,
  syntax::{SyntaxManager, TokenCategory},
  utils::escape_attr,
};

/// Render one fenced code block.
///
/// With a highlighter and a supported language the block becomes
/// `<pre class="highlight">` with one `tok-*` span per non-plain token.
/// Otherwise the text is emitted escaped, keeping the author's language
/// class. An unsupported language tag is reported as a warning.
pub(super) fn render_code_block(
  syntax: Option<&SyntaxManager>,
  language: Option<&str>,
  meta: Option<&str>,
  text: &str,
  warnings: &mut Vec<Warning>,
) -> String {
  let meta_attr = meta
    .map(|m| format!(" data-meta=\"{}\"", escape_attr(m)))
    .unwrap_or_default();

  let Some(manager) = syntax else {
    return plain_block(language, &meta_attr, text);
  };

  let highlighted = manager.highlight(text, language);
  let Some(resolved) = highlighted.language.as_deref() else {
    if let Some(language) = language {
      trace!("No grammar for code block language '{language}'");
      warnings.push(Warning::UnknownLanguage {
        language: language.to_string(),
      });
    }
    return plain_block(language, &meta_attr, text);
  };

  let mut body = String::with_capacity(text.len() * 2);
  for token in &highlighted.tokens {
    let escaped = html_escape::encode_text(&token.text);
    if token.category == TokenCategory::Plain {
      body.push_str(&escaped);
    } else {
      body.push_str("<span class=\"tok-");
      body.push_str(token.category.as_str());
      body.push_str("\">");
      body.push_str(&escaped);
      body.push_str("</span>");
    }
  }

  format!(
    "<pre class=\"highlight\"{meta_attr}><code class=\"language-{}\">{body}</code></pre>",
    escape_attr(resolved)
  )
}

fn plain_block(language: Option<&str>, meta_attr: &str, text: &str) -> String {
  let class = language
    .map(|l| format!(" class=\"language-{}\"", escape_attr(l)))
    .unwrap_or_default();
  format!(
    "<pre{meta_attr}><code{class}>{}</code></pre>",
    html_escape::encode_text(text)
  )
}
