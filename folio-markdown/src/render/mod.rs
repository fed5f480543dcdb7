//! HTML rendering of a parsed document.
//!
//! The renderer walks the block tree once, in source order. Every block it
//! emits starts with a block-level tag on its own line, so rendered output
//! parsed again comes back as raw markup that the sanitizer reproduces
//! unchanged.
mod code;

use std::collections::HashSet;

use log::debug;

use crate::{
  assets::{AssetError, BaseContext},
  error::Warning,
  sanitize::{SanitizePolicy, Sanitizer},
  syntax::SyntaxManager,
  types::{Alignment, BlockNode, Header, InlineNode, SourceRef},
  utils::{escape_attr, escape_text, inline_text, slugify},
};

/// Output of [`HtmlRenderer::render`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOutput {
  pub html:     String,
  pub headers:  Vec<Header>,
  pub warnings: Vec<Warning>,
}

/// Renders the blocks of one document.
#[derive(Debug)]
pub struct HtmlRenderer<'a> {
  syntax:    Option<&'a SyntaxManager>,
  policy:    &'a SanitizePolicy,
  context:   &'a BaseContext,
  sanitizer: Sanitizer<'a>,
  ids:       HashSet<String>,
  headers:   Vec<Header>,
  warnings:  Vec<Warning>,
}

/// Outcome of resolving a link or image target.
enum Target {
  Url(String),
  /// The reference climbs out of the asset root.
  Broken,
  /// The reference uses a scheme that is not allowed.
  Unsafe,
}

impl<'a> HtmlRenderer<'a> {
  /// Create a renderer. Code blocks are highlighted only when `syntax` is
  /// given.
  #[must_use]
  pub fn new(
    policy: &'a SanitizePolicy,
    context: &'a BaseContext,
    syntax: Option<&'a SyntaxManager>,
  ) -> Self {
    Self {
      syntax,
      policy,
      context,
      sanitizer: Sanitizer::new(policy, context),
      ids: HashSet::new(),
      headers: Vec::new(),
      warnings: Vec::new(),
    }
  }

  /// Render blocks to an HTML fragment, collecting headings and warnings.
  #[must_use]
  pub fn render(mut self, blocks: &[BlockNode]) -> RenderOutput {
    let html = self.blocks(blocks);
    debug!(
      "Rendered {} blocks ({} headings, {} warnings)",
      blocks.len(),
      self.headers.len(),
      self.warnings.len()
    );
    RenderOutput {
      html,
      headers: self.headers,
      warnings: self.warnings,
    }
  }

  fn blocks(&mut self, blocks: &[BlockNode]) -> String {
    blocks
      .iter()
      .map(|block| self.block(block))
      .collect::<Vec<_>>()
      .join("\n")
  }

  fn block(&mut self, block: &BlockNode) -> String {
    match block {
      BlockNode::Heading { level, content, id } => {
        self.heading(*level, content, id.as_deref())
      },
      BlockNode::Paragraph { content } => {
        format!("<p>{}</p>", self.inlines(content))
      },
      BlockNode::FencedCode {
        language,
        text,
        meta,
      } => {
        code::render_code_block(
          self.syntax,
          language.as_deref(),
          meta.as_deref(),
          text,
          &mut self.warnings,
        )
      },
      BlockNode::BlockQuote { blocks } => {
        format!("<blockquote>\n{}\n</blockquote>", self.blocks(blocks))
      },
      BlockNode::List {
        ordered,
        start,
        tight,
        items,
      } => self.list(*ordered, *start, *tight, items),
      BlockNode::Image { alt, source, title } => {
        self.figure(alt, source, title.as_deref())
      },
      BlockNode::RawMarkup { text, .. } => {
        let scope = self.sanitizer.enter_scope();
        let sanitized = self.sanitizer.sanitize(text, &mut self.warnings);
        let closers = self.sanitizer.leave_scope(scope);
        if sanitized.leading_escaped {
          format!("<p>{}{closers}</p>", sanitized.html)
        } else {
          format!("{}{closers}", sanitized.html)
        }
      },
      BlockNode::ThematicBreak => "<hr>".to_string(),
      BlockNode::Table {
        alignments,
        header,
        rows,
      } => self.table(alignments, header, rows),
    }
  }

  fn heading(
    &mut self,
    level: u8,
    content: &[InlineNode],
    explicit_id: Option<&str>,
  ) -> String {
    let text = inline_text(content);
    let base = explicit_id.map_or_else(|| slugify(&text), str::to_string);
    let id = self.claim_id(if base.is_empty() { "section" } else { &base });

    let html = format!(
      "<h{level} id=\"{}\">{}</h{level}>",
      escape_attr(&id),
      self.inlines(content)
    );
    self.headers.push(Header { text, level, id });
    html
  }

  /// Reserve a unique heading id, suffixing `-1`, `-2`, ... on collisions.
  fn claim_id(&mut self, base: &str) -> String {
    if self.ids.insert(base.to_string()) {
      return base.to_string();
    }
    let mut n = 1usize;
    loop {
      let candidate = format!("{base}-{n}");
      if self.ids.insert(candidate.clone()) {
        return candidate;
      }
      n += 1;
    }
  }

  fn list(
    &mut self,
    ordered: bool,
    start: Option<u64>,
    tight: bool,
    items: &[Vec<BlockNode>],
  ) -> String {
    let open = match (ordered, start) {
      (true, Some(n)) if n != 1 => format!("<ol start=\"{n}\">"),
      (true, _) => "<ol>".to_string(),
      (false, _) => "<ul>".to_string(),
    };
    let close = if ordered { "</ol>" } else { "</ul>" };

    let mut out = vec![open];
    for item in items {
      let parts: Vec<String> = item
        .iter()
        .map(|block| {
          match block {
            BlockNode::Paragraph { content } if tight => self.inlines(content),
            other => self.block(other),
          }
        })
        .collect();
      out.push(format!("<li>{}</li>", parts.join("\n")));
    }
    out.push(close.to_string());
    out.join("\n")
  }

  fn table(
    &mut self,
    alignments: &[Alignment],
    header: &[Vec<InlineNode>],
    rows: &[Vec<Vec<InlineNode>>],
  ) -> String {
    let mut out = vec!["<table>".to_string(), "<thead>".to_string()];
    out.push(self.row("th", alignments, header));
    out.push("</thead>".to_string());
    if !rows.is_empty() {
      out.push("<tbody>".to_string());
      for row in rows {
        out.push(self.row("td", alignments, row));
      }
      out.push("</tbody>".to_string());
    }
    out.push("</table>".to_string());
    out.join("\n")
  }

  fn row(
    &mut self,
    cell: &str,
    alignments: &[Alignment],
    cells: &[Vec<InlineNode>],
  ) -> String {
    let mut out = String::from("<tr>");
    for (idx, content) in cells.iter().enumerate() {
      let align = alignments
        .get(idx)
        .copied()
        .unwrap_or_default()
        .as_attr()
        .map(|a| format!(" align=\"{a}\""))
        .unwrap_or_default();
      out.push_str(&format!("<{cell}{align}>{}</{cell}>", self.inlines(content)));
    }
    out.push_str("</tr>");
    out
  }

  fn figure(&mut self, alt: &str, source: &SourceRef, title: Option<&str>) -> String {
    let caption = title
      .map(|t| format!("<figcaption>{}</figcaption>", escape_text(t)))
      .unwrap_or_default();
    let image = self.image(alt, source, title);
    format!("<figure>{image}{caption}</figure>")
  }

  fn image(&mut self, alt: &str, source: &SourceRef, title: Option<&str>) -> String {
    let title_attr = title
      .map(|t| format!(" title=\"{}\"", escape_attr(t)))
      .unwrap_or_default();
    match self.resolve(source, "img", "src") {
      Target::Url(url) => {
        format!(
          "<img src=\"{}\" alt=\"{}\"{title_attr}>",
          escape_attr(&url),
          escape_attr(alt)
        )
      },
      Target::Unsafe => format!("<img alt=\"{}\"{title_attr}>", escape_attr(alt)),
      Target::Broken => broken_asset(source, &escape_text(alt)),
    }
  }

  fn resolve(&mut self, source: &SourceRef, tag: &str, attribute: &str) -> Target {
    if let SourceRef::Absolute(url) = source {
      if !self.policy.is_safe_url(url) {
        self.warnings.push(Warning::DroppedAttribute {
          tag:       tag.to_string(),
          attribute: attribute.to_string(),
        });
        return Target::Unsafe;
      }
    }
    match self.context.resolve(source) {
      Ok(resolved) => Target::Url(resolved.url),
      Err(AssetError::PathEscape { reference }) => {
        self.warnings.push(Warning::PathEscape { reference });
        Target::Broken
      },
    }
  }

  /// Render an inline run. Raw tags opened inside it are closed at its end.
  fn inlines(&mut self, nodes: &[InlineNode]) -> String {
    let scope = self.sanitizer.enter_scope();
    let mut out = String::new();
    for node in nodes {
      self.inline(node, &mut out);
    }
    out.push_str(&self.sanitizer.leave_scope(scope));
    out
  }

  fn inline(&mut self, node: &InlineNode, out: &mut String) {
    match node {
      InlineNode::Text { text } => out.push_str(&escape_text(text)),
      InlineNode::Emphasis { children } => {
        out.push_str("<em>");
        out.push_str(&self.inlines(children));
        out.push_str("</em>");
      },
      InlineNode::Strong { children } => {
        out.push_str("<strong>");
        out.push_str(&self.inlines(children));
        out.push_str("</strong>");
      },
      InlineNode::InlineCode { text } => {
        out.push_str("<code>");
        out.push_str(&html_escape::encode_text(text));
        out.push_str("</code>");
      },
      InlineNode::Link {
        children,
        dest,
        title,
      } => {
        let label = self.inlines(children);
        match self.resolve(dest, "a", "href") {
          Target::Url(url) => {
            out.push_str("<a href=\"");
            out.push_str(&escape_attr(&url));
            out.push('"');
            if let Some(title) = title {
              out.push_str(" title=\"");
              out.push_str(&escape_attr(title));
              out.push('"');
            }
            out.push('>');
            out.push_str(&label);
            out.push_str("</a>");
          },
          Target::Unsafe => out.push_str(&label),
          Target::Broken => out.push_str(&broken_asset(dest, &label)),
        }
      },
      InlineNode::InlineImage { alt, source, title } => {
        out.push_str(&self.image(alt, source, title.as_deref()));
      },
      InlineNode::RawInline { text } => {
        out.push_str(&self.sanitizer.sanitize(text, &mut self.warnings).html);
      },
      InlineNode::LineBreak => out.push_str("<br />\n"),
    }
  }
}

/// Placeholder for a reference that could not be resolved.
fn broken_asset(source: &SourceRef, content: &str) -> String {
  format!(
    "<span class=\"broken-asset\" title=\"{}\">{content}</span>",
    escape_attr(source.as_str())
  )
}
