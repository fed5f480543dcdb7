//! Core implementation of the post processor.
//!
//! This module contains the main implementation of `Processor`: parsing,
//! per-document resolution context and the rendering pipeline.
use std::path::Path;

use log::{debug, trace};

use super::types::{Processor, ProcessorOptions};
use crate::{
  assets::{AssetError, BaseContext},
  error::{IngestResult, Warning},
  parser,
  render::HtmlRenderer,
  syntax::create_default_manager,
  types::{Document, Rendered},
  utils::slugify,
};

impl Processor {
  /// Create a new `Processor` with the given options.
  #[must_use]
  pub fn new(options: ProcessorOptions) -> Self {
    let syntax_manager = options.highlight_code.then(create_default_manager);
    if let Some(manager) = &syntax_manager {
      trace!("Using {} syntax highlighter", manager.highlighter().name());
    }

    Self {
      options,
      syntax_manager,
    }
  }

  /// Access processor options.
  #[must_use]
  pub const fn options(&self) -> &ProcessorOptions {
    &self.options
  }

  /// Parse a raw post into a [`Document`].
  ///
  /// # Errors
  ///
  /// Returns [`crate::IngestError::MalformedFrontmatter`] if the frontmatter
  /// block is never closed.
  pub fn parse(&self, raw: &str) -> IngestResult<Document> {
    parser::parse_document_with(raw, self.options.tab_style)
  }

  /// The resolution context for a document with the given slug.
  #[must_use]
  pub fn base_context(&self, slug: Option<&str>) -> BaseContext {
    BaseContext {
      slug:       slug.map(str::to_string),
      cdn_base:   self.options.cdn_base.clone(),
      asset_root: self.options.asset_root.clone(),
    }
  }

  /// Render a parsed document, using its declared or derived slug.
  #[must_use]
  pub fn render_document(&self, document: &Document) -> Rendered {
    self.render_with_slug(document, document.slug())
  }

  fn render_with_slug(&self, document: &Document, slug: Option<String>) -> Rendered {
    let context = self.base_context(slug.as_deref());
    let renderer = HtmlRenderer::new(
      &self.options.sanitize,
      &context,
      self.syntax_manager.as_ref(),
    );
    let output = renderer.render(&document.body);

    let mut warnings = document.warnings.clone();
    warnings.extend(output.warnings);
    let cover = self.resolve_cover(document, &context, &mut warnings);

    debug!(
      "Rendered post {:?}: {} bytes, {} warnings",
      slug.as_deref().unwrap_or("<untitled>"),
      output.html.len(),
      warnings.len()
    );

    Rendered {
      html: output.html,
      headers: output.headers,
      title: document.title(),
      slug,
      cover,
      metadata: document.metadata.clone(),
      warnings,
    }
  }

  fn resolve_cover(
    &self,
    document: &Document,
    context: &BaseContext,
    warnings: &mut Vec<Warning>,
  ) -> Option<String> {
    let cover = document.metadata.cover()?;
    if !self.options.sanitize.is_safe_url(cover) {
      warnings.push(Warning::DroppedAttribute {
        tag:       "frontmatter".to_string(),
        attribute: "cover".to_string(),
      });
      return None;
    }
    match context.resolve_str(cover) {
      Ok(resolved) => Some(resolved.url),
      Err(AssetError::PathEscape { reference }) => {
        warnings.push(Warning::PathEscape { reference });
        None
      },
    }
  }

  /// Parse and render a raw post.
  ///
  /// # Errors
  ///
  /// See [`Processor::parse`].
  pub fn render(&self, raw: &str) -> IngestResult<Rendered> {
    let document = self.parse(raw)?;
    Ok(self.render_document(&document))
  }

  /// Parse and render a post read from `path`.
  ///
  /// Posts that declare neither a slug nor a title take their slug from the
  /// file name.
  ///
  /// # Errors
  ///
  /// See [`Processor::parse`].
  pub fn render_file_content(&self, raw: &str, path: &Path) -> IngestResult<Rendered> {
    let document = self.parse(raw)?;
    let slug = document.slug().or_else(|| {
      path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .map(slugify)
        .filter(|slug| !slug.is_empty())
    });
    Ok(self.render_with_slug(&document, slug))
  }
}

#[cfg(test)]
mod tests {
  #![allow(clippy::expect_used, reason = "Fine in tests")]
  use super::*;
  use crate::processor::{ProcessorOptionsBuilder, TabStyle};

  fn processor() -> Processor {
    Processor::new(
      ProcessorOptionsBuilder::new()
        .asset_root("/content")
        .cdn_base(Some("https://cdn.example.com"))
        .build(),
    )
  }

  #[test]
  fn test_render_collects_metadata() {
    let raw = "---\ntitle: Hooks in Depth\ncover: ./cover.png\ntags: [react, \
               hooks]\n---\n\n# Hooks in Depth\n\nBody.";
    let rendered = processor().render(raw).expect("Failed to render");
    assert_eq!(rendered.title.as_deref(), Some("Hooks in Depth"));
    assert_eq!(rendered.slug.as_deref(), Some("hooks-in-depth"));
    assert_eq!(
      rendered.cover.as_deref(),
      Some("https://cdn.example.com/hooks-in-depth/cover.png")
    );
    assert_eq!(rendered.headers.len(), 1);
    assert!(rendered.warnings.is_empty());
  }

  #[test]
  fn test_cover_escape_is_a_warning() {
    let raw = "---\ntitle: T\ncover: ../../../x.png\n---\nBody";
    let rendered = processor().render(raw).expect("Failed to render");
    assert_eq!(rendered.cover, None);
    assert_eq!(rendered.warnings, vec![Warning::PathEscape {
      reference: "../../../x.png".to_string(),
    }]);
  }

  #[test]
  fn test_parse_and_render_warnings_are_merged() {
    let raw = "<script>x</script>\n\n```ts\nlet a";
    let rendered = processor().render(raw).expect("Failed to render");
    assert_eq!(rendered.warnings.len(), 2);
    assert!(matches!(rendered.warnings[0], Warning::UnterminatedBlock { .. }));
    assert!(matches!(rendered.warnings[1], Warning::DisallowedTag { .. }));
  }

  #[test]
  fn test_file_stem_slug_fallback() {
    let rendered = processor()
      .render_file_content("![a](./a.png)", Path::new("posts/My Post.mdx"))
      .expect("Failed to render");
    assert_eq!(rendered.slug.as_deref(), Some("my-post"));
    assert!(rendered.html.contains("https://cdn.example.com/my-post/a.png"));
  }

  #[test]
  fn test_highlighting_can_be_disabled() {
    let processor = Processor::new(
      ProcessorOptionsBuilder::new()
        .highlight_code(false)
        .tab_style(TabStyle::Warn)
        .build(),
    );
    let rendered = processor
      .render("```ts\nconst x = 1;\n```")
      .expect("Failed to render");
    assert_eq!(
      rendered.html,
      "<pre><code class=\"language-ts\">const x = 1;</code></pre>"
    );
  }
}
