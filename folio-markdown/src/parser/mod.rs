//! Markdown/MDX parsing.
//!
//! - [`block`]: line-oriented recursive descent over the document body
//! - [`inline`]: delimiter-stack parsing of the text inside each block
mod block;
mod inline;

pub use block::{parse_blocks, parse_blocks_with};
pub use inline::parse_inlines;
use log::trace;

use crate::{
  error::IngestResult,
  frontmatter,
  processor::TabStyle,
  types::Document,
};

/// Parse a raw document into its metadata and block tree.
///
/// # Errors
///
/// Returns [`crate::IngestError::MalformedFrontmatter`] if the document opens
/// a frontmatter block that is never closed.
pub fn parse_document(raw: &str) -> IngestResult<Document> {
  parse_document_with(raw, TabStyle::None)
}

/// Parse a raw document, applying `tab_style` to fenced code blocks.
///
/// # Errors
///
/// See [`parse_document`].
pub fn parse_document_with(raw: &str, tab_style: TabStyle) -> IngestResult<Document> {
  let extracted = frontmatter::extract(raw)?;
  let mut warnings = extracted.warnings;

  let blocks = parse_blocks_with(
    extracted.body,
    extracted.body_line,
    tab_style,
    &mut warnings,
  );
  trace!(
    "Parsed document: {} blocks, {} warnings",
    blocks.len(),
    warnings.len()
  );

  Ok(Document {
    metadata: extracted.frontmatter,
    body: blocks,
    warnings,
  })
}
