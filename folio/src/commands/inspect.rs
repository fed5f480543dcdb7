use std::{fs, io::Write, path::Path};

use color_eyre::eyre::{Context, Result};
use folio_config::Config;
use folio_markdown::{Document, parser::parse_document_with};

/// Parse a post into its document tree.
///
/// # Errors
///
/// Returns an error if the file cannot be read, the configured tab style is
/// invalid, or the frontmatter is malformed.
pub fn inspect_file(config: &Config, file: &Path) -> Result<Document> {
  let content = fs::read_to_string(file)
    .wrap_err_with(|| format!("Failed to read post: {}", file.display()))?;
  let document = parse_document_with(&content, config.parsed_tab_style()?)
    .wrap_err_with(|| format!("Failed to parse post: {}", file.display()))?;
  Ok(document)
}

/// Entry point for `folio inspect`: writes the document as JSON to `out`.
///
/// # Errors
///
/// Returns an error if parsing, serialization or writing fails.
pub fn run<W: Write>(config: &Config, file: &Path, pretty: bool, mut out: W) -> Result<()> {
  let document = inspect_file(config, file)?;
  if pretty {
    serde_json::to_writer_pretty(&mut out, &document)?;
  } else {
    serde_json::to_writer(&mut out, &document)?;
  }
  writeln!(out)?;
  Ok(())
}
