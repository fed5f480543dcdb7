//! Writing rendered posts and the post index to disk.
use std::{
  cmp::Ordering,
  fs,
  path::{Component, Path, PathBuf},
};

use color_eyre::eyre::{Context, Result, bail};
use folio_markdown::{Frontmatter, Header, Rendered, Warning};
use jiff::{Timestamp, civil, tz::TimeZone};
use serde::Serialize;

/// One entry of `index.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexEntry {
  pub slug:           String,
  pub title:          Option<String>,
  pub date_published: Option<String>,
  pub tags:           Vec<String>,
  pub cover:          Option<String>,
  /// Rendered fragment, relative to the output directory.
  pub path:           String,
}

impl IndexEntry {
  #[must_use]
  pub fn new(slug: &str, rendered: &Rendered) -> Self {
    Self {
      slug:           slug.to_string(),
      title:          rendered.title.clone(),
      date_published: rendered
        .metadata
        .date_published()
        .map(ToString::to_string),
      tags:           rendered.metadata.tags(),
      cover:          rendered.cover.clone(),
      path:           format!("{slug}.html"),
    }
  }
}

/// Per-post metadata written as `<slug>.json`.
#[derive(Debug, Serialize)]
struct PostManifest<'a> {
  slug:     &'a str,
  title:    Option<&'a str>,
  cover:    Option<&'a str>,
  metadata: &'a Frontmatter,
  headers:  &'a [Header],
  warnings: &'a [Warning],
}

/// Check that a slug names a file inside the output directory.
///
/// # Errors
///
/// Returns an error for empty slugs and slugs with absolute, `.` or `..`
/// components.
pub fn validate_slug(slug: &str) -> Result<()> {
  let path = Path::new(slug);
  if slug.is_empty()
    || !path
      .components()
      .all(|component| matches!(component, Component::Normal(_)))
  {
    bail!("Slug '{slug}' cannot be used as an output file name");
  }
  Ok(())
}

/// Write `<slug>.html`, and `<slug>.json` when `emit_json` is set.
///
/// # Errors
///
/// Returns an error if the slug is unusable or a file cannot be written.
pub fn write_post(
  output_dir: &Path,
  slug: &str,
  rendered: &Rendered,
  emit_json: bool,
) -> Result<PathBuf> {
  validate_slug(slug)?;

  let html_path = output_dir.join(format!("{slug}.html"));
  if let Some(parent) = html_path.parent() {
    fs::create_dir_all(parent).wrap_err_with(|| {
      format!("Failed to create output directory: {}", parent.display())
    })?;
  }

  fs::write(&html_path, &rendered.html).wrap_err_with(|| {
    format!("Failed to write output HTML: {}", html_path.display())
  })?;

  if emit_json {
    let manifest = PostManifest {
      slug,
      title: rendered.title.as_deref(),
      cover: rendered.cover.as_deref(),
      metadata: &rendered.metadata,
      headers: &rendered.headers,
      warnings: &rendered.warnings,
    };
    let json_path = output_dir.join(format!("{slug}.json"));
    let json = serde_json::to_string_pretty(&manifest)?;
    fs::write(&json_path, json).wrap_err_with(|| {
      format!("Failed to write post metadata: {}", json_path.display())
    })?;
  }

  Ok(html_path)
}

/// Sort entries newest first. Undated posts go last, ties by slug.
pub fn sort_index(entries: &mut [IndexEntry]) {
  entries.sort_by(|a, b| {
    let a_date = a.date_published.as_deref().and_then(publication_date);
    let b_date = b.date_published.as_deref().and_then(publication_date);
    match (a_date, b_date) {
      (Some(a_date), Some(b_date)) => b_date.cmp(&a_date),
      (Some(_), None) => Ordering::Less,
      (None, Some(_)) => Ordering::Greater,
      (None, None) => Ordering::Equal,
    }
    .then_with(|| a.slug.cmp(&b.slug))
  });
}

/// Write `index.json`, sorted with [`sort_index`].
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_index(output_dir: &Path, mut entries: Vec<IndexEntry>) -> Result<PathBuf> {
  sort_index(&mut entries);

  let index_path = output_dir.join("index.json");
  let json = serde_json::to_string_pretty(&entries)?;
  fs::write(&index_path, json).wrap_err_with(|| {
    format!("Failed to write index: {}", index_path.display())
  })?;

  Ok(index_path)
}

/// Interpret a `datePublished` value. Accepts RFC 3339 timestamps, civil
/// date-times and plain dates; anything else counts as undated.
fn publication_date(raw: &str) -> Option<civil::DateTime> {
  let raw = raw.trim();
  if let Ok(timestamp) = raw.parse::<Timestamp>() {
    return Some(timestamp.to_zoned(TimeZone::UTC).datetime());
  }
  if let Ok(datetime) = raw.parse::<civil::DateTime>() {
    return Some(datetime);
  }
  raw
    .parse::<civil::Date>()
    .ok()
    .map(|date| date.to_datetime(civil::Time::midnight()))
}
