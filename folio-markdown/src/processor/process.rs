//! High-level processing functions with failure isolation.
use std::{
  collections::HashMap,
  fs,
  io::Error,
  path::{Path, PathBuf},
};

use log::{error, warn};
use rayon::prelude::*;

use super::types::{Processor, ProcessorOptions, TabStyle};
use crate::{
  error::{IngestError, IngestResult},
  types::Rendered,
};

/// Why one document of a batch produced no output.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BatchError {
  #[error("Failed to read file: {0}")]
  Read(String),

  #[error(transparent)]
  Ingest(#[from] IngestError),

  #[error("Duplicate slug '{slug}' (already used by {first})")]
  DuplicateSlug { slug: String, first: String },
}

/// Render raw content, turning a panic anywhere in the pipeline into
/// [`IngestError::Internal`].
///
/// # Errors
///
/// Returns the error from [`Processor::render`], or
/// [`IngestError::Internal`] if processing panicked.
pub fn process_with_recovery(processor: &Processor, content: &str) -> IngestResult<Rendered> {
  recover(|| processor.render(content))
}

fn recover<F>(render: F) -> IngestResult<Rendered>
where
  F: FnOnce() -> IngestResult<Rendered>,
{
  match std::panic::catch_unwind(std::panic::AssertUnwindSafe(render)) {
    Ok(result) => result,
    Err(panic_err) => {
      let message = if let Some(msg) = panic_err.downcast_ref::<String>() {
        msg.clone()
      } else if let Some(msg) = panic_err.downcast_ref::<&str>() {
        (*msg).to_string()
      } else {
        "unknown panic".to_string()
      };
      error!("Panic during post processing: {message}");
      Err(IngestError::Internal(message))
    },
  }
}

/// Process a batch of posts in parallel.
///
/// Every file is read with `read_file_fn` and rendered independently; a
/// failure (read error, malformed frontmatter, panic) only affects that
/// file. Results come back in input order. When two posts share a slug, the
/// first one in input order keeps it and the later ones fail with
/// [`BatchError::DuplicateSlug`].
pub fn process_batch<F>(
  processor: &Processor,
  files: &[PathBuf],
  read_file_fn: F,
) -> Vec<(PathBuf, Result<Rendered, BatchError>)>
where
  F: Fn(&Path) -> Result<String, Error> + Sync,
{
  let mut results: Vec<(PathBuf, Result<Rendered, BatchError>)> = files
    .par_iter()
    .map(|path| {
      let result = match read_file_fn(path) {
        Ok(content) => {
          recover(|| processor.render_file_content(&content, path))
            .map_err(BatchError::from)
        },
        Err(e) => Err(BatchError::Read(e.to_string())),
      };
      (path.clone(), result)
    })
    .collect();

  let mut seen: HashMap<String, PathBuf> = HashMap::new();
  for (path, result) in &mut results {
    let Some(slug) = result.as_ref().ok().and_then(|r| r.slug.clone()) else {
      continue;
    };
    if let Some(first) = seen.get(&slug) {
      warn!(
        "{} reuses slug '{slug}' from {}",
        path.display(),
        first.display()
      );
      *result = Err(BatchError::DuplicateSlug {
        slug,
        first: first.display().to_string(),
      });
    } else {
      seen.insert(slug, path.clone());
    }
  }

  results
}

/// Preset configurations for common use cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessorPreset {
  /// Parsing and sanitizing only, no syntax highlighting
  Basic,
  /// Highlighted code and warnings for hard tabs in code blocks
  Blog,
}

/// Create a processor with sensible defaults for library usage.
#[must_use]
pub fn create_processor(preset: ProcessorPreset) -> Processor {
  let options = match preset {
    ProcessorPreset::Basic => {
      ProcessorOptions {
        highlight_code: false,
        ..Default::default()
      }
    },
    ProcessorPreset::Blog => {
      ProcessorOptions {
        highlight_code: true,
        tab_style: TabStyle::Warn,
        ..Default::default()
      }
    },
  };

  Processor::new(options)
}

/// Process a post from a string with error recovery.
///
/// # Errors
///
/// See [`process_with_recovery`].
pub fn process_markdown_string(
  content: &str,
  preset: ProcessorPreset,
) -> IngestResult<Rendered> {
  let processor = create_processor(preset);
  process_with_recovery(&processor, content)
}

/// Process a post from a file with error recovery.
///
/// # Errors
///
/// Returns [`BatchError::Read`] if the file cannot be read, or
/// [`BatchError::Ingest`] if it cannot be processed.
pub fn process_markdown_file(
  file_path: &Path,
  preset: ProcessorPreset,
) -> Result<Rendered, BatchError> {
  let content = fs::read_to_string(file_path).map_err(|e| {
    BatchError::Read(format!("{}: {e}", file_path.display()))
  })?;

  let processor = create_processor(preset);
  recover(|| processor.render_file_content(&content, file_path))
    .map_err(BatchError::from)
}

#[cfg(test)]
mod tests {
  #![allow(clippy::expect_used, reason = "Fine in tests")]
  use super::*;

  #[test]
  fn test_recovery_turns_panic_into_error() {
    #[allow(clippy::panic, reason = "Exercising panic recovery")]
    let result = recover(|| panic!("boom"));
    assert_eq!(result, Err(IngestError::Internal("boom".to_string())));
  }

  #[test]
  fn test_process_markdown_string() {
    let result = process_markdown_string(
      "# Test Header\n\nSome content.",
      ProcessorPreset::Basic,
    )
    .expect("Failed to process");
    assert!(result.html.contains("<h1 id=\"test-header\">"));
    assert_eq!(result.title, Some("Test Header".to_string()));
    assert_eq!(result.headers.len(), 1);
  }

  #[test]
  fn test_process_markdown_file_uses_file_stem() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("Event Loop.mdx");
    fs::write(&path, "Body only.").expect("Failed to write post");

    let rendered = process_markdown_file(&path, ProcessorPreset::Basic)
      .expect("Failed to process");
    assert_eq!(rendered.slug.as_deref(), Some("event-loop"));

    let missing = process_markdown_file(&dir.path().join("nope.md"), ProcessorPreset::Basic);
    assert!(matches!(missing, Err(BatchError::Read(_))));
  }

  #[test]
  fn test_create_processor_presets() {
    let basic = create_processor(ProcessorPreset::Basic);
    assert!(!basic.options().highlight_code);

    let blog = create_processor(ProcessorPreset::Blog);
    assert!(blog.options().highlight_code);
    assert_eq!(blog.options().tab_style, TabStyle::Warn);
  }

  #[test]
  fn test_process_batch_isolates_failures() {
    let processor = create_processor(ProcessorPreset::Basic);
    let paths: Vec<PathBuf> = ["a.md", "broken.md", "missing.md", "b.md", "dup.md"]
      .into_iter()
      .map(PathBuf::from)
      .collect();

    let read_fn = |path: &Path| -> Result<String, Error> {
      match path.to_str() {
        Some("a.md") => Ok("---\nslug: first\n---\n# A".to_string()),
        Some("broken.md") => Ok("---\ntitle: never closed\n".to_string()),
        Some("b.md") => Ok("# B".to_string()),
        Some("dup.md") => Ok("---\nslug: first\n---\n# Dup".to_string()),
        _ => Err(Error::new(std::io::ErrorKind::NotFound, "File not found")),
      }
    };

    let results = process_batch(&processor, &paths, read_fn);
    let order: Vec<&Path> = results.iter().map(|(p, _)| p.as_path()).collect();
    assert_eq!(order, paths.iter().map(PathBuf::as_path).collect::<Vec<_>>());

    assert!(results[0].1.is_ok());
    assert_eq!(
      results[1].1,
      Err(BatchError::Ingest(IngestError::MalformedFrontmatter { line: 1 }))
    );
    assert!(matches!(results[2].1, Err(BatchError::Read(_))));
    assert_eq!(
      results[3].1.as_ref().ok().and_then(|r| r.slug.as_deref()),
      Some("b")
    );
    assert_eq!(
      results[4].1,
      Err(BatchError::DuplicateSlug {
        slug:  "first".to_string(),
        first: "a.md".to_string(),
      })
    );
  }
}
