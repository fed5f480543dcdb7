//! Asset reference resolution.
//!
//! Image sources, link targets and cover images written as repository paths
//! are normalized against the document's asset directory and turned into
//! canonical URLs. Resolution is lexical only: nothing here touches the
//! filesystem, and resolving an already resolved URL returns it unchanged.
use std::path::PathBuf;

use log::debug;

use crate::types::SourceRef;

/// Errors produced while resolving a single reference.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssetError {
  #[error("Asset reference '{reference}' resolves outside the asset root")]
  PathEscape { reference: String },
}

/// Where relative references in one document are resolved from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BaseContext {
  /// Document slug; `./x` and `x` resolve inside `<slug>/`.
  pub slug:       Option<String>,
  /// Base URL assets are served from, e.g. `https://cdn.example.com/posts`.
  pub cdn_base:   Option<String>,
  /// Directory on disk that holds the assets.
  pub asset_root: PathBuf,
}

/// A resolved reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAsset {
  /// Canonical URL, including any query or fragment from the reference.
  pub url:        String,
  /// Location below the asset root, for repository-relative references.
  pub local_path: Option<PathBuf>,
}

impl BaseContext {
  #[must_use]
  pub fn new(asset_root: impl Into<PathBuf>) -> Self {
    Self {
      asset_root: asset_root.into(),
      ..Default::default()
    }
  }

  #[must_use]
  pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
    self.slug = Some(slug.into());
    self
  }

  #[must_use]
  pub fn with_cdn_base(mut self, cdn_base: impl Into<String>) -> Self {
    self.cdn_base = Some(cdn_base.into());
    self
  }

  /// Resolve a reference to its canonical URL.
  ///
  /// # Errors
  ///
  /// Returns [`AssetError::PathEscape`] if a `..` segment climbs above the
  /// asset root. Percent-encoded dot segments and backslash
  /// separators count.
  pub fn resolve(&self, source: &SourceRef) -> Result<ResolvedAsset, AssetError> {
    let path = match source {
      SourceRef::Absolute(url) => {
        return Ok(ResolvedAsset {
          url:        url.clone(),
          local_path: None,
        });
      },
      SourceRef::RepoRelative(path) => path,
    };

    let split = path.find(['?', '#']).unwrap_or(path.len());
    let (path_part, suffix) = path.split_at(split);

    let mut segments: Vec<&str> = Vec::new();
    if !path_part.starts_with(['/', '\\']) {
      if let Some(slug) = &self.slug {
        segments.extend(slug.split('/').filter(|s| !s.is_empty() && *s != "."));
      }
    }

    let escape = || {
      debug!("Rejecting asset reference '{path}': escapes the asset root");
      AssetError::PathEscape {
        reference: path.clone(),
      }
    };

    for segment in path_part.split(['/', '\\']) {
      match classify(segment) {
        Segment::Current => {},
        Segment::Parent => {
          if segments.pop().is_none() {
            return Err(escape());
          }
        },
        Segment::Hidden => return Err(escape()),
        Segment::Name => segments.push(segment),
      }
    }

    let normalized = segments.join("/");
    let url = match &self.cdn_base {
      Some(base) => format!("{}/{normalized}{suffix}", base.trim_end_matches('/')),
      None => format!("/{normalized}{suffix}"),
    };
    let local_path = segments
      .iter()
      .fold(self.asset_root.clone(), |mut acc, segment| {
        acc.push(segment);
        acc
      });

    Ok(ResolvedAsset {
      url,
      local_path: Some(local_path),
    })
  }

  /// Resolve a raw attribute or frontmatter value.
  ///
  /// # Errors
  ///
  /// See [`BaseContext::resolve`].
  pub fn resolve_str(&self, raw: &str) -> Result<ResolvedAsset, AssetError> {
    self.resolve(&SourceRef::parse(raw))
  }
}

enum Segment {
  Current,
  Parent,
  /// Percent-encoded separators wrapping a `..` segment.
  Hidden,
  Name,
}

/// Classify a path segment by its percent-decoded form, so `%2e%2e` counts
/// as `..` the way browsers and servers will read it.
fn classify(segment: &str) -> Segment {
  let decoded = urlencoding::decode(segment)
    .map_or_else(|_| segment.to_string(), std::borrow::Cow::into_owned);
  match decoded.as_str() {
    "" | "." => Segment::Current,
    ".." => Segment::Parent,
    other if other.split(['/', '\\']).any(|part| part == "..") => Segment::Hidden,
    _ => Segment::Name,
  }
}

#[cfg(test)]
mod tests {
  #![allow(clippy::expect_used, reason = "Fine in tests")]
  use std::path::Path;

  use super::*;

  fn context() -> BaseContext {
    BaseContext::new("/content").with_slug("my-post")
  }

  fn relative(path: &str) -> SourceRef {
    SourceRef::RepoRelative(path.to_string())
  }

  #[test]
  fn test_absolute_passes_through() {
    let ctx = context().with_cdn_base("https://cdn.example.com");
    let resolved = ctx
      .resolve(&SourceRef::Absolute("https://x.com/a.png".to_string()))
      .expect("Failed to resolve");
    assert_eq!(resolved.url, "https://x.com/a.png");
    assert_eq!(resolved.local_path, None);
  }

  #[test]
  fn test_document_relative() {
    let ctx = context();
    for path in ["./images/a.png", "images/a.png", "images/./x/../a.png"] {
      let resolved = ctx.resolve(&relative(path)).expect("Failed to resolve");
      assert_eq!(resolved.url, "/my-post/images/a.png", "for {path}");
      assert_eq!(
        resolved.local_path.as_deref(),
        Some(Path::new("/content/my-post/images/a.png"))
      );
    }
  }

  #[test]
  fn test_root_relative() {
    let resolved = context()
      .resolve(&relative("/shared/logo.svg"))
      .expect("Failed to resolve");
    assert_eq!(resolved.url, "/shared/logo.svg");
  }

  #[test]
  fn test_sibling_directory_is_allowed() {
    let resolved = context()
      .resolve(&relative("../other-post/fig.png"))
      .expect("Failed to resolve");
    assert_eq!(resolved.url, "/other-post/fig.png");
  }

  #[test]
  fn test_cdn_base_and_suffix() {
    let ctx = context().with_cdn_base("https://cdn.example.com/posts/");
    let resolved = ctx
      .resolve(&relative("./clip.mp4?autoplay=1#t=10"))
      .expect("Failed to resolve");
    assert_eq!(
      resolved.url,
      "https://cdn.example.com/posts/my-post/clip.mp4?autoplay=1#t=10"
    );
  }

  #[test]
  fn test_path_escape() {
    let ctx = BaseContext::new("/content");
    assert_eq!(
      ctx.resolve(&relative("../../etc/passwd")),
      Err(AssetError::PathEscape {
        reference: "../../etc/passwd".to_string(),
      })
    );
    assert!(context().resolve(&relative("../../etc/passwd")).is_err());
    assert!(context().resolve(&relative("/../x")).is_err());
  }

  #[test]
  fn test_encoded_dot_segments_escape() {
    let ctx = BaseContext::new("/content")
      .with_slug("post")
      .with_cdn_base("https://cdn.example.com/posts");
    for path in [
      "./%2e%2e/%2e%2e/etc/passwd",
      "%2E%2E/%2e%2E/secret.txt",
      "./.%2e/.%2E/x",
      "..\\..\\etc\\passwd",
      "./a/..%5c..%5c..%5cx",
      "%2e%2e%2f%2e%2e%2fsecret.txt",
    ] {
      assert!(
        matches!(ctx.resolve(&relative(path)), Err(AssetError::PathEscape { .. })),
        "for {path}"
      );
    }
  }

  #[test]
  fn test_backslash_is_a_separator() {
    let resolved = context()
      .resolve(&relative(".\\images\\a.png"))
      .expect("Failed to resolve");
    assert_eq!(resolved.url, "/my-post/images/a.png");

    // Encoded dots inside a file name are not dot segments
    let resolved = context()
      .resolve(&relative("./v1%2e2.tar.gz"))
      .expect("Failed to resolve");
    assert_eq!(resolved.url, "/my-post/v1%2e2.tar.gz");
  }

  #[test]
  fn test_resolution_is_idempotent() {
    for ctx in [context(), context().with_cdn_base("https://cdn.example.com")] {
      let once = ctx
        .resolve(&relative("./img/a b.png?x=1"))
        .expect("Failed to resolve");
      let twice = ctx.resolve_str(&once.url).expect("Failed to resolve");
      assert_eq!(once.url, twice.url);
    }
  }
}
