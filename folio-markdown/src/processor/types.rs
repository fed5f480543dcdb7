//! Type definitions for the post processor.
//!
//! Contains the configuration options (`ProcessorOptions` and its builder)
//! and the `Processor` struct itself.
//!
//! # Examples
//!
//! ```
//! use folio_markdown::{Processor, ProcessorOptions};
//!
//! let options = ProcessorOptions {
//!   highlight_code: true,
//!   cdn_base: Some("https://cdn.example.com".to_string()),
//!   ..Default::default()
//! };
//!
//! let processor = Processor::new(options);
//! ```

use std::path::PathBuf;

use crate::{sanitize::SanitizePolicy, syntax::SyntaxManager};

/// Options for configuring the processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessorOptions {
  /// Enable syntax highlighting for code blocks.
  pub highlight_code: bool,

  /// How to handle hard tabs in code blocks.
  pub tab_style: TabStyle,

  /// Base URL assets are served from. Resolved URLs are root-relative when
  /// unset.
  pub cdn_base: Option<String>,

  /// Directory holding post assets on disk.
  pub asset_root: PathBuf,

  /// Allow-list applied to embedded HTML and JSX.
  pub sanitize: SanitizePolicy,
}

/// Configuration for handling hard tabs in code blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TabStyle {
  /// Leave hard tabs unchanged
  #[default]
  None,
  /// Issue a warning when hard tabs are detected
  Warn,
  /// Automatically convert hard tabs to spaces (using 2 spaces per tab)
  Normalize,
}

impl Default for ProcessorOptions {
  fn default() -> Self {
    Self {
      highlight_code: true,
      tab_style:      TabStyle::None,
      cdn_base:       None,
      asset_root:     PathBuf::from("."),
      sanitize:       SanitizePolicy::default(),
    }
  }
}

/// Parses and renders posts.
///
/// A processor holds no per-document state, so one instance can be shared
/// across threads for batch ingestion.
#[derive(Debug)]
pub struct Processor {
  pub(crate) options:        ProcessorOptions,
  pub(crate) syntax_manager: Option<SyntaxManager>,
}

/// Builder for constructing `ProcessorOptions` with method chaining.
#[derive(Debug, Clone, Default)]
pub struct ProcessorOptionsBuilder {
  options: ProcessorOptions,
}

impl ProcessorOptionsBuilder {
  /// Create a new builder with default options.
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// Enable or disable syntax highlighting.
  #[must_use]
  pub const fn highlight_code(mut self, enabled: bool) -> Self {
    self.options.highlight_code = enabled;
    self
  }

  /// Set how to handle hard tabs in code blocks.
  #[must_use]
  pub const fn tab_style(mut self, style: TabStyle) -> Self {
    self.options.tab_style = style;
    self
  }

  /// Set the CDN base URL.
  #[must_use]
  pub fn cdn_base<S: Into<String>>(mut self, base: Option<S>) -> Self {
    self.options.cdn_base = base.map(Into::into);
    self
  }

  /// Set the asset root directory.
  #[must_use]
  pub fn asset_root<P: Into<PathBuf>>(mut self, root: P) -> Self {
    self.options.asset_root = root.into();
    self
  }

  /// Set the sanitizer allow-list.
  #[must_use]
  pub fn sanitize(mut self, policy: SanitizePolicy) -> Self {
    self.options.sanitize = policy;
    self
  }

  /// Build the final `ProcessorOptions`.
  #[must_use]
  pub fn build(self) -> ProcessorOptions {
    self.options
  }
}
