//! # folio-markdown - ingestion and rendering for technical blog posts
//!
//! Parses Markdown/MDX posts with YAML-like frontmatter into a typed document
//! tree and renders it to a sanitized HTML fragment. Code samples are
//! highlighted without being executed, asset references are resolved against
//! a per-post directory or a CDN, and embedded HTML/JSX passes through an
//! allow-list.
//!
//! ## Quick Start
//!
//! ```rust
//! use folio_markdown::{Processor, ProcessorOptions};
//!
//! let processor = Processor::new(ProcessorOptions::default());
//! let rendered = processor
//!   .render("---\ntitle: Hello\n---\n\n# Hello\n\nThis is **bold** text.")
//!   .expect("frontmatter is closed");
//!
//! assert_eq!(rendered.title.as_deref(), Some("Hello"));
//! assert!(rendered.html.starts_with("<h1 id=\"hello\">"));
//! ```
//!
//! ## Pipeline
//!
//! - [`frontmatter`]: metadata block to an ordered key/value map
//! - [`parser`]: body to blocks, block text to inlines
//! - [`syntax`]: code to categorized tokens, behind a pluggable backend
//! - [`assets`]: relative references to canonical URLs
//! - [`sanitize`]: allow-list over embedded HTML and JSX
//! - [`render`]: document tree to HTML
//!
//! ## Configuration
//!
//! ```rust
//! use folio_markdown::{ProcessorOptionsBuilder, SanitizePolicy, TabStyle, Processor};
//!
//! let options = ProcessorOptionsBuilder::new()
//!   .cdn_base(Some("https://cdn.example.com/posts"))
//!   .tab_style(TabStyle::Warn)
//!   .sanitize(SanitizePolicy::default().with_extra_tags(["Tweet"]))
//!   .build();
//!
//! let processor = Processor::new(options);
//! ```

pub mod assets;
mod error;
pub mod frontmatter;
pub mod markup;
pub mod parser;
pub mod processor;
pub mod render;
pub mod sanitize;
pub mod syntax;
mod types;
pub mod utils;

pub use crate::{
  assets::{AssetError, BaseContext, ResolvedAsset},
  error::{BlockKind, IngestError, IngestResult, Warning},
  frontmatter::{Frontmatter, FrontmatterValue},
  parser::parse_document,
  processor::{
    BatchError,
    Processor,
    ProcessorOptions,
    ProcessorOptionsBuilder,
    TabStyle,
  },
  sanitize::{SanitizePolicy, Verdict},
  types::{
    Alignment,
    BlockNode,
    Document,
    Header,
    InlineNode,
    RawKind,
    Rendered,
    SourceRef,
  },
};
