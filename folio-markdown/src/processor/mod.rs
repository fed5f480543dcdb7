//! Post processing with modular organization.
//!
//! # Architecture
//!
//! The processor module is organized into focused submodules:
//!
//! - [`core`]: Main processor implementation and rendering pipeline
//! - [`process`]: High-level processing functions with failure isolation
//! - [`types`]: Configuration structures and the processor type
pub mod core;
pub mod process;
pub mod types;

pub use process::{
  BatchError,
  ProcessorPreset,
  create_processor,
  process_batch,
  process_markdown_file,
  process_markdown_string,
  process_with_recovery,
};
pub use types::{Processor, ProcessorOptions, ProcessorOptionsBuilder, TabStyle};

#[cfg(test)]
mod tests {
  #![allow(clippy::expect_used, reason = "Fine in tests")]
  use super::*;
  use crate::error::Warning;

  #[test]
  fn test_tab_style_none() {
    let processor = Processor::new(ProcessorOptions {
      tab_style: TabStyle::None,
      ..Default::default()
    });
    let rendered = processor
      .render("```\nfn main() {\n\tprintln!(\"x\");\n}\n```")
      .expect("Failed to render");
    assert!(rendered.html.contains('\t'));
    assert!(rendered.warnings.is_empty());
  }

  #[test]
  fn test_tab_style_warn() {
    let processor = Processor::new(ProcessorOptions {
      tab_style: TabStyle::Warn,
      ..Default::default()
    });
    let rendered = processor
      .render("# Title\n\n```\nfn main() {\n\tprintln!(\"x\");\n}\n```")
      .expect("Failed to render");
    assert!(rendered.html.contains('\t'));
    assert_eq!(rendered.warnings, vec![Warning::HardTabs { line: 3 }]);
  }

  #[test]
  fn test_tab_style_normalize() {
    let processor = Processor::new(ProcessorOptions {
      tab_style: TabStyle::Normalize,
      ..Default::default()
    });
    let rendered = processor
      .render("```\nfn main() {\n\tprintln!(\"x\");\n}\n```")
      .expect("Failed to render");
    assert!(!rendered.html.contains('\t'));
    assert!(rendered.html.contains("  println!"));
  }

  #[test]
  fn test_builder_matches_struct_literal() {
    let built = ProcessorOptionsBuilder::new()
      .highlight_code(false)
      .cdn_base(Some("https://cdn.example.com"))
      .asset_root("/srv/posts")
      .build();
    assert_eq!(built, ProcessorOptions {
      highlight_code: false,
      cdn_base: Some("https://cdn.example.com".to_string()),
      asset_root: "/srv/posts".into(),
      ..Default::default()
    });
  }
}
