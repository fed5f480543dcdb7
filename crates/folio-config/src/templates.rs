use std::fmt;

/// Error type for config template lookups.
#[derive(Debug)]
pub enum TemplateError {
  /// The requested configuration format is not supported.
  UnsupportedFormat(String),
}

impl fmt::Display for TemplateError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::UnsupportedFormat(format) => {
        write!(f, "Unsupported config format: {format}")
      },
    }
  }
}

impl std::error::Error for TemplateError {}

/// Default configuration written by `folio init --format toml`.
pub const DEFAULT_TOML_TEMPLATE: &str = r#"# folio configuration file

# Directory containing .md and .mdx posts
input_dir = "posts"

# Directory rendered HTML is written to
output_dir = "build"

# Base URL assets are served from. Resolved URLs are root-relative when unset.
# cdn_base = "https://cdn.example.com/posts"

# Directory holding post assets on disk (defaults to input_dir)
# asset_root = "posts"

# Number of threads to use for parallel rendering (defaults to number of CPU cores)
# jobs = 4

# Highlight fenced code blocks
highlight_code = true

# How to handle hard tabs in code blocks: "none", "warn", or "normalize"
tab_style = "none"

# Write <slug>.json with metadata and headings next to each rendered post
emit_json = false

[sanitize]
# JSX components and extra tags to pass through
extra_tags = []

# Extra attributes allowed on every tag. Event handlers are always removed.
extra_attributes = []

# Hosts an <iframe> may load from (replaces the built-in list)
# iframe_domains = ["www.youtube.com", "player.vimeo.com", "codesandbox.io"]

# sandbox tokens permitted on embeds (replaces the built-in list)
# iframe_sandbox = ["allow-scripts", "allow-same-origin", "allow-presentation"]
"#;

/// Default configuration written by `folio init --format json`.
pub const DEFAULT_JSON_TEMPLATE: &str = r#"{
  "input_dir": "posts",
  "output_dir": "build",
  "highlight_code": true,
  "tab_style": "none",
  "emit_json": false,
  "sanitize": {
    "extra_tags": [],
    "extra_attributes": []
  }
}
"#;

/// Get the default config template for a format.
///
/// # Errors
///
/// Returns [`TemplateError::UnsupportedFormat`] for anything but `toml` or
/// `json`.
pub fn get_template(format: &str) -> Result<&'static str, TemplateError> {
  match format.to_lowercase().as_str() {
    "toml" => Ok(DEFAULT_TOML_TEMPLATE),
    "json" => Ok(DEFAULT_JSON_TEMPLATE),
    _ => Err(TemplateError::UnsupportedFormat(format.to_string())),
  }
}

#[cfg(test)]
mod tests {
  #![allow(clippy::expect_used, reason = "Fine in tests")]
  use super::*;
  use crate::Config;

  #[test]
  fn test_templates_parse_to_config() {
    let from_toml: Config =
      toml::from_str(DEFAULT_TOML_TEMPLATE).expect("TOML template parses");
    let from_json: Config =
      serde_json::from_str(DEFAULT_JSON_TEMPLATE).expect("JSON template parses");

    assert_eq!(from_toml, from_json);
    assert_eq!(from_toml.tab_style, "none");
  }

  #[test]
  fn test_unsupported_format() {
    let err = get_template("yaml").expect_err("yaml is not supported");
    assert_eq!(err.to_string(), "Unsupported config format: yaml");
  }
}
