use std::{
  fs,
  path::{Path, PathBuf},
  sync::OnceLock,
};

use folio_markdown::{ProcessorOptions, ProcessorOptionsBuilder, TabStyle};
use serde::{Deserialize, Serialize};

use crate::{error::ConfigError, sanitize::SanitizeConfig};

/// Configuration for the folio post renderer.
///
/// [`Config`] holds the options that control batch rendering: where posts
/// live, where output goes, how assets resolve and what the sanitizer lets
/// through. Fields are typically loaded from a TOML or JSON config file, but
/// can also be set via CLI arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  /// Directory containing `.md` and `.mdx` posts.
  pub input_dir: Option<PathBuf>,

  /// Directory rendered HTML is written to.
  pub output_dir: PathBuf,

  /// Base URL assets are served from.
  pub cdn_base: Option<String>,

  /// Directory holding post assets on disk. Falls back to `input_dir`.
  pub asset_root: Option<PathBuf>,

  /// Number of threads to use for parallel rendering.
  pub jobs: Option<usize>,

  /// Whether to highlight fenced code blocks.
  pub highlight_code: bool,

  /// How to handle hard tabs in code blocks: `none`, `warn` or `normalize`.
  pub tab_style: String,

  /// Write `<slug>.json` next to each rendered post.
  pub emit_json: bool,

  /// Sanitizer allow-list adjustments.
  pub sanitize: SanitizeConfig,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      input_dir:      None,
      output_dir:     PathBuf::from("build"),
      cdn_base:       None,
      asset_root:     None,
      jobs:           None,
      highlight_code: true,
      tab_style:      "none".to_string(),
      emit_json:      false,
      sanitize:       SanitizeConfig::default(),
    }
  }
}

impl Config {
  /// Load configuration from a file (TOML or JSON).
  ///
  /// # Errors
  ///
  /// Returns an error if the file cannot be read or parsed, or if the format is
  /// unsupported.
  #[allow(
    clippy::option_if_let_else,
    reason = "Clearer with explicit match on extension"
  )]
  pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
      ConfigError::Config(format!(
        "Failed to read config file: {}: {}",
        path.display(),
        e
      ))
    })?;

    match path.extension().and_then(|ext| ext.to_str()) {
      Some(ext) => {
        match ext.to_lowercase().as_str() {
          "json" => {
            serde_json::from_str(&content).map_err(|e| {
              ConfigError::Config(format!(
                "Failed to parse JSON config from {}: {}",
                path.display(),
                e
              ))
            })
          },
          "toml" => {
            toml::from_str(&content).map_err(|e| {
              ConfigError::Config(format!(
                "Failed to parse TOML config from {}: {}",
                path.display(),
                e
              ))
            })
          },
          _ => {
            Err(ConfigError::Config(format!(
              "Unsupported config file format: {}",
              path.display()
            )))
          },
        }
      },
      None => {
        Err(ConfigError::Config(format!(
          "Config file has no extension: {}",
          path.display()
        )))
      },
    }
  }

  /// Load configuration from the given files, or a discovered one, and apply
  /// `KEY=VALUE` overrides on top.
  ///
  /// Files are merged in order, later files taking precedence. When no file is
  /// given, [`Config::find_config_file`] is consulted and defaults are used if
  /// nothing is found.
  ///
  /// # Errors
  ///
  /// Returns an error if a file cannot be loaded, an override is malformed, or
  /// the resulting `tab_style` is unknown.
  pub fn load(
    config_files: &[PathBuf],
    config_overrides: &[String],
  ) -> Result<Self, ConfigError> {
    let mut config = if let Some((first, rest)) = config_files.split_first() {
      let mut merged_config = Self::from_file(first).map_err(|e| {
        ConfigError::Config(format!(
          "Failed to load config from {}: {}",
          first.display(),
          e
        ))
      })?;

      for config_path in rest {
        let additional_config = Self::from_file(config_path).map_err(|e| {
          ConfigError::Config(format!(
            "Failed to load config from {}: {}",
            config_path.display(),
            e
          ))
        })?;
        merged_config.merge(additional_config);
      }

      if config_files.len() > 1 {
        log::info!("Loaded and merged {} config files", config_files.len());
      }

      merged_config
    } else if let Some(discovered_config) = Self::find_config_file() {
      log::info!(
        "Using discovered config file: {}",
        discovered_config.display()
      );
      Self::from_file(&discovered_config).map_err(|e| {
        ConfigError::Config(format!(
          "Failed to load discovered config from {}: {}",
          discovered_config.display(),
          e
        ))
      })?
    } else {
      Self::default()
    };

    if !config_overrides.is_empty() {
      config.apply_overrides(config_overrides)?;
    }

    config.parsed_tab_style()?;

    Ok(config)
  }

  /// Apply configuration overrides from KEY=VALUE strings.
  ///
  /// Keys are the field names of [`Config`]; sanitizer fields are addressed
  /// as `sanitize.<field>` and take comma-separated lists.
  ///
  /// # Errors
  ///
  /// Returns an error if:
  ///
  /// - An override string is not in KEY=VALUE format
  /// - A key is not recognized
  /// - A value cannot be parsed as the expected type
  ///
  /// # Example
  ///
  /// ```rust
  /// use folio_config::Config;
  ///
  /// let mut config = Config::default();
  /// config
  ///   .apply_overrides(&[
  ///     "highlight_code=false".to_string(),
  ///     "sanitize.extra_tags=Tweet,Callout".to_string(),
  ///   ])
  ///   .expect("overrides are valid");
  ///
  /// assert!(!config.highlight_code);
  /// assert_eq!(config.sanitize.extra_tags, ["Tweet", "Callout"]);
  /// ```
  pub fn apply_overrides(
    &mut self,
    overrides: &[String],
  ) -> Result<(), ConfigError> {
    for override_str in overrides {
      let (key, value) = override_str.split_once('=').ok_or_else(|| {
        ConfigError::Config(format!(
          "Invalid config override format: '{override_str}'. Expected \
           KEY=VALUE"
        ))
      })?;

      self.apply_override(key.trim(), value.trim())?;
    }

    Ok(())
  }

  fn apply_override(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
    match key {
      "input_dir" => {
        self.input_dir = (!value.is_empty()).then(|| PathBuf::from(value));
      },
      "output_dir" => self.output_dir = PathBuf::from(value),
      "cdn_base" => {
        self.cdn_base = (!value.is_empty()).then(|| value.to_string());
      },
      "asset_root" => {
        self.asset_root = (!value.is_empty()).then(|| PathBuf::from(value));
      },
      "jobs" => {
        self.jobs = if value.is_empty() {
          None
        } else {
          Some(value.parse().map_err(|_| {
            ConfigError::Config(format!(
              "Invalid value for 'jobs': '{value}'. Expected a positive integer"
            ))
          })?)
        };
      },
      "highlight_code" => self.highlight_code = parse_bool(key, value)?,
      "emit_json" => self.emit_json = parse_bool(key, value)?,
      "tab_style" => {
        parse_tab_style(value)?;
        self.tab_style = value.to_lowercase();
      },
      "sanitize.extra_tags" => self.sanitize.extra_tags = parse_list(value),
      "sanitize.extra_attributes" => {
        self.sanitize.extra_attributes = parse_list(value);
      },
      "sanitize.iframe_domains" => {
        self.sanitize.iframe_domains = Some(parse_list(value));
      },
      "sanitize.iframe_sandbox" => {
        self.sanitize.iframe_sandbox = Some(parse_list(value));
      },
      _ => {
        return Err(ConfigError::Config(format!(
          "Unknown configuration key: '{key}'. See documentation for \
           supported keys."
        )));
      },
    }

    Ok(())
  }

  /// Merge another config into this one, with the other config's values taking
  /// precedence.
  ///
  /// # Merge Rules
  ///
  /// - [`Option<T>`] fields: Other's [`Some`] value replaces this config's
  ///   value
  /// - Plain fields (String, bool, etc.): Other's value always replaces
  /// - `sanitize`: see [`SanitizeConfig::merge`]
  pub fn merge(&mut self, other: Self) {
    if other.input_dir.is_some() {
      self.input_dir = other.input_dir;
    }
    if other.cdn_base.is_some() {
      self.cdn_base = other.cdn_base;
    }
    if other.asset_root.is_some() {
      self.asset_root = other.asset_root;
    }
    if other.jobs.is_some() {
      self.jobs = other.jobs;
    }
    self.output_dir = other.output_dir;
    self.highlight_code = other.highlight_code;
    self.tab_style = other.tab_style;
    self.emit_json = other.emit_json;
    self.sanitize.merge(other.sanitize);
  }

  /// Search for config files in common locations
  #[must_use]
  pub fn find_config_file() -> Option<PathBuf> {
    static RESULT: OnceLock<Option<PathBuf>> = OnceLock::new();
    RESULT
      .get_or_init(|| {
        let config_filenames = [
          "folio.toml",
          "folio.json",
          ".folio.toml",
          ".folio.json",
          ".config/folio.toml",
          ".config/folio.json",
        ];

        let current_dir = std::env::current_dir().ok()?;
        for filename in &config_filenames {
          let config_path = current_dir.join(filename);
          if config_path.exists() {
            return Some(config_path);
          }
        }

        if let Ok(xdg_config_home) = std::env::var("XDG_CONFIG_HOME") {
          let xdg_config_dir = PathBuf::from(xdg_config_home).join("folio");
          for filename in &["config.toml", "config.json"] {
            let config_path = xdg_config_dir.join(filename);
            if config_path.exists() {
              return Some(config_path);
            }
          }
        }

        None
      })
      .clone()
  }

  /// Validate all paths specified in the configuration
  ///
  /// # Errors
  ///
  /// Returns an error if the input directory or asset root is set but does
  /// not exist or is not a directory.
  pub fn validate_paths(&self) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    for (name, dir) in [
      ("Input directory", self.input_dir.as_ref()),
      ("Asset root", self.asset_root.as_ref()),
    ] {
      if let Some(dir) = dir {
        if !dir.exists() {
          errors.push(format!("{name} does not exist: {}", dir.display()));
        } else if !dir.is_dir() {
          errors.push(format!("{name} is not a directory: {}", dir.display()));
        }
      }
    }

    if !errors.is_empty() {
      return Err(ConfigError::Config(errors.join("\n")));
    }

    Ok(())
  }

  /// The configured tab handling.
  ///
  /// # Errors
  ///
  /// Returns an error if `tab_style` is not one of `none`, `warn` or
  /// `normalize`.
  pub fn parsed_tab_style(&self) -> Result<TabStyle, ConfigError> {
    parse_tab_style(&self.tab_style)
  }

  /// Build processor options from this configuration.
  ///
  /// # Errors
  ///
  /// Returns an error if `tab_style` is invalid.
  pub fn processor_options(&self) -> Result<ProcessorOptions, ConfigError> {
    let asset_root = self
      .asset_root
      .as_ref()
      .or(self.input_dir.as_ref())
      .cloned()
      .unwrap_or_else(|| PathBuf::from("."));

    Ok(
      ProcessorOptionsBuilder::new()
        .highlight_code(self.highlight_code)
        .tab_style(self.parsed_tab_style()?)
        .cdn_base(self.cdn_base.as_deref())
        .asset_root(asset_root)
        .sanitize(self.sanitize.policy())
        .build(),
    )
  }

  /// Generate a default configuration file with commented explanations
  ///
  /// # Errors
  ///
  /// Returns an error if the format is unsupported or the file cannot be
  /// written.
  pub fn generate_default_config(
    format: &str,
    path: &Path,
  ) -> Result<(), ConfigError> {
    let config_content = crate::templates::get_template(format)
      .map_err(|e| ConfigError::Template(e.to_string()))?;

    fs::write(path, config_content).map_err(|e| {
      ConfigError::Config(format!(
        "Failed to write default config to {}: {}",
        path.display(),
        e
      ))
    })?;

    log::info!("Created default configuration file: {}", path.display());
    Ok(())
  }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
  match value.to_lowercase().as_str() {
    "true" | "yes" | "1" => Ok(true),
    "false" | "no" | "0" => Ok(false),
    _ => {
      Err(ConfigError::Config(format!(
        "Invalid boolean value for '{key}': '{value}'. Expected true/false, \
         yes/no, or 1/0"
      )))
    },
  }
}

fn parse_tab_style(value: &str) -> Result<TabStyle, ConfigError> {
  match value.to_lowercase().as_str() {
    "none" => Ok(TabStyle::None),
    "warn" => Ok(TabStyle::Warn),
    "normalize" => Ok(TabStyle::Normalize),
    _ => {
      Err(ConfigError::Config(format!(
        "Invalid value for 'tab_style': '{value}'. Expected none, warn, or \
         normalize"
      )))
    },
  }
}

fn parse_list(value: &str) -> Vec<String> {
  value
    .split(',')
    .map(str::trim)
    .filter(|item| !item.is_empty())
    .map(ToString::to_string)
    .collect()
}

#[cfg(test)]
mod tests {
  #![allow(clippy::expect_used, reason = "Fine in tests")]
  use std::fs;

  use tempfile::tempdir;

  use super::*;

  #[test]
  fn test_default_config() {
    let config = Config::default();
    assert_eq!(config.output_dir, PathBuf::from("build"));
    assert!(config.highlight_code);
    assert!(!config.emit_json);
    assert_eq!(
      config.parsed_tab_style().expect("default is valid"),
      TabStyle::None
    );
  }

  #[test]
  fn test_from_toml_file() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("folio.toml");
    fs::write(
      &path,
      r#"
input_dir = "posts"
cdn_base = "https://cdn.example.com"
tab_style = "warn"

[sanitize]
extra_tags = ["Tweet"]
iframe_domains = ["player.vimeo.com"]
"#,
    )
    .expect("Failed to write config");

    let config = Config::from_file(&path).expect("Failed to load config");
    assert_eq!(config.input_dir, Some(PathBuf::from("posts")));
    assert_eq!(config.cdn_base.as_deref(), Some("https://cdn.example.com"));
    assert_eq!(config.tab_style, "warn");
    assert_eq!(config.sanitize.extra_tags, ["Tweet"]);
    assert_eq!(
      config.sanitize.iframe_domains,
      Some(vec!["player.vimeo.com".to_string()])
    );
    // Unset fields keep their defaults
    assert_eq!(config.output_dir, PathBuf::from("build"));
  }

  #[test]
  fn test_from_json_file() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("folio.json");
    fs::write(&path, r#"{ "emit_json": true, "jobs": 2 }"#)
      .expect("Failed to write config");

    let config = Config::from_file(&path).expect("Failed to load config");
    assert!(config.emit_json);
    assert_eq!(config.jobs, Some(2));
  }

  #[test]
  fn test_from_file_unsupported_extension() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("folio.yaml");
    fs::write(&path, "input_dir: posts").expect("Failed to write config");

    let err = Config::from_file(&path).expect_err("yaml is unsupported");
    assert!(err.to_string().contains("Unsupported config file format"));
  }

  #[test]
  fn test_load_merges_files_in_order() {
    let dir = tempdir().expect("Failed to create temp dir");
    let base = dir.path().join("base.toml");
    let local = dir.path().join("local.toml");
    fs::write(
      &base,
      "input_dir = \"posts\"\n[sanitize]\nextra_tags = [\"Tweet\"]\n",
    )
    .expect("Failed to write config");
    fs::write(
      &local,
      "cdn_base = \"https://cdn.example.com\"\n[sanitize]\nextra_tags = \
       [\"Callout\"]\n",
    )
    .expect("Failed to write config");

    let config =
      Config::load(&[base, local], &["jobs=3".to_string()]).expect("loads");
    assert_eq!(config.input_dir, Some(PathBuf::from("posts")));
    assert_eq!(config.cdn_base.as_deref(), Some("https://cdn.example.com"));
    assert_eq!(config.sanitize.extra_tags, ["Tweet", "Callout"]);
    assert_eq!(config.jobs, Some(3));
  }

  #[test]
  fn test_load_rejects_bad_tab_style() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("folio.toml");
    fs::write(&path, "tab_style = \"spaces\"\n").expect("Failed to write");

    let err = Config::load(&[path], &[]).expect_err("tab_style is invalid");
    assert!(err.to_string().contains("tab_style"));
  }

  #[test]
  fn test_apply_overrides_boolean() {
    let mut config = Config::default();

    config
      .apply_overrides(&[
        "highlight_code=no".to_string(),
        "emit_json=1".to_string(),
      ])
      .expect("overrides are valid");

    assert!(!config.highlight_code);
    assert!(config.emit_json);
  }

  #[test]
  fn test_apply_overrides_path_and_string() {
    let mut config = Config::default();

    config
      .apply_overrides(&[
        "output_dir=/tmp/output".to_string(),
        "input_dir=/tmp/input".to_string(),
        "cdn_base=https://cdn.example.com/a=b".to_string(),
      ])
      .expect("overrides are valid");

    assert_eq!(config.output_dir, PathBuf::from("/tmp/output"));
    assert_eq!(config.input_dir, Some(PathBuf::from("/tmp/input")));
    // Only the first '=' separates key and value
    assert_eq!(config.cdn_base.as_deref(), Some("https://cdn.example.com/a=b"));
  }

  #[test]
  fn test_apply_overrides_empty_clears_option() {
    let mut config = Config {
      cdn_base: Some("https://cdn.example.com".to_string()),
      ..Default::default()
    };

    config
      .apply_overrides(&["cdn_base=".to_string()])
      .expect("overrides are valid");

    assert_eq!(config.cdn_base, None);
  }

  #[test]
  fn test_apply_overrides_sanitize_lists() {
    let mut config = Config::default();

    config
      .apply_overrides(&[
        "sanitize.iframe_domains=player.vimeo.com, codepen.io".to_string(),
        "sanitize.extra_attributes=data-theme".to_string(),
      ])
      .expect("overrides are valid");

    assert_eq!(
      config.sanitize.iframe_domains,
      Some(vec!["player.vimeo.com".to_string(), "codepen.io".to_string()])
    );
    assert_eq!(config.sanitize.extra_attributes, ["data-theme"]);
  }

  #[test]
  fn test_apply_overrides_invalid_format() {
    let mut config = Config::default();

    let result = config.apply_overrides(&["no_equals_sign".to_string()]);

    assert!(
      result
        .expect_err("missing '=' is rejected")
        .to_string()
        .contains("Expected KEY=VALUE")
    );
  }

  #[test]
  fn test_apply_overrides_unknown_key() {
    let mut config = Config::default();

    let result = config.apply_overrides(&["title=value".to_string()]);

    assert!(
      result
        .expect_err("unknown key is rejected")
        .to_string()
        .contains("Unknown configuration key")
    );
  }

  #[test]
  fn test_apply_overrides_invalid_values() {
    let mut config = Config::default();

    let err = config
      .apply_overrides(&["highlight_code=maybe".to_string()])
      .expect_err("not a boolean");
    assert!(err.to_string().contains("Invalid boolean"));

    let err = config
      .apply_overrides(&["jobs=many".to_string()])
      .expect_err("not a number");
    assert!(err.to_string().contains("Invalid value"));

    let err = config
      .apply_overrides(&["tab_style=spaces".to_string()])
      .expect_err("unknown tab style");
    assert!(err.to_string().contains("Invalid value for 'tab_style'"));
  }

  #[test]
  fn test_merge_option_and_plain_fields() {
    let mut base = Config {
      input_dir: Some(PathBuf::from("posts")),
      jobs: Some(2),
      ..Default::default()
    };
    let other = Config {
      jobs: None,
      highlight_code: false,
      ..Default::default()
    };

    base.merge(other);

    assert_eq!(base.input_dir, Some(PathBuf::from("posts")));
    assert_eq!(base.jobs, Some(2));
    assert!(!base.highlight_code);
  }

  #[test]
  fn test_validate_paths() {
    let dir = tempdir().expect("Failed to create temp dir");
    let file = dir.path().join("not-a-dir.md");
    fs::write(&file, "# hi").expect("Failed to write");

    let ok = Config {
      input_dir: Some(dir.path().to_path_buf()),
      ..Default::default()
    };
    assert!(ok.validate_paths().is_ok());

    let bad = Config {
      input_dir: Some(dir.path().join("missing")),
      asset_root: Some(file),
      ..Default::default()
    };
    let message = bad.validate_paths().expect_err("paths are bad").to_string();
    assert!(message.contains("Input directory does not exist"));
    assert!(message.contains("Asset root is not a directory"));
  }

  #[test]
  fn test_processor_options_bridge() {
    let config = Config {
      input_dir: Some(PathBuf::from("posts")),
      cdn_base: Some("https://cdn.example.com".to_string()),
      highlight_code: false,
      tab_style: "normalize".to_string(),
      sanitize: SanitizeConfig {
        extra_tags: vec!["Tweet".to_string()],
        ..Default::default()
      },
      ..Default::default()
    };

    let options = config.processor_options().expect("options are valid");
    assert!(!options.highlight_code);
    assert_eq!(options.tab_style, TabStyle::Normalize);
    assert_eq!(options.cdn_base.as_deref(), Some("https://cdn.example.com"));
    // asset_root falls back to the input directory
    assert_eq!(options.asset_root, PathBuf::from("posts"));
    assert!(options.sanitize.allows_tag("Tweet"));
  }

  #[test]
  fn test_generate_default_config() {
    let dir = tempdir().expect("Failed to create temp dir");

    for format in ["toml", "json"] {
      let path = dir.path().join(format!("folio.{format}"));
      Config::generate_default_config(format, &path)
        .expect("Failed to generate config");
      let config = Config::from_file(&path).expect("Generated config loads");
      assert_eq!(config.input_dir, Some(PathBuf::from("posts")));
    }

    let err = Config::generate_default_config("ini", &dir.path().join("x"))
      .expect_err("ini is unsupported");
    assert!(matches!(err, ConfigError::Template(_)));
  }
}
