use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};

/// Command line interface for folio
#[derive(Parser, Debug)]
#[command(author, version, about = "folio: render Markdown/MDX posts to HTML")]
pub struct Cli {
  /// Subcommand to execute (see [`Commands`])
  #[command(subcommand)]
  pub command: Commands,

  #[command(flatten)]
  pub verbosity: Verbosity<InfoLevel>,

  /// Path to configuration file(s) (TOML or JSON, can be specified multiple
  /// times) Multiple files are merged in order, with later files overriding
  /// earlier ones
  #[arg(short = 'c', long = "config-file", action = clap::ArgAction::Append, global = true)]
  pub config_files: Vec<PathBuf>,

  /// Override configuration values (KEY=VALUE format, can be used multiple
  /// times)
  #[arg(long = "config", action = clap::ArgAction::Append, global = true)]
  pub config_overrides: Vec<String>,
}

/// All supported subcommands for the folio CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
  /// Initialize a new folio configuration file
  Init {
    /// Path to create the configuration file at
    #[arg(short, long, default_value = "folio.toml")]
    output: PathBuf,

    /// Format of the configuration file.
    #[arg(short = 'F', long, default_value = "toml", value_parser = ["toml", "json"])]
    format: String,

    /// Force overwrite if file already exists
    #[arg(short, long)]
    force: bool,
  },

  /// Render every post under the input directory to HTML fragments.
  Render {
    #[command(flatten)]
    input: InputArgs,

    /// Output directory for rendered posts.
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Write `<slug>.json` with metadata and headings next to each post.
    #[arg(long = "emit-json", action = clap::ArgAction::SetTrue)]
    emit_json: bool,
  },

  /// Ingest every post and report problems without writing anything.
  Check {
    #[command(flatten)]
    input: InputArgs,

    /// Treat warnings as failures.
    #[arg(long)]
    strict: bool,
  },

  /// Print the parsed document tree of a single post as JSON.
  Inspect {
    /// Post to parse.
    file: PathBuf,

    /// Pretty-print the JSON output.
    #[arg(short, long)]
    pretty: bool,
  },
}

/// Arguments shared by commands that ingest a directory of posts.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct InputArgs {
  /// Path to the directory containing posts.
  #[arg(short, long)]
  pub input_dir: Option<PathBuf>,

  /// Number of threads to use for parallel processing.
  #[arg(short = 'p', long = "jobs")]
  pub jobs: Option<usize>,

  /// Base URL assets are served from.
  #[arg(long = "cdn-base")]
  pub cdn_base: Option<String>,

  /// Directory holding post assets on disk.
  #[arg(long = "asset-root")]
  pub asset_root: Option<PathBuf>,

  /// Disable syntax highlighting for code blocks.
  #[arg(long = "no-highlight", action = clap::ArgAction::SetTrue)]
  pub no_highlight: bool,
}

impl Cli {
  /// Parse command line arguments into a [`Cli`] struct.
  #[must_use]
  pub fn parse_args() -> Self {
    Self::parse()
  }
}

#[cfg(test)]
mod tests {
  #![allow(clippy::expect_used, reason = "Fine in tests")]
  use clap::CommandFactory;

  use super::*;

  #[test]
  fn test_cli_is_well_formed() {
    Cli::command().debug_assert();
  }

  #[test]
  fn test_render_arguments() {
    let cli = Cli::try_parse_from([
      "folio",
      "-v",
      "render",
      "-i",
      "posts",
      "--cdn-base",
      "https://cdn.example.com",
      "--emit-json",
      "--config",
      "jobs=2",
    ])
    .expect("arguments parse");

    assert_eq!(cli.verbosity.log_level_filter(), log::LevelFilter::Debug);
    assert_eq!(cli.config_overrides, ["jobs=2"]);
    assert!(matches!(
      cli.command,
      Commands::Render { ref input, emit_json: true, .. }
        if input.input_dir == Some(PathBuf::from("posts"))
          && input.cdn_base.as_deref() == Some("https://cdn.example.com")
    ));
  }

  #[test]
  fn test_check_strict() {
    let cli = Cli::try_parse_from(["folio", "check", "--strict"])
      .expect("arguments parse");
    assert!(matches!(cli.command, Commands::Check { strict: true, .. }));
  }
}
