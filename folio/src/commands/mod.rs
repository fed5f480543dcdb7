//! Subcommand implementations.
pub mod check;
pub mod init;
pub mod inspect;
pub mod render;

use std::{
  fs,
  path::{Path, PathBuf},
};

use color_eyre::eyre::{Context, Result, bail};
use folio_config::Config;
use folio_markdown::{
  BatchError,
  Processor,
  Rendered,
  processor::process_batch,
  utils::collect_markdown_files,
};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};

use crate::cli::InputArgs;

/// Outcome of ingesting one post, in input order.
pub type BatchResult = (PathBuf, Result<Rendered, BatchError>);

/// Load configuration from files and overrides, then apply the flags given
/// on the command line, which take precedence over both.
///
/// # Errors
///
/// Returns an error if a config file cannot be loaded or an override is
/// invalid.
pub fn load_config(
  config_files: &[PathBuf],
  config_overrides: &[String],
  input: &InputArgs,
) -> Result<Config> {
  let mut config = Config::load(config_files, config_overrides)?;

  if let Some(ref input_dir) = input.input_dir {
    config.input_dir = Some(input_dir.clone());
  }
  if let Some(jobs) = input.jobs {
    config.jobs = Some(jobs);
  }
  if let Some(ref cdn_base) = input.cdn_base {
    config.cdn_base = Some(cdn_base.clone());
  }
  if let Some(ref asset_root) = input.asset_root {
    config.asset_root = Some(asset_root.clone());
  }
  if input.no_highlight {
    config.highlight_code = false;
  }

  debug!("Effective configuration: {config:?}");
  Ok(config)
}

/// Ingest every post below the configured input directory.
///
/// Posts are rendered in parallel on a pool sized by `jobs`; a failing post
/// does not stop the others.
///
/// # Errors
///
/// Returns an error if no input directory is configured, the configured
/// paths are invalid or the thread pool cannot be built.
pub fn ingest(config: &Config) -> Result<Vec<BatchResult>> {
  let Some(ref input_dir) = config.input_dir else {
    bail!(
      "No input directory provided. Use --input-dir or set input_dir in the \
       configuration file."
    );
  };
  config.validate_paths()?;

  let processor = Processor::new(config.processor_options()?);
  let files = collect_markdown_files(input_dir);
  info!("Found {} posts in {}", files.len(), input_dir.display());

  let thread_count = config.jobs.unwrap_or_else(num_cpus::get);
  let pool = rayon::ThreadPoolBuilder::new()
    .num_threads(thread_count)
    .build()
    .wrap_err("Failed to build thread pool")?;

  let progress = ProgressBar::new(files.len() as u64);
  progress.set_style(
    ProgressStyle::with_template("{spinner} [{bar:40}] {pos}/{len} posts")?
      .progress_chars("=> "),
  );

  let results = pool.install(|| {
    process_batch(&processor, &files, |path| {
      let content = fs::read_to_string(path);
      progress.inc(1);
      content
    })
  });
  progress.finish_and_clear();

  Ok(results)
}

/// Path of a post relative to the input directory, for messages.
#[must_use]
pub fn display_path<'a>(config: &Config, path: &'a Path) -> std::borrow::Cow<'a, str> {
  config
    .input_dir
    .as_deref()
    .and_then(|input_dir| path.strip_prefix(input_dir).ok())
    .unwrap_or(path)
    .to_string_lossy()
}
