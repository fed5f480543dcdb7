use std::{fs, path::PathBuf};

use color_eyre::eyre::{Context, Result, bail};
use folio_config::Config;
use log::{error, info, warn};

use super::{display_path, ingest};
use crate::output::{self, IndexEntry};

/// Summary of a render run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderSummary {
  pub rendered: usize,
  pub failed:   usize,
  pub warnings: usize,
}

/// Render every post to `<slug>.html` and write `index.json`.
///
/// Posts that fail are reported and skipped. The summary is returned so the
/// caller can decide on the exit status.
///
/// # Errors
///
/// Returns an error if ingestion cannot start or the output directory cannot
/// be written at all.
pub fn render_posts(config: &Config) -> Result<RenderSummary> {
  info!("Starting post rendering...");
  let results = ingest(config)?;

  fs::create_dir_all(&config.output_dir).wrap_err_with(|| {
    format!(
      "Failed to create output directory: {}",
      config.output_dir.display()
    )
  })?;
  info!("Output directory: {}", config.output_dir.display());

  let mut summary = RenderSummary::default();
  let mut index = Vec::with_capacity(results.len());

  for (path, result) in results {
    let name = display_path(config, &path);
    let rendered = match result {
      Ok(rendered) => rendered,
      Err(e) => {
        error!("{name}: {e}");
        summary.failed += 1;
        continue;
      },
    };

    for warning in &rendered.warnings {
      warn!("{name}: {warning}");
    }
    summary.warnings += rendered.warnings.len();

    let Some(ref slug) = rendered.slug else {
      error!("{name}: no slug could be derived from frontmatter or file name");
      summary.failed += 1;
      continue;
    };

    match output::write_post(&config.output_dir, slug, &rendered, config.emit_json) {
      Ok(_) => {
        index.push(IndexEntry::new(slug, &rendered));
        summary.rendered += 1;
      },
      Err(e) => {
        error!("{name}: {e:#}");
        summary.failed += 1;
      },
    }
  }

  let index_path = output::write_index(&config.output_dir, index)?;
  info!(
    "Rendered {} posts ({} failed, {} warnings), index written to {}",
    summary.rendered,
    summary.failed,
    summary.warnings,
    index_path.display()
  );

  Ok(summary)
}

/// Entry point for `folio render`.
///
/// # Errors
///
/// Returns an error if rendering cannot start or any post failed.
pub fn run(mut config: Config, output_dir: Option<PathBuf>, emit_json: bool) -> Result<()> {
  if let Some(output_dir) = output_dir {
    config.output_dir = output_dir;
  }
  if emit_json {
    config.emit_json = true;
  }

  let summary = render_posts(&config)?;
  if summary.failed > 0 {
    bail!(
      "{} of {} posts failed to render",
      summary.failed,
      summary.failed + summary.rendered
    );
  }

  Ok(())
}
