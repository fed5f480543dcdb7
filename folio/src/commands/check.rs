use color_eyre::eyre::{Result, bail};
use folio_config::Config;
use log::{error, info, warn};

use super::{display_path, ingest};

/// Counts produced by `folio check`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckReport {
  pub posts:    usize,
  pub failed:   usize,
  pub warnings: usize,
}

impl CheckReport {
  /// Whether the run should fail, with warnings counting when `strict`.
  #[must_use]
  pub const fn is_failure(&self, strict: bool) -> bool {
    self.failed > 0 || (strict && self.warnings > 0)
  }
}

/// Ingest every post and log its warnings and errors without writing output.
///
/// # Errors
///
/// Returns an error if ingestion cannot start.
pub fn check_posts(config: &Config) -> Result<CheckReport> {
  let results = ingest(config)?;
  let mut report = CheckReport {
    posts: results.len(),
    ..Default::default()
  };

  for (path, result) in &results {
    let name = display_path(config, path);
    match result {
      Ok(rendered) => {
        for warning in &rendered.warnings {
          warn!("{name}: {warning}");
        }
        report.warnings += rendered.warnings.len();
      },
      Err(e) => {
        error!("{name}: {e}");
        report.failed += 1;
      },
    }
  }

  info!(
    "Checked {} posts: {} failed, {} warnings",
    report.posts, report.failed, report.warnings
  );
  Ok(report)
}

/// Entry point for `folio check`.
///
/// # Errors
///
/// Returns an error if any post failed, or produced warnings under `strict`.
pub fn run(config: &Config, strict: bool) -> Result<()> {
  let report = check_posts(config)?;
  if report.is_failure(strict) {
    bail!(
      "Check failed: {} errors, {} warnings{}",
      report.failed,
      report.warnings,
      if strict { " (strict)" } else { "" }
    );
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_strict_counts_warnings() {
    let report = CheckReport {
      posts:    2,
      failed:   0,
      warnings: 1,
    };
    assert!(!report.is_failure(false));
    assert!(report.is_failure(true));

    let failed = CheckReport {
      failed: 1,
      ..report
    };
    assert!(failed.is_failure(false));
  }
}
