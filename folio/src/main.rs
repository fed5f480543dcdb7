use std::io;

use color_eyre::eyre::Result;
use folio::{
  cli::{Cli, Commands},
  commands::{self, check, init, inspect, render},
};
use folio_config::Config;

fn main() -> Result<()> {
  color_eyre::install()?;

  let cli = Cli::parse_args();

  // Initialize logging first so we can log during command handling
  env_logger::Builder::new()
    .filter_level(cli.verbosity.log_level_filter())
    .write_style(env_logger::WriteStyle::Always)
    .init();

  match cli.command {
    Commands::Init {
      ref output,
      ref format,
      force,
    } => init::run(output, format, force),

    Commands::Render {
      ref input,
      output_dir,
      emit_json,
    } => {
      let config =
        commands::load_config(&cli.config_files, &cli.config_overrides, input)?;
      render::run(config, output_dir, emit_json)
    },

    Commands::Check { ref input, strict } => {
      let config =
        commands::load_config(&cli.config_files, &cli.config_overrides, input)?;
      check::run(&config, strict)
    },

    Commands::Inspect { ref file, pretty } => {
      let config = Config::load(&cli.config_files, &cli.config_overrides)?;
      inspect::run(&config, file, pretty, io::stdout().lock())
    },
  }
}
