pub mod activity;
pub mod cli;
pub mod config;
pub mod datetime;
pub mod error;
pub mod grid;
pub mod heatmap;
pub mod html;
pub mod intensity;
pub mod months;
pub mod render;
pub mod summary;

use std::ffi::OsString;
use std::io::{self, Write};

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use tracing::{
  debug,
  info
};

use crate::activity::ActivitySource;

pub use crate::error::HeatmapError;

const BANNER: &str =
  "Pearl – London Oyster Analytics \
   Dashboard";

/// Batch entry point: load config,
/// fetch journey counts once and draw
/// them on stdout.
#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let cli =
    cli::GlobalCli::parse_from(raw_args);

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting pearl CLI"
  );

  let cfg = config::Config::load(
    cli.config.as_deref()
  )?;

  let now = Utc::now();
  let today = datetime::reference_day(
    now,
    cfg.timezone
  );
  debug!(%now, %today, "reference time");

  let source = cfg.activity_source();
  let activity = source
    .fetch_activity(now)
    .context(
      "failed to fetch activity data"
    )?;

  let renderer =
    render::TextRenderer::for_stdout(
      cfg.color && !cli.no_color
    );

  let mut out = io::stdout().lock();
  writeln!(out, "{BANNER}")?;
  writeln!(
    out,
    "{}",
    "=".repeat(BANNER.chars().count())
  )?;
  writeln!(out)?;

  renderer
    .render(&mut out, &activity, today)
    .context(
      "failed to render heatmap"
    )?;

  info!("done");
  Ok(())
}
