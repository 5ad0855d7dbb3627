use std::fs;
use std::path::{
  Path,
  PathBuf
};
use std::time::Duration;

use anyhow::{
  Context,
  anyhow
};
use chrono_tz::Tz;
use serde::Deserialize;
use tracing::{
  debug,
  info
};

use crate::activity::JsonlSource;
use crate::datetime::parse_timezone;
use crate::grid::GridLayout;
use crate::heatmap::HeatmapSettings;
use crate::summary::DEFAULT_WINDOW_DAYS;

pub const DEFAULT_CONFIG_FILE: &str =
  "pearl.toml";
pub const CONFIG_ENV_VAR: &str =
  "PEARL_CONFIG";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_REQUEST_TIMEOUT_SECS:
  u64 = 30;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
  #[serde(default)]
  timezone: Option<String>,
  #[serde(default)]
  server:   ServerSection,
  source:   SourceSection,
  #[serde(default)]
  heatmap:  HeatmapSection
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ServerSection {
  #[serde(default)]
  port:                 u16,
  #[serde(default)]
  request_timeout_secs: u64
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SourceSection {
  path: PathBuf
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct HeatmapSection {
  #[serde(default = "default_window_days")]
  window_days:    u32,
  #[serde(default = "default_trailing_weeks")]
  trailing_weeks: u32,
  #[serde(default = "default_color")]
  color:          bool
}

impl Default for HeatmapSection {
  fn default() -> Self {
    Self {
      window_days:    default_window_days(),
      trailing_weeks:
        default_trailing_weeks(),
      color:          default_color()
    }
  }
}

fn default_window_days() -> u32 {
  DEFAULT_WINDOW_DAYS
}

fn default_trailing_weeks() -> u32 {
  GridLayout::TRAILING_WEEKS
}

fn default_color() -> bool {
  true
}

/// Resolved application settings.
#[derive(Debug, Clone)]
pub struct Config {
  pub timezone:    Tz,
  pub port:        u16,
  /// Upper bound on fetching journey
  /// counts for one HTTP request.
  pub request_timeout: Duration,
  pub source_path: PathBuf,
  pub heatmap:     HeatmapSettings,
  pub color:       bool,
  pub loaded_from: PathBuf
}

impl Config {
  #[tracing::instrument(skip(
    config_override
  ))]
  pub fn load(
    config_override: Option<&Path>
  ) -> anyhow::Result<Self> {
    let path = resolve_config_path(
      config_override
    );
    info!(config = %path.display(), "loading config");

    let text =
      fs::read_to_string(&path)
        .with_context(|| {
          format!(
            "failed to read config \
             file {}",
            path.display()
          )
        })?;

    Self::from_toml_str(&text, &path)
      .with_context(|| {
        format!(
          "failed to parse config \
           file {}",
          path.display()
        )
      })
  }

  /// Parses config text as if it had
  /// been read from `path`; relative
  /// source paths resolve against the
  /// directory of `path`.
  pub fn from_toml_str(
    text: &str,
    path: &Path
  ) -> anyhow::Result<Self> {
    let file: FileConfig =
      toml::from_str(text)?;

    let timezone = match file
      .timezone
      .as_deref()
    {
      | Some(raw) => {
        parse_timezone(raw)?
      }
      | None => chrono_tz::UTC
    };

    if file.heatmap.trailing_weeks == 0
    {
      return Err(anyhow!(
        "heatmap.trailing_weeks must \
         be at least 1"
      ));
    }

    let port = if file.server.port == 0
    {
      DEFAULT_PORT
    } else {
      file.server.port
    };
    let request_timeout =
      Duration::from_secs(
        match file
          .server
          .request_timeout_secs
        {
          | 0 => {
            DEFAULT_REQUEST_TIMEOUT_SECS
          }
          | secs => secs
        }
      );

    let base_dir = path
      .parent()
      .map(|p| p.to_path_buf())
      .unwrap_or_else(|| {
        PathBuf::from(".")
      });
    let source_path = resolve_relative(
      &base_dir,
      &file.source.path
    )?;

    debug!(
      timezone = timezone.name(),
      port,
      request_timeout_secs =
        request_timeout.as_secs(),
      source = %source_path.display(),
      window_days = file.heatmap.window_days,
      trailing_weeks = file.heatmap.trailing_weeks,
      "resolved config"
    );

    Ok(Self {
      timezone,
      port,
      request_timeout,
      source_path,
      heatmap: HeatmapSettings {
        trailing_weeks: file
          .heatmap
          .trailing_weeks,
        window_days:    file
          .heatmap
          .window_days
      },
      color: file.heatmap.color,
      loaded_from: path.to_path_buf()
    })
  }

  pub fn activity_source(
    &self
  ) -> JsonlSource {
    JsonlSource::new(
      self.source_path.clone()
    )
  }
}

/// Explicit path, then
/// `$PEARL_CONFIG`, then `pearl.toml`
/// in the working directory.
pub fn resolve_config_path(
  override_path: Option<&Path>
) -> PathBuf {
  if let Some(path) = override_path {
    return expand_tilde(path);
  }

  if let Ok(raw) =
    std::env::var(CONFIG_ENV_VAR)
  {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
      return expand_tilde(Path::new(
        trimmed
      ));
    }
  }

  PathBuf::from(DEFAULT_CONFIG_FILE)
}

fn resolve_relative(
  base_dir: &Path,
  raw: &Path
) -> anyhow::Result<PathBuf> {
  if raw.as_os_str().is_empty() {
    return Err(anyhow!(
      "source.path cannot be empty"
    ));
  }

  let expanded = expand_tilde(raw);
  if expanded.is_absolute() {
    Ok(expanded)
  } else {
    Ok(base_dir.join(expanded))
  }
}

fn expand_tilde(
  path: &Path
) -> PathBuf {
  let text = path.to_string_lossy();
  if let Some(rest) =
    text.strip_prefix("~/")
    && let Some(home) = dirs::home_dir()
  {
    return home.join(rest);
  }
  path.to_path_buf()
}
