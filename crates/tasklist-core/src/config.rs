use std::collections::HashMap;
use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::{
  Context,
  anyhow
};
use tracing::{
  debug,
  info,
  trace,
  warn
};

const DATA_LOCATION: &str =
  "data.location";
const COLOR: &str = "color";
const CONFIRMATION: &str =
  "confirmation";

/// Settings from the rc file, its includes and command line overrides.
#[derive(Debug, Clone)]
pub struct Config {
  map:     HashMap<String, String>,
  sources: Vec<PathBuf>
}

impl Default for Config {
  fn default() -> Self {
    let map = [
      (DATA_LOCATION, "~/.tasklist"),
      (COLOR, "on"),
      (CONFIRMATION, "on")
    ]
    .into_iter()
    .map(|(k, v)| {
      (k.to_string(), v.to_string())
    })
    .collect();

    Config {
      map,
      sources: vec![]
    }
  }
}

impl Config {
  #[tracing::instrument(skip(
    rc_override
  ))]
  pub fn load(
    rc_override: Option<&Path>
  ) -> anyhow::Result<Self> {
    let mut cfg = Config::default();

    if let Some(path) =
      resolve_rc_path(rc_override)
    {
      info!(rc = %path.display(), "loading config");
      cfg.load_file(&path)?;
    } else {
      debug!(
        "no config file found; using \
         defaults"
      );
    }

    Ok(cfg)
  }

  #[tracing::instrument(skip(
    self, overrides
  ))]
  pub fn apply_overrides<I>(
    &mut self,
    overrides: I
  ) where
    I: IntoIterator<
      Item = (String, String)
    >
  {
    for (k, v) in overrides {
      let key = k
        .strip_prefix("rc.")
        .unwrap_or(&k)
        .to_string();
      debug!(key = %key, value = %v, "applying override");
      self.map.insert(key, v);
    }
  }

  pub fn data_location(
    &self
  ) -> PathBuf {
    let raw = self
      .map
      .get(DATA_LOCATION)
      .map(String::as_str)
      .unwrap_or("~/.tasklist");
    expand_tilde(Path::new(raw))
  }

  pub fn color(
    &self
  ) -> anyhow::Result<bool> {
    match self.map.get(COLOR) {
      | None => Ok(true),
      | Some(raw) => parse_bool(raw)
        .ok_or_else(|| {
          anyhow!(
            "invalid color setting: \
             {raw}"
          )
        })
    }
  }

  /// Deletes ask first unless this is switched off.
  pub fn confirmation(&self) -> bool {
    self
      .map
      .get(CONFIRMATION)
      .and_then(|v| parse_bool(v))
      .unwrap_or(true)
  }

  #[tracing::instrument(skip(self))]
  fn load_file(
    &mut self,
    path: &Path
  ) -> anyhow::Result<()> {
    let path = expand_tilde(path);
    let text =
      fs::read_to_string(&path)
        .with_context(|| {
          format!(
            "failed to read {}",
            path.display()
          )
        })?;
    self.sources.push(path.clone());

    let base_dir = path
      .parent()
      .map(Path::to_path_buf)
      .unwrap_or_else(|| {
        PathBuf::from(".")
      });

    for (line_num, raw_line) in
      text.lines().enumerate()
    {
      let line = raw_line
        .split_once('#')
        .map_or(raw_line, |(before, _)| {
          before
        })
        .trim();
      if line.is_empty() {
        continue;
      }

      if let Some(include) =
        line.strip_prefix("include ")
      {
        let include_path =
          resolve_include_path(
            &base_dir,
            include.trim()
          )?;
        if self
          .sources
          .contains(&include_path)
        {
          warn!(include = %include_path.display(), "config already loaded; skipping include");
        } else if include_path.exists()
        {
          self
            .load_file(&include_path)?;
        } else {
          warn!(include = %include_path.display(), "include file does not exist; skipping");
        }
        continue;
      }

      let (k, v) = line
        .split_once('=')
        .ok_or_else(|| {
          anyhow!(
            "invalid config line \
             {}:{}: {}",
            path.display(),
            line_num + 1,
            raw_line
          )
        })?;

      trace!(key = %k.trim(), value = %v.trim(), "loaded config key");
      self.map.insert(
        k.trim().to_string(),
        v.trim().to_string()
      );
    }

    Ok(())
  }
}

/// Picks the data directory (`--data` wins) and creates it if needed.
#[tracing::instrument(skip(
  cfg,
  override_dir
))]
pub fn resolve_data_dir(
  cfg: &Config,
  override_dir: Option<&Path>
) -> anyhow::Result<PathBuf> {
  let dir = override_dir
    .map(Path::to_path_buf)
    .unwrap_or_else(|| {
      cfg.data_location()
    });

  if !dir.exists() {
    info!(dir = %dir.display(), "creating data directory");
    fs::create_dir_all(&dir)
      .with_context(|| {
        format!(
          "failed to create {}",
          dir.display()
        )
      })?;
  }

  Ok(dir)
}

fn resolve_rc_path(
  override_path: Option<&Path>
) -> Option<PathBuf> {
  if let Some(path) = override_path {
    return Some(path.to_path_buf());
  }

  if let Ok(rc_env) =
    std::env::var("TASKLISTRC")
  {
    return (rc_env != "/dev/null")
      .then(|| PathBuf::from(rc_env));
  }

  dirs::home_dir()
    .map(|home| {
      home.join(".tasklistrc")
    })
    .filter(|candidate| {
      candidate.exists()
    })
}

fn resolve_include_path(
  base_dir: &Path,
  include: &str
) -> anyhow::Result<PathBuf> {
  if include.is_empty() {
    return Err(anyhow!(
      "include path cannot be empty"
    ));
  }

  let expanded =
    expand_tilde(Path::new(include));
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

fn parse_bool(s: &str) -> Option<bool> {
  match s
    .trim()
    .to_ascii_lowercase()
    .as_str()
  {
    | "1" | "y" | "yes" | "on"
    | "true" => Some(true),
    | "0" | "n" | "no" | "off"
    | "false" => Some(false),
    | _ => None
  }
}
