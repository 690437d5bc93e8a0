//! User configuration: color schemes and the Taskwarrior executable.
//!
//! Stored as pretty JSON in the platform config directory
//! (`~/.config/tsakarori/config.json` on Linux). A missing file is created with the
//! defaults on first start.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Foreground and background color names, e.g. `["white", "blue"]`.
/// `"reset"` means the terminal default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorPair(pub String, pub String);

impl ColorPair {
    fn new(fg: &str, bg: &str) -> Self {
        ColorPair(fg.to_string(), bg.to_string())
    }

    pub fn fg(&self) -> &str {
        &self.0
    }

    pub fn bg(&self) -> &str {
        &self.1
    }
}

/// Colors for each screen region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorScheme {
    pub header: ColorPair,
    pub footer: ColorPair,
    pub selected: ColorPair,
    pub normal: ColorPair,
    pub highlight: ColorPair,
}

impl ColorScheme {
    pub fn default_scheme() -> Self {
        ColorScheme {
            header: ColorPair::new("reset", "blue"),
            footer: ColorPair::new("reset", "blue"),
            selected: ColorPair::new("black", "white"),
            normal: ColorPair::new("reset", "reset"),
            highlight: ColorPair::new("yellow", "reset"),
        }
    }

    pub fn dark() -> Self {
        ColorScheme {
            header: ColorPair::new("white", "blue"),
            footer: ColorPair::new("white", "blue"),
            selected: ColorPair::new("black", "white"),
            normal: ColorPair::new("reset", "reset"),
            highlight: ColorPair::new("yellow", "reset"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Name of the active entry in `color_schemes`.
    pub color_scheme: String,
    pub color_schemes: BTreeMap<String, ColorScheme>,
    /// Taskwarrior executable, looked up in `PATH` when not absolute.
    #[serde(default = "default_task_bin")]
    pub task_bin: String,
}

fn default_task_bin() -> String {
    "task".to_string()
}

impl Default for Config {
    fn default() -> Self {
        let mut color_schemes = BTreeMap::new();
        color_schemes.insert("default".to_string(), ColorScheme::default_scheme());
        color_schemes.insert("dark".to_string(), ColorScheme::dark());
        Config {
            color_scheme: "default".to_string(),
            color_schemes,
            task_bin: default_task_bin(),
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "tsakarori")
}

/// `<config dir>/config.json`, if the platform has a config directory.
pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|p| p.config_dir().join("config.json"))
}

/// `<data dir>/tsakarori.log`, falling back to the current directory.
pub fn default_log_path() -> PathBuf {
    project_dirs()
        .map(|p| p.data_dir().join("tsakarori.log"))
        .unwrap_or_else(|| PathBuf::from("tsakarori.log"))
}

impl Config {
    /// Load the config at `path`, writing the defaults there if it does not exist.
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Config::default();
            config.save(path)?;
            tracing::info!(path = %path.display(), "created default config");
            return Ok(config);
        }
        let mut buf = String::new();
        File::open(path)
            .and_then(|mut f| f.read_to_string(&mut buf))
            .map_err(|source| Error::IoPath {
                path: path.to_path_buf(),
                source,
            })?;
        let config: Config = serde_json::from_str(&buf)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        if config.color_schemes.is_empty() {
            return Err(Error::Config(format!(
                "{}: no color schemes defined",
                path.display()
            )));
        }
        Ok(config)
    }

    /// Write via temp file + rename, creating the parent directory if needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        let io_err = |source| Error::IoPath {
            path: path.to_path_buf(),
            source,
        };
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(io_err)?;
        }
        let data = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        let mut f = File::create(&tmp).map_err(io_err)?;
        f.write_all(data.as_bytes()).map_err(io_err)?;
        f.flush().map_err(io_err)?;
        fs::rename(&tmp, path).map_err(io_err)?;
        Ok(())
    }

    /// The active scheme; an unknown name falls back to the built-in default.
    pub fn active_scheme(&self) -> ColorScheme {
        self.color_schemes
            .get(&self.color_scheme)
            .cloned()
            .unwrap_or_else(ColorScheme::default_scheme)
    }

    pub fn scheme_names(&self) -> Vec<&str> {
        self.color_schemes.keys().map(String::as_str).collect()
    }

    /// Switch to the next scheme in name order, wrapping around. Returns the new name.
    pub fn cycle_color_scheme(&mut self) -> &str {
        let names = self.scheme_names();
        if names.is_empty() {
            return &self.color_scheme;
        }
        let next = match names.iter().position(|n| *n == self.color_scheme) {
            Some(i) => names[(i + 1) % names.len()],
            None => names[0],
        }
        .to_string();
        self.color_scheme = next;
        &self.color_scheme
    }
}
