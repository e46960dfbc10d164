//! Layered configuration for the command line tool.
//!
//! Lowest to highest precedence: built-in defaults, the config file, the
//! selected profile, then environment variables and flags (both surfaced
//! through `Args`).

use crate::options::Args;
use anyhow::{bail, Context, Result};
use config::{Config, File, FileFormat};
use engine::UploaderConfig;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Values that may appear in `config.toml` or a profile file.
#[derive(Deserialize, Default, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct FileSettings {
    #[serde(alias = "api-url", alias = "endpoint")]
    pub url: Option<String>,
    pub key: Option<String>,
    #[serde(alias = "workers")]
    pub jobs: Option<usize>,
    pub queue_capacity: Option<usize>,
    /// Seconds
    pub timeout: Option<u64>,
    pub max_depth: Option<usize>,
    pub include: Option<Vec<String>>,
    pub exclude: Option<Vec<String>>,
}

/// `~/.config/file_uploader`, if a home directory is known.
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".config").join("file_uploader"))
}

/// Directory holding the config file in use and its `profiles/`.
pub fn config_dir(config_path: Option<&Path>, default_dir: Option<&Path>) -> Option<PathBuf> {
    match config_path {
        Some(path) => path.parent().map(Path::to_path_buf),
        None => default_dir.map(Path::to_path_buf),
    }
}

/// Names of the `profiles/*.toml` files under `dir`, sorted.
///
/// A missing profiles directory means no profiles.
pub fn list_profiles(dir: &Path) -> Result<Vec<String>> {
    let profiles_dir = dir.join("profiles");
    let entries = match fs::read_dir(&profiles_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(e).with_context(|| {
                format!("Cannot list profiles in {}", profiles_dir.display())
            })
        }
    };

    let mut names = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("Cannot list profiles in {}", profiles_dir.display()))?
            .path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "toml") {
            if let Some(stem) = path.file_stem() {
                names.push(stem.to_string_lossy().into_owned());
            }
        }
    }
    names.sort();
    Ok(names)
}

impl FileSettings {
    /// Read the config file and optional profile.
    ///
    /// An explicit `config_path` must exist; the default file may be absent.
    /// Profiles live in `profiles/<name>.toml` next to the config file in use
    /// and must exist when requested.
    pub fn load(
        config_path: Option<&Path>,
        profile: Option<&str>,
        default_dir: Option<&Path>,
    ) -> Result<Self> {
        let (file, required) = match config_path {
            Some(path) => (Some(path.to_path_buf()), true),
            None => (default_dir.map(|dir| dir.join("config.toml")), false),
        };

        if required {
            if let Some(path) = &file {
                if !path.is_file() {
                    bail!("Config file does not exist: {}", path.display());
                }
            }
        }

        let mut builder = Config::builder();
        if let Some(path) = &file {
            builder = builder.add_source(
                File::new(&path.to_string_lossy(), FileFormat::Toml).required(required),
            );
        }

        if let Some(name) = profile {
            let base = config_dir(config_path, default_dir)
                .context("No configuration directory to look up profiles in")?;
            let profile_path = base.join("profiles").join(format!("{}.toml", name));
            if !profile_path.is_file() {
                bail!("Profile '{}' not found at {}", name, profile_path.display());
            }
            builder = builder.add_source(
                File::new(&profile_path.to_string_lossy(), FileFormat::Toml).required(true),
            );
        }

        builder
            .build()
            .context("Failed to read configuration")?
            .try_deserialize::<FileSettings>()
            .context("Invalid configuration")
    }

    /// Overlay `args` onto these settings and the built-in defaults.
    pub fn into_uploader_config(self, args: &Args) -> UploaderConfig {
        let defaults = UploaderConfig::default();
        UploaderConfig {
            endpoint: args.url.clone().or(self.url).unwrap_or(defaults.endpoint),
            key: args.key.clone().or(self.key).unwrap_or(defaults.key),
            jobs: args.jobs.or(self.jobs).unwrap_or(defaults.jobs),
            queue_capacity: args
                .queue_capacity
                .or(self.queue_capacity)
                .unwrap_or(defaults.queue_capacity),
            timeout: args
                .timeout
                .or(self.timeout)
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            max_depth: args
                .max_depth
                .or(self.max_depth)
                .unwrap_or(defaults.max_depth),
            include: pick_patterns(&args.include, self.include),
            exclude: pick_patterns(&args.exclude, self.exclude),
            ..defaults
        }
    }
}

/// Patterns given on the command line replace those from the file.
fn pick_patterns(from_args: &[String], from_file: Option<Vec<String>>) -> Vec<String> {
    if from_args.is_empty() {
        from_file.unwrap_or_default()
    } else {
        from_args.to_vec()
    }
}
