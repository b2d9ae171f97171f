//! Gradebook configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::grading::GradeScale;

/// Environment variable overriding `preview_rows`.
pub const PREVIEW_ROWS_ENV: &str = "GRADEBOOK_PREVIEW_ROWS";

/// Top-level gradebook configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradebookConfig {
    /// Accepted upload rows shown before committing.
    #[serde(default = "default_preview_rows")]
    pub preview_rows: usize,
    /// Custom grade bands; validated when the file is parsed.
    #[serde(default)]
    pub grading: Option<GradeScale>,
    /// Output directory for results sheets.
    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,
}

fn default_preview_rows() -> usize {
    5
}
fn default_results_dir() -> PathBuf {
    PathBuf::from("./gradebook-results")
}

impl Default for GradebookConfig {
    fn default() -> Self {
        Self {
            preview_rows: default_preview_rows(),
            grading: None,
            results_dir: default_results_dir(),
        }
    }
}

impl GradebookConfig {
    /// The configured grade scale, or the standard one.
    pub fn grade_scale(&self) -> GradeScale {
        self.grading.clone().unwrap_or_default()
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `gradebook.toml` in the current directory
/// 2. `~/.config/gradebook/config.toml`
///
/// Environment variable override: `GRADEBOOK_PREVIEW_ROWS`.
pub fn load_config() -> Result<GradebookConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<GradebookConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("gradebook.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            parse_config_str(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => GradebookConfig::default(),
    };

    if let Ok(rows) = std::env::var(PREVIEW_ROWS_ENV) {
        config.preview_rows = rows
            .trim()
            .parse()
            .with_context(|| format!("{PREVIEW_ROWS_ENV} must be a whole number, got '{rows}'"))?;
    }

    Ok(config)
}

/// Parse a TOML config string.
pub fn parse_config_str(content: &str) -> Result<GradebookConfig> {
    Ok(toml::from_str(content)?)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("gradebook"))
}
