use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Directory (relative to the project root) holding the store and config.
pub const DATA_DIR: &str = ".huddle";

/// Database file name inside [`DATA_DIR`].
pub const DB_FILE: &str = "huddle.sqlite3";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HuddleConfig {
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub rag: RagTuning,
}

/// External text-classifier endpoint. When `url` is unset the deterministic
/// keyword fallback is the only classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_classifier_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_ms: default_classifier_timeout_ms(),
        }
    }
}

/// Tuning knobs for the rollup engine. Defaults match the product rules:
/// an 8-hour workday, a 7-day staleness window, and a 30% timeline
/// deviation ceiling before RED.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RagTuning {
    #[serde(default = "default_workday_hours")]
    pub workday_hours: f64,
    #[serde(default = "default_stale_after_days")]
    pub stale_after_days: i64,
    #[serde(default = "default_deviation_threshold_pct")]
    pub deviation_threshold_pct: f64,
}

impl Default for RagTuning {
    fn default() -> Self {
        Self {
            workday_hours: default_workday_hours(),
            stale_after_days: default_stale_after_days(),
            deviation_threshold_pct: default_deviation_threshold_pct(),
        }
    }
}

/// Resolve the store path under a project root.
#[must_use]
pub fn db_path(project_root: &Path) -> PathBuf {
    project_root.join(DATA_DIR).join(DB_FILE)
}

/// Load `.huddle/config.toml`, falling back to defaults when absent.
///
/// # Errors
///
/// Returns an error when the file exists but cannot be read or parsed.
pub fn load_config(project_root: &Path) -> Result<HuddleConfig> {
    let path = project_root.join(DATA_DIR).join("config.toml");
    if !path.exists() {
        return Ok(HuddleConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<HuddleConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Write a commented default config during `hud init`.
///
/// # Errors
///
/// Returns an error when the file cannot be written.
pub fn write_default_config(project_root: &Path) -> Result<PathBuf> {
    let dir = project_root.join(DATA_DIR);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let path = dir.join("config.toml");
    if !path.exists() {
        let body = "\
[classifier]
# url = \"http://localhost:8088/classify\"
timeout_ms = 2000

[rag]
workday_hours = 8.0
stale_after_days = 7
deviation_threshold_pct = 30.0
";
        std::fs::write(&path, body)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    Ok(path)
}

const fn default_classifier_timeout_ms() -> u64 {
    2000
}

const fn default_workday_hours() -> f64 {
    8.0
}

const fn default_stale_after_days() -> i64 {
    7
}

const fn default_deviation_threshold_pct() -> f64 {
    30.0
}
