use crate::aggregate::DEFAULT_STALE_DAYS;
use crate::error::{ArchieError, Result};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// ProjectConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

// ---------------------------------------------------------------------------
// StatusConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusConfig {
    #[serde(default = "default_stale_days")]
    pub stale_days: u32,
    #[serde(default = "default_suggestion_distance")]
    pub suggestion_distance: usize,
    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: usize,
}

fn default_stale_days() -> u32 {
    DEFAULT_STALE_DAYS
}

fn default_suggestion_distance() -> usize {
    3
}

fn default_max_suggestions() -> usize {
    5
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            stale_days: default_stale_days(),
            suggestion_distance: default_suggestion_distance(),
            max_suggestions: default_max_suggestions(),
        }
    }
}

// ---------------------------------------------------------------------------
// ExportDefaults
// ---------------------------------------------------------------------------

/// Which optional sections `archie export` includes unless told otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportDefaults {
    #[serde(default = "default_true")]
    pub toc: bool,
    #[serde(default = "default_true")]
    pub stats: bool,
    #[serde(default = "default_true")]
    pub dep_graph: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ExportDefaults {
    fn default() -> Self {
        Self {
            toc: true,
            stats: true,
            dep_graph: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub project: ProjectConfig,
    #[serde(default)]
    pub status: StatusConfig,
    #[serde(default)]
    pub export: ExportDefaults,
}

fn default_version() -> u32 {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self::new("")
    }
}

impl Config {
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            version: default_version(),
            project: ProjectConfig {
                name: project_name.into(),
                description: None,
            },
            status: StatusConfig::default(),
            export: ExportDefaults::default(),
        }
    }

    /// Load `.archie/config.yaml`. A missing file yields the defaults.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let data =
            std::fs::read_to_string(&path).map_err(|e| ArchieError::fs("read", &path, e))?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    /// Project name, falling back to the root directory's name.
    pub fn project_name(&self, root: &Path) -> String {
        if !self.project.name.is_empty() {
            return self.project.name.clone();
        }
        root.canonicalize()
            .ok()
            .as_deref()
            .unwrap_or(root)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.status.stale_days == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "status.stale_days is 0: every dated feature will be reported stale"
                    .to_string(),
            });
        }
        if self.status.max_suggestions == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "status.max_suggestions is 0: misspelled keys get no suggestions"
                    .to_string(),
            });
        }
        if self.version > default_version() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!(
                    "config version {} is newer than this archie understands ({})",
                    self.version,
                    default_version()
                ),
            });
        }

        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::new("atlas");
        let yaml = serde_yaml::to_string(&cfg).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.project.name, "atlas");
        assert_eq!(parsed.status.stale_days, 30);
        assert_eq!(parsed.status.suggestion_distance, 3);
        assert_eq!(parsed.status.max_suggestions, 5);
        assert!(parsed.export.toc && parsed.export.stats && parsed.export.dep_graph);
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let cfg = Config::load(dir.path()).unwrap();
        assert_eq!(cfg.version, 1);
        assert_eq!(cfg.status.stale_days, 30);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".archie")).unwrap();
        std::fs::write(
            dir.path().join(".archie/config.yaml"),
            "status:\n  stale_days: 14\nexport:\n  toc: false\n",
        )
        .unwrap();
        let cfg = Config::load(dir.path()).unwrap();
        assert_eq!(cfg.status.stale_days, 14);
        assert_eq!(cfg.status.max_suggestions, 5);
        assert!(!cfg.export.toc);
        assert!(cfg.export.stats);
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".archie")).unwrap();
        std::fs::write(dir.path().join(".archie/config.yaml"), "status: [unclosed").unwrap();
        assert!(matches!(
            Config::load(dir.path()),
            Err(ArchieError::Yaml(_))
        ));
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let mut cfg = Config::new("atlas");
        cfg.status.stale_days = 45;
        cfg.save(dir.path()).unwrap();
        let loaded = Config::load(dir.path()).unwrap();
        assert_eq!(loaded.status.stale_days, 45);
        assert_eq!(loaded.project.name, "atlas");
    }

    #[test]
    fn project_name_falls_back_to_directory() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("orbit");
        std::fs::create_dir_all(&root).unwrap();
        assert_eq!(Config::default().project_name(&root), "orbit");
        assert_eq!(Config::new("named").project_name(&root), "named");
    }

    #[test]
    fn validate_defaults_clean() {
        assert!(Config::new("x").validate().is_empty());
    }

    #[test]
    fn validate_flags_zero_thresholds() {
        let mut cfg = Config::new("x");
        cfg.status.stale_days = 0;
        cfg.status.max_suggestions = 0;
        let warnings = cfg.validate();
        assert_eq!(warnings.len(), 2);
        assert!(warnings.iter().all(|w| w.level == WarnLevel::Warning));
    }

    #[test]
    fn validate_newer_version_is_error() {
        let mut cfg = Config::new("x");
        cfg.version = 9;
        let warnings = cfg.validate();
        assert!(warnings.iter().any(|w| w.level == WarnLevel::Error));
    }
}
