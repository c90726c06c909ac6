use crate::error::{ArchieError, Result};
use crate::paths;
use crate::status::FeatureStatus;
use chrono::{Local, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Placeholder the feature template ships with for unset dates.
pub const DATE_PLACEHOLDER: &str = "YYYY-MM-DD";

/// Placeholder key the feature template ships with in its dependency list.
pub const FEATURE_KEY_PLACEHOLDER: &str = "<feature-key>";

pub const STATUS_HEADING: &str = "## Status";
pub const DEPENDENCIES_HEADING: &str = "## Feature Dependencies";

// ---------------------------------------------------------------------------
// Feature
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub name: String,
    pub status: FeatureStatus,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub owner: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub last_updated: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reason: String,
    /// Dependency feature key → reason. Keys name other features.
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
    pub file_path: PathBuf,
}

impl Feature {
    pub fn new(name: impl Into<String>, status: FeatureStatus) -> Self {
        Self {
            name: name.into(),
            status,
            ..Self::default()
        }
    }

    /// Record for a file that could not be read.
    pub fn unknown(name: impl Into<String>, file_path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            status: FeatureStatus::Unknown,
            file_path: file_path.into(),
            ..Self::default()
        }
    }

    pub fn with_dependency(mut self, key: impl Into<String>, reason: impl Into<String>) -> Self {
        self.dependencies.insert(key.into(), reason.into());
        self
    }

    /// Parse a single feature file. The name is the file stem.
    pub fn parse_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ArchieError::fs("read", path, e))?;
        Ok(Self::parse_str(feature_name(path), path, &content))
    }

    /// Parse the `## Status` and `## Feature Dependencies` blocks of `content`.
    pub fn parse_str(name: impl Into<String>, file_path: impl Into<PathBuf>, content: &str) -> Self {
        #[derive(PartialEq)]
        enum Block {
            None,
            Status,
            Dependencies,
        }

        let mut feature = Self {
            name: name.into(),
            file_path: file_path.into(),
            ..Self::default()
        };
        let mut status: Option<FeatureStatus> = None;
        let mut block = Block::None;

        for raw in content.lines() {
            let line = raw.trim();

            if line == STATUS_HEADING {
                block = Block::Status;
                continue;
            }
            if line == DEPENDENCIES_HEADING {
                block = Block::Dependencies;
                continue;
            }
            if line.starts_with("##") {
                block = Block::None;
                continue;
            }

            match block {
                Block::Status => match status_field(line) {
                    Some(StatusField::Value(v)) => status = Some(FeatureStatus::from(v)),
                    Some(StatusField::Owner(v)) => feature.owner = v.to_string(),
                    Some(StatusField::LastUpdated(v)) => feature.last_updated = v.to_string(),
                    Some(StatusField::Reason(v)) => feature.reason = v.to_string(),
                    None => {}
                },
                Block::Dependencies => {
                    if let Some((key, reason)) = dependency_entry(line) {
                        feature.dependencies.insert(key.to_string(), reason.to_string());
                    }
                }
                Block::None => {}
            }
        }

        feature.status = status.unwrap_or_default();
        feature
    }

    /// The `Last Updated` date, when it is set and well-formed.
    pub fn last_updated_date(&self) -> Option<NaiveDate> {
        parse_date(&self.last_updated)
    }

    /// True when `Last Updated` lies more than `days` whole days before today.
    pub fn is_old(&self, days: u32) -> bool {
        self.is_stale_on(days, Local::now().date_naive())
    }

    /// Like [`Feature::is_old`] with an explicit "today".
    pub fn is_stale_on(&self, days: u32, today: NaiveDate) -> bool {
        match self.last_updated_date() {
            Some(date) => (today - date).num_days() > i64::from(days),
            None => false,
        }
    }

    pub fn has_owner(&self) -> bool {
        !self.owner.is_empty() && self.owner != DATE_PLACEHOLDER
    }
}

// ---------------------------------------------------------------------------
// Directory scan
// ---------------------------------------------------------------------------

/// Parse every `features/*.md` file under `root`.
///
/// A missing `features/` directory yields an empty list. A file that cannot
/// be read becomes an `UNKNOWN` record instead of failing the scan. The
/// result is sorted by name.
pub fn parse_features_dir(root: &Path) -> Result<Vec<Feature>> {
    let dir = paths::features_dir(root);
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let entries = std::fs::read_dir(&dir).map_err(|e| ArchieError::fs("read directory", &dir, e))?;

    let mut features = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ArchieError::fs("read directory", &dir, e))?;
        let path = entry.path();
        if path.is_dir() || !is_feature_file(&path) {
            continue;
        }

        let feature = match Feature::parse_file(&path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "unreadable feature file");
                Feature::unknown(feature_name(&path), &path)
            }
        };
        features.push(feature);
    }

    features.sort_by(|a, b| a.name.cmp(&b.name));
    tracing::debug!(dir = %dir.display(), count = features.len(), "parsed features");
    Ok(features)
}

fn is_feature_file(path: &Path) -> bool {
    let is_md = path
        .extension()
        .map(|ext| ext == paths::MARKDOWN_EXT)
        .unwrap_or(false);
    let is_readme = path
        .file_name()
        .map(|name| name == paths::README_MD)
        .unwrap_or(false);
    is_md && !is_readme
}

fn feature_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Line grammar (shared with the detail parser)
// ---------------------------------------------------------------------------

pub(crate) enum StatusField<'a> {
    Value(&'a str),
    Owner(&'a str),
    LastUpdated(&'a str),
    Reason(&'a str),
}

static STATUS_FIELD_RE: OnceLock<Regex> = OnceLock::new();
static DEPENDENCY_RE: OnceLock<Regex> = OnceLock::new();

fn status_field_re() -> &'static Regex {
    STATUS_FIELD_RE
        .get_or_init(|| Regex::new(r"^-\s*(Value|Owner|Last Updated|Reason):\s*(.*)$").unwrap())
}

fn dependency_re() -> &'static Regex {
    DEPENDENCY_RE.get_or_init(|| Regex::new(r"^-\s*`([^`]+)`\s*:\s*(.*)$").unwrap())
}

/// Match one `- <Label>: <text>` line of a status block. `Value` needs text.
pub(crate) fn status_field(line: &str) -> Option<StatusField<'_>> {
    let caps = status_field_re().captures(line)?;
    let label = caps.get(1)?.as_str();
    let text = caps.get(2).map(|m| m.as_str().trim()).unwrap_or("");
    match label {
        "Value" if !text.is_empty() => Some(StatusField::Value(text)),
        "Value" => None,
        "Owner" => Some(StatusField::Owner(text)),
        "Last Updated" => Some(StatusField::LastUpdated(text)),
        "Reason" => Some(StatusField::Reason(text)),
        _ => None,
    }
}

/// Match one ``- `key`: reason`` line, skipping the template placeholder.
pub(crate) fn dependency_entry(line: &str) -> Option<(&str, &str)> {
    let caps = dependency_re().captures(line)?;
    let key = caps.get(1)?.as_str().trim();
    let reason = caps.get(2).map(|m| m.as_str().trim()).unwrap_or("");
    if key.is_empty() || key == FEATURE_KEY_PLACEHOLDER {
        return None;
    }
    Some((key, reason))
}

pub(crate) fn parse_date(value: &str) -> Option<NaiveDate> {
    if value.is_empty() || value == DATE_PLACEHOLDER {
        return None;
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
