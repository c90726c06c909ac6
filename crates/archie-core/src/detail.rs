use crate::error::{ArchieError, Result};
use crate::parser::{self, dependency_entry, status_field, StatusField};
use crate::paths;
use crate::status::FeatureStatus;
use crate::Feature;
use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Full contents of one feature document, section by section.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeatureDetail {
    pub key: String,
    pub file_path: PathBuf,

    pub status: FeatureStatus,
    pub owner: String,
    pub last_updated: String,
    pub reason: String,

    pub one_liner: String,
    pub background: String,
    pub user_story: String,

    pub in_scope: Vec<String>,
    pub out_of_scope: Vec<String>,

    pub requirements: Vec<String>,
    pub non_requirements: Vec<String>,
    pub feature_dependencies: BTreeMap<String, String>,
    pub acceptance_criteria: Vec<String>,
    pub design_constraints: Vec<String>,

    pub api_design: String,
    pub storage_design: String,
    pub workflow_design: String,
    pub metrics_design: String,
    pub tasks_design: String,

    pub spec_location: String,
    pub spec_readiness: String,

    pub blockers: String,

    pub changelog: Vec<String>,
}

/// Strip a leading `./`, a leading `features/` and a trailing `.md`.
///
/// `./features/foo.md`, `features/foo.md`, `foo.md` and `foo` all name the
/// same feature.
pub fn normalize_feature_key(input: &str) -> String {
    let mut key = input.trim();
    key = key.strip_prefix("./").unwrap_or(key);
    key = key
        .strip_prefix(&format!("{}/", paths::FEATURES_DIR))
        .unwrap_or(key);
    key = key
        .strip_suffix(&format!(".{}", paths::MARKDOWN_EXT))
        .unwrap_or(key);
    key.to_string()
}

impl FeatureDetail {
    /// Load `features/<key>.md` under `root`. The key is normalized first.
    pub fn load(root: &Path, key: &str) -> Result<Self> {
        let key = normalize_feature_key(key);
        let path = paths::feature_file(root, &key);
        if !path.is_file() {
            return Err(ArchieError::FeatureNotFound(key));
        }
        let content = std::fs::read_to_string(&path).map_err(|e| ArchieError::fs("read", &path, e))?;
        Ok(Self::parse_str(key, path, &content))
    }

    pub fn parse_str(key: impl Into<String>, file_path: impl Into<PathBuf>, content: &str) -> Self {
        let mut detail = Self {
            key: key.into(),
            file_path: file_path.into(),
            ..Self::default()
        };
        let mut section = "";
        let mut subsection = "";

        for raw in content.lines() {
            let line = raw.trim();
            if let Some(name) = line.strip_prefix("## ") {
                section = name.trim();
                subsection = "";
                continue;
            }
            if let Some(name) = line.strip_prefix("### ") {
                subsection = name.trim();
                continue;
            }
            if line.is_empty() {
                continue;
            }
            detail.apply_line(section, subsection, line);
        }
        detail
    }

    fn apply_line(&mut self, section: &str, subsection: &str, line: &str) {
        match section {
            "Status" => match status_field(line) {
                Some(StatusField::Value(v)) => self.status = FeatureStatus::from(v),
                Some(StatusField::Owner(v)) => self.owner = v.to_string(),
                Some(StatusField::LastUpdated(v)) => self.last_updated = v.to_string(),
                Some(StatusField::Reason(v)) => self.reason = v.to_string(),
                None => {}
            },
            "Summary" => {
                if let Some(v) = labeled(line, "One-liner") {
                    self.one_liner = v;
                } else if let Some(v) = labeled(line, "Background / Motivation") {
                    self.background = v;
                } else if let Some(v) = labeled(line, "User story / Use case") {
                    self.user_story = v;
                }
            }
            "Scope" => {
                if let Some(item) = line.strip_prefix("- ") {
                    match subsection {
                        "In Scope" => self.in_scope.push(item.to_string()),
                        "Out of Scope" => self.out_of_scope.push(item.to_string()),
                        _ => {}
                    }
                }
            }
            "Requirements" => push_any_bullet(&mut self.requirements, line),
            "Non-Requirements" => push_any_bullet(&mut self.non_requirements, line),
            "Acceptance Criteria" => push_any_bullet(&mut self.acceptance_criteria, line),
            "Design Constraints" => push_bullet(&mut self.design_constraints, line),
            "Changelog" => push_bullet(&mut self.changelog, line),
            "Feature Dependencies" => {
                if let Some((key, reason)) = dependency_entry(line) {
                    self.feature_dependencies
                        .insert(key.to_string(), reason.to_string());
                }
            }
            "Design Artifacts" => {
                if let Some(v) = labeled(line, "API") {
                    self.api_design = v;
                } else if let Some(v) = labeled(line, "Storage") {
                    self.storage_design = v;
                } else if let Some(v) = labeled(line, "Workflow") {
                    self.workflow_design = v;
                } else if let Some(v) = labeled(line, "Metrics") {
                    self.metrics_design = v;
                } else if let Some(v) = labeled(line, "Tasks") {
                    self.tasks_design = v;
                }
            }
            "Spec" => {
                if let Some(v) = labeled(line, "Location") {
                    self.spec_location = v;
                } else if let Some(v) = labeled(line, "Readiness") {
                    self.spec_readiness = v;
                }
            }
            "Related Records" => {
                if let Some(v) = labeled(line, "Blockers") {
                    self.blockers = v;
                }
            }
            _ => {}
        }
    }

    /// The summary record for this document.
    pub fn to_feature(&self) -> Feature {
        Feature {
            name: self.key.clone(),
            status: self.status.clone(),
            owner: self.owner.clone(),
            last_updated: self.last_updated.clone(),
            reason: self.reason.clone(),
            dependencies: self.feature_dependencies.clone(),
            file_path: self.file_path.clone(),
        }
    }

    pub fn last_updated_date(&self) -> Option<NaiveDate> {
        parser::parse_date(&self.last_updated)
    }

    /// Owner, unless it is empty or still the template placeholder.
    pub fn owner_display(&self) -> Option<&str> {
        shown(&self.owner).filter(|v| *v != parser::DATE_PLACEHOLDER)
    }

    pub fn last_updated_display(&self) -> Option<&str> {
        shown(&self.last_updated).filter(|v| *v != parser::DATE_PLACEHOLDER)
    }

    pub fn scope_in(&self) -> impl Iterator<Item = &str> {
        filled(&self.in_scope)
    }

    pub fn scope_out(&self) -> impl Iterator<Item = &str> {
        filled(&self.out_of_scope)
    }

    pub fn requirement_items(&self) -> impl Iterator<Item = &str> {
        filled(&self.requirements)
    }

    pub fn non_requirement_items(&self) -> impl Iterator<Item = &str> {
        filled(&self.non_requirements)
    }

    pub fn acceptance_items(&self) -> impl Iterator<Item = &str> {
        filled(&self.acceptance_criteria)
    }

    pub fn constraint_items(&self) -> impl Iterator<Item = &str> {
        filled(&self.design_constraints)
    }

    /// Changelog entries, minus the template's `YYYY-MM-DD: ...` line.
    pub fn changelog_items(&self) -> impl Iterator<Item = &str> {
        filled(&self.changelog).filter(|e| !e.starts_with(parser::DATE_PLACEHOLDER))
    }

    /// `(label, value)` pairs for the design artifacts that are filled in.
    pub fn design_artifacts(&self) -> Vec<(&'static str, &str)> {
        [
            ("API", self.api_design.as_str()),
            ("Storage", self.storage_design.as_str()),
            ("Workflow", self.workflow_design.as_str()),
            ("Metrics", self.metrics_design.as_str()),
            ("Tasks", self.tasks_design.as_str()),
        ]
        .into_iter()
        .filter_map(|(label, value)| shown(value).map(|v| (label, v)))
        .collect()
    }

    pub fn summary_fields(&self) -> Vec<(&'static str, &str)> {
        [
            ("One-liner", self.one_liner.as_str()),
            ("Background", self.background.as_str()),
            ("User Story", self.user_story.as_str()),
        ]
        .into_iter()
        .filter_map(|(label, value)| shown(value).map(|v| (label, v)))
        .collect()
    }

    pub fn spec_fields(&self) -> Vec<(&'static str, &str)> {
        [
            ("Location", self.spec_location.as_str()),
            ("Readiness", self.spec_readiness.as_str()),
        ]
        .into_iter()
        .filter_map(|(label, value)| shown(value).map(|v| (label, v)))
        .collect()
    }

    pub fn blockers_display(&self) -> Option<&str> {
        shown(&self.blockers)
    }

    pub fn has_summary(&self) -> bool {
        !self.summary_fields().is_empty()
    }

    pub fn has_scope(&self) -> bool {
        self.scope_in().next().is_some() || self.scope_out().next().is_some()
    }
}

// ---------------------------------------------------------------------------
// Line helpers
// ---------------------------------------------------------------------------

/// `- <label>: <value>` → trimmed value.
fn labeled(line: &str, label: &str) -> Option<String> {
    line.strip_prefix("- ")?
        .strip_prefix(label)?
        .strip_prefix(':')
        .map(|v| v.trim().to_string())
}

fn push_any_bullet(items: &mut Vec<String>, line: &str) {
    if line.starts_with('-') {
        items.push(line.strip_prefix("- ").unwrap_or(line).to_string());
    }
}

fn push_bullet(items: &mut Vec<String>, line: &str) {
    if let Some(item) = line.strip_prefix("- ") {
        items.push(item.to_string());
    }
}

static STUB_RE: OnceLock<Regex> = OnceLock::new();

/// Template stubs such as `R1:`, `NR2:` or `AC1:` with nothing after them.
fn is_numbered_stub(value: &str) -> bool {
    STUB_RE
        .get_or_init(|| Regex::new(r"^(R|NR|AC)\d+:$").unwrap())
        .is_match(value)
}

fn is_placeholder(value: &str) -> bool {
    let value = value.trim();
    value.is_empty()
        || value == "..."
        || value == "[...]"
        || is_numbered_stub(value)
        || value.contains(parser::FEATURE_KEY_PLACEHOLDER)
}

fn shown(value: &str) -> Option<&str> {
    (!is_placeholder(value)).then_some(value)
}

fn filled(items: &[String]) -> impl Iterator<Item = &str> {
    items.iter().map(String::as_str).filter(|v| !is_placeholder(v))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
