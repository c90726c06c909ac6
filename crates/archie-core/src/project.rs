use crate::config::Config;
use crate::error::{ArchieError, Result};
use crate::io;
use crate::paths;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Directories every project carries, relative to the root.
pub const PROJECT_DIRS: &[&str] = &[
    paths::ARCHIE_DIR,
    paths::ARCHIE_DOCS_DIR,
    paths::FEATURES_DIR,
    paths::API_DIR,
    paths::WORKFLOW_DIR,
    paths::SPEC_DIR,
    paths::ASSETS_DIR,
];

/// What `init_project` did. Paths are relative to the project root.
#[derive(Debug, Clone, Default, Serialize)]
pub struct InitReport {
    pub root: PathBuf,
    pub created_dirs: Vec<String>,
    pub created_files: Vec<String>,
    pub refreshed_files: Vec<String>,
}

impl InitReport {
    pub fn is_fresh(&self) -> bool {
        !self.created_files.is_empty() || !self.created_dirs.is_empty()
    }
}

/// Scaffold an archie project at `target`.
///
/// Existing documents are never touched, except `AGENTS.md`, which is
/// rewritten on every run. A non-empty directory without `.archie/` is
/// refused.
pub fn init_project(target: &Path) -> Result<InitReport> {
    if target.exists() && !target.is_dir() {
        return Err(ArchieError::NotADirectory(target.to_path_buf()));
    }
    if target.is_dir() && !paths::is_archie_project(target) && !is_empty_dir(target)? {
        return Err(ArchieError::NotEmpty(target.to_path_buf()));
    }

    let mut report = InitReport {
        root: target.to_path_buf(),
        ..InitReport::default()
    };

    io::ensure_dir(target)?;
    for dir in PROJECT_DIRS {
        let path = target.join(dir);
        if !path.is_dir() {
            io::ensure_dir(&path)?;
            report.created_dirs.push(dir.to_string());
        }
    }

    let api_main = format!("{}/{}.{}", paths::API_DIR, paths::API_DIR, paths::MARKDOWN_EXT);
    for doc in paths::ROOT_DOCS
        .iter()
        .copied()
        .chain(std::iter::once(api_main.as_str()))
    {
        if io::write_if_missing(&target.join(doc), b"")? {
            report.created_files.push(doc.to_string());
        }
    }

    if io::write_if_missing(
        &target.join(paths::FEATURE_TEMPLATE_FILE),
        FEATURE_TEMPLATE.as_bytes(),
    )? {
        report
            .created_files
            .push(paths::FEATURE_TEMPLATE_FILE.to_string());
    }

    let config_path = paths::config_path(target);
    if !config_path.exists() {
        let name = Config::default().project_name(target);
        Config::new(name).save(target)?;
        report.created_files.push(paths::CONFIG_FILE.to_string());
    }

    io::atomic_write(&target.join(paths::AGENTS_MD), AGENTS_MD_CONTENT.as_bytes())?;
    report.refreshed_files.push(paths::AGENTS_MD.to_string());

    tracing::debug!(
        root = %target.display(),
        dirs = report.created_dirs.len(),
        files = report.created_files.len(),
        "initialized project"
    );
    Ok(report)
}

/// Empty, or holding nothing but `.archie`.
fn is_empty_dir(dir: &Path) -> Result<bool> {
    let entries = std::fs::read_dir(dir).map_err(|e| ArchieError::fs("read directory", dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| ArchieError::fs("read directory", dir, e))?;
        if entry.file_name() != paths::ARCHIE_DIR {
            return Ok(false);
        }
    }
    Ok(true)
}

// ---------------------------------------------------------------------------
// Scaffold content
// ---------------------------------------------------------------------------

pub const FEATURE_TEMPLATE: &str = r#"# Feature: <feature-key>

## Status
- Value: NOT_REVIEWED
- Owner:
- Last Updated: YYYY-MM-DD
- Reason:

## Summary
- One-liner:
- Background / Motivation:
- User story / Use case:

## Scope
### In Scope
- ...
### Out of Scope
- ...

## Requirements
- R1:
- R2:

## Non-Requirements
- NR1:

## Feature Dependencies
- `<feature-key>`: [Reason]

## Acceptance Criteria
- AC1:

## Design Constraints
- ...

## Design Artifacts
- API:
- Storage:
- Workflow:
- Metrics:
- Tasks:

## Spec
- Location:
- Readiness:

## Related Records
- Blockers:

## Changelog
- YYYY-MM-DD: Created
"#;

pub const AGENTS_MD_CONTENT: &str = r#"# AGENTS.md

This repository is an archie design workspace. Design documents live at the
root, one file per concern; features live under `features/`.

## Layout

| Path | Contents |
|---|---|
| `background.md` | Problem statement, goals, constraints |
| `architecture.md` | Components and how they talk |
| `dependency.md` | External systems and libraries |
| `deployment.md` | Environments and rollout |
| `storage.md` | Data model and persistence |
| `api/api.md` | Public interfaces |
| `workflow/<feature-key>/` | `workflow.md` plus `*.mmd` diagrams |
| `spec/<feature-key>.spec.md` | Implementation-ready spec |
| `features/<feature-key>.md` | One file per feature |
| `tasks.md`, `metrics.md`, `faq.md`, `blocker.md` | Planning notes |

## Feature files

Copy `.archie/docs/feature-template.md` to `features/<feature-key>.md`.
Keep the `## Status` block current:

- `- Value:` one of NOT_REVIEWED, UNDER_REVIEW, BLOCKED, READY_FOR_DESIGN,
  UNDER_DESIGN, DESIGNED, SPEC_READY, IMPLEMENTING, FINISHED
- `- Owner:` who drives the feature
- `- Last Updated:` YYYY-MM-DD, refreshed on every status change
- `- Reason:` required when BLOCKED

List prerequisites under `## Feature Dependencies` as
``- `other-feature`: why it must be designed first``.

## Commands

- `archie status` project overview
- `archie status --feature <key>` one feature in detail
- `archie status --deps` dependency tree and recommended design order
- `archie export` single-file markdown bundle of the whole design
"#;
