use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const ARCHIE_DIR: &str = ".archie";
pub const ARCHIE_DOCS_DIR: &str = ".archie/docs";
pub const CONFIG_FILE: &str = ".archie/config.yaml";
pub const FEATURE_TEMPLATE_FILE: &str = ".archie/docs/feature-template.md";

pub const FEATURES_DIR: &str = "features";
pub const API_DIR: &str = "api";
pub const WORKFLOW_DIR: &str = "workflow";
pub const SPEC_DIR: &str = "spec";
pub const ASSETS_DIR: &str = "assets";

pub const AGENTS_MD: &str = "AGENTS.md";
pub const README_MD: &str = "README.md";
pub const WORKFLOW_MD: &str = "workflow.md";

pub const MARKDOWN_EXT: &str = "md";
pub const MERMAID_EXT: &str = "mmd";
pub const SPEC_SUFFIX: &str = ".spec.md";

/// Root-level design documents, in the order they are scaffolded and exported.
pub const ROOT_DOCS: &[&str] = &[
    "background.md",
    "architecture.md",
    "dependency.md",
    "deployment.md",
    "tasks.md",
    "metrics.md",
    "faq.md",
    "blocker.md",
    "storage.md",
];

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn archie_dir(root: &Path) -> PathBuf {
    root.join(ARCHIE_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn features_dir(root: &Path) -> PathBuf {
    root.join(FEATURES_DIR)
}

pub fn feature_file(root: &Path, key: &str) -> PathBuf {
    features_dir(root).join(format!("{key}.{MARKDOWN_EXT}"))
}

/// `api/` is a directory whose main document is `api/api.md`.
pub fn api_main_file(root: &Path) -> PathBuf {
    root.join(API_DIR).join(format!("{API_DIR}.{MARKDOWN_EXT}"))
}

pub fn workflow_dir(root: &Path, key: &str) -> PathBuf {
    root.join(WORKFLOW_DIR).join(key)
}

pub fn spec_file(root: &Path, key: &str) -> PathBuf {
    root.join(SPEC_DIR).join(format!("{key}{SPEC_SUFFIX}"))
}

pub fn is_archie_project(root: &Path) -> bool {
    archie_dir(root).is_dir()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
