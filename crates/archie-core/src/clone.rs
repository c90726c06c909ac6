use crate::error::{ArchieError, Result};
use crate::project::{self, InitReport};
use crate::{io, paths};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

// ---------------------------------------------------------------------------
// CloneStrategy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CloneStrategy {
    /// Project context and structure.
    Context,
    /// Background only.
    Light,
    /// Every standard document and directory.
    Full,
    /// An explicit item list.
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    File,
    Directory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CloneItem {
    pub name: String,
    pub kind: ItemKind,
}

impl CloneItem {
    fn file(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: ItemKind::File,
        }
    }

    fn dir(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: ItemKind::Directory,
        }
    }
}

const CONTEXT_FILES: &[&str] = &[
    "background.md",
    "dependency.md",
    "architecture.md",
    "storage.md",
    "faq.md",
];

/// Directories a clone may copy. `.archie` is never copied.
const CLONE_DIRS: &[&str] = &[
    paths::API_DIR,
    paths::WORKFLOW_DIR,
    paths::SPEC_DIR,
    paths::FEATURES_DIR,
    paths::ASSETS_DIR,
];

impl CloneStrategy {
    pub fn all() -> &'static [CloneStrategy] {
        &[
            CloneStrategy::Context,
            CloneStrategy::Light,
            CloneStrategy::Full,
            CloneStrategy::Custom,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CloneStrategy::Context => "context",
            CloneStrategy::Light => "light",
            CloneStrategy::Full => "full",
            CloneStrategy::Custom => "custom",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            CloneStrategy::Context => "Copy project context and structure (recommended)",
            CloneStrategy::Light => "Copy only background documentation",
            CloneStrategy::Full => "Copy everything from source project",
            CloneStrategy::Custom => "Copy an explicit list of items",
        }
    }

    /// Items the strategy copies. `Custom` has none of its own.
    pub fn items(self) -> Vec<CloneItem> {
        match self {
            CloneStrategy::Context => CONTEXT_FILES
                .iter()
                .map(|f| CloneItem::file(f))
                .chain(std::iter::once(CloneItem::dir(paths::API_DIR)))
                .collect(),
            CloneStrategy::Light => vec![CloneItem::file("background.md")],
            CloneStrategy::Full => standard_items(),
            CloneStrategy::Custom => Vec::new(),
        }
    }
}

impl fmt::Display for CloneStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CloneStrategy {
    type Err = ArchieError;

    fn from_str(s: &str) -> Result<Self> {
        CloneStrategy::all()
            .iter()
            .copied()
            .find(|strategy| strategy.as_str() == s)
            .ok_or_else(|| ArchieError::InvalidStrategy(s.to_string()))
    }
}

/// Every root document and project directory a clone may copy.
pub fn standard_items() -> Vec<CloneItem> {
    paths::ROOT_DOCS
        .iter()
        .map(|f| CloneItem::file(f))
        .chain(CLONE_DIRS.iter().map(|d| CloneItem::dir(d)))
        .collect()
}

/// Resolve names given for a custom clone against the standard items.
/// A trailing `/` is accepted on directory names.
pub fn custom_items(names: &[String]) -> Result<Vec<CloneItem>> {
    let standard = standard_items();
    names
        .iter()
        .map(|name| {
            let wanted = name.trim_end_matches('/');
            standard
                .iter()
                .find(|item| item.name == wanted)
                .cloned()
                .ok_or_else(|| ArchieError::UnknownCloneItem(name.clone()))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Clone
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct CloneReport {
    pub strategy: CloneStrategy,
    pub source: PathBuf,
    pub target: PathBuf,
    pub copied_files: Vec<String>,
    pub copied_dirs: Vec<String>,
    /// Target files left as they were because they already existed.
    pub skipped: Vec<String>,
    pub errors: Vec<String>,
    pub init: InitReport,
}

fn absolutize(path: &Path) -> Result<PathBuf> {
    let abs = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    Ok(abs.canonicalize().unwrap_or(abs))
}

/// Source must be an existing archie project directory.
pub fn validate_source(source: &Path) -> Result<()> {
    if !source.exists() {
        return Err(ArchieError::InvalidSource(format!(
            "source path does not exist: {}",
            source.display()
        )));
    }
    if !source.is_dir() {
        return Err(ArchieError::InvalidSource(format!(
            "source path is not a directory: {}",
            source.display()
        )));
    }
    if !paths::is_archie_project(source) {
        return Err(ArchieError::InvalidSource(format!(
            "source is not an archie project (missing .archie folder): {}",
            source.display()
        )));
    }
    Ok(())
}

/// Copy `items` from `source` into `target` without overwriting, then
/// scaffold whatever the target still lacks.
///
/// Items missing from the source are dropped. The target is marked as a
/// project before copying so the scaffold step accepts it.
pub fn clone_project(
    source: &Path,
    target: &Path,
    strategy: CloneStrategy,
    items: Vec<CloneItem>,
) -> Result<CloneReport> {
    validate_source(source)?;
    let source = absolutize(source)?;
    let target = absolutize(target)?;
    if source == target {
        return Err(ArchieError::SameSourceAndTarget(target));
    }
    if target.exists() && !target.is_dir() {
        return Err(ArchieError::NotADirectory(target));
    }
    if target.is_dir()
        && !paths::is_archie_project(&target)
        && std::fs::read_dir(&target)
            .map_err(|e| ArchieError::fs("read directory", &target, e))?
            .next()
            .is_some()
    {
        return Err(ArchieError::NotEmpty(target));
    }

    let items: Vec<CloneItem> = items
        .into_iter()
        .filter(|item| source.join(&item.name).exists())
        .collect();

    io::ensure_dir(&paths::archie_dir(&target))?;

    let mut copied_files = Vec::new();
    let mut copied_dirs = Vec::new();
    let mut skipped = Vec::new();
    let mut errors = Vec::new();

    for item in &items {
        let from = source.join(&item.name);
        let to = target.join(&item.name);
        match item.kind {
            ItemKind::File => {
                if to.exists() {
                    skipped.push(item.name.clone());
                    continue;
                }
                match std::fs::copy(&from, &to) {
                    Ok(_) => copied_files.push(item.name.clone()),
                    Err(e) => errors.push(ArchieError::fs("copy", &from, e).to_string()),
                }
            }
            ItemKind::Directory => match io::copy_dir_no_clobber(&from, &to) {
                Ok(existing) => {
                    skipped.extend(existing.iter().map(|p| {
                        p.strip_prefix(&target)
                            .unwrap_or(p)
                            .to_string_lossy()
                            .into_owned()
                    }));
                    copied_dirs.push(item.name.clone());
                }
                Err(e) => errors.push(e.to_string()),
            },
        }
    }

    for err in &errors {
        tracing::warn!(error = %err, "clone copy failed");
    }

    let init = project::init_project(&target)?;

    Ok(CloneReport {
        strategy,
        source,
        target,
        copied_files,
        copied_dirs,
        skipped,
        errors,
        init,
    })
}
