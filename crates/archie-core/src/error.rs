use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArchieError {
    #[error("feature not found: {0}")]
    FeatureNotFound(String),

    #[error("not an archie project: no archie documents found in {0}")]
    NotAProject(PathBuf),

    #[error("directory is not empty and not an archie project (missing .archie folder): {0}")]
    NotEmpty(PathBuf),

    #[error("path exists but is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("invalid clone source: {0}")]
    InvalidSource(String),

    #[error("source and target cannot be the same directory: {0}")]
    SameSourceAndTarget(PathBuf),

    #[error("invalid clone strategy '{0}': expected context, light, full or custom")]
    InvalidStrategy(String),

    #[error("unknown clone item '{0}'")]
    UnknownCloneItem(String),

    #[error("{op} {path}: {source}")]
    Fs {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl ArchieError {
    /// Wrap an I/O error with the operation and path that produced it.
    pub fn fs(op: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ArchieError::Fs {
            op,
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ArchieError>;
