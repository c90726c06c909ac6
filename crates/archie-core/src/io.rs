use crate::error::{ArchieError, Result};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Atomically write `data` to `path` using a tempfile in the same directory.
/// Prevents partial writes from corrupting exported or generated files.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp =
        NamedTempFile::new_in(dir).map_err(|e| ArchieError::fs("create temp file in", dir, e))?;
    tmp.write_all(data)
        .map_err(|e| ArchieError::fs("write", path, e))?;
    tmp.persist(path)
        .map_err(|e| ArchieError::fs("persist", path, e.error))?;
    Ok(())
}

/// Create a directory and all parents, idempotent.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(path).map_err(|e| ArchieError::fs("create directory", path, e))
}

/// Write a file only if it does not already exist. Returns true if written.
pub fn write_if_missing(path: &Path, data: &[u8]) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    atomic_write(path, data)?;
    Ok(true)
}

/// Read a file to a string, attaching the path to any failure.
pub fn read_to_string(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| ArchieError::fs("read", path, e))
}

/// Recursively copy `src` into `dst` without overwriting existing files.
///
/// Returns the destination paths that were skipped because they already existed.
pub fn copy_dir_no_clobber(src: &Path, dst: &Path) -> Result<Vec<std::path::PathBuf>> {
    let mut skipped = Vec::new();
    ensure_dir(dst)?;
    let entries = std::fs::read_dir(src).map_err(|e| ArchieError::fs("read directory", src, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| ArchieError::fs("read directory", src, e))?;
        let from = entry.path();
        let to = dst.join(entry.file_name());
        let file_type = entry
            .file_type()
            .map_err(|e| ArchieError::fs("stat", &from, e))?;
        if file_type.is_dir() {
            skipped.extend(copy_dir_no_clobber(&from, &to)?);
        } else if to.exists() {
            skipped.push(to);
        } else {
            std::fs::copy(&from, &to).map_err(|e| ArchieError::fs("copy", &from, e))?;
        }
    }
    Ok(skipped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn atomic_write_creates_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("export.md");
        atomic_write(&path, b"# Export").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# Export");
    }

    #[test]
    fn atomic_write_creates_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a/b/c/config.yaml");
        atomic_write(&path, b"data").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn write_if_missing_skips_existing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("background.md");
        std::fs::write(&path, b"original").unwrap();
        let written = write_if_missing(&path, b"new").unwrap();
        assert!(!written);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "original");
    }

    #[test]
    fn read_to_string_reports_path() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.md");
        let err = read_to_string(&missing).unwrap_err();
        assert!(err.to_string().contains("nope.md"));
    }

    #[test]
    fn copy_dir_keeps_existing_files() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        let dst = dir.path().join("dst");
        std::fs::create_dir_all(src.join("nested")).unwrap();
        std::fs::write(src.join("a.md"), "from source").unwrap();
        std::fs::write(src.join("nested/b.md"), "nested").unwrap();
        std::fs::create_dir_all(&dst).unwrap();
        std::fs::write(dst.join("a.md"), "already here").unwrap();

        let skipped = copy_dir_no_clobber(&src, &dst).unwrap();

        assert_eq!(skipped, vec![dst.join("a.md")]);
        assert_eq!(std::fs::read_to_string(dst.join("a.md")).unwrap(), "already here");
        assert_eq!(std::fs::read_to_string(dst.join("nested/b.md")).unwrap(), "nested");
    }
}
