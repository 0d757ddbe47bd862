//! Filesystem utilities.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Remove a directory and all its contents, if it exists.
pub fn remove_dir_all_if_exists(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => {
            Err(e).with_context(|| format!("failed to remove directory: {}", path.display()))
        }
    }
}

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .with_context(|| format!("failed to create directory: {}", path.display()))
}

/// Write a string to a file, creating parent directories if needed.
pub fn write_string(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    fs::write(path, contents)
        .with_context(|| format!("failed to write file: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_remove_dir_all_if_exists() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("build/tmp");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("stamp"), "x").unwrap();

        remove_dir_all_if_exists(&tmp.path().join("build")).unwrap();
        assert!(!tmp.path().join("build").exists());

        // Second removal is a no-op
        remove_dir_all_if_exists(&tmp.path().join("build")).unwrap();
    }

    #[test]
    fn test_write_string_creates_parents() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("recipes-kernel/linux/linux-stable_5.4.bb");

        write_string(&path, "LINUX_VERSION = \"5.4.1\"\n").unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "LINUX_VERSION = \"5.4.1\"\n"
        );
    }
}
