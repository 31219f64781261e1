//! # Data Directory Lock
//!
//! Only one process may hold a catalog open for writing. The holder owns
//! `<data_dir>/.lock`, created exclusively and removed on drop. A lock left
//! behind by a crashed process has to be removed by hand; its content names
//! the pid that created it.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use super::errors::{LoaderError, LoaderResult};

pub const LOCK_FILE: &str = ".lock";

#[derive(Debug)]
pub struct DataDirLock {
    path: PathBuf,
}

impl DataDirLock {
    /// Fails with `DataDirLocked` while another holder exists
    pub fn acquire(data_dir: &Path) -> LoaderResult<Self> {
        fs::create_dir_all(data_dir)?;
        let path = data_dir.join(LOCK_FILE);

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => LoaderError::DataDirLocked(path.display().to_string()),
                _ => LoaderError::from(e),
            })?;

        let lock = Self { path };
        writeln!(file, "{}", std::process::id())?;
        Ok(lock)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for DataDirLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_second_holder_rejected() {
        let temp = TempDir::new().unwrap();

        let lock = DataDirLock::acquire(temp.path()).unwrap();
        assert!(lock.path().is_file());

        let second = DataDirLock::acquire(temp.path());
        assert!(matches!(second, Err(LoaderError::DataDirLocked(_))));
    }

    #[test]
    fn test_released_on_drop() {
        let temp = TempDir::new().unwrap();

        drop(DataDirLock::acquire(temp.path()).unwrap());
        assert!(!temp.path().join(LOCK_FILE).exists());

        DataDirLock::acquire(temp.path()).unwrap();
    }
}
