//! # Local Filesystem Backend

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use super::backend::StorageBackend;
use super::errors::{LoaderError, LoaderResult};

/// Stores payloads under a root directory, one file per upload
#[derive(Debug)]
pub struct LocalBackend {
    root: PathBuf,
}

impl LocalBackend {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn full_path(&self, path: &str) -> PathBuf {
        path.split('/')
            .filter(|segment| !segment.is_empty())
            .fold(self.root.clone(), |acc, segment| acc.join(segment))
    }

    fn not_found_or_io(path: &str, e: std::io::Error) -> LoaderError {
        if e.kind() == ErrorKind::NotFound {
            LoaderError::FileNotFound(path.to_string())
        } else {
            LoaderError::Io(e.to_string())
        }
    }
}

impl StorageBackend for LocalBackend {
    fn write(&self, path: &str, data: &[u8]) -> LoaderResult<()> {
        let full_path = self.full_path(path);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&full_path, data)?;
        Ok(())
    }

    fn read(&self, path: &str) -> LoaderResult<Vec<u8>> {
        fs::read(self.full_path(path)).map_err(|e| Self::not_found_or_io(path, e))
    }

    fn delete(&self, path: &str) -> LoaderResult<()> {
        fs::remove_file(self.full_path(path)).map_err(|e| Self::not_found_or_io(path, e))
    }

    fn exists(&self, path: &str) -> LoaderResult<bool> {
        Ok(self.full_path(path).is_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_read_nested() {
        let temp = TempDir::new().unwrap();
        let backend = LocalBackend::new(temp.path().to_path_buf());

        backend.write("test_feed/20240305/data.csv", b"a,b\n1,2\n").unwrap();
        let data = backend.read("test_feed/20240305/data.csv").unwrap();
        assert_eq!(data, b"a,b\n1,2\n");
        assert!(temp.path().join("test_feed").join("20240305").join("data.csv").is_file());
    }

    #[test]
    fn test_delete() {
        let temp = TempDir::new().unwrap();
        let backend = LocalBackend::new(temp.path().to_path_buf());

        backend.write("f/1/x.csv", b"bye").unwrap();
        assert!(backend.exists("f/1/x.csv").unwrap());

        backend.delete("f/1/x.csv").unwrap();
        assert!(!backend.exists("f/1/x.csv").unwrap());
    }

    #[test]
    fn test_not_found() {
        let temp = TempDir::new().unwrap();
        let backend = LocalBackend::new(temp.path().to_path_buf());

        assert!(matches!(backend.read("missing.csv"), Err(LoaderError::FileNotFound(_))));
        assert!(matches!(backend.delete("missing.csv"), Err(LoaderError::FileNotFound(_))));
    }
}
