//! # Storage Backend Trait

use super::errors::LoaderResult;

/// Where uploaded payloads are kept. Paths are relative and `/`-separated.
pub trait StorageBackend: Send + Sync + std::fmt::Debug {
    fn write(&self, path: &str, data: &[u8]) -> LoaderResult<()>;

    fn read(&self, path: &str) -> LoaderResult<Vec<u8>>;

    fn delete(&self, path: &str) -> LoaderResult<()>;

    fn exists(&self, path: &str) -> LoaderResult<bool>;
}
