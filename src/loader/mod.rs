//! # Loader
//!
//! Feeds, columns and uploaded data files, with the validation rules that
//! govern them and the storage that holds them.

pub mod backend;
pub mod catalog;
pub mod column;
pub mod errors;
pub mod feed;
pub mod file;
pub mod local;
pub mod lock;
pub mod names;
pub mod permissions;
pub mod service;

pub use backend::StorageBackend;
pub use catalog::{Catalog, CatalogStore};
pub use column::{Column, ColumnRegistry, ColumnType};
pub use errors::{LoaderError, LoaderResult};
pub use feed::{Feed, FeedRegistry};
pub use file::{path_for, DataFile, DataFileBuilder, Delimiter};
pub use local::LocalBackend;
pub use lock::DataDirLock;
pub use permissions::FeedPermissions;
pub use service::{LoaderService, ServiceOptions, UploadRequest};
