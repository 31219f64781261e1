//! # Loader Service
//!
//! The single entry point for reading and changing feeds, columns, users and
//! files. Every file record is inserted through `upload`, which always runs
//! `DataFile::validate` first, so no file is stored for a user outside the
//! feed's authorized set.

use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

use uuid::Uuid;

use super::backend::StorageBackend;
use super::catalog::{Catalog, CatalogStore};
use super::column::{Column, ColumnRegistry, ColumnType};
use super::errors::{LoaderError, LoaderResult};
use super::feed::{Feed, FeedRegistry};
use super::file::{DataFile, Delimiter};
use super::lock::DataDirLock;
use super::permissions::FeedPermissions;
use crate::auth::{AuthError, InMemoryUserRepository, PasswordPolicy, RequestContext, User, UserRepository};
use crate::observability::{log_event, Event};

/// Tunables for the service
#[derive(Debug, Clone)]
pub struct ServiceOptions {
    /// Largest accepted payload in bytes
    pub max_upload_bytes: u64,
    /// Used when an upload does not name a delimiter
    pub default_delimiter: Delimiter,
    pub password_policy: PasswordPolicy,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            max_upload_bytes: 100 * 1024 * 1024,
            default_delimiter: Delimiter::default(),
            password_policy: PasswordPolicy::default(),
        }
    }
}

/// A file upload as handed over by the request layer
#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    pub feed: Option<String>,
    pub file_name: String,
    pub data: Vec<u8>,
    pub delimiter: Option<Delimiter>,
    pub columns: Vec<String>,
}

#[derive(Debug)]
pub struct LoaderService<B: StorageBackend> {
    backend: B,
    users: InMemoryUserRepository,
    feeds: FeedRegistry,
    columns: ColumnRegistry,
    /// File records by id. Also serializes uploads against feed deletion.
    files: RwLock<HashMap<Uuid, DataFile>>,
    permissions: FeedPermissions,
    catalog: Option<CatalogStore>,
    /// Held for the lifetime of a service opened over a catalog
    _dir_lock: Option<DataDirLock>,
    /// Serializes mutations so a failed save can be undone in isolation
    write_lock: Mutex<()>,
    options: ServiceOptions,
}

impl<B: StorageBackend> LoaderService<B> {
    /// A service that keeps metadata in memory only
    pub fn new(backend: B, options: ServiceOptions) -> Self {
        Self {
            backend,
            users: InMemoryUserRepository::new(),
            feeds: FeedRegistry::new(),
            columns: ColumnRegistry::new(),
            files: RwLock::new(HashMap::new()),
            permissions: FeedPermissions::new(),
            catalog: None,
            _dir_lock: None,
            write_lock: Mutex::new(()),
            options,
        }
    }

    /// Load the catalog and persist every later change back into it.
    ///
    /// Takes the data directory lock, so a second open of the same catalog
    /// fails with `DataDirLocked` until this service is dropped.
    pub fn open(backend: B, store: CatalogStore, options: ServiceOptions) -> LoaderResult<Self> {
        let dir_lock = DataDirLock::acquire(store.dir())?;
        let catalog = store.load()?;
        let mut service = Self::new(backend, options);
        service.restore(catalog)?;
        service.catalog = Some(store);
        service._dir_lock = Some(dir_lock);

        let feeds = service.feeds.list()?.len().to_string();
        let files = service.read_files()?.len().to_string();
        log_event(Event::CatalogLoaded, &[("feeds", &feeds), ("files", &files)]);

        Ok(service)
    }

    fn restore(&self, catalog: Catalog) -> LoaderResult<()> {
        for user in &catalog.users {
            self.users.create(user)?;
        }
        for feed in catalog.feeds {
            self.feeds.insert(feed)?;
        }
        for column in catalog.columns {
            self.columns.insert(column)?;
        }

        let mut files = self.files.write().map_err(|_| LoaderError::poisoned())?;
        for file in catalog.files {
            self.feeds.get_by_id(&file.feed_id).map_err(|_| {
                LoaderError::Catalog(format!("file {} references an unknown feed", file.id))
            })?;
            files.insert(file.id, file);
        }
        Ok(())
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn options(&self) -> &ServiceOptions {
        &self.options
    }

    /// Current state as a serializable catalog
    pub fn snapshot(&self) -> LoaderResult<Catalog> {
        let mut files: Vec<DataFile> = self.read_files()?.values().cloned().collect();
        files.sort_by_key(|f| (f.upload_date(), f.id));

        Ok(Catalog {
            format_version: 1,
            users: self.users.list()?,
            feeds: self.feeds.list()?,
            columns: self.columns.list()?,
            files,
        })
    }

    /// Run `apply` and save the catalog. When the save fails, `undo` reverts
    /// the in-memory change and the save error is returned.
    fn commit<T>(
        &self,
        apply: impl FnOnce() -> LoaderResult<T>,
        undo: impl FnOnce(&T),
    ) -> LoaderResult<T> {
        let _guard = self.write_lock.lock().map_err(|_| LoaderError::poisoned())?;

        let value = apply()?;
        if let Err(e) = self.persist() {
            undo(&value);
            return Err(e);
        }
        Ok(value)
    }

    /// Callers hold `write_lock`
    fn persist(&self) -> LoaderResult<()> {
        let Some(store) = &self.catalog else {
            return Ok(());
        };

        let result = self.snapshot().and_then(|catalog| store.save(&catalog));
        if let Err(e) = &result {
            log_event(Event::CatalogSaveFailed, &[("error", &e.to_string())]);
        }
        result
    }

    fn read_files(&self) -> LoaderResult<std::sync::RwLockReadGuard<'_, HashMap<Uuid, DataFile>>> {
        self.files.read().map_err(|_| LoaderError::poisoned())
    }

    // ==================
    // Users
    // ==================

    pub fn register_user(
        &self,
        username: &str,
        email: &str,
        password: &str,
        is_admin: bool,
        ctx: &RequestContext,
    ) -> LoaderResult<User> {
        self.permissions.check_admin(ctx)?;

        let mut user = User::new(
            username.to_string(),
            email.to_string(),
            password,
            &self.options.password_policy,
        )?;
        user.is_admin = is_admin;
        let user = self.commit(
            || {
                self.users.create(&user)?;
                Ok(user)
            },
            |user| {
                let _ = self.users.delete(user.id);
            },
        )?;

        log_event(Event::UserCreated, &[("username", username)]);
        Ok(user)
    }

    /// Check a username/password pair
    pub fn authenticate(&self, username: &str, password: &str) -> LoaderResult<User> {
        let verified = match self.users.find_by_username(username)? {
            Some(user) if user.verify_password(password)? => Some(user),
            _ => None,
        };

        match verified {
            Some(user) => {
                log_event(Event::LoginSucceeded, &[("username", username)]);
                Ok(user)
            }
            None => {
                log_event(Event::LoginFailed, &[("username", username)]);
                Err(AuthError::InvalidCredentials.into())
            }
        }
    }

    pub fn get_user(&self, id: Uuid) -> LoaderResult<User> {
        self.users
            .find_by_id(id)?
            .ok_or_else(|| LoaderError::UserNotFound(id.to_string()))
    }

    pub fn find_user(&self, username: &str) -> LoaderResult<User> {
        self.users
            .find_by_username(username)?
            .ok_or_else(|| LoaderError::UserNotFound(username.to_string()))
    }

    pub fn list_users(&self, ctx: &RequestContext) -> LoaderResult<Vec<User>> {
        self.permissions.check_admin(ctx)?;
        let mut users = self.users.list()?;
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    // ==================
    // Feeds
    // ==================

    pub fn create_feed(&self, name: &str, ctx: &RequestContext) -> LoaderResult<Feed> {
        self.permissions.check_admin(ctx)?;

        let feed = self.commit(
            || self.feeds.create(name.to_string()),
            |feed| {
                let _ = self.feeds.delete(&feed.name);
            },
        )?;

        log_event(Event::FeedCreated, &[("feed", name)]);
        Ok(feed)
    }

    pub fn get_feed(&self, name: &str, ctx: &RequestContext) -> LoaderResult<Feed> {
        let feed = self.feeds.get(name)?;
        self.permissions.check_read(&feed, ctx)?;
        Ok(feed)
    }

    /// Administrators see every feed, everyone else only their own
    pub fn list_feeds(&self, ctx: &RequestContext) -> LoaderResult<Vec<Feed>> {
        self.permissions.check_authenticated(ctx)?;

        Ok(self
            .feeds
            .list()?
            .into_iter()
            .filter(|feed| self.permissions.check_read(feed, ctx).is_ok())
            .collect())
    }

    /// Refuses to delete a feed that still owns files
    pub fn delete_feed(&self, name: &str, ctx: &RequestContext) -> LoaderResult<()> {
        self.permissions.check_admin(ctx)?;

        self.commit(
            || {
                let files = self.files.write().map_err(|_| LoaderError::poisoned())?;
                let feed = self.feeds.get(name)?;
                if files.values().any(|f| f.feed_id == feed.id) {
                    return Err(LoaderError::FeedNotEmpty(name.to_string()));
                }
                self.feeds.delete(name)
            },
            |feed| {
                let _ = self.feeds.insert(feed.clone());
            },
        )?;

        log_event(Event::FeedDeleted, &[("feed", name)]);
        Ok(())
    }

    pub fn add_feed_user(&self, name: &str, user_id: Uuid, ctx: &RequestContext) -> LoaderResult<Feed> {
        self.permissions.check_admin(ctx)?;
        let user = self.get_user(user_id)?;

        let (feed, _) = self.commit(
            || {
                let mut added = false;
                let feed = self.feeds.update(name, |feed| {
                    added = feed.add_user(user_id);
                })?;
                Ok((feed, added))
            },
            |(_, added)| {
                if *added {
                    let _ = self.feeds.update(name, |feed| {
                        feed.remove_user(&user_id);
                    });
                }
            },
        )?;

        log_event(Event::FeedUserAdded, &[("feed", name), ("username", &user.username)]);
        Ok(feed)
    }

    pub fn remove_feed_user(&self, name: &str, user_id: Uuid, ctx: &RequestContext) -> LoaderResult<Feed> {
        self.permissions.check_admin(ctx)?;

        let feed = self.commit(
            || {
                let mut was_member = false;
                let feed = self.feeds.update(name, |feed| {
                    was_member = feed.remove_user(&user_id);
                })?;
                if !was_member {
                    return Err(LoaderError::UserNotFound(user_id.to_string()));
                }
                Ok(feed)
            },
            |_| {
                let _ = self.feeds.update(name, |feed| {
                    feed.add_user(user_id);
                });
            },
        )?;

        log_event(Event::FeedUserRemoved, &[("feed", name), ("user_id", &user_id.to_string())]);
        Ok(feed)
    }

    // ==================
    // Columns
    // ==================

    pub fn create_column(
        &self,
        name: &str,
        col_type: ColumnType,
        ctx: &RequestContext,
    ) -> LoaderResult<Column> {
        self.permissions.check_admin(ctx)?;

        let column = self.commit(
            || self.columns.create(name.to_string(), col_type),
            |column| {
                let _ = self.columns.delete(&column.name);
            },
        )?;

        log_event(Event::ColumnCreated, &[("column", name), ("col_type", col_type.as_str())]);
        Ok(column)
    }

    pub fn get_column(&self, name: &str, ctx: &RequestContext) -> LoaderResult<Column> {
        self.permissions.check_authenticated(ctx)?;
        self.columns.get(name)
    }

    pub fn list_columns(&self, ctx: &RequestContext) -> LoaderResult<Vec<Column>> {
        self.permissions.check_authenticated(ctx)?;
        self.columns.list()
    }

    pub fn delete_column(&self, name: &str, ctx: &RequestContext) -> LoaderResult<()> {
        self.permissions.check_admin(ctx)?;

        self.commit(
            || self.columns.delete(name),
            |column| {
                let _ = self.columns.insert(column.clone());
            },
        )?;

        log_event(Event::ColumnDeleted, &[("column", name)]);
        Ok(())
    }

    // ==================
    // Files
    // ==================

    /// Validate and store an upload.
    ///
    /// The uploading user is taken from `ctx`; a missing feed or user fails
    /// with `MissingRequiredReference`.
    pub fn upload(&self, request: UploadRequest, ctx: &RequestContext) -> LoaderResult<DataFile> {
        let result = self.store_upload(request, ctx);

        match &result {
            Ok(file) => {
                let size = file.size.to_string();
                log_event(Event::FileUploaded, &[("path", &file.data_path), ("size", &size)]);
            }
            Err(e) if e.is_client_error() => {
                log_event(Event::UploadRejected, &[("reason", &e.to_string())]);
            }
            Err(_) => {}
        }

        result
    }

    fn store_upload(&self, request: UploadRequest, ctx: &RequestContext) -> LoaderResult<DataFile> {
        let feed = match request.feed.as_deref() {
            Some(name) => Some(self.feeds.get(name)?),
            None => None,
        };

        let mut builder = DataFile::builder()
            .file_name(request.file_name)
            .delimiter(request.delimiter.unwrap_or(self.options.default_delimiter))
            .columns(request.columns)
            .data(&request.data);
        if let Some(feed) = &feed {
            builder = builder.feed(feed);
        }
        if let Some(user_id) = ctx.user_id {
            builder = builder.user(user_id);
        }
        let file = builder.build()?;

        // build() guarantees both references are present
        let feed = feed.ok_or(LoaderError::MissingRequiredReference("feed"))?;
        self.get_user(file.user_id)?;
        file.validate(&feed)?;

        let max = self.options.max_upload_bytes;
        if max > 0 && file.size > max {
            return Err(LoaderError::FileTooLarge(file.size, max));
        }

        self.insert_file(file, &request.data)
    }

    /// Store a built record and its payload. Membership is checked again
    /// against the feed as currently registered, since it may have changed
    /// (or the feed been deleted) after the record was built.
    fn insert_file(&self, file: DataFile, data: &[u8]) -> LoaderResult<DataFile> {
        self.commit(
            || {
                let mut files = self.files.write().map_err(|_| LoaderError::poisoned())?;

                let current = self.feeds.get_by_id(&file.feed_id)?;
                file.validate(&current)?;

                if files.values().any(|f| f.data_path == file.data_path) {
                    return Err(LoaderError::FileAlreadyExists(file.data_path.clone()));
                }

                self.backend.write(&file.data_path, data)?;
                files.insert(file.id, file.clone());
                Ok(file)
            },
            |file| {
                if let Ok(mut files) = self.files.write() {
                    files.remove(&file.id);
                }
                let _ = self.backend.delete(&file.data_path);
            },
        )
    }

    /// Files of a feed, oldest first
    pub fn list_files(&self, feed_name: &str, ctx: &RequestContext) -> LoaderResult<Vec<DataFile>> {
        let feed = self.get_feed(feed_name, ctx)?;

        let mut files: Vec<DataFile> = self
            .read_files()?
            .values()
            .filter(|f| f.feed_id == feed.id)
            .cloned()
            .collect();
        files.sort_by_key(|f| (f.upload_date(), f.file_name.clone()));
        Ok(files)
    }

    /// File record and the name of its feed
    pub fn get_file(&self, id: Uuid, ctx: &RequestContext) -> LoaderResult<(DataFile, Feed)> {
        let file = self
            .read_files()?
            .get(&id)
            .cloned()
            .ok_or_else(|| LoaderError::FileNotFound(id.to_string()))?;

        let feed = self.feeds.get_by_id(&file.feed_id)?;
        self.permissions
            .check_read(&feed, ctx)
            .map_err(|_| LoaderError::FileNotFound(id.to_string()))?;
        Ok((file, feed))
    }

    pub fn download(&self, id: Uuid, ctx: &RequestContext) -> LoaderResult<(DataFile, Vec<u8>)> {
        let (file, _) = self.get_file(id, ctx)?;
        let data = self.backend.read(&file.data_path)?;
        Ok((file, data))
    }

    pub fn delete_file(&self, id: Uuid, ctx: &RequestContext) -> LoaderResult<()> {
        let (file, _) = self.get_file(id, ctx)?;
        self.permissions.check_delete_file(&file.user_id, ctx)?;

        self.commit(
            || {
                let mut files = self.files.write().map_err(|_| LoaderError::poisoned())?;
                files
                    .remove(&id)
                    .ok_or_else(|| LoaderError::FileNotFound(id.to_string()))
            },
            |removed| {
                if let Ok(mut files) = self.files.write() {
                    files.insert(removed.id, removed.clone());
                }
            },
        )?;

        // The record is gone from the saved catalog; only then drop the payload
        match self.backend.delete(&file.data_path) {
            Ok(()) | Err(LoaderError::FileNotFound(_)) => {}
            Err(e) => return Err(e),
        }

        log_event(Event::FileDeleted, &[("path", &file.data_path)]);
        Ok(())
    }
}
