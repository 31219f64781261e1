//! # Feeds
//!
//! A feed is a named collection of uploaded files together with the set of
//! users allowed to upload into it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::RwLock;
use uuid::Uuid;

use super::errors::{LoaderError, LoaderResult};
use super::names::validate_name;

/// A named feed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feed {
    pub id: Uuid,
    pub name: String,
    /// Users authorized to upload into this feed
    #[serde(default)]
    pub users: HashSet<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Feed {
    /// Create a new feed with no authorized users
    pub fn new(name: String) -> LoaderResult<Self> {
        validate_name(&name)?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            name,
            users: HashSet::new(),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn has_user(&self, user_id: &Uuid) -> bool {
        self.users.contains(user_id)
    }

    /// Returns false if the user was already a member
    pub fn add_user(&mut self, user_id: Uuid) -> bool {
        let added = self.users.insert(user_id);
        if added {
            self.updated_at = Utc::now();
        }
        added
    }

    /// Returns false if the user was not a member
    pub fn remove_user(&mut self, user_id: &Uuid) -> bool {
        let removed = self.users.remove(user_id);
        if removed {
            self.updated_at = Utc::now();
        }
        removed
    }
}

impl fmt::Display for Feed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Feed registry keyed by name
#[derive(Debug, Default)]
pub struct FeedRegistry {
    feeds: RwLock<HashMap<String, Feed>>,
}

impl FeedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a feed. The name check and insert share one write lock.
    pub fn create(&self, name: String) -> LoaderResult<Feed> {
        let feed = Feed::new(name)?;
        self.insert(feed.clone())?;
        Ok(feed)
    }

    /// Insert an existing feed record (used when restoring the catalog)
    pub fn insert(&self, feed: Feed) -> LoaderResult<()> {
        let mut feeds = self.feeds.write().map_err(|_| LoaderError::poisoned())?;

        if feeds.contains_key(&feed.name) {
            return Err(LoaderError::duplicate_feed(feed.name));
        }

        feeds.insert(feed.name.clone(), feed);
        Ok(())
    }

    pub fn get(&self, name: &str) -> LoaderResult<Feed> {
        let feeds = self.feeds.read().map_err(|_| LoaderError::poisoned())?;

        feeds
            .get(name)
            .cloned()
            .ok_or_else(|| LoaderError::FeedNotFound(name.to_string()))
    }

    pub fn get_by_id(&self, id: &Uuid) -> LoaderResult<Feed> {
        let feeds = self.feeds.read().map_err(|_| LoaderError::poisoned())?;

        feeds
            .values()
            .find(|f| &f.id == id)
            .cloned()
            .ok_or_else(|| LoaderError::FeedNotFound(id.to_string()))
    }

    /// Apply a change to a stored feed and return the updated copy
    pub fn update<F>(&self, name: &str, change: F) -> LoaderResult<Feed>
    where
        F: FnOnce(&mut Feed),
    {
        let mut feeds = self.feeds.write().map_err(|_| LoaderError::poisoned())?;

        let feed = feeds
            .get_mut(name)
            .ok_or_else(|| LoaderError::FeedNotFound(name.to_string()))?;
        change(feed);
        Ok(feed.clone())
    }

    pub fn delete(&self, name: &str) -> LoaderResult<Feed> {
        let mut feeds = self.feeds.write().map_err(|_| LoaderError::poisoned())?;

        feeds
            .remove(name)
            .ok_or_else(|| LoaderError::FeedNotFound(name.to_string()))
    }

    /// All feeds, ordered by name
    pub fn list(&self) -> LoaderResult<Vec<Feed>> {
        let feeds = self.feeds.read().map_err(|_| LoaderError::poisoned())?;

        let mut feeds: Vec<Feed> = feeds.values().cloned().collect();
        feeds.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(feeds)
    }
}
