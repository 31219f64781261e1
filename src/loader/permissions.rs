//! # Feed Permissions
//!
//! Who may see or change feeds, columns and files. Upload authorization
//! itself is `DataFile::validate`.

use uuid::Uuid;

use super::errors::{LoaderError, LoaderResult};
use super::feed::Feed;
use crate::auth::RequestContext;

#[derive(Debug, Default)]
pub struct FeedPermissions;

impl FeedPermissions {
    pub fn new() -> Self {
        Self
    }

    pub fn check_authenticated(&self, context: &RequestContext) -> LoaderResult<()> {
        if context.is_authenticated {
            Ok(())
        } else {
            Err(LoaderError::AuthenticationRequired)
        }
    }

    /// Creating and deleting feeds and columns, managing membership
    pub fn check_admin(&self, context: &RequestContext) -> LoaderResult<()> {
        self.check_authenticated(context)?;
        if context.is_admin {
            Ok(())
        } else {
            Err(LoaderError::AdminRequired)
        }
    }

    /// Reading a feed and its files is limited to its members
    pub fn check_read(&self, feed: &Feed, context: &RequestContext) -> LoaderResult<()> {
        self.check_authenticated(context)?;
        if context.is_admin {
            return Ok(());
        }

        match &context.user_id {
            Some(user_id) if feed.has_user(user_id) => Ok(()),
            // Hide the feed from non-members
            _ => Err(LoaderError::FeedNotFound(feed.name.clone())),
        }
    }

    /// Deleting a file: administrators or the uploader
    pub fn check_delete_file(&self, uploader: &Uuid, context: &RequestContext) -> LoaderResult<()> {
        self.check_authenticated(context)?;
        if context.is_admin || context.is_user(uploader) {
            Ok(())
        } else {
            Err(LoaderError::AdminRequired)
        }
    }
}
