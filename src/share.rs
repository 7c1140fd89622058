use chrono::{DateTime, Utc};
use disk_lib::ids;
use disk_lib::query::Page;
use futures::future::BoxFuture;

use crate::error::api;
use crate::storage::StorageIdentity;

pub mod memory;
pub mod pg;
pub mod service;

/// a storage item shared by a user through a share code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserShare {
    pub id: ids::ShareId,
    pub share_code: String,
    pub identity: StorageIdentity,
    pub user_id: ids::UserId,
    pub password: Option<String>,
    /// `None` never expires
    pub expire_time: Option<DateTime<Utc>>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl UserShare {
    pub fn is_expired(&self, now: &DateTime<Utc>) -> bool {
        self.expire_time
            .map(|expire| expire <= *now)
            .unwrap_or(false)
    }

    pub fn has_password(&self) -> bool {
        self.password.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct NewShare {
    pub share_code: String,
    pub identity: StorageIdentity,
    pub user_id: ids::UserId,
    pub password: Option<String>,
    pub expire_time: Option<DateTime<Utc>>,
}

pub trait ShareRepository: Send + Sync {
    fn find(&self, id: ids::ShareId) -> BoxFuture<'_, api::Result<Option<UserShare>>>;

    fn find_by_code<'a>(&'a self, code: &'a str) -> BoxFuture<'a, api::Result<Option<UserShare>>>;

    /// newest first
    fn by_user(&self, user_id: ids::UserId, page: Page) -> BoxFuture<'_, api::Result<Vec<UserShare>>>;

    fn create(&self, share: NewShare) -> BoxFuture<'_, api::Result<UserShare>>;

    fn update<'a>(&'a self, share: &'a UserShare) -> BoxFuture<'a, api::Result<()>>;
}
