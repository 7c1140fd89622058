use chrono::{DateTime, Utc};
use disk_lib::ids;
use futures::future::BoxFuture;

use crate::error::api;

pub mod memory;
pub mod pg;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: ids::UserId,
    pub username: String,
    pub created: DateTime<Utc>,
    pub updated: Option<DateTime<Utc>>,
}

pub trait UserRepository: Send + Sync {
    fn find(&self, id: ids::UserId) -> BoxFuture<'_, api::Result<Option<User>>>;

    fn find_by_username<'a>(&'a self, username: &'a str) -> BoxFuture<'a, api::Result<Option<User>>>;

    fn create<'a>(&'a self, username: &'a str) -> BoxFuture<'a, api::Result<User>>;
}

pub fn check_username(username: &str) -> api::Result<()> {
    if !disk_lib::validation::printable_no_whitespace(username, Some(64)) || username.is_empty() {
        return Err(api::Error::api((
            api::UserKind::InvalidUsername,
            "username must be 1 to 64 characters without whitespace"
        )));
    }

    Ok(())
}
