use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use dashmap::DashMap;
use disk_lib::ids;
use futures::future::BoxFuture;

use crate::error::api;

use super::{User, UserRepository, check_username};

#[derive(Debug, Default)]
pub struct MemoryUserRepository {
    seq: AtomicI64,
    users: DashMap<ids::UserId, User>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserRepository for MemoryUserRepository {
    fn find(&self, id: ids::UserId) -> BoxFuture<'_, api::Result<Option<User>>> {
        Box::pin(async move {
            Ok(self.users.get(&id).map(|found| found.value().clone()))
        })
    }

    fn find_by_username<'a>(&'a self, username: &'a str) -> BoxFuture<'a, api::Result<Option<User>>> {
        Box::pin(async move {
            Ok(self.users.iter()
                .find(|entry| entry.value().username == username)
                .map(|entry| entry.value().clone()))
        })
    }

    fn create<'a>(&'a self, username: &'a str) -> BoxFuture<'a, api::Result<User>> {
        Box::pin(async move {
            check_username(username)?;

            if self.find_by_username(username).await?.is_some() {
                return Err(api::Error::api(api::UserKind::UsernameExisted));
            }

            let user = User {
                id: self.seq.fetch_add(1, Ordering::Relaxed) + 1,
                username: username.to_owned(),
                created: Utc::now(),
                updated: None,
            };

            self.users.insert(user.id, user.clone());

            Ok(user)
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn create_and_find() {
        let repo = MemoryUserRepository::new();
        let user = repo.create("alice").await.unwrap();

        assert_eq!(user.id, 1);
        assert_eq!(repo.find(user.id).await.unwrap(), Some(user.clone()));
        assert_eq!(repo.find_by_username("alice").await.unwrap(), Some(user));
        assert_eq!(repo.find(42).await.unwrap(), None);
    }

    #[tokio::test]
    async fn duplicate_username() {
        let repo = MemoryUserRepository::new();

        repo.create("alice").await.unwrap();

        let err = repo.create("alice").await.unwrap_err();

        assert_eq!(err.api_kind(), &api::ApiErrorKind::User(api::UserKind::UsernameExisted));

        let err = repo.create("two words").await.unwrap_err();

        assert_eq!(err.api_kind(), &api::ApiErrorKind::User(api::UserKind::InvalidUsername));
    }
}
