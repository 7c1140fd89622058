use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use dashmap::DashMap;
use disk_lib::ids;
use disk_lib::query::Page;
use futures::future::BoxFuture;

use crate::error::api;

use super::{NewShare, UserShare, ShareRepository};

#[derive(Debug, Default)]
pub struct MemoryShareRepository {
    seq: AtomicI64,
    shares: DashMap<ids::ShareId, UserShare>,
}

impl MemoryShareRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ShareRepository for MemoryShareRepository {
    fn find(&self, id: ids::ShareId) -> BoxFuture<'_, api::Result<Option<UserShare>>> {
        Box::pin(async move {
            Ok(self.shares.get(&id).map(|found| found.value().clone()))
        })
    }

    fn find_by_code<'a>(&'a self, code: &'a str) -> BoxFuture<'a, api::Result<Option<UserShare>>> {
        Box::pin(async move {
            Ok(self.shares.iter()
                .find(|entry| entry.value().share_code == code)
                .map(|entry| entry.value().clone()))
        })
    }

    fn by_user(&self, user_id: ids::UserId, page: Page) -> BoxFuture<'_, api::Result<Vec<UserShare>>> {
        Box::pin(async move {
            let mut list: Vec<UserShare> = self.shares.iter()
                .filter(|entry| entry.value().user_id == user_id)
                .map(|entry| entry.value().clone())
                .collect();

            list.sort_by(|a, b| b.created.cmp(&a.created).then(b.id.cmp(&a.id)));

            Ok(list.into_iter()
                .skip(page.limit.skip(page.offset))
                .take(page.limit.take())
                .collect())
        })
    }

    fn create(&self, share: NewShare) -> BoxFuture<'_, api::Result<UserShare>> {
        Box::pin(async move {
            if self.shares.iter().any(|entry| entry.value().share_code == share.share_code) {
                return Err(api::Error::new()
                    .context("share code already in use"));
            }

            let now = Utc::now();
            let id = self.seq.fetch_add(1, Ordering::Relaxed) + 1;
            let record = UserShare {
                id,
                share_code: share.share_code,
                identity: share.identity,
                user_id: share.user_id,
                password: share.password,
                expire_time: share.expire_time,
                created: now,
                updated: now,
            };

            self.shares.insert(id, record.clone());

            Ok(record)
        })
    }

    fn update<'a>(&'a self, share: &'a UserShare) -> BoxFuture<'a, api::Result<()>> {
        Box::pin(async move {
            let Some(mut found) = self.shares.get_mut(&share.id) else {
                return Err(api::Error::api(api::ShareKind::NotFound));
            };

            *found = share.clone();

            Ok(())
        })
    }
}
