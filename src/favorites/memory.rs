use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use dashmap::DashMap;
use disk_lib::ids;
use futures::future::BoxFuture;

use crate::error::api;
use crate::storage::StorageIdentity;

use super::{
    FavoriteGroup,
    FavoriteItem,
    FavoriteRepository,
    NewFavoriteGroup,
    NewFavoriteItem,
};

#[derive(Debug, Default)]
pub struct MemoryFavoriteRepository {
    group_seq: AtomicI64,
    item_seq: AtomicI64,
    groups: DashMap<ids::FavoriteGroupId, FavoriteGroup>,
    items: DashMap<ids::FavoriteItemId, FavoriteItem>,
}

impl MemoryFavoriteRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FavoriteRepository for MemoryFavoriteRepository {
    fn find_group(&self, id: ids::FavoriteGroupId) -> BoxFuture<'_, api::Result<Option<FavoriteGroup>>> {
        Box::pin(async move {
            Ok(self.groups.get(&id).map(|found| found.value().clone()))
        })
    }

    fn find_group_by_name<'a>(
        &'a self,
        user_id: ids::UserId,
        name: &'a str
    ) -> BoxFuture<'a, api::Result<Option<FavoriteGroup>>> {
        Box::pin(async move {
            Ok(self.groups.iter()
                .find(|entry| {
                    let group = entry.value();

                    group.user_id == user_id && group.name == name && !group.deleted
                })
                .map(|entry| entry.value().clone()))
        })
    }

    fn groups_of(&self, user_id: ids::UserId) -> BoxFuture<'_, api::Result<Vec<FavoriteGroup>>> {
        Box::pin(async move {
            let mut list: Vec<FavoriteGroup> = self.groups.iter()
                .filter(|entry| entry.value().user_id == user_id && !entry.value().deleted)
                .map(|entry| entry.value().clone())
                .collect();

            list.sort_by_key(|group| group.id);

            Ok(list)
        })
    }

    fn create_group(&self, group: NewFavoriteGroup) -> BoxFuture<'_, api::Result<FavoriteGroup>> {
        Box::pin(async move {
            if self.find_group_by_name(group.user_id, &group.name).await?.is_some() {
                return Err(api::Error::api(api::FavoriteKind::Existed));
            }

            let now = Utc::now();
            let record = FavoriteGroup {
                id: self.group_seq.fetch_add(1, Ordering::Relaxed) + 1,
                name: group.name,
                user_id: group.user_id,
                public: group.public,
                created: now,
                updated: now,
                deleted: false,
            };

            self.groups.insert(record.id, record.clone());

            Ok(record)
        })
    }

    fn update_group<'a>(&'a self, group: &'a FavoriteGroup) -> BoxFuture<'a, api::Result<()>> {
        Box::pin(async move {
            let Some(mut found) = self.groups.get_mut(&group.id) else {
                return Err(api::Error::api(api::FavoriteKind::NotFound));
            };

            *found = group.clone();

            Ok(())
        })
    }

    fn find_item(&self, id: ids::FavoriteItemId) -> BoxFuture<'_, api::Result<Option<FavoriteItem>>> {
        Box::pin(async move {
            Ok(self.items.get(&id).map(|found| found.value().clone()))
        })
    }

    fn find_item_by(
        &self,
        group_id: ids::FavoriteGroupId,
        user_id: ids::UserId,
        identity: StorageIdentity,
    ) -> BoxFuture<'_, api::Result<Option<FavoriteItem>>> {
        Box::pin(async move {
            Ok(self.items.iter()
                .find(|entry| {
                    let item = entry.value();

                    item.group_id == group_id && item.user_id == user_id && item.identity == identity
                })
                .map(|entry| entry.value().clone()))
        })
    }

    fn items_of(
        &self,
        group_id: ids::FavoriteGroupId,
        user_id: ids::UserId
    ) -> BoxFuture<'_, api::Result<Vec<FavoriteItem>>> {
        Box::pin(async move {
            let mut list: Vec<FavoriteItem> = self.items.iter()
                .filter(|entry| {
                    let item = entry.value();

                    item.group_id == group_id && item.user_id == user_id && !item.deleted
                })
                .map(|entry| entry.value().clone())
                .collect();

            list.sort_by_key(|item| item.id);

            Ok(list)
        })
    }

    fn create_item(&self, item: NewFavoriteItem) -> BoxFuture<'_, api::Result<FavoriteItem>> {
        Box::pin(async move {
            if self.find_item_by(item.group_id, item.user_id, item.identity).await?.is_some() {
                return Err(api::Error::api(api::FavoriteKind::ItemExisted));
            }

            let now = Utc::now();
            let record = FavoriteItem {
                id: self.item_seq.fetch_add(1, Ordering::Relaxed) + 1,
                group_id: item.group_id,
                user_id: item.user_id,
                identity: item.identity,
                created: now,
                updated: now,
                deleted: false,
            };

            self.items.insert(record.id, record.clone());

            Ok(record)
        })
    }

    fn update_item<'a>(&'a self, item: &'a FavoriteItem) -> BoxFuture<'a, api::Result<()>> {
        Box::pin(async move {
            let Some(mut found) = self.items.get_mut(&item.id) else {
                return Err(api::Error::api(api::FavoriteKind::NotFound));
            };

            *found = item.clone();

            Ok(())
        })
    }
}
