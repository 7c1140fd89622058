use chrono::{DateTime, Utc};
use disk_lib::ids;
use futures::future::BoxFuture;

use crate::error::api;
use crate::storage::StorageIdentity;

pub mod memory;
pub mod pg;
pub mod service;

/// every user has this group without it being stored
pub const DEFAULT_GROUP_ID: ids::FavoriteGroupId = 0;
pub const RECYCLE_BIN_ID: ids::FavoriteGroupId = -1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FavoriteGroup {
    pub id: ids::FavoriteGroupId,
    pub name: String,
    pub user_id: ids::UserId,
    pub public: bool,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub deleted: bool,
}

impl FavoriteGroup {
    fn builtin(id: ids::FavoriteGroupId, name: &str, user_id: ids::UserId) -> Self {
        FavoriteGroup {
            id,
            name: name.to_owned(),
            user_id,
            public: false,
            created: DateTime::<Utc>::default(),
            updated: DateTime::<Utc>::default(),
            deleted: false,
        }
    }

    pub fn default_of(user_id: ids::UserId) -> Self {
        Self::builtin(DEFAULT_GROUP_ID, "default", user_id)
    }

    pub fn recycle_bin_of(user_id: ids::UserId) -> Self {
        Self::builtin(RECYCLE_BIN_ID, "recycle-bin", user_id)
    }

    pub fn is_builtin(&self) -> bool {
        self.id <= DEFAULT_GROUP_ID
    }
}

#[derive(Debug, Clone)]
pub struct NewFavoriteGroup {
    pub name: String,
    pub user_id: ids::UserId,
    pub public: bool,
}

/// a storage item placed in a favorite group. items of the built in groups
/// share a group id so they are always looked up along with the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FavoriteItem {
    pub id: ids::FavoriteItemId,
    pub group_id: ids::FavoriteGroupId,
    pub user_id: ids::UserId,
    pub identity: StorageIdentity,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub deleted: bool,
}

#[derive(Debug, Clone)]
pub struct NewFavoriteItem {
    pub group_id: ids::FavoriteGroupId,
    pub user_id: ids::UserId,
    pub identity: StorageIdentity,
}

pub trait FavoriteRepository: Send + Sync {
    /// includes deleted groups
    fn find_group(&self, id: ids::FavoriteGroupId) -> BoxFuture<'_, api::Result<Option<FavoriteGroup>>>;

    /// live groups only
    fn find_group_by_name<'a>(
        &'a self,
        user_id: ids::UserId,
        name: &'a str
    ) -> BoxFuture<'a, api::Result<Option<FavoriteGroup>>>;

    /// live stored groups of the user ordered by id
    fn groups_of(&self, user_id: ids::UserId) -> BoxFuture<'_, api::Result<Vec<FavoriteGroup>>>;

    fn create_group(&self, group: NewFavoriteGroup) -> BoxFuture<'_, api::Result<FavoriteGroup>>;

    fn update_group<'a>(&'a self, group: &'a FavoriteGroup) -> BoxFuture<'a, api::Result<()>>;

    fn find_item(&self, id: ids::FavoriteItemId) -> BoxFuture<'_, api::Result<Option<FavoriteItem>>>;

    /// includes deleted items
    fn find_item_by(
        &self,
        group_id: ids::FavoriteGroupId,
        user_id: ids::UserId,
        identity: StorageIdentity,
    ) -> BoxFuture<'_, api::Result<Option<FavoriteItem>>>;

    /// live items ordered by id
    fn items_of(
        &self,
        group_id: ids::FavoriteGroupId,
        user_id: ids::UserId
    ) -> BoxFuture<'_, api::Result<Vec<FavoriteItem>>>;

    fn create_item(&self, item: NewFavoriteItem) -> BoxFuture<'_, api::Result<FavoriteItem>>;

    fn update_item<'a>(&'a self, item: &'a FavoriteItem) -> BoxFuture<'a, api::Result<()>>;
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn builtin_groups() {
        let default = FavoriteGroup::default_of(4);
        let bin = FavoriteGroup::recycle_bin_of(4);

        assert!(default.is_builtin());
        assert!(bin.is_builtin());
        assert_eq!(default.user_id, 4);
        assert_eq!(bin.name, "recycle-bin");
        assert!(disk_lib::favorites::RESERVED_NAMES.contains(&default.name.as_str()));
    }
}
