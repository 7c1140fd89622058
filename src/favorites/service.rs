use std::sync::Arc;

use chrono::Utc;
use disk_lib::ids;

use crate::error::api;
use crate::sec::Operator;
use crate::storage::{self, StorageIdentity, StorageRepository};

use super::{
    DEFAULT_GROUP_ID,
    RECYCLE_BIN_ID,
    FavoriteGroup,
    FavoriteItem,
    FavoriteRepository,
    NewFavoriteGroup,
    NewFavoriteItem,
};

fn not_found(id: ids::FavoriteGroupId) -> api::Error {
    api::Error::api((api::FavoriteKind::NotFound, format!("favorite group {id} not found")))
}

/// favorite groups of users and the storage items placed in them
pub struct FavoriteService {
    repo: Arc<dyn FavoriteRepository>,
    storages: Arc<dyn StorageRepository>,
}

impl FavoriteService {
    pub fn new(repo: Arc<dyn FavoriteRepository>, storages: Arc<dyn StorageRepository>) -> Self {
        FavoriteService { repo, storages }
    }

    /// the default group followed by the stored groups of the operator
    pub async fn groups(&self, operator: &Operator) -> api::Result<Vec<FavoriteGroup>> {
        let stored = self.repo.groups_of(operator.user_id).await?;
        let mut list = Vec::with_capacity(stored.len() + 1);

        list.push(FavoriteGroup::default_of(operator.user_id));
        list.extend(stored);

        Ok(list)
    }

    /// a group the operator owns or that was made public
    pub async fn group(&self, id: ids::FavoriteGroupId, operator: &Operator) -> api::Result<FavoriteGroup> {
        match id {
            DEFAULT_GROUP_ID => return Ok(FavoriteGroup::default_of(operator.user_id)),
            RECYCLE_BIN_ID => return Ok(FavoriteGroup::recycle_bin_of(operator.user_id)),
            _ => {}
        }

        let Some(group) = self.repo.find_group(id).await? else {
            return Err(not_found(id));
        };

        if group.deleted || (group.user_id != operator.user_id && !group.public) {
            return Err(not_found(id));
        }

        Ok(group)
    }

    async fn owned_group(&self, id: ids::FavoriteGroupId, operator: &Operator) -> api::Result<FavoriteGroup> {
        let group = self.group(id, operator).await?;

        if group.user_id != operator.user_id {
            return Err(api::Error::api((
                api::AuthKind::PermissionDenied,
                format!("favorite group {id} belongs to another user")
            )));
        }

        Ok(group)
    }

    async fn stored_group(&self, id: ids::FavoriteGroupId, operator: &Operator) -> api::Result<FavoriteGroup> {
        let group = self.owned_group(id, operator).await?;

        if group.is_builtin() {
            return Err(api::Error::api((
                api::FavoriteKind::FavoriteError,
                format!("favorite group \"{}\" cannot be changed", group.name)
            )));
        }

        Ok(group)
    }

    fn check_name(name: &str) -> api::Result<()> {
        if !disk_lib::favorites::group_name_valid(name) {
            return Err(api::Error::api((
                api::FavoriteKind::NameNonCompliance,
                format!("invalid favorite group name \"{name}\"")
            )));
        }

        Ok(())
    }

    pub async fn create_group(&self, name: &str, public: bool, operator: &Operator) -> api::Result<FavoriteGroup> {
        Self::check_name(name)?;

        let group = self.repo.create_group(NewFavoriteGroup {
            name: name.to_owned(),
            user_id: operator.user_id,
            public,
        }).await?;

        tracing::debug!("user {} created favorite group {}", operator.user_id, group.id);

        Ok(group)
    }

    pub async fn rename_group(
        &self,
        id: ids::FavoriteGroupId,
        name: &str,
        operator: &Operator
    ) -> api::Result<FavoriteGroup> {
        Self::check_name(name)?;

        let mut group = self.stored_group(id, operator).await?;

        if group.name == name {
            return Ok(group);
        }

        if self.repo.find_group_by_name(operator.user_id, name).await?.is_some() {
            return Err(api::Error::api(api::FavoriteKind::Existed));
        }

        group.name = name.to_owned();
        group.updated = Utc::now();

        self.repo.update_group(&group).await?;

        Ok(group)
    }

    pub async fn set_visibility(
        &self,
        id: ids::FavoriteGroupId,
        public: bool,
        operator: &Operator
    ) -> api::Result<FavoriteGroup> {
        let mut group = self.stored_group(id, operator).await?;

        group.public = public;
        group.updated = Utc::now();

        self.repo.update_group(&group).await?;

        Ok(group)
    }

    pub async fn delete_group(&self, id: ids::FavoriteGroupId, operator: &Operator) -> api::Result<()> {
        let mut group = self.stored_group(id, operator).await?;

        group.deleted = true;
        group.updated = Utc::now();

        self.repo.update_group(&group).await?;

        tracing::debug!("user {} deleted favorite group {}", operator.user_id, id);

        Ok(())
    }

    pub async fn items(&self, id: ids::FavoriteGroupId, operator: &Operator) -> api::Result<Vec<FavoriteItem>> {
        let group = self.group(id, operator).await?;

        self.repo.items_of(group.id, group.user_id).await
    }

    /// places a live storage item in the group, reviving a removed entry
    pub async fn add(
        &self,
        id: ids::FavoriteGroupId,
        identity: StorageIdentity,
        operator: &Operator
    ) -> api::Result<FavoriteItem> {
        let group = self.owned_group(id, operator).await?;

        let Some(found) = self.storages.find(identity).await? else {
            return Err(storage::not_exist(&identity));
        };

        if found.deleted {
            return Err(storage::already_deleted(&identity));
        }

        match self.repo.find_item_by(group.id, operator.user_id, identity).await? {
            Some(item) if !item.deleted => Err(api::Error::api(api::FavoriteKind::ItemExisted)),
            Some(mut item) => {
                item.deleted = false;
                item.updated = Utc::now();

                self.repo.update_item(&item).await?;

                Ok(item)
            }
            None => self.repo.create_item(NewFavoriteItem {
                group_id: group.id,
                user_id: operator.user_id,
                identity,
            }).await,
        }
    }

    /// removing an item that is not in the group does nothing
    pub async fn remove(
        &self,
        id: ids::FavoriteGroupId,
        identity: StorageIdentity,
        operator: &Operator
    ) -> api::Result<()> {
        let group = self.owned_group(id, operator).await?;

        if let Some(item) = self.repo.find_item_by(group.id, operator.user_id, identity).await? {
            self.mark_removed(item).await?;
        }

        Ok(())
    }

    pub async fn remove_item(&self, item_id: ids::FavoriteItemId, operator: &Operator) -> api::Result<()> {
        match self.repo.find_item(item_id).await? {
            Some(item) if item.user_id == operator.user_id => self.mark_removed(item).await,
            _ => Err(api::Error::api((
                api::FavoriteKind::NotFound,
                format!("favorite item {item_id} not found")
            ))),
        }
    }

    async fn mark_removed(&self, mut item: FavoriteItem) -> api::Result<()> {
        if item.deleted {
            return Ok(());
        }

        item.deleted = true;
        item.updated = Utc::now();

        self.repo.update_item(&item).await
    }
}
