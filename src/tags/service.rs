use std::sync::Arc;

use disk_lib::ids;

use crate::error::api;
use crate::storage::StorageTag;

use super::{TagGroup, ContentTag, TagRepository, ArcTagListener};

/// manages tag groups and tells listeners when groups come and go
pub struct TagService {
    repo: Arc<dyn TagRepository>,
    listeners: Vec<ArcTagListener>,
}

impl TagService {
    pub fn new(repo: Arc<dyn TagRepository>, listeners: Vec<ArcTagListener>) -> Self {
        TagService { repo, listeners }
    }

    pub async fn groups(&self) -> api::Result<Vec<TagGroup>> {
        self.repo.groups().await
    }

    pub async fn group(&self, id: ids::TagGroupId) -> api::Result<TagGroup> {
        self.repo.find_group(id)
            .await?
            .ok_or_else(|| api::Error::api(api::TagKind::GroupNotFound))
    }

    pub async fn create_group(&self, name: &str, description: &str) -> api::Result<TagGroup> {
        if !disk_lib::tags::group_name_valid(name) {
            return Err(api::Error::api((
                api::TagKind::InvalidName,
                format!("invalid tag group name \"{name}\"")
            )));
        }

        if !disk_lib::tags::description_valid(description) {
            return Err(api::Error::api((
                api::TagKind::InvalidName,
                "invalid tag group description"
            )));
        }

        let group = self.repo.create_group(name.to_owned(), description.to_owned()).await?;

        tracing::debug!("created tag group {} \"{}\"", group.id, group.name);

        for listener in &self.listeners {
            listener.group_created(&group);
        }

        Ok(group)
    }

    pub async fn delete_group(&self, id: ids::TagGroupId) -> api::Result<()> {
        let Some(group) = self.repo.delete_group(id).await? else {
            return Err(api::Error::api(api::TagKind::GroupNotFound));
        };

        tracing::debug!("deleted tag group {} \"{}\"", group.id, group.name);

        for listener in &self.listeners {
            listener.group_deleted(&group);
        }

        Ok(())
    }

    pub async fn add_tag(&self, group_id: ids::TagGroupId, name: &str) -> api::Result<ContentTag> {
        if !disk_lib::tags::tag_name_valid(name) {
            return Err(api::Error::api((
                api::TagKind::InvalidName,
                format!("invalid tag name \"{name}\"")
            )));
        }

        self.repo.create_tag(group_id, name.to_owned()).await
    }

    pub async fn remove_tag(&self, group_id: ids::TagGroupId, tag_id: ids::TagId) -> api::Result<()> {
        if !self.repo.delete_tag(group_id, tag_id).await? {
            return Err(api::Error::api(api::TagKind::TagNotFound));
        }

        Ok(())
    }

    /// finds the tag with the given name inside the named group
    pub async fn resolve(&self, group_name: &str, tag_name: &str) -> api::Result<StorageTag> {
        let Some(group) = self.repo.find_group_by_name(group_name).await? else {
            return Err(api::Error::api((
                api::TagKind::GroupNotFound,
                format!("tag group \"{group_name}\" does not exist")
            )));
        };

        let Some(tag) = group.tag_by_name(tag_name) else {
            return Err(api::Error::api((
                api::TagKind::TagNotFound,
                format!("tag \"{tag_name}\" does not exist in \"{group_name}\"")
            )));
        };

        Ok(StorageTag {
            group_id: group.id,
            tag_id: tag.id,
        })
    }
}
