use std::sync::Arc;

use chrono::{DateTime, Utc};
use disk_lib::ids;
use futures::future::BoxFuture;

use crate::error::api;

pub mod memory;
pub mod pg;
pub mod service;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentTag {
    pub id: ids::TagId,
    pub group_id: ids::TagGroupId,
    pub name: String,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagGroup {
    pub id: ids::TagGroupId,
    pub name: String,
    pub description: String,
    pub tags: Vec<ContentTag>,
    pub created: DateTime<Utc>,
    pub updated: Option<DateTime<Utc>>,
}

impl TagGroup {
    pub fn tag_by_name(&self, name: &str) -> Option<&ContentTag> {
        self.tags.iter().find(|tag| tag.name == name)
    }
}

pub trait TagRepository: Send + Sync {
    fn find_group(&self, id: ids::TagGroupId) -> BoxFuture<'_, api::Result<Option<TagGroup>>>;

    fn find_group_by_name<'a>(&'a self, name: &'a str) -> BoxFuture<'a, api::Result<Option<TagGroup>>>;

    fn groups(&self) -> BoxFuture<'_, api::Result<Vec<TagGroup>>>;

    fn create_group(&self, name: String, description: String) -> BoxFuture<'_, api::Result<TagGroup>>;

    /// returns the removed group if it existed
    fn delete_group(&self, id: ids::TagGroupId) -> BoxFuture<'_, api::Result<Option<TagGroup>>>;

    fn create_tag(&self, group_id: ids::TagGroupId, name: String) -> BoxFuture<'_, api::Result<ContentTag>>;

    /// true if the tag existed
    fn delete_tag(&self, group_id: ids::TagGroupId, tag_id: ids::TagId) -> BoxFuture<'_, api::Result<bool>>;
}

/// notified whenever the set of tag groups changes
pub trait TagEventListener: Send + Sync {
    fn group_created(&self, group: &TagGroup);

    fn group_deleted(&self, group: &TagGroup);
}

pub type ArcTagListener = Arc<dyn TagEventListener>;
