use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use dashmap::DashMap;
use disk_lib::ids;
use futures::future::BoxFuture;

use crate::error::api;

use super::{TagGroup, ContentTag, TagRepository};

#[derive(Debug, Default)]
pub struct MemoryTagRepository {
    group_seq: AtomicI64,
    tag_seq: AtomicI64,
    groups: DashMap<ids::TagGroupId, TagGroup>,
}

impl MemoryTagRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TagRepository for MemoryTagRepository {
    fn find_group(&self, id: ids::TagGroupId) -> BoxFuture<'_, api::Result<Option<TagGroup>>> {
        Box::pin(async move {
            Ok(self.groups.get(&id).map(|found| found.value().clone()))
        })
    }

    fn find_group_by_name<'a>(&'a self, name: &'a str) -> BoxFuture<'a, api::Result<Option<TagGroup>>> {
        Box::pin(async move {
            Ok(self.groups.iter()
                .find(|entry| entry.value().name == name)
                .map(|entry| entry.value().clone()))
        })
    }

    fn groups(&self) -> BoxFuture<'_, api::Result<Vec<TagGroup>>> {
        Box::pin(async move {
            let mut list: Vec<TagGroup> = self.groups.iter()
                .map(|entry| entry.value().clone())
                .collect();

            list.sort_by_key(|group| group.id);

            Ok(list)
        })
    }

    fn create_group(&self, name: String, description: String) -> BoxFuture<'_, api::Result<TagGroup>> {
        Box::pin(async move {
            if self.find_group_by_name(&name).await?.is_some() {
                return Err(api::Error::api(api::TagKind::GroupExisted));
            }

            let group = TagGroup {
                id: self.group_seq.fetch_add(1, Ordering::Relaxed) + 1,
                name,
                description,
                tags: Vec::new(),
                created: Utc::now(),
                updated: None,
            };

            self.groups.insert(group.id, group.clone());

            Ok(group)
        })
    }

    fn delete_group(&self, id: ids::TagGroupId) -> BoxFuture<'_, api::Result<Option<TagGroup>>> {
        Box::pin(async move {
            Ok(self.groups.remove(&id).map(|(_, group)| group))
        })
    }

    fn create_tag(&self, group_id: ids::TagGroupId, name: String) -> BoxFuture<'_, api::Result<ContentTag>> {
        Box::pin(async move {
            let Some(mut group) = self.groups.get_mut(&group_id) else {
                return Err(api::Error::api(api::TagKind::GroupNotFound));
            };

            if group.tag_by_name(&name).is_some() {
                return Err(api::Error::api(api::TagKind::TagExisted));
            }

            let now = Utc::now();
            let tag = ContentTag {
                id: self.tag_seq.fetch_add(1, Ordering::Relaxed) + 1,
                group_id,
                name,
                created: now,
            };

            group.tags.push(tag.clone());
            group.updated = Some(now);

            Ok(tag)
        })
    }

    fn delete_tag(&self, group_id: ids::TagGroupId, tag_id: ids::TagId) -> BoxFuture<'_, api::Result<bool>> {
        Box::pin(async move {
            let Some(mut group) = self.groups.get_mut(&group_id) else {
                return Ok(false);
            };

            let before = group.tags.len();

            group.tags.retain(|tag| tag.id != tag_id);

            if group.tags.len() == before {
                return Ok(false);
            }

            group.updated = Some(Utc::now());

            Ok(true)
        })
    }
}
