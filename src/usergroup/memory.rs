use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use dashmap::DashMap;
use disk_lib::ids;
use disk_lib::query::Page;
use futures::future::BoxFuture;

use crate::error::api;
use crate::storage::StorageOwner;

use super::{NewUserGroup, UserGroup, UserGroupMember, UserGroupRepository};

#[derive(Debug, Default)]
pub struct MemoryUserGroupRepository {
    group_seq: AtomicI64,
    member_seq: AtomicI64,
    groups: DashMap<ids::UserGroupId, UserGroup>,
    members: DashMap<StorageOwner, UserGroupMember>,
}

impl MemoryUserGroupRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserGroupRepository for MemoryUserGroupRepository {
    fn find_group(&self, id: ids::UserGroupId) -> BoxFuture<'_, api::Result<Option<UserGroup>>> {
        Box::pin(async move {
            Ok(self.groups.get(&id).map(|found| found.value().clone()))
        })
    }

    fn find_group_by_name<'a>(&'a self, name: &'a str) -> BoxFuture<'a, api::Result<Option<UserGroup>>> {
        Box::pin(async move {
            Ok(self.groups.iter()
                .find(|entry| entry.value().name == name)
                .map(|entry| entry.value().clone()))
        })
    }

    fn groups(&self, page: Page) -> BoxFuture<'_, api::Result<Vec<UserGroup>>> {
        Box::pin(async move {
            let mut list: Vec<UserGroup> = self.groups.iter()
                .filter(|entry| !entry.value().deleted)
                .map(|entry| entry.value().clone())
                .collect();

            list.sort_by_key(|group| group.id);

            Ok(list.into_iter()
                .skip(page.limit.skip(page.offset))
                .take(page.limit.take())
                .collect())
        })
    }

    fn create_group(&self, group: NewUserGroup) -> BoxFuture<'_, api::Result<UserGroup>> {
        Box::pin(async move {
            if self.find_group_by_name(&group.name).await?.is_some() {
                return Err(api::Error::api(api::UserGroupKind::NameExisted));
            }

            let now = Utc::now();
            let record = UserGroup {
                id: self.group_seq.fetch_add(1, Ordering::Relaxed) + 1,
                name: group.name,
                description: group.description,
                settings: group.settings,
                created: now,
                updated: now,
                deleted: false,
            };

            self.groups.insert(record.id, record.clone());

            Ok(record)
        })
    }

    fn update_group<'a>(&'a self, group: &'a UserGroup) -> BoxFuture<'a, api::Result<()>> {
        Box::pin(async move {
            let Some(mut found) = self.groups.get_mut(&group.id) else {
                return Err(api::Error::api(api::UserGroupKind::NotFound));
            };

            *found = group.clone();

            Ok(())
        })
    }

    fn find_member(&self, member: StorageOwner) -> BoxFuture<'_, api::Result<Option<UserGroupMember>>> {
        Box::pin(async move {
            Ok(self.members.get(&member).map(|found| found.value().clone()))
        })
    }

    fn members_of(&self, group_id: ids::UserGroupId) -> BoxFuture<'_, api::Result<Vec<UserGroupMember>>> {
        Box::pin(async move {
            let mut list: Vec<UserGroupMember> = self.members.iter()
                .filter(|entry| entry.value().group_id == group_id && !entry.value().deleted)
                .map(|entry| entry.value().clone())
                .collect();

            list.sort_by_key(|member| member.id);

            Ok(list)
        })
    }

    fn create_member(
        &self,
        group_id: ids::UserGroupId,
        member: StorageOwner
    ) -> BoxFuture<'_, api::Result<UserGroupMember>> {
        Box::pin(async move {
            if self.members.contains_key(&member) {
                return Err(api::Error::api(api::UserGroupKind::MemberExisted));
            }

            let now = Utc::now();
            let record = UserGroupMember {
                id: self.member_seq.fetch_add(1, Ordering::Relaxed) + 1,
                group_id,
                member,
                created: now,
                updated: now,
                deleted: false,
            };

            self.members.insert(member, record.clone());

            Ok(record)
        })
    }

    fn update_member<'a>(&'a self, member: &'a UserGroupMember) -> BoxFuture<'a, api::Result<()>> {
        Box::pin(async move {
            let Some(mut found) = self.members.get_mut(&member.member) else {
                return Err(api::Error::api(api::UserGroupKind::MemberNotFound));
            };

            *found = member.clone();

            Ok(())
        })
    }
}
