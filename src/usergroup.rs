use std::collections::HashMap;

use chrono::{DateTime, Utc};
use disk_lib::ids;
use disk_lib::query::Page;
use futures::future::BoxFuture;

use crate::error::api;
use crate::storage::StorageOwner;

pub mod memory;
pub mod pg;
pub mod service;

pub const DEFAULT_GROUP_ID: ids::UserGroupId = 0;

/// storage quota of the members in megabytes
pub const GROUP_QUOTA: &str = "group_quota";
pub const GROUP_FILE_NUM_LIMIT: &str = "group_file-number-limit";
pub const NO_LIMIT: &str = "-1";

pub type GroupSettings = HashMap<String, String>;

pub fn default_settings() -> GroupSettings {
    HashMap::from([
        (GROUP_QUOTA.to_owned(), String::from("10240")),
        (GROUP_FILE_NUM_LIMIT.to_owned(), NO_LIMIT.to_owned()),
    ])
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserGroup {
    pub id: ids::UserGroupId,
    pub name: String,
    pub description: String,
    pub settings: GroupSettings,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub deleted: bool,
}

impl UserGroup {
    /// the group of every owner that is not a member anywhere else
    pub fn default_group() -> Self {
        UserGroup {
            id: DEFAULT_GROUP_ID,
            name: disk_lib::usergroup::DEFAULT_NAME.to_owned(),
            description: String::from("default group"),
            settings: default_settings(),
            created: DateTime::<Utc>::default(),
            updated: DateTime::<Utc>::default(),
            deleted: false,
        }
    }

    pub fn setting(&self, key: &str) -> Option<&str> {
        self.settings.get(key).map(String::as_str)
    }

    /// `None` when the setting is missing, invalid or unlimited
    pub fn limit(&self, key: &str) -> Option<u64> {
        self.setting(key)?.parse::<i64>()
            .ok()
            .and_then(|value| u64::try_from(value).ok())
    }
}

#[derive(Debug, Clone)]
pub struct NewUserGroup {
    pub name: String,
    pub description: String,
    pub settings: GroupSettings,
}

/// an owner belongs to at most one group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserGroupMember {
    pub id: ids::UserGroupMemberId,
    pub group_id: ids::UserGroupId,
    pub member: StorageOwner,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub deleted: bool,
}

pub trait UserGroupRepository: Send + Sync {
    fn find_group(&self, id: ids::UserGroupId) -> BoxFuture<'_, api::Result<Option<UserGroup>>>;

    /// includes deleted groups
    fn find_group_by_name<'a>(&'a self, name: &'a str) -> BoxFuture<'a, api::Result<Option<UserGroup>>>;

    /// live groups ordered by id
    fn groups(&self, page: Page) -> BoxFuture<'_, api::Result<Vec<UserGroup>>>;

    fn create_group(&self, group: NewUserGroup) -> BoxFuture<'_, api::Result<UserGroup>>;

    fn update_group<'a>(&'a self, group: &'a UserGroup) -> BoxFuture<'a, api::Result<()>>;

    /// includes removed members
    fn find_member(&self, member: StorageOwner) -> BoxFuture<'_, api::Result<Option<UserGroupMember>>>;

    /// live members ordered by id
    fn members_of(&self, group_id: ids::UserGroupId) -> BoxFuture<'_, api::Result<Vec<UserGroupMember>>>;

    fn create_member(
        &self,
        group_id: ids::UserGroupId,
        member: StorageOwner
    ) -> BoxFuture<'_, api::Result<UserGroupMember>>;

    fn update_member<'a>(&'a self, member: &'a UserGroupMember) -> BoxFuture<'a, api::Result<()>>;
}
