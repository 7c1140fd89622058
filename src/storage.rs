use chrono::{DateTime, Utc};
use disk_lib::ids;
use disk_lib::search::{TimeRange, SizeFilter};
use futures::future::BoxFuture;

pub use disk_lib::storage::{
    StorageType,
    StorageIdentity,
    OwnerType,
    StorageOwner,
    FileType,
};

use crate::error::api;

pub mod memory;
pub mod pg;
pub mod service;

/// a tag assigned to a storage item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StorageTag {
    pub group_id: ids::TagGroupId,
    pub tag_id: ids::TagId,
}

/// a storage item with its attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserStorage {
    pub identity: StorageIdentity,
    pub name: String,
    pub owner: StorageOwner,
    pub parent_id: Option<ids::StorageId>,
    pub file_type: Option<FileType>,
    pub size: u64,
    pub tags: Vec<StorageTag>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub deleted: bool,
}

impl UserStorage {
    pub fn storage_id(&self) -> ids::StorageId {
        self.identity.storage_id
    }

    pub fn storage_type(&self) -> StorageType {
        self.identity.storage_type
    }
}

/// values for a storage item that has not been stored yet
#[derive(Debug, Clone)]
pub struct NewStorage {
    pub storage_type: StorageType,
    pub name: String,
    pub owner: StorageOwner,
    pub parent_id: Option<ids::StorageId>,
    pub file_type: Option<FileType>,
    pub size: u64,
}

/// filters applied when listing the storage items of an owner. deleted
/// items are never included
#[derive(Debug, Clone)]
pub struct StorageQuery {
    pub owner: StorageOwner,
    pub name: Option<String>,
    pub storage_type: Option<StorageType>,
    pub file_type: Option<FileType>,
    pub created: Option<TimeRange>,
    pub updated: Option<TimeRange>,
    pub size: Option<SizeFilter>,
    pub tags: Vec<StorageTag>,
}

impl StorageQuery {
    pub fn owned_by(owner: StorageOwner) -> Self {
        StorageQuery {
            owner,
            name: None,
            storage_type: None,
            file_type: None,
            created: None,
            updated: None,
            size: None,
            tags: Vec::new(),
        }
    }

    pub fn matches(&self, storage: &UserStorage) -> bool {
        if storage.deleted || storage.owner != self.owner {
            return false;
        }

        if let Some(name) = &self.name {
            if !storage.name.to_lowercase().contains(&name.to_lowercase()) {
                return false;
            }
        }

        if let Some(storage_type) = &self.storage_type {
            if storage.storage_type() != *storage_type {
                return false;
            }
        }

        if let Some(file_type) = &self.file_type {
            if storage.file_type.as_ref() != Some(file_type) {
                return false;
            }
        }

        if let Some(range) = &self.created {
            if !range.contains(&storage.created) {
                return false;
            }
        }

        if let Some(range) = &self.updated {
            if !range.contains(&storage.updated) {
                return false;
            }
        }

        if let Some(size) = &self.size {
            if !storage.storage_type().is_file() || !size.matches(storage.size) {
                return false;
            }
        }

        self.tags.iter().all(|tag| storage.tags.contains(tag))
    }
}

/// aggregate counts of all live storage items
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StorageTotals {
    pub files: u64,
    pub folders: u64,
    pub links: u64,
    pub bytes: u64,
}

pub trait StorageRepository: Send + Sync {
    /// includes deleted items
    fn find(&self, identity: StorageIdentity) -> BoxFuture<'_, api::Result<Option<UserStorage>>>;

    fn query<'a>(&'a self, query: &'a StorageQuery) -> BoxFuture<'a, api::Result<Vec<UserStorage>>>;

    /// live children of a folder, `None` being the root of the owner
    fn children(
        &self,
        owner: StorageOwner,
        parent_id: Option<ids::StorageId>
    ) -> BoxFuture<'_, api::Result<Vec<UserStorage>>>;

    fn create(&self, storage: NewStorage) -> BoxFuture<'_, api::Result<UserStorage>>;

    fn set_deleted(&self, identity: StorageIdentity, deleted: bool) -> BoxFuture<'_, api::Result<()>>;

    fn set_tags(&self, identity: StorageIdentity, tags: Vec<StorageTag>) -> BoxFuture<'_, api::Result<()>>;

    fn totals(&self) -> BoxFuture<'_, api::Result<StorageTotals>>;
}

/// error returned when a storage item is missing
pub fn not_exist(identity: &StorageIdentity) -> api::Error {
    let kind = match identity.storage_type {
        StorageType::Folder => api::StorageKind::DirectoryNotExist,
        StorageType::File |
        StorageType::Link => api::StorageKind::FileNotExist,
    };

    api::Error::api((kind, format!("storage {} does not exist", identity)))
}

/// error returned when a storage item has been deleted
pub fn already_deleted(identity: &StorageIdentity) -> api::Error {
    let kind = match identity.storage_type {
        StorageType::Folder => api::StorageKind::DirectoryAlreadyDeleted,
        StorageType::File |
        StorageType::Link => api::StorageKind::FileAlreadyDeleted,
    };

    api::Error::api((kind, format!("storage {} is deleted", identity)))
}
