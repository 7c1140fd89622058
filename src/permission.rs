use chrono::{DateTime, Utc};
use disk_lib::ids;
use futures::future::BoxFuture;

pub use disk_lib::sec::authz::permission::{
    PermissionType,
    PublicPermissionType,
    Action,
};

use crate::error::api;
use crate::storage::StorageIdentity;

pub mod evaluator;
pub mod memory;
pub mod pg;
pub mod cached;
pub mod service;
pub mod action;

/// the public permission of a storage item. a missing record is treated the
/// same as [`StoragePermission::default_of`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePermission {
    pub id: ids::PermissionId,
    pub identity: StorageIdentity,
    pub public_permission: PublicPermissionType,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub deleted: bool,
}

impl StoragePermission {
    /// a private permission that has not been stored yet
    pub fn default_of(identity: StorageIdentity) -> Self {
        let now = Utc::now();

        StoragePermission {
            id: 0,
            identity,
            public_permission: PublicPermissionType::Private,
            created: now,
            updated: now,
            deleted: false,
        }
    }
}

/// permissions granted to a single user for a storage item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageUserPermission {
    pub id: ids::UserPermissionId,
    pub permission_id: ids::PermissionId,
    pub identity: StorageIdentity,
    pub user_id: ids::UserId,
    pub permission_types: Vec<PermissionType>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub deleted: bool,
}

impl StorageUserPermission {
    pub fn new(
        permission: &StoragePermission,
        user_id: ids::UserId,
        permission_types: Vec<PermissionType>
    ) -> Self {
        let now = Utc::now();

        StorageUserPermission {
            id: 0,
            permission_id: permission.id,
            identity: permission.identity,
            user_id,
            permission_types,
            created: now,
            updated: now,
            deleted: false,
        }
    }
}

pub trait StoragePermissionRepository: Send + Sync {
    /// includes deleted records
    fn find(&self, identity: StorageIdentity) -> BoxFuture<'_, api::Result<Option<StoragePermission>>>;

    /// stores the record unless one already exists for the storage item,
    /// returning whichever record is stored
    fn create(&self, permission: StoragePermission) -> BoxFuture<'_, api::Result<StoragePermission>>;

    fn update<'a>(&'a self, permission: &'a StoragePermission) -> BoxFuture<'a, api::Result<()>>;

    /// includes deleted records
    fn find_user(
        &self,
        identity: StorageIdentity,
        user_id: ids::UserId
    ) -> BoxFuture<'_, api::Result<Option<StorageUserPermission>>>;

    /// includes deleted records
    fn users(&self, identity: StorageIdentity) -> BoxFuture<'_, api::Result<Vec<StorageUserPermission>>>;

    fn create_user(&self, permission: StorageUserPermission) -> BoxFuture<'_, api::Result<StorageUserPermission>>;

    fn update_user<'a>(&'a self, permission: &'a StorageUserPermission) -> BoxFuture<'a, api::Result<()>>;
}
