use std::sync::atomic::{AtomicI64, Ordering};

use dashmap::DashMap;
use disk_lib::ids;
use futures::future::BoxFuture;

use crate::error::api;
use crate::storage::StorageIdentity;

use super::{StoragePermission, StorageUserPermission, StoragePermissionRepository};

#[derive(Debug, Default)]
pub struct MemoryPermissionRepository {
    permission_seq: AtomicI64,
    user_seq: AtomicI64,
    permissions: DashMap<StorageIdentity, StoragePermission>,
    users: DashMap<(StorageIdentity, ids::UserId), StorageUserPermission>,
}

impl MemoryPermissionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StoragePermissionRepository for MemoryPermissionRepository {
    fn find(&self, identity: StorageIdentity) -> BoxFuture<'_, api::Result<Option<StoragePermission>>> {
        Box::pin(async move {
            Ok(self.permissions.get(&identity).map(|found| found.value().clone()))
        })
    }

    fn create(&self, mut permission: StoragePermission) -> BoxFuture<'_, api::Result<StoragePermission>> {
        Box::pin(async move {
            let entry = self.permissions.entry(permission.identity)
                .or_insert_with(|| {
                    permission.id = self.permission_seq.fetch_add(1, Ordering::Relaxed) + 1;
                    permission
                });

            Ok(entry.value().clone())
        })
    }

    fn update<'a>(&'a self, permission: &'a StoragePermission) -> BoxFuture<'a, api::Result<()>> {
        Box::pin(async move {
            let Some(mut found) = self.permissions.get_mut(&permission.identity) else {
                return Err(api::Error::api(api::PermissionKind::NotFound));
            };

            *found = permission.clone();

            Ok(())
        })
    }

    fn find_user(
        &self,
        identity: StorageIdentity,
        user_id: ids::UserId
    ) -> BoxFuture<'_, api::Result<Option<StorageUserPermission>>> {
        Box::pin(async move {
            Ok(self.users.get(&(identity, user_id)).map(|found| found.value().clone()))
        })
    }

    fn users(&self, identity: StorageIdentity) -> BoxFuture<'_, api::Result<Vec<StorageUserPermission>>> {
        Box::pin(async move {
            let mut list: Vec<StorageUserPermission> = self.users.iter()
                .filter(|entry| entry.key().0 == identity)
                .map(|entry| entry.value().clone())
                .collect();

            list.sort_by_key(|permission| permission.id);

            Ok(list)
        })
    }

    fn create_user(&self, mut permission: StorageUserPermission) -> BoxFuture<'_, api::Result<StorageUserPermission>> {
        Box::pin(async move {
            let key = (permission.identity, permission.user_id);

            if self.users.contains_key(&key) {
                return Err(api::Error::api(api::PermissionKind::AlreadyExist));
            }

            permission.id = self.user_seq.fetch_add(1, Ordering::Relaxed) + 1;

            self.users.insert(key, permission.clone());

            Ok(permission)
        })
    }

    fn update_user<'a>(&'a self, permission: &'a StorageUserPermission) -> BoxFuture<'a, api::Result<()>> {
        Box::pin(async move {
            let key = (permission.identity, permission.user_id);
            let Some(mut found) = self.users.get_mut(&key) else {
                return Err(api::Error::api(api::PermissionKind::NotFound));
            };

            *found = permission.clone();

            Ok(())
        })
    }
}
