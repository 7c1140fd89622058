use std::sync::Arc;

use disk_lib::ids;
use futures::future::BoxFuture;

use crate::cache::{Cache, MokaCache};
use crate::error::api;
use crate::storage::StorageIdentity;

use super::{StoragePermission, StorageUserPermission, StoragePermissionRepository};

type UserKey = (StorageIdentity, ids::UserId);

/// read through cache in front of another repository. every write evicts
/// the keys it touches
pub struct CachedPermissionRepository {
    inner: Arc<dyn StoragePermissionRepository>,
    permissions: Arc<dyn Cache<StorageIdentity, StoragePermission>>,
    user: Arc<dyn Cache<UserKey, Option<StorageUserPermission>>>,
    users: Arc<dyn Cache<StorageIdentity, Vec<StorageUserPermission>>>,
}

impl CachedPermissionRepository {
    pub fn new(inner: Arc<dyn StoragePermissionRepository>, capacity: u64) -> Self {
        CachedPermissionRepository {
            inner,
            permissions: Arc::new(MokaCache::new("storage_permissions", capacity)),
            user: Arc::new(MokaCache::new("storage_user_permission", capacity)),
            users: Arc::new(MokaCache::new("storage_user_permissions", capacity)),
        }
    }

    fn evict_user(&self, identity: StorageIdentity, user_id: ids::UserId) {
        self.user.evict(&(identity, user_id));
        self.users.evict(&identity);
    }
}

impl StoragePermissionRepository for CachedPermissionRepository {
    fn find(&self, identity: StorageIdentity) -> BoxFuture<'_, api::Result<Option<StoragePermission>>> {
        Box::pin(async move {
            if let Some(found) = self.permissions.get(&identity) {
                return Ok(Some(found));
            }

            let result = self.inner.find(identity).await?;

            if let Some(found) = &result {
                self.permissions.put(identity, found.clone());
            }

            Ok(result)
        })
    }

    fn create(&self, permission: StoragePermission) -> BoxFuture<'_, api::Result<StoragePermission>> {
        Box::pin(async move {
            let identity = permission.identity;

            self.permissions.evict(&identity);

            let stored = self.inner.create(permission).await?;

            self.permissions.evict(&identity);

            Ok(stored)
        })
    }

    fn update<'a>(&'a self, permission: &'a StoragePermission) -> BoxFuture<'a, api::Result<()>> {
        Box::pin(async move {
            let result = self.inner.update(permission).await;

            self.permissions.evict(&permission.identity);

            result
        })
    }

    fn find_user(
        &self,
        identity: StorageIdentity,
        user_id: ids::UserId
    ) -> BoxFuture<'_, api::Result<Option<StorageUserPermission>>> {
        Box::pin(async move {
            let key = (identity, user_id);

            if let Some(found) = self.user.get(&key) {
                return Ok(found);
            }

            let result = self.inner.find_user(identity, user_id).await?;

            self.user.put(key, result.clone());

            Ok(result)
        })
    }

    fn users(&self, identity: StorageIdentity) -> BoxFuture<'_, api::Result<Vec<StorageUserPermission>>> {
        Box::pin(async move {
            if let Some(found) = self.users.get(&identity) {
                return Ok(found);
            }

            let result = self.inner.users(identity).await?;

            self.users.put(identity, result.clone());

            Ok(result)
        })
    }

    fn create_user(&self, permission: StorageUserPermission) -> BoxFuture<'_, api::Result<StorageUserPermission>> {
        Box::pin(async move {
            let identity = permission.identity;
            let user_id = permission.user_id;
            let result = self.inner.create_user(permission).await;

            self.evict_user(identity, user_id);

            result
        })
    }

    fn update_user<'a>(&'a self, permission: &'a StorageUserPermission) -> BoxFuture<'a, api::Result<()>> {
        Box::pin(async move {
            let result = self.inner.update_user(permission).await;

            self.evict_user(permission.identity, permission.user_id);

            result
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::permission::{PermissionType, PublicPermissionType};
    use crate::permission::memory::MemoryPermissionRepository;

    #[tokio::test]
    async fn writes_are_visible() {
        let repo = CachedPermissionRepository::new(Arc::new(MemoryPermissionRepository::new()), 100);
        let identity = StorageIdentity::file(1);

        assert_eq!(repo.find(identity).await.unwrap(), None);
        assert_eq!(repo.find_user(identity, 2).await.unwrap(), None);

        let mut permission = repo.create(StoragePermission::default_of(identity)).await.unwrap();

        assert_eq!(repo.find(identity).await.unwrap().as_ref(), Some(&permission));

        permission.public_permission = PublicPermissionType::PublicRead;
        repo.update(&permission).await.unwrap();

        assert_eq!(
            repo.find(identity).await.unwrap().map(|found| found.public_permission),
            Some(PublicPermissionType::PublicRead)
        );

        let grant = repo.create_user(StorageUserPermission::new(
            &permission,
            2,
            vec![PermissionType::Read]
        )).await.unwrap();

        assert_eq!(repo.find_user(identity, 2).await.unwrap(), Some(grant.clone()));
        assert_eq!(repo.users(identity).await.unwrap(), vec![grant.clone()]);

        let mut updated = grant.clone();
        updated.deleted = true;
        repo.update_user(&updated).await.unwrap();

        assert_eq!(repo.find_user(identity, 2).await.unwrap().map(|found| found.deleted), Some(true));
        assert!(repo.users(identity).await.unwrap()[0].deleted);
    }
}
