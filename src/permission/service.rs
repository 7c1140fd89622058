use std::sync::Arc;

use disk_lib::ids;

use crate::error::api;
use crate::sec::Operator;
use crate::storage::{self, StorageIdentity, StorageOwner, StorageRepository, UserStorage};
use crate::user::UserRepository;

use super::{
    Action,
    PublicPermissionType,
    StoragePermission,
    StorageUserPermission,
    StoragePermissionRepository,
};
use super::evaluator::StoragePermissionDto;
use super::action::StoragePermissionAction;

/// the public permission of a storage item and every live user grant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePermissionsInfo {
    pub identity: StorageIdentity,
    pub owner: StorageOwner,
    pub public_permission: PublicPermissionType,
    pub user_permissions: Vec<StorageUserPermission>,
}

pub struct StoragePermissionService {
    pub(super) storages: Arc<dyn StorageRepository>,
    pub(super) users: Arc<dyn UserRepository>,
    pub(super) permissions: Arc<dyn StoragePermissionRepository>,
}

impl StoragePermissionService {
    pub fn new(
        storages: Arc<dyn StorageRepository>,
        users: Arc<dyn UserRepository>,
        permissions: Arc<dyn StoragePermissionRepository>,
    ) -> Self {
        StoragePermissionService {
            storages,
            users,
            permissions,
        }
    }

    /// retrieves the storage item. deleted items are an error unless
    /// `ignore_deleted` is set
    pub(super) async fn storage(
        &self,
        identity: StorageIdentity,
        ignore_deleted: bool
    ) -> api::Result<UserStorage> {
        let Some(storage) = self.storages.find(identity).await? else {
            return Err(storage::not_exist(&identity));
        };

        if storage.deleted && !ignore_deleted {
            return Err(storage::already_deleted(&identity));
        }

        Ok(storage)
    }

    /// retrieves the permission record, storing the default one when none
    /// exists yet
    pub(super) async fn ensure_permission(&self, identity: StorageIdentity) -> api::Result<StoragePermission> {
        if let Some(found) = self.permissions.find(identity).await? {
            return Ok(found);
        }

        tracing::debug!("creating default permission for {}", identity);

        self.permissions.create(StoragePermission::default_of(identity)).await
    }

    pub async fn permission_of(
        &self,
        identity: StorageIdentity,
        operator: &Operator,
        ignore_deleted: bool,
    ) -> api::Result<StoragePermissionDto> {
        let storage = self.storage(identity, ignore_deleted).await?;
        let permission = self.ensure_permission(identity).await?;

        let public_permission = if permission.deleted {
            PublicPermissionType::Private
        } else {
            permission.public_permission
        };

        let granted = if permission.deleted {
            Vec::new()
        } else {
            match self.permissions.find_user(identity, operator.user_id).await? {
                Some(grant) if !grant.deleted => grant.permission_types,
                _ => Vec::new(),
            }
        };

        Ok(StoragePermissionDto::of(
            &storage,
            operator.user_id,
            granted,
            Some(public_permission)
        ))
    }

    pub async fn check_permission_of(
        &self,
        identity: StorageIdentity,
        operator: &Operator,
        action: Action,
        ignore_deleted: bool,
    ) -> api::Result<bool> {
        let dto = self.permission_of(identity, operator, ignore_deleted).await?;

        if action.is_write() {
            Ok(dto.allow_write())
        } else {
            Ok(dto.allow_read())
        }
    }

    pub async fn check_permission_or_throws(
        &self,
        identity: StorageIdentity,
        operator: &Operator,
        action: Action,
        ignore_deleted: bool,
    ) -> api::Result<()> {
        if self.check_permission_of(identity, operator, action, ignore_deleted).await? {
            return Ok(());
        }

        tracing::debug!(
            "user {} not allowed to {} {}",
            operator.user_id,
            action.as_str(),
            identity
        );

        let kind = if action.is_write() {
            api::PermissionKind::NotAllowedToWrite
        } else {
            api::PermissionKind::NotAllowedToRead
        };

        Err(api::Error::api(kind))
    }

    pub async fn permissions_info(
        &self,
        identity: StorageIdentity,
        ignore_deleted: bool,
    ) -> api::Result<StoragePermissionsInfo> {
        let storage = self.storage(identity, ignore_deleted).await?;
        let permission = self.ensure_permission(identity).await?;

        if permission.deleted {
            return Ok(StoragePermissionsInfo {
                identity,
                owner: storage.owner,
                public_permission: PublicPermissionType::Private,
                user_permissions: Vec::new(),
            });
        }

        let user_permissions = self.permissions.users(identity)
            .await?
            .into_iter()
            .filter(|grant| !grant.deleted)
            .collect();

        Ok(StoragePermissionsInfo {
            identity,
            owner: storage.owner,
            public_permission: permission.public_permission,
            user_permissions,
        })
    }

    /// same as [`permissions_info`](Self::permissions_info) but the storage
    /// item must belong to the given owner
    pub async fn permissions_info_owned(
        &self,
        identity: StorageIdentity,
        owner: &StorageOwner,
        ignore_deleted: bool,
    ) -> api::Result<StoragePermissionsInfo> {
        let info = self.permissions_info(identity, ignore_deleted).await?;

        if info.owner != *owner {
            return Err(storage::not_exist(&identity));
        }

        Ok(info)
    }

    /// modifications to the permissions of a live storage item
    pub async fn action(&self, identity: StorageIdentity) -> api::Result<StoragePermissionAction<'_>> {
        let storage = self.storage(identity, false).await?;
        let permission = self.ensure_permission(identity).await?;

        Ok(StoragePermissionAction::new(self, storage, permission))
    }

    pub(super) async fn user_exists(&self, user_id: ids::UserId) -> api::Result<()> {
        if self.users.find(user_id).await?.is_none() {
            return Err(api::Error::api((
                api::UserKind::NotFound,
                format!("user {user_id} does not exist")
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use crate::permission::PermissionType;
    use crate::permission::memory::MemoryPermissionRepository;
    use crate::storage::{NewStorage, StorageType, FileType};
    use crate::storage::memory::MemoryStorageRepository;
    use crate::user::memory::MemoryUserRepository;

    pub(crate) struct Fixture {
        pub service: StoragePermissionService,
        pub storages: Arc<MemoryStorageRepository>,
        pub owner: ids::UserId,
        pub other: ids::UserId,
        pub file: UserStorage,
    }

    pub(crate) async fn fixture() -> Fixture {
        let storages = Arc::new(MemoryStorageRepository::new());
        let users = Arc::new(MemoryUserRepository::new());
        let owner = users.create("owner").await.unwrap().id;
        let other = users.create("other").await.unwrap().id;

        let file = storages.create(NewStorage {
            storage_type: StorageType::File,
            name: "report.pdf".into(),
            owner: StorageOwner::user(owner),
            parent_id: None,
            file_type: Some(FileType::Document),
            size: 100,
        }).await.unwrap();

        let service = StoragePermissionService::new(
            storages.clone(),
            users,
            Arc::new(MemoryPermissionRepository::new()),
        );

        Fixture {
            service,
            storages,
            owner,
            other,
            file,
        }
    }

    #[tokio::test]
    async fn lazily_created_private() {
        let fixture = fixture().await;
        let identity = fixture.file.identity;

        assert!(fixture.service.permissions.find(identity).await.unwrap().is_none());

        let dto = fixture.service.permission_of(identity, &Operator::new(fixture.other), false)
            .await
            .unwrap();

        assert!(!dto.allow_read());
        assert!(!dto.allow_write());

        let stored = fixture.service.permissions.find(identity).await.unwrap().unwrap();

        assert_eq!(stored.public_permission, PublicPermissionType::Private);
    }

    #[tokio::test]
    async fn owner_checks() {
        let fixture = fixture().await;
        let owner = Operator::new(fixture.owner);

        for action in [Action::Access, Action::Delete, Action::Rename] {
            assert!(fixture.service.check_permission_of(fixture.file.identity, &owner, action, false)
                .await
                .unwrap());
        }
    }

    #[tokio::test]
    async fn throws_matching_kind() {
        let fixture = fixture().await;
        let other = Operator::new(fixture.other);

        let err = fixture.service.check_permission_or_throws(
            fixture.file.identity, &other, Action::Access, false
        ).await.unwrap_err();

        assert_eq!(err.api_kind(), &api::ApiErrorKind::Permission(api::PermissionKind::NotAllowedToRead));

        let err = fixture.service.check_permission_or_throws(
            fixture.file.identity, &other, Action::Move, false
        ).await.unwrap_err();

        assert_eq!(err.api_kind(), &api::ApiErrorKind::Permission(api::PermissionKind::NotAllowedToWrite));
    }

    #[tokio::test]
    async fn missing_and_deleted_storage() {
        let fixture = fixture().await;
        let other = Operator::new(fixture.other);

        let err = fixture.service.permission_of(StorageIdentity::file(404), &other, false)
            .await
            .unwrap_err();

        assert_eq!(err.api_kind(), &api::ApiErrorKind::Storage(api::StorageKind::FileNotExist));

        fixture.storages.set_deleted(fixture.file.identity, true).await.unwrap();

        let err = fixture.service.permission_of(fixture.file.identity, &other, false)
            .await
            .unwrap_err();

        assert_eq!(err.api_kind(), &api::ApiErrorKind::Storage(api::StorageKind::FileAlreadyDeleted));

        assert!(fixture.service.permission_of(fixture.file.identity, &other, true).await.is_ok());
    }

    #[tokio::test]
    async fn info_lists_live_grants() {
        let fixture = fixture().await;
        let identity = fixture.file.identity;

        {
            let mut action = fixture.service.action(identity).await.unwrap();

            action.set_permission(PublicPermissionType::PublicRead).await.unwrap();
            action.set_user_permission(fixture.other, &[PermissionType::Write]).await.unwrap();
        }

        let info = fixture.service.permissions_info(identity, false).await.unwrap();

        assert_eq!(info.public_permission, PublicPermissionType::PublicRead);
        assert_eq!(info.user_permissions.len(), 1);
        assert_eq!(info.user_permissions[0].permission_types, vec![PermissionType::Write]);

        let err = fixture.service.permissions_info_owned(
            identity,
            &StorageOwner::user(fixture.other),
            false
        ).await.unwrap_err();

        assert_eq!(err.api_kind(), &api::ApiErrorKind::Storage(api::StorageKind::FileNotExist));

        assert!(fixture.service.permissions_info_owned(
            identity,
            &StorageOwner::user(fixture.owner),
            false
        ).await.is_ok());
    }
}
