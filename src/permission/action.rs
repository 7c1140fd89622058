use chrono::Utc;
use disk_lib::ids;

use crate::error::api;
use crate::storage::UserStorage;

use super::{PermissionType, PublicPermissionType, StoragePermission, StorageUserPermission};
use super::service::StoragePermissionService;

/// modifies the permissions of a single storage item. created by
/// [`StoragePermissionService::action`]
pub struct StoragePermissionAction<'a> {
    service: &'a StoragePermissionService,
    storage: UserStorage,
    permission: StoragePermission,
}

impl<'a> StoragePermissionAction<'a> {
    pub(super) fn new(
        service: &'a StoragePermissionService,
        storage: UserStorage,
        permission: StoragePermission,
    ) -> Self {
        StoragePermissionAction {
            service,
            storage,
            permission,
        }
    }

    pub fn storage(&self) -> &UserStorage {
        &self.storage
    }

    pub fn permission(&self) -> &StoragePermission {
        &self.permission
    }

    async fn revive(&mut self) -> api::Result<()> {
        if !self.permission.deleted {
            return Ok(());
        }

        self.permission.deleted = false;
        self.permission.updated = Utc::now();

        self.service.permissions.update(&self.permission).await
    }

    pub async fn set_permission(&mut self, public_permission: PublicPermissionType) -> api::Result<()> {
        self.permission.public_permission = public_permission;
        self.permission.deleted = false;
        self.permission.updated = Utc::now();

        self.service.permissions.update(&self.permission).await?;

        tracing::debug!(
            "public permission of {} set to {}",
            self.storage.identity,
            public_permission.as_str()
        );

        Ok(())
    }

    pub async fn set_user_permission(
        &mut self,
        user_id: ids::UserId,
        permission_types: &[PermissionType],
    ) -> api::Result<StorageUserPermission> {
        let mut types = Vec::with_capacity(permission_types.len());

        for permission_type in permission_types {
            if !types.contains(permission_type) {
                types.push(*permission_type);
            }
        }

        if types.is_empty() {
            return Err(api::Error::api(api::PermissionKind::TypeEmpty));
        }

        if self.storage.owner.owner_id == user_id {
            return Err(api::Error::api((
                api::PermissionKind::NotAllowUser,
                "the owner of a storage item cannot be given permissions"
            )));
        }

        self.service.user_exists(user_id).await?;
        self.revive().await?;

        let identity = self.storage.identity;

        let stored = match self.service.permissions.find_user(identity, user_id).await? {
            Some(mut grant) => {
                grant.permission_types = types;
                grant.deleted = false;
                grant.updated = Utc::now();

                self.service.permissions.update_user(&grant).await?;

                grant
            }
            None => {
                self.service.permissions.create_user(
                    StorageUserPermission::new(&self.permission, user_id, types)
                ).await?
            }
        };

        tracing::debug!("user {} permissions for {} set to {:?}", user_id, identity, stored.permission_types);

        Ok(stored)
    }

    pub async fn remove_user_permission(&mut self, user_id: ids::UserId) -> api::Result<()> {
        let identity = self.storage.identity;

        let Some(mut grant) = self.service.permissions.find_user(identity, user_id).await? else {
            return Err(api::Error::api(api::PermissionKind::NotFound));
        };

        if grant.deleted {
            return Err(api::Error::api(api::PermissionKind::NotFound));
        }

        grant.deleted = true;
        grant.updated = Utc::now();

        self.service.permissions.update_user(&grant).await
    }

    /// resets the public permission and soft deletes the record along with
    /// every user grant
    pub async fn delete(mut self) -> api::Result<()> {
        let now = Utc::now();
        let identity = self.storage.identity;

        self.permission.public_permission = PublicPermissionType::Private;
        self.permission.deleted = true;
        self.permission.updated = now;

        self.service.permissions.update(&self.permission).await?;

        for mut grant in self.service.permissions.users(identity).await? {
            if grant.deleted {
                continue;
            }

            grant.deleted = true;
            grant.updated = now;

            self.service.permissions.update_user(&grant).await?;
        }

        tracing::debug!("permissions of {} deleted", identity);

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use crate::error::api;
    use crate::permission::{PermissionType, PublicPermissionType};
    use crate::permission::service::test::fixture;
    use crate::sec::Operator;
    use crate::storage::{NewStorage, OwnerType, StorageOwner, StorageRepository, StorageType};

    #[tokio::test]
    async fn group_owner_not_grantable() {
        let fixture = fixture().await;
        let shared = fixture.storages.create(NewStorage {
            storage_type: StorageType::Folder,
            name: "team".into(),
            owner: StorageOwner::new(fixture.other, OwnerType::Group),
            parent_id: None,
            file_type: None,
            size: 0,
        }).await.unwrap();

        let mut action = fixture.service.action(shared.identity).await.unwrap();

        let err = action.set_user_permission(fixture.other, &[PermissionType::Read]).await.unwrap_err();
        assert_eq!(err.api_kind(), &api::ApiErrorKind::Permission(api::PermissionKind::NotAllowUser));

        let dto = fixture.service.permission_of(shared.identity, &Operator::new(fixture.other), false)
            .await
            .unwrap();

        assert!(dto.allow_read());
        assert!(dto.allow_write());
    }

    #[tokio::test]
    async fn user_permission_rules() {
        let fixture = fixture().await;
        let mut action = fixture.service.action(fixture.file.identity).await.unwrap();

        let err = action.set_user_permission(fixture.other, &[]).await.unwrap_err();
        assert_eq!(err.api_kind(), &api::ApiErrorKind::Permission(api::PermissionKind::TypeEmpty));

        let err = action.set_user_permission(fixture.owner, &[PermissionType::Read]).await.unwrap_err();
        assert_eq!(err.api_kind(), &api::ApiErrorKind::Permission(api::PermissionKind::NotAllowUser));

        let err = action.set_user_permission(999, &[PermissionType::Read]).await.unwrap_err();
        assert_eq!(err.api_kind(), &api::ApiErrorKind::User(api::UserKind::NotFound));

        let grant = action.set_user_permission(
            fixture.other,
            &[PermissionType::Read, PermissionType::Read, PermissionType::Write]
        ).await.unwrap();

        assert_eq!(grant.permission_types, vec![PermissionType::Read, PermissionType::Write]);

        let updated = action.set_user_permission(fixture.other, &[PermissionType::Denied])
            .await
            .unwrap();

        assert_eq!(updated.id, grant.id);
        assert_eq!(updated.permission_types, vec![PermissionType::Denied]);
    }

    #[tokio::test]
    async fn remove_then_missing() {
        let fixture = fixture().await;
        let identity = fixture.file.identity;
        let other = Operator::new(fixture.other);

        let mut action = fixture.service.action(identity).await.unwrap();

        let err = action.remove_user_permission(fixture.other).await.unwrap_err();
        assert_eq!(err.api_kind(), &api::ApiErrorKind::Permission(api::PermissionKind::NotFound));

        action.set_user_permission(fixture.other, &[PermissionType::Read]).await.unwrap();

        assert!(fixture.service.permission_of(identity, &other, false).await.unwrap().allow_read());

        action.remove_user_permission(fixture.other).await.unwrap();

        assert!(!fixture.service.permission_of(identity, &other, false).await.unwrap().allow_read());

        let err = action.remove_user_permission(fixture.other).await.unwrap_err();
        assert_eq!(err.api_kind(), &api::ApiErrorKind::Permission(api::PermissionKind::NotFound));
    }

    #[tokio::test]
    async fn delete_resets_everything() {
        let fixture = fixture().await;
        let identity = fixture.file.identity;
        let other = Operator::new(fixture.other);

        let mut action = fixture.service.action(identity).await.unwrap();
        action.set_permission(PublicPermissionType::PublicReadWrite).await.unwrap();
        action.set_user_permission(fixture.other, &[PermissionType::Read]).await.unwrap();
        action.delete().await.unwrap();

        let dto = fixture.service.permission_of(identity, &other, false).await.unwrap();

        assert!(!dto.allow_read());
        assert!(!dto.allow_write());

        let info = fixture.service.permissions_info(identity, false).await.unwrap();

        assert_eq!(info.public_permission, PublicPermissionType::Private);
        assert!(info.user_permissions.is_empty());

        // setting the public permission again revives the record
        let mut action = fixture.service.action(identity).await.unwrap();
        action.set_permission(PublicPermissionType::PublicRead).await.unwrap();

        assert!(fixture.service.permission_of(identity, &other, false).await.unwrap().allow_read());
    }
}
