use std::sync::Arc;

use futures::future::BoxFuture;

use crate::error::api;
use crate::permission::Action;
use crate::permission::service::StoragePermissionService;
use crate::sec::Operator;

use super::{Authentication, AuthenticationProvider, SystemResource, SystemResourceKind};

/// checks files, folders and links against their stored permissions
pub struct StorageAuthenticationProvider {
    permissions: Arc<StoragePermissionService>,
}

impl StorageAuthenticationProvider {
    pub fn new(permissions: Arc<StoragePermissionService>) -> Self {
        StorageAuthenticationProvider { permissions }
    }
}

impl AuthenticationProvider for StorageAuthenticationProvider {
    fn supports(&self, kind: SystemResourceKind) -> bool {
        matches!(
            kind,
            SystemResourceKind::File |
            SystemResourceKind::Folder |
            SystemResourceKind::Link
        )
    }

    fn authenticate<'a>(
        &'a self,
        resource: &'a SystemResource,
        operator: &'a Operator,
        action: Action,
    ) -> BoxFuture<'a, api::Result<Authentication>> {
        Box::pin(async move {
            let Some(identity) = resource.storage_identity() else {
                return Err(api::Error::api((
                    api::AuthKind::PermissionDenied,
                    format!("{} is not a storage item", resource)
                )));
            };

            // deleted items can still be inspected or restored by the ones
            // allowed to
            let allow = self.permissions.check_permission_of(identity, operator, action, true).await?;

            Ok(Authentication::new(*resource, *operator, allow))
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::permission::{PermissionType, PublicPermissionType};
    use crate::permission::service::test::fixture;
    use crate::sec::authz::ResourceAuthenticator;
    use crate::storage::StorageRepository;

    #[tokio::test]
    async fn guards_with_stored_permissions() {
        let fixture = fixture().await;
        let identity = fixture.file.identity;
        let service = Arc::new(fixture.service);

        let authenticator = ResourceAuthenticator::new(vec![
            Arc::new(StorageAuthenticationProvider::new(service.clone()))
        ]);

        let resource = SystemResource::from(identity);
        let other = Operator::new(fixture.other);
        let owner = Operator::new(fixture.owner);

        assert!(authenticator.authenticate(&resource, &owner, Action::Delete).await.unwrap().allow);
        assert!(!authenticator.authenticate(&resource, &other, Action::Access).await.unwrap().allow);

        {
            let mut action = service.action(identity).await.unwrap();
            action.set_permission(PublicPermissionType::PublicRead).await.unwrap();
        }

        assert!(authenticator.authenticate(&resource, &other, Action::Access).await.unwrap().allow);
        assert!(!authenticator.authenticate(&resource, &other, Action::Edit).await.unwrap().allow);

        {
            let mut action = service.action(identity).await.unwrap();
            action.set_user_permission(fixture.other, &[PermissionType::Denied]).await.unwrap();
        }

        assert!(!authenticator.authenticate(&resource, &other, Action::Access).await.unwrap().allow);

        fixture.storages.set_deleted(identity, true).await.unwrap();

        assert!(authenticator.authenticate(&resource, &owner, Action::Access).await.unwrap().allow);
    }
}
