use std::fmt;
use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use futures::future::BoxFuture;

use crate::error::api;
use crate::operatelog::{NewOperationLog, OperationLogRepository};
use crate::permission::Action;
use crate::storage::{StorageIdentity, StorageType};

use super::Operator;

pub mod storage;
pub mod share;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SystemResourceKind {
    File,
    Folder,
    Link,
    StoragePermission,
    StorageShare,
    Tag,
    TagGroup,
    User,
    UserGroup,
    FavoriteGroup,
    FavoriteItem,
}

impl SystemResourceKind {
    pub fn from_str(given: &str) -> Option<Self> {
        let kind = match given.to_ascii_uppercase().as_str() {
            "FILE" => Self::File,
            "FOLDER" => Self::Folder,
            "LINK" => Self::Link,
            "STORAGE_PERMISSION" => Self::StoragePermission,
            "STORAGE_SHARE" => Self::StorageShare,
            "TAG" => Self::Tag,
            "TAG_GROUP" => Self::TagGroup,
            "USER" => Self::User,
            "USER_GROUP" => Self::UserGroup,
            "FAVORITE_GROUP" => Self::FavoriteGroup,
            "FAVORITE_ITEM" => Self::FavoriteItem,
            _ => return None,
        };

        Some(kind)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "FILE",
            Self::Folder => "FOLDER",
            Self::Link => "LINK",
            Self::StoragePermission => "STORAGE_PERMISSION",
            Self::StorageShare => "STORAGE_SHARE",
            Self::Tag => "TAG",
            Self::TagGroup => "TAG_GROUP",
            Self::User => "USER",
            Self::UserGroup => "USER_GROUP",
            Self::FavoriteGroup => "FAVORITE_GROUP",
            Self::FavoriteItem => "FAVORITE_ITEM",
        }
    }
}

impl fmt::Display for SystemResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<StorageType> for SystemResourceKind {
    fn from(storage_type: StorageType) -> Self {
        match storage_type {
            StorageType::File => Self::File,
            StorageType::Folder => Self::Folder,
            StorageType::Link => Self::Link,
        }
    }
}

/// anything in the system that can be guarded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SystemResource {
    pub id: i64,
    pub kind: SystemResourceKind,
}

impl SystemResource {
    pub fn new(id: i64, kind: SystemResourceKind) -> Self {
        SystemResource { id, kind }
    }

    pub fn storage_identity(&self) -> Option<StorageIdentity> {
        let storage_type = match self.kind {
            SystemResourceKind::File => StorageType::File,
            SystemResourceKind::Folder => StorageType::Folder,
            SystemResourceKind::Link => StorageType::Link,
            _ => return None,
        };

        Some(StorageIdentity::new(self.id, storage_type))
    }
}

impl From<StorageIdentity> for SystemResource {
    fn from(identity: StorageIdentity) -> Self {
        SystemResource::new(identity.storage_id, identity.storage_type.into())
    }
}

impl fmt::Display for SystemResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// result of checking an operator against a resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authentication {
    pub resource: SystemResource,
    pub operator: Operator,
    pub allow: bool,
}

impl Authentication {
    pub fn new(resource: SystemResource, operator: Operator, allow: bool) -> Self {
        Authentication {
            resource,
            operator,
            allow,
        }
    }

    pub fn into_result(self) -> api::Result<()> {
        if self.allow {
            Ok(())
        } else {
            Err(api::Error::api((
                api::AuthKind::PermissionDenied,
                format!("no permission to access {}", self.resource)
            )))
        }
    }
}

pub trait AuthenticationProvider: Send + Sync {
    fn supports(&self, kind: SystemResourceKind) -> bool;

    fn authenticate<'a>(
        &'a self,
        resource: &'a SystemResource,
        operator: &'a Operator,
        action: Action,
    ) -> BoxFuture<'a, api::Result<Authentication>>;
}

pub type ArcAuthenticationProvider = Arc<dyn AuthenticationProvider>;

/// allows every operator on every resource
#[derive(Debug, Default)]
pub struct AllowAll;

impl AuthenticationProvider for AllowAll {
    fn supports(&self, _kind: SystemResourceKind) -> bool {
        true
    }

    fn authenticate<'a>(
        &'a self,
        resource: &'a SystemResource,
        operator: &'a Operator,
        _action: Action,
    ) -> BoxFuture<'a, api::Result<Authentication>> {
        Box::pin(async move {
            Ok(Authentication::new(*resource, *operator, true))
        })
    }
}

/// picks the first provider that supports a resource kind, falling back to
/// the default provider
pub struct ResourceAuthenticator {
    providers: Vec<ArcAuthenticationProvider>,
    default: ArcAuthenticationProvider,
    log: Option<Arc<dyn OperationLogRepository>>,
}

impl ResourceAuthenticator {
    pub fn new(providers: Vec<ArcAuthenticationProvider>) -> Self {
        ResourceAuthenticator {
            providers,
            default: Arc::new(AllowAll),
            log: None,
        }
    }

    pub fn with_default(mut self, default: ArcAuthenticationProvider) -> Self {
        self.default = default;
        self
    }

    /// records guarded operations in the given repository
    pub fn with_log(mut self, log: Arc<dyn OperationLogRepository>) -> Self {
        self.log = Some(log);
        self
    }

    pub fn provider(&self, kind: SystemResourceKind) -> &dyn AuthenticationProvider {
        self.providers.iter()
            .find(|provider| provider.supports(kind))
            .unwrap_or(&self.default)
            .as_ref()
    }

    pub async fn authenticate(
        &self,
        resource: &SystemResource,
        operator: &Operator,
        action: Action,
    ) -> api::Result<Authentication> {
        self.provider(resource.kind)
            .authenticate(resource, operator, action)
            .await
    }

    /// runs `f` only when the operator is allowed to perform the action on
    /// the resource. writes are logged with their outcome, reads only when
    /// denied
    pub async fn guard<F, Fut, T>(
        &self,
        resource: &SystemResource,
        operator: &Operator,
        action: Action,
        f: F,
    ) -> api::Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = api::Result<T>>,
    {
        let authentication = self.authenticate(resource, operator, action).await?;

        if let Err(err) = authentication.into_result() {
            tracing::debug!(
                "operator {} denied {} on {}",
                operator.user_id,
                action.as_str(),
                resource
            );

            self.record(resource, operator, action, Some(&err)).await;

            return Err(err);
        }

        let result = f().await;

        if action.is_write() {
            self.record(resource, operator, action, result.as_ref().err()).await;
        }

        result
    }

    /// a failed write to the log does not fail the operation
    async fn record(
        &self,
        resource: &SystemResource,
        operator: &Operator,
        action: Action,
        error: Option<&api::Error>,
    ) {
        let Some(log) = self.log.as_ref() else {
            return;
        };

        let entry = NewOperationLog {
            operator: operator.user_id,
            resource: *resource,
            action,
            error_code: error.map(|err| err.api_kind().code().to_owned()),
            timestamp: Utc::now(),
        };

        if let Err(err) = log.record(entry).await {
            tracing::warn!("failed to log {} on {}: {}", action.as_str(), resource, err);
        }
    }
}

#[cfg(test)]
mod test {
    use disk_lib::query::Page;

    use super::*;
    use crate::operatelog::memory::MemoryOperationLogRepository;

    struct DenyFiles;

    impl AuthenticationProvider for DenyFiles {
        fn supports(&self, kind: SystemResourceKind) -> bool {
            kind == SystemResourceKind::File
        }

        fn authenticate<'a>(
            &'a self,
            resource: &'a SystemResource,
            operator: &'a Operator,
            _action: Action,
        ) -> BoxFuture<'a, api::Result<Authentication>> {
            Box::pin(async move {
                Ok(Authentication::new(*resource, *operator, false))
            })
        }
    }

    #[test]
    fn resource_kind_strings() {
        assert_eq!(SystemResourceKind::from_str("storage_share"), Some(SystemResourceKind::StorageShare));
        assert_eq!(SystemResourceKind::from_str("FOLDER"), Some(SystemResourceKind::Folder));
        assert_eq!(SystemResourceKind::from_str("space"), None);
    }

    #[tokio::test]
    async fn first_supporting_provider() {
        let authenticator = ResourceAuthenticator::new(vec![Arc::new(DenyFiles) as ArcAuthenticationProvider]);
        let operator = Operator::new(1);

        let file = SystemResource::from(StorageIdentity::file(1));
        let folder = SystemResource::from(StorageIdentity::folder(1));

        assert!(!authenticator.authenticate(&file, &operator, Action::Access).await.unwrap().allow);
        assert!(authenticator.authenticate(&folder, &operator, Action::Access).await.unwrap().allow);
    }

    #[tokio::test]
    async fn guard_skips_denied() {
        let authenticator = ResourceAuthenticator::new(vec![Arc::new(DenyFiles) as ArcAuthenticationProvider]);
        let operator = Operator::new(1);
        let file = SystemResource::from(StorageIdentity::file(1));

        let mut ran = false;

        let result = authenticator.guard(&file, &operator, Action::Edit, || {
            ran = true;

            async { Ok(()) }
        }).await;

        assert!(!ran);
        assert_eq!(
            result.unwrap_err().api_kind(),
            &api::ApiErrorKind::Auth(api::AuthKind::PermissionDenied)
        );

        let folder = SystemResource::from(StorageIdentity::folder(1));
        let value = authenticator.guard(&folder, &operator, Action::Edit, || async { Ok(5) })
            .await
            .unwrap();

        assert_eq!(value, 5);
    }

    #[tokio::test]
    async fn guard_logs_outcomes() {
        let log = Arc::new(MemoryOperationLogRepository::new());
        let authenticator = ResourceAuthenticator::new(vec![Arc::new(DenyFiles) as ArcAuthenticationProvider])
            .with_log(log.clone());
        let operator = Operator::new(3);
        let file = SystemResource::from(StorageIdentity::file(1));
        let folder = SystemResource::from(StorageIdentity::folder(2));

        authenticator.guard(&folder, &operator, Action::Rename, || async { Ok(()) })
            .await
            .unwrap();

        authenticator.guard(&folder, &operator, Action::Delete, || async {
            Err::<(), _>(api::Error::api(api::StorageKind::DirectoryAlreadyDeleted))
        })
            .await
            .unwrap_err();

        authenticator.guard(&folder, &operator, Action::Access, || async { Ok(()) })
            .await
            .unwrap();

        authenticator.guard(&file, &operator, Action::Access, || async { Ok(()) })
            .await
            .unwrap_err();

        let logs = log.by_operator(3, Page::default()).await.unwrap();
        let mut outcomes: Vec<(SystemResource, Action, Option<String>)> = logs.into_iter()
            .map(|log| (log.resource, log.action, log.error_code))
            .collect();

        outcomes.sort_by_key(|(resource, action, _)| (resource.id, action.as_str()));

        assert_eq!(outcomes, vec![
            (file, Action::Access, Some(String::from("A0101"))),
            (folder, Action::Delete, Some(String::from("B3163"))),
            (folder, Action::Rename, None),
        ]);

        assert_eq!(log.by_resource(folder, Page::default()).await.unwrap().len(), 2);
        assert!(log.by_operator(4, Page::default()).await.unwrap().is_empty());
    }
}
