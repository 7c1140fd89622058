use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, Utc};
use disk_lib::ids;
use disk_lib::query::Page;
use disk_lib::share::{password_valid, CODE_SUFFIX_CHARS};
use rand::Rng;
use rand::distributions::Alphanumeric;

use crate::error::api;
use crate::sec::Operator;
use crate::storage::{self, StorageIdentity, StorageOwner, StorageRepository, StorageType, UserStorage};

use super::{NewShare, UserShare, ShareRepository};

const HASH_CHARS: usize = 8;

/// `<owner hash><name hash>_<random>`
pub fn share_code(storage: &UserStorage) -> String {
    let mut owner = blake3::Hasher::new();
    owner.update(&storage.owner.owner_id.to_be_bytes());
    owner.update(storage.owner.owner_type.as_str().as_bytes());

    let mut name = blake3::Hasher::new();
    name.update(storage.name.as_bytes());
    name.update(storage.storage_type().as_str().as_bytes());

    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(CODE_SUFFIX_CHARS)
        .map(char::from)
        .collect();

    let owner_hex = owner.finalize().to_hex();
    let name_hex = name.finalize().to_hex();

    format!(
        "{}{}_{}",
        &owner_hex[..HASH_CHARS],
        &name_hex[..HASH_CHARS],
        suffix
    )
}

/// errors if the share does not exist or has expired
pub fn check_status(share: Option<UserShare>) -> api::Result<UserShare> {
    let Some(share) = share else {
        return Err(api::Error::api(api::ShareKind::NotFound));
    };

    if share.is_expired(&Utc::now()) {
        return Err(api::Error::api(api::ShareKind::Expired));
    }

    Ok(share)
}

pub struct ShareService {
    shares: Arc<dyn ShareRepository>,
    storages: Arc<dyn StorageRepository>,
}

impl ShareService {
    pub fn new(shares: Arc<dyn ShareRepository>, storages: Arc<dyn StorageRepository>) -> Self {
        ShareService { shares, storages }
    }

    /// shares a live storage item of the owner. a missing or negative
    /// duration never expires, an empty password is the same as none
    pub async fn share(
        &self,
        identity: StorageIdentity,
        owner: &StorageOwner,
        duration: Option<Duration>,
        operator: &Operator,
        password: Option<&str>,
    ) -> api::Result<UserShare> {
        let password = match password {
            Some(given) if !given.is_empty() => {
                if !password_valid(given) {
                    return Err(api::Error::api(api::ShareKind::PasswordFormat));
                }

                Some(given.to_owned())
            }
            _ => None,
        };

        let storage = match self.storages.find(identity).await? {
            Some(found) if !found.deleted && found.owner == *owner => found,
            _ => return Err(api::Error::api(api::ShareKind::StorageNotFound)),
        };

        let now = Utc::now();
        let expire_time = match duration {
            Some(duration) if duration >= Duration::zero() => Some(now + duration),
            _ => None,
        };

        let share = self.shares.create(NewShare {
            share_code: share_code(&storage),
            identity,
            user_id: operator.user_id,
            password,
            expire_time,
        }).await?;

        tracing::info!("shared {} as {}", identity, share.share_code);

        Ok(share)
    }

    /// expires the share immediately
    pub async fn cancel(&self, id: ids::ShareId) -> api::Result<()> {
        let mut share = check_status(self.shares.find(id).await?)?;
        let now = Utc::now();

        share.expire_time = Some(now);
        share.updated = now;

        self.shares.update(&share).await?;

        tracing::info!("canceled share {}", share.share_code);

        Ok(())
    }

    pub async fn find_by_id(&self, id: ids::ShareId) -> api::Result<UserShare> {
        self.shares.find(id)
            .await?
            .ok_or_else(|| api::Error::api(api::ShareKind::NotFound))
    }

    pub async fn find_by_code(&self, code: &str) -> api::Result<UserShare> {
        self.shares.find_by_code(code)
            .await?
            .ok_or_else(|| api::Error::api(api::ShareKind::NotFound))
    }

    pub async fn find_by_user(&self, user_id: ids::UserId, page: Page) -> api::Result<Vec<UserShare>> {
        self.shares.by_user(user_id, page).await
    }

    /// checks the password of a password protected share
    pub async fn verify_password(&self, code: &str, given: Option<&str>) -> api::Result<UserShare> {
        let share = check_status(self.shares.find_by_code(code).await?)?;

        if let Some(password) = &share.password {
            if given != Some(password.as_str()) {
                return Err(api::Error::api(api::ShareKind::Password));
            }
        }

        Ok(share)
    }

    /// true if the storage item is the shared item or somewhere below a
    /// shared folder
    pub async fn has_storage(&self, id: ids::ShareId, identity: StorageIdentity) -> api::Result<bool> {
        let share = check_status(self.shares.find(id).await?)?;

        if share.identity == identity {
            return Ok(true);
        }

        let Some(storage) = self.storages.find(identity).await? else {
            return Err(storage::not_exist(&identity));
        };

        if storage.deleted {
            return Err(api::Error::api(api::ShareKind::StorageNotFound));
        }

        if share.identity.storage_type != StorageType::Folder {
            return Ok(false);
        }

        self.within(share.identity.storage_id, storage.parent_id).await
    }

    /// walks up from `parent_id` looking for `folder_id`
    async fn within(
        &self,
        folder_id: ids::StorageId,
        mut parent_id: Option<ids::StorageId>
    ) -> api::Result<bool> {
        let mut visited = HashSet::new();

        while let Some(current) = parent_id {
            if current == folder_id {
                return Ok(true);
            }

            if !visited.insert(current) {
                tracing::warn!("folder cycle found at {}", current);

                return Ok(false);
            }

            parent_id = match self.storages.find(StorageIdentity::folder(current)).await? {
                Some(folder) => folder.parent_id,
                None => None,
            };
        }

        Ok(false)
    }

    /// lists the contents of a share. `None` lists the shared item itself,
    /// otherwise a folder inside of a shared folder
    pub async fn structure(
        &self,
        id: ids::ShareId,
        parent_id: Option<ids::StorageId>
    ) -> api::Result<Vec<UserStorage>> {
        let share = check_status(self.shares.find(id).await?)?;

        let Some(parent_id) = parent_id else {
            return match self.storages.find(share.identity).await? {
                Some(storage) if !storage.deleted => Ok(vec![storage]),
                _ => Err(api::Error::api(api::ShareKind::StorageNotFound)),
            };
        };

        if share.identity.storage_type != StorageType::Folder {
            return Err(api::Error::api(api::ShareKind::NotFound));
        }

        let folder_identity = StorageIdentity::folder(parent_id);

        let folder = match self.storages.find(folder_identity).await? {
            Some(folder) if !folder.deleted => folder,
            _ => return Err(storage::not_exist(&folder_identity)),
        };

        if !self.within(share.identity.storage_id, Some(parent_id)).await? {
            return Err(api::Error::api(api::ShareKind::NotFound));
        }

        self.storages.children(folder.owner, Some(parent_id)).await
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::share::memory::MemoryShareRepository;
    use crate::storage::{NewStorage, FileType};
    use crate::storage::memory::MemoryStorageRepository;

    struct Setup {
        service: ShareService,
        storages: Arc<MemoryStorageRepository>,
        owner: StorageOwner,
        operator: Operator,
    }

    fn setup() -> Setup {
        let storages = Arc::new(MemoryStorageRepository::new());

        Setup {
            service: ShareService::new(Arc::new(MemoryShareRepository::new()), storages.clone()),
            storages,
            owner: StorageOwner::user(1),
            operator: Operator::new(1),
        }
    }

    async fn create(
        setup: &Setup,
        storage_type: StorageType,
        name: &str,
        parent_id: Option<ids::StorageId>
    ) -> UserStorage {
        setup.storages.create(NewStorage {
            storage_type,
            name: name.into(),
            owner: setup.owner,
            parent_id,
            file_type: storage_type.is_file().then_some(FileType::Other),
            size: 0,
        }).await.unwrap()
    }

    #[tokio::test]
    async fn code_format() {
        let setup = setup();
        let file = create(&setup, StorageType::File, "a.txt", None).await;

        let code = share_code(&file);
        let (hashes, suffix) = code.split_once('_').unwrap();

        assert_eq!(hashes.len(), HASH_CHARS * 2);
        assert_eq!(suffix.len(), CODE_SUFFIX_CHARS);
        assert!(suffix.chars().all(|ch| ch.is_ascii_alphanumeric()));
        assert_ne!(share_code(&file), code);
    }

    #[tokio::test]
    async fn password_rules() {
        let setup = setup();
        let file = create(&setup, StorageType::File, "a.txt", None).await;

        let err = setup.service.share(file.identity, &setup.owner, None, &setup.operator, Some("12345"))
            .await
            .unwrap_err();

        assert_eq!(err.api_kind(), &api::ApiErrorKind::Share(api::ShareKind::PasswordFormat));

        let open = setup.service.share(file.identity, &setup.owner, None, &setup.operator, Some(""))
            .await
            .unwrap();

        assert!(!open.has_password());
        assert!(setup.service.verify_password(&open.share_code, None).await.is_ok());

        let locked = setup.service.share(file.identity, &setup.owner, None, &setup.operator, Some("abc123"))
            .await
            .unwrap();

        let err = setup.service.verify_password(&locked.share_code, Some("abc124")).await.unwrap_err();

        assert_eq!(err.api_kind(), &api::ApiErrorKind::Share(api::ShareKind::Password));
        assert!(setup.service.verify_password(&locked.share_code, Some("abc123")).await.is_ok());
    }

    #[tokio::test]
    async fn missing_or_foreign_storage() {
        let setup = setup();
        let file = create(&setup, StorageType::File, "a.txt", None).await;

        let err = setup.service.share(file.identity, &StorageOwner::user(2), None, &setup.operator, None)
            .await
            .unwrap_err();

        assert_eq!(err.api_kind(), &api::ApiErrorKind::Share(api::ShareKind::StorageNotFound));

        setup.storages.set_deleted(file.identity, true).await.unwrap();

        let err = setup.service.share(file.identity, &setup.owner, None, &setup.operator, None)
            .await
            .unwrap_err();

        assert_eq!(err.api_kind(), &api::ApiErrorKind::Share(api::ShareKind::StorageNotFound));
    }

    #[tokio::test]
    async fn cancel_expires() {
        let setup = setup();
        let file = create(&setup, StorageType::File, "a.txt", None).await;
        let share = setup.service.share(
            file.identity,
            &setup.owner,
            Some(Duration::days(1)),
            &setup.operator,
            None
        ).await.unwrap();

        assert!(setup.service.has_storage(share.id, file.identity).await.unwrap());

        setup.service.cancel(share.id).await.unwrap();

        let err = setup.service.has_storage(share.id, file.identity).await.unwrap_err();

        assert_eq!(err.api_kind(), &api::ApiErrorKind::Share(api::ShareKind::Expired));

        let err = setup.service.cancel(404).await.unwrap_err();

        assert_eq!(err.api_kind(), &api::ApiErrorKind::Share(api::ShareKind::NotFound));
    }

    #[tokio::test]
    async fn nested_storage() {
        let setup = setup();
        let root = create(&setup, StorageType::Folder, "root", None).await;
        let inner = create(&setup, StorageType::Folder, "inner", Some(root.storage_id())).await;
        let deep = create(&setup, StorageType::File, "deep.txt", Some(inner.storage_id())).await;
        let outside = create(&setup, StorageType::File, "outside.txt", None).await;

        let share = setup.service.share(root.identity, &setup.owner, None, &setup.operator, None)
            .await
            .unwrap();

        assert!(setup.service.has_storage(share.id, deep.identity).await.unwrap());
        assert!(!setup.service.has_storage(share.id, outside.identity).await.unwrap());

        let listed = setup.service.structure(share.id, None).await.unwrap();
        assert_eq!(listed, vec![root.clone()]);

        let listed = setup.service.structure(share.id, Some(inner.storage_id())).await.unwrap();
        assert_eq!(listed, vec![deep]);

        let other = create(&setup, StorageType::Folder, "other", None).await;
        let err = setup.service.structure(share.id, Some(other.storage_id())).await.unwrap_err();

        assert_eq!(err.api_kind(), &api::ApiErrorKind::Share(api::ShareKind::NotFound));
    }

    #[tokio::test]
    async fn user_pages() {
        let setup = setup();
        let file = create(&setup, StorageType::File, "a.txt", None).await;

        for _ in 0..3 {
            setup.service.share(file.identity, &setup.owner, None, &setup.operator, None)
                .await
                .unwrap();
        }

        let found = setup.service.find_by_user(1, Page::default()).await.unwrap();

        assert_eq!(found.len(), 3);
        assert!(found[0].id > found[2].id);
        assert!(setup.service.find_by_user(2, Page::default()).await.unwrap().is_empty());
    }
}
