use std::sync::Arc;

use disk_lib::ids;

use crate::error::api;
use crate::tags::service::TagService;

use super::{
    UserStorage,
    NewStorage,
    StorageRepository,
    StorageIdentity,
    StorageOwner,
    StorageType,
    FileType,
    not_exist,
    already_deleted,
};

/// creates, deletes and tags storage items of an owner
pub struct StorageService {
    repo: Arc<dyn StorageRepository>,
    tags: Arc<TagService>,
}

impl StorageService {
    pub fn new(repo: Arc<dyn StorageRepository>, tags: Arc<TagService>) -> Self {
        StorageService { repo, tags }
    }

    /// retrieves a live storage item
    pub async fn get(&self, identity: StorageIdentity) -> api::Result<UserStorage> {
        let Some(storage) = self.repo.find(identity).await? else {
            return Err(not_exist(&identity));
        };

        if storage.deleted {
            return Err(already_deleted(&identity));
        }

        Ok(storage)
    }

    pub async fn children(
        &self,
        owner: StorageOwner,
        parent_id: Option<ids::StorageId>
    ) -> api::Result<Vec<UserStorage>> {
        if let Some(parent_id) = parent_id {
            self.check_parent(&owner, parent_id).await?;
        }

        self.repo.children(owner, parent_id).await
    }

    pub async fn create_folder(
        &self,
        owner: StorageOwner,
        parent_id: Option<ids::StorageId>,
        name: &str,
    ) -> api::Result<UserStorage> {
        self.create(NewStorage {
            storage_type: StorageType::Folder,
            name: name.to_owned(),
            owner,
            parent_id,
            file_type: None,
            size: 0,
        }).await
    }

    pub async fn create_file(
        &self,
        owner: StorageOwner,
        parent_id: Option<ids::StorageId>,
        name: &str,
        file_type: FileType,
        size: u64,
    ) -> api::Result<UserStorage> {
        self.create(NewStorage {
            storage_type: StorageType::File,
            name: name.to_owned(),
            owner,
            parent_id,
            file_type: Some(file_type),
            size,
        }).await
    }

    async fn create(&self, storage: NewStorage) -> api::Result<UserStorage> {
        check_name(&storage.name)?;

        if let Some(parent_id) = storage.parent_id {
            self.check_parent(&storage.owner, parent_id).await?;
        }

        let siblings = self.repo.children(storage.owner, storage.parent_id).await?;

        for sibling in siblings {
            if sibling.storage_type() == storage.storage_type && sibling.name == storage.name {
                let kind = match storage.storage_type {
                    StorageType::Folder => api::StorageKind::DirectoryExisted,
                    StorageType::File |
                    StorageType::Link => api::StorageKind::FileExisted,
                };

                return Err(api::Error::api((kind, format!("\"{}\" already exists", storage.name))));
            }
        }

        let created = self.repo.create(storage).await?;

        tracing::debug!("created storage {} owned by {}", created.identity, created.owner);

        Ok(created)
    }

    async fn check_parent(&self, owner: &StorageOwner, parent_id: ids::StorageId) -> api::Result<()> {
        let identity = StorageIdentity::folder(parent_id);
        let parent = self.get(identity).await?;

        if parent.owner != *owner {
            return Err(not_exist(&identity));
        }

        Ok(())
    }

    pub async fn delete(&self, identity: StorageIdentity) -> api::Result<()> {
        self.get(identity).await?;
        self.repo.set_deleted(identity, true).await
    }

    pub async fn restore(&self, identity: StorageIdentity) -> api::Result<()> {
        let Some(storage) = self.repo.find(identity).await? else {
            return Err(not_exist(&identity));
        };

        if !storage.deleted {
            return Err(api::Error::api((
                api::StorageKind::StorageError,
                format!("storage {} is not deleted", identity)
            )));
        }

        self.repo.set_deleted(identity, false).await
    }

    /// replaces the tags of a file with the given `(group, tag)` names
    pub async fn set_tags(
        &self,
        identity: StorageIdentity,
        tags: &[(String, String)]
    ) -> api::Result<()> {
        self.get(identity).await?;

        let mut resolved = Vec::with_capacity(tags.len());

        for (group, tag) in tags {
            let found = self.tags.resolve(group, tag).await?;

            if !resolved.contains(&found) {
                resolved.push(found);
            }
        }

        self.repo.set_tags(identity, resolved).await
    }
}

fn check_name(name: &str) -> api::Result<()> {
    if name.is_empty() {
        return Err(api::Error::api(api::StorageKind::NameEmpty));
    }

    if name.chars().count() > disk_lib::storage::MAX_NAME_CHARS {
        return Err(api::Error::api(api::StorageKind::NameTooLong));
    }

    if !disk_lib::storage::name_valid(name) || name.contains('/') || name.contains('\\') {
        return Err(api::Error::api(api::StorageKind::NameIllegal));
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::storage::memory::MemoryStorageRepository;
    use crate::tags::memory::MemoryTagRepository;

    fn service() -> (StorageService, Arc<TagService>) {
        let tags = Arc::new(TagService::new(Arc::new(MemoryTagRepository::new()), Vec::new()));

        (StorageService::new(Arc::new(MemoryStorageRepository::new()), tags.clone()), tags)
    }

    #[tokio::test]
    async fn create_in_folder() {
        let (service, _) = service();
        let owner = StorageOwner::user(1);

        let folder = service.create_folder(owner, None, "docs").await.unwrap();
        let file = service.create_file(owner, Some(folder.storage_id()), "a.txt", FileType::Text, 3)
            .await
            .unwrap();

        let children = service.children(owner, Some(folder.storage_id())).await.unwrap();

        assert_eq!(children, vec![file]);
    }

    #[tokio::test]
    async fn name_errors() {
        let (service, _) = service();
        let owner = StorageOwner::user(1);

        let err = service.create_folder(owner, None, "").await.unwrap_err();
        assert_eq!(err.api_kind(), &api::ApiErrorKind::Storage(api::StorageKind::NameEmpty));

        let err = service.create_folder(owner, None, "a/b").await.unwrap_err();
        assert_eq!(err.api_kind(), &api::ApiErrorKind::Storage(api::StorageKind::NameIllegal));

        let long = disk_lib::string_to_len(disk_lib::storage::MAX_NAME_CHARS + 1);
        let err = service.create_folder(owner, None, &long).await.unwrap_err();
        assert_eq!(err.api_kind(), &api::ApiErrorKind::Storage(api::StorageKind::NameTooLong));

        service.create_folder(owner, None, "docs").await.unwrap();

        let err = service.create_folder(owner, None, "docs").await.unwrap_err();
        assert_eq!(err.api_kind(), &api::ApiErrorKind::Storage(api::StorageKind::DirectoryExisted));
    }

    #[tokio::test]
    async fn parent_must_belong_to_owner() {
        let (service, _) = service();
        let folder = service.create_folder(StorageOwner::user(1), None, "docs").await.unwrap();

        let err = service.create_folder(StorageOwner::user(2), Some(folder.storage_id()), "mine")
            .await
            .unwrap_err();

        assert_eq!(err.api_kind(), &api::ApiErrorKind::Storage(api::StorageKind::DirectoryNotExist));
    }

    #[tokio::test]
    async fn delete_and_restore() {
        let (service, _) = service();
        let file = service.create_file(StorageOwner::user(1), None, "a", FileType::Other, 1)
            .await
            .unwrap();

        service.delete(file.identity).await.unwrap();

        let err = service.delete(file.identity).await.unwrap_err();
        assert_eq!(err.api_kind(), &api::ApiErrorKind::Storage(api::StorageKind::FileAlreadyDeleted));

        service.restore(file.identity).await.unwrap();
        service.get(file.identity).await.unwrap();
    }

    #[tokio::test]
    async fn tags_resolve_by_name() {
        let (service, tags) = service();
        let group = tags.create_group("project", "").await.unwrap();
        let tag = tags.add_tag(group.id, "alpha").await.unwrap();
        let file = service.create_file(StorageOwner::user(1), None, "a", FileType::Other, 1)
            .await
            .unwrap();

        service.set_tags(file.identity, &[("project".into(), "alpha".into())]).await.unwrap();

        let found = service.get(file.identity).await.unwrap();

        assert_eq!(found.tags.len(), 1);
        assert_eq!(found.tags[0].tag_id, tag.id);

        let err = service.set_tags(file.identity, &[("missing".into(), "alpha".into())])
            .await
            .unwrap_err();

        assert_eq!(err.api_kind(), &api::ApiErrorKind::Tag(api::TagKind::GroupNotFound));
    }
}
