use std::sync::Arc;

use disk_lib::search::{parse_time_range, parse_size};
use futures::future::BoxFuture;

use crate::error::api;
use crate::storage::{StorageOwner, StorageQuery, StorageRepository, UserStorage};

use super::{names, SearchConditionGroup, SearchConditionProvider, TypeKeyword};

const SUPPORTED: [&str; 5] = [
    names::NAME,
    names::TYPE,
    names::TIME,
    names::LAST_MODIFIED,
    names::SIZE,
];

/// searches the attributes of the storage items of an owner
pub struct StorageSearchProvider {
    storages: Arc<dyn StorageRepository>,
}

impl StorageSearchProvider {
    pub fn new(storages: Arc<dyn StorageRepository>) -> Self {
        StorageSearchProvider { storages }
    }

    fn query(group: &SearchConditionGroup, owner: &StorageOwner) -> api::Result<StorageQuery> {
        let mut query = StorageQuery::owned_by(*owner);

        query.name = group.keyword(names::NAME).map(String::from);

        match TypeKeyword::from_group(group) {
            Some(TypeKeyword::Storage(storage_type)) => query.storage_type = Some(storage_type),
            Some(TypeKeyword::File(file_type)) => query.file_type = Some(file_type),
            None => {}
        }

        if let Some(keyword) = group.keyword(names::TIME) {
            query.created = Some(parse_time_range(keyword)?);
        }

        if let Some(keyword) = group.keyword(names::LAST_MODIFIED) {
            query.updated = Some(parse_time_range(keyword)?);
        }

        if let Some(keyword) = group.keyword(names::SIZE) {
            query.size = Some(parse_size(keyword)?);
        }

        Ok(query)
    }
}

impl SearchConditionProvider for StorageSearchProvider {
    fn supports(&self, name: &str) -> bool {
        SUPPORTED.contains(&name)
    }

    fn search<'a>(
        &'a self,
        group: &'a SearchConditionGroup,
        owner: &'a StorageOwner,
    ) -> BoxFuture<'a, api::Result<Vec<UserStorage>>> {
        Box::pin(async move {
            let query = Self::query(group, owner)?;

            self.storages.query(&query).await
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::search::parse;
    use crate::storage::{NewStorage, StorageType, FileType};
    use crate::storage::memory::MemoryStorageRepository;

    async fn repo() -> Arc<MemoryStorageRepository> {
        let repo = Arc::new(MemoryStorageRepository::new());
        let owner = StorageOwner::user(1);

        let items = [
            (StorageType::Folder, "Photos", None, 0),
            (StorageType::File, "beach.png", Some(FileType::Image), 4_096),
            (StorageType::File, "notes.txt", Some(FileType::Text), 12),
            (StorageType::File, "photo-list.txt", Some(FileType::Text), 64),
        ];

        for (storage_type, name, file_type, size) in items {
            repo.create(NewStorage {
                storage_type,
                name: name.into(),
                owner,
                parent_id: None,
                file_type,
                size,
            }).await.unwrap();
        }

        repo.create(NewStorage {
            storage_type: StorageType::File,
            name: "photo.png".into(),
            owner: StorageOwner::user(2),
            parent_id: None,
            file_type: Some(FileType::Image),
            size: 10,
        }).await.unwrap();

        repo
    }

    async fn names(provider: &StorageSearchProvider, expression: &str) -> Vec<String> {
        let group = SearchConditionGroup::new(parse(expression).unwrap());

        provider.search(&group, &StorageOwner::user(1))
            .await
            .unwrap()
            .into_iter()
            .map(|storage| storage.name)
            .collect()
    }

    #[tokio::test]
    async fn attribute_filters() {
        let provider = StorageSearchProvider::new(repo().await);

        assert_eq!(names(&provider, "name:photo").await, vec!["Photos", "photo-list.txt"]);
        assert_eq!(names(&provider, "name:photo type:file").await, vec!["photo-list.txt"]);
        assert_eq!(names(&provider, "type:text size:>=20").await, vec!["photo-list.txt"]);
        assert_eq!(names(&provider, "type:image").await, vec!["beach.png"]);
        assert_eq!(names(&provider, "size:<100").await, vec!["notes.txt", "photo-list.txt"]);
        assert_eq!(names(&provider, "time:0..").await.len(), 4);
        assert!(names(&provider, "last_modified:..1000").await.is_empty());
    }

    #[tokio::test]
    async fn invalid_keywords() {
        let provider = StorageSearchProvider::new(repo().await);
        let owner = StorageOwner::user(1);

        for expression in ["size:big", "time:yesterday"] {
            let group = SearchConditionGroup::new(parse(expression).unwrap());
            let err = provider.search(&group, &owner).await.unwrap_err();

            assert_eq!(
                err.api_kind(),
                &api::ApiErrorKind::Search(api::SearchKind::InvalidKeyword),
                "expression: {expression}"
            );
        }
    }

    #[tokio::test]
    async fn unknown_type_ignored() {
        let provider = StorageSearchProvider::new(repo().await);

        assert_eq!(names(&provider, "type:spreadsheet").await.len(), 4);
        assert_eq!(
            names(&provider, "name:photo type:spreadsheet").await,
            vec!["Photos", "photo-list.txt"]
        );
    }
}
