use std::collections::HashSet;

use crate::error::api;
use crate::storage::{StorageIdentity, StorageOwner, UserStorage};

use super::{parse, ArcSearchProvider, SearchCondition, SearchConditionGroup};

pub struct SearchService {
    providers: Vec<ArcSearchProvider>,
}

impl SearchService {
    pub fn new(providers: Vec<ArcSearchProvider>) -> Self {
        SearchService { providers }
    }

    pub async fn search(&self, expression: &str, owner: &StorageOwner) -> api::Result<Vec<UserStorage>> {
        let conditions = parse(expression)?;

        self.search_for(conditions, owner).await
    }

    pub async fn search_for(
        &self,
        conditions: Vec<SearchCondition>,
        owner: &StorageOwner,
    ) -> api::Result<Vec<UserStorage>> {
        if conditions.is_empty() {
            return Ok(Vec::new());
        }

        let group = SearchConditionGroup::new(conditions);

        if group.has_duplicate_names() {
            tracing::debug!("duplicate condition names in search");

            return Ok(Vec::new());
        }

        let Some(selected) = self.select(&group) else {
            return Ok(Vec::new());
        };

        let mut seen: HashSet<StorageIdentity> = HashSet::new();
        let mut results = Vec::new();

        for provider in selected {
            for storage in provider.search(&group, owner).await? {
                if seen.insert(storage.identity) {
                    results.push(storage);
                }
            }
        }

        Ok(results)
    }

    /// the first supporting provider of each condition, in order of first
    /// use and without repeats. `None` if any condition is unsupported
    fn select(&self, group: &SearchConditionGroup) -> Option<Vec<&ArcSearchProvider>> {
        let mut indexes = Vec::new();

        for condition in group.conditions() {
            let found = self.providers.iter()
                .position(|provider| provider.supports(&condition.name));

            match found {
                Some(index) => if !indexes.contains(&index) {
                    indexes.push(index);
                }
                None => {
                    tracing::debug!("no search provider for condition \"{}\"", condition.name);

                    return None;
                }
            }
        }

        Some(indexes.into_iter()
            .map(|index| &self.providers[index])
            .collect())
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::Utc;
    use futures::future::BoxFuture;

    use super::*;
    use crate::search::SearchConditionProvider;
    use crate::storage::{StorageType, FileType};

    struct Fixed {
        names: &'static [&'static str],
        results: Vec<UserStorage>,
        calls: AtomicUsize,
    }

    impl Fixed {
        fn new(names: &'static [&'static str], results: Vec<UserStorage>) -> Arc<Self> {
            Arc::new(Fixed {
                names,
                results,
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl SearchConditionProvider for Fixed {
        fn supports(&self, name: &str) -> bool {
            self.names.contains(&name)
        }

        fn search<'a>(
            &'a self,
            _group: &'a SearchConditionGroup,
            _owner: &'a StorageOwner,
        ) -> BoxFuture<'a, api::Result<Vec<UserStorage>>> {
            Box::pin(async move {
                self.calls.fetch_add(1, Ordering::Relaxed);

                Ok(self.results.clone())
            })
        }
    }

    fn item(id: i64, storage_type: StorageType, name: &str) -> UserStorage {
        let now = Utc::now();

        UserStorage {
            identity: StorageIdentity::new(id, storage_type),
            name: name.into(),
            owner: StorageOwner::user(1),
            parent_id: None,
            file_type: storage_type.is_file().then_some(FileType::Other),
            size: 0,
            tags: Vec::new(),
            created: now,
            updated: now,
            deleted: false,
        }
    }

    #[tokio::test]
    async fn same_identity_once() {
        let first = Fixed::new(&["name"], vec![
            item(1, StorageType::File, "first"),
            item(1, StorageType::Folder, "folder"),
        ]);
        let second = Fixed::new(&["group"], vec![
            item(1, StorageType::File, "second"),
            item(2, StorageType::File, "other"),
        ]);

        let service = SearchService::new(vec![
            first.clone() as ArcSearchProvider,
            second.clone() as ArcSearchProvider,
        ]);
        let found = service.search("name:a group:b", &StorageOwner::user(1)).await.unwrap();

        let names: Vec<&str> = found.iter().map(|storage| storage.name.as_str()).collect();

        assert_eq!(names, vec!["first", "folder", "other"]);
    }

    #[tokio::test]
    async fn first_supporting_provider_only() {
        let first = Fixed::new(&["name"], vec![item(1, StorageType::File, "first")]);
        let second = Fixed::new(&["name", "size"], vec![item(2, StorageType::File, "second")]);

        let service = SearchService::new(vec![
            first.clone() as ArcSearchProvider,
            second.clone() as ArcSearchProvider,
        ]);
        let found = service.search("name:a", &StorageOwner::user(1)).await.unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(first.calls.load(Ordering::Relaxed), 1);
        assert_eq!(second.calls.load(Ordering::Relaxed), 0);

        service.search("name:a size:1", &StorageOwner::user(1)).await.unwrap();

        assert_eq!(first.calls.load(Ordering::Relaxed), 2);
        assert_eq!(second.calls.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn unsupported_and_duplicates() {
        let first = Fixed::new(&["name"], vec![item(1, StorageType::File, "first")]);
        let service = SearchService::new(vec![first.clone() as ArcSearchProvider]);
        let owner = StorageOwner::user(1);

        assert_eq!(service.search("color:red", &owner).await.unwrap().len(), 0);
        assert_eq!(service.search("color:red name:a", &owner).await.unwrap().len(), 0);
        assert_eq!(service.search("name:a color:red", &owner).await.unwrap().len(), 0);
        assert_eq!(service.search("name:a name:b", &owner).await.unwrap().len(), 0);
        assert_eq!(service.search("   ", &owner).await.unwrap().len(), 0);
        assert_eq!(first.calls.load(Ordering::Relaxed), 0);

        assert_eq!(service.search("name:a", &owner).await.unwrap().len(), 1);
        assert_eq!(first.calls.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn invalid_expression() {
        let service = SearchService::new(Vec::new());
        let err = service.search("badtoken", &StorageOwner::user(1)).await.unwrap_err();

        assert_eq!(err.api_kind(), &api::ApiErrorKind::Search(api::SearchKind::InvalidExpression));
    }
}
