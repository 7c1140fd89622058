use std::sync::Arc;

use dashmap::DashSet;
use futures::future::BoxFuture;

use crate::error::api;
use crate::storage::{StorageOwner, StorageQuery, StorageRepository, StorageTag, StorageType, UserStorage};
use crate::tags::{TagEventListener, TagGroup, TagRepository};

use super::{SearchConditionGroup, SearchConditionProvider, TypeKeyword};

/// one condition per tag group, `<group>:<tag>`. only files carry tags
pub struct TagSearchProvider {
    groups: DashSet<String>,
    tags: Arc<dyn TagRepository>,
    storages: Arc<dyn StorageRepository>,
}

impl TagSearchProvider {
    /// loads the names of the existing tag groups
    pub async fn load(
        tags: Arc<dyn TagRepository>,
        storages: Arc<dyn StorageRepository>
    ) -> api::Result<Self> {
        let groups = DashSet::new();

        for group in tags.groups().await? {
            groups.insert(group.name);
        }

        tracing::debug!("tag search provider loaded {} groups", groups.len());

        Ok(TagSearchProvider {
            groups,
            tags,
            storages,
        })
    }

    /// `None` when a group or tag does not exist, nothing can match then
    async fn resolve(&self, group: &SearchConditionGroup) -> api::Result<Option<Vec<StorageTag>>> {
        let mut resolved = Vec::new();

        for condition in group.conditions() {
            if !self.groups.contains(&condition.name) {
                continue;
            }

            let Some(tag_group) = self.tags.find_group_by_name(&condition.name).await? else {
                return Ok(None);
            };

            let Some(tag) = tag_group.tag_by_name(&condition.keyword) else {
                return Ok(None);
            };

            resolved.push(StorageTag {
                group_id: tag_group.id,
                tag_id: tag.id,
            });
        }

        Ok(Some(resolved))
    }
}

impl SearchConditionProvider for TagSearchProvider {
    fn supports(&self, name: &str) -> bool {
        self.groups.contains(name)
    }

    fn search<'a>(
        &'a self,
        group: &'a SearchConditionGroup,
        owner: &'a StorageOwner,
    ) -> BoxFuture<'a, api::Result<Vec<UserStorage>>> {
        Box::pin(async move {
            let mut query = StorageQuery::owned_by(*owner);
            query.storage_type = Some(StorageType::File);

            match TypeKeyword::from_group(group) {
                Some(TypeKeyword::Storage(StorageType::File)) | None => {}
                Some(TypeKeyword::Storage(_)) => return Ok(Vec::new()),
                Some(TypeKeyword::File(file_type)) => query.file_type = Some(file_type),
            }

            let Some(tags) = self.resolve(group).await? else {
                return Ok(Vec::new());
            };

            if tags.is_empty() {
                return Ok(Vec::new());
            }

            query.tags = tags;

            self.storages.query(&query).await
        })
    }
}

impl TagEventListener for TagSearchProvider {
    fn group_created(&self, group: &TagGroup) {
        self.groups.insert(group.name.clone());
    }

    fn group_deleted(&self, group: &TagGroup) {
        self.groups.remove(&group.name);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::search::parse;
    use crate::storage::{NewStorage, StorageIdentity, FileType};
    use crate::storage::memory::MemoryStorageRepository;
    use crate::tags::ArcTagListener;
    use crate::tags::memory::MemoryTagRepository;
    use crate::tags::service::TagService;

    struct Setup {
        provider: Arc<TagSearchProvider>,
        tags: TagService,
        storages: Arc<MemoryStorageRepository>,
    }

    async fn setup() -> Setup {
        let tag_repo = Arc::new(MemoryTagRepository::new());
        let storages = Arc::new(MemoryStorageRepository::new());

        tag_repo.create_group("season".into(), String::new()).await.unwrap();

        let provider = Arc::new(TagSearchProvider::load(tag_repo.clone(), storages.clone())
            .await
            .unwrap());

        let tags = TagService::new(tag_repo, vec![provider.clone() as ArcTagListener]);

        Setup {
            provider,
            tags,
            storages,
        }
    }

    async fn tagged(
        setup: &Setup,
        name: &str,
        file_type: FileType,
        tags: Vec<StorageTag>
    ) -> StorageIdentity {
        let storage = setup.storages.create(NewStorage {
            storage_type: StorageType::File,
            name: name.into(),
            owner: StorageOwner::user(1),
            parent_id: None,
            file_type: Some(file_type),
            size: 1,
        }).await.unwrap();

        setup.storages.set_tags(storage.identity, tags).await.unwrap();

        storage.identity
    }

    async fn names(setup: &Setup, expression: &str) -> Vec<String> {
        let group = SearchConditionGroup::new(parse(expression).unwrap());

        setup.provider.search(&group, &StorageOwner::user(1))
            .await
            .unwrap()
            .into_iter()
            .map(|storage| storage.name)
            .collect()
    }

    #[tokio::test]
    async fn follows_group_events() {
        let setup = setup().await;

        assert!(setup.provider.supports("season"));
        assert!(!setup.provider.supports("place"));

        let place = setup.tags.create_group("place", "").await.unwrap();

        assert!(setup.provider.supports("place"));

        setup.tags.delete_group(place.id).await.unwrap();

        assert!(!setup.provider.supports("place"));
    }

    #[tokio::test]
    async fn requires_every_tag() {
        let setup = setup().await;
        let season = setup.tags.groups().await.unwrap().remove(0);
        let place = setup.tags.create_group("place", "").await.unwrap();

        setup.tags.add_tag(season.id, "summer").await.unwrap();
        setup.tags.add_tag(place.id, "beach").await.unwrap();

        let summer = setup.tags.resolve("season", "summer").await.unwrap();
        let beach = setup.tags.resolve("place", "beach").await.unwrap();

        tagged(&setup, "both.png", FileType::Image, vec![summer, beach]).await;
        tagged(&setup, "summer.txt", FileType::Text, vec![summer]).await;

        assert_eq!(names(&setup, "season:summer").await, vec!["both.png", "summer.txt"]);
        assert_eq!(names(&setup, "season:summer place:beach").await, vec!["both.png"]);
        assert_eq!(names(&setup, "season:summer type:text").await, vec!["summer.txt"]);
        assert!(names(&setup, "season:summer type:folder").await.is_empty());
        assert!(names(&setup, "season:winter").await.is_empty());
    }
}
