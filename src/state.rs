use std::sync::Arc;

use deadpool_postgres::Pool;

use crate::config;
use crate::db;
use crate::error;
use crate::favorites::FavoriteRepository;
use crate::favorites::memory::MemoryFavoriteRepository;
use crate::favorites::pg::PgFavoriteRepository;
use crate::favorites::service::FavoriteService;
use crate::jobs::{JobExecutor, JobRegistry};
use crate::operatelog::OperationLogRepository;
use crate::operatelog::memory::MemoryOperationLogRepository;
use crate::operatelog::pg::PgOperationLogRepository;
use crate::permission::StoragePermissionRepository;
use crate::permission::cached::CachedPermissionRepository;
use crate::permission::memory::MemoryPermissionRepository;
use crate::permission::pg::PgPermissionRepository;
use crate::permission::service::StoragePermissionService;
use crate::search::{ArcSearchProvider, SearchService};
use crate::search::storage::StorageSearchProvider;
use crate::search::tags::TagSearchProvider;
use crate::sec::authz::{ArcAuthenticationProvider, ResourceAuthenticator};
use crate::sec::authz::share::ShareAuthenticationProvider;
use crate::sec::authz::storage::StorageAuthenticationProvider;
use crate::share::ShareRepository;
use crate::share::memory::MemoryShareRepository;
use crate::share::pg::PgShareRepository;
use crate::share::service::ShareService;
use crate::stats::{ArcPersistable, DataPersistTask, StatisticsRepository};
use crate::stats::memory::MemoryStatisticsRepository;
use crate::stats::pg::PgStatisticsRepository;
use crate::stats::storage::StorageStatistics;
use crate::storage::StorageRepository;
use crate::storage::memory::MemoryStorageRepository;
use crate::storage::pg::PgStorageRepository;
use crate::storage::service::StorageService;
use crate::tags::{ArcTagListener, TagRepository};
use crate::tags::memory::MemoryTagRepository;
use crate::tags::pg::PgTagRepository;
use crate::tags::service::TagService;
use crate::user::UserRepository;
use crate::user::memory::MemoryUserRepository;
use crate::user::pg::PgUserRepository;
use crate::usergroup::UserGroupRepository;
use crate::usergroup::memory::MemoryUserGroupRepository;
use crate::usergroup::pg::PgUserGroupRepository;
use crate::usergroup::service::UserGroupService;

/// the repositories backing every service
pub struct Repos {
    pub users: Arc<dyn UserRepository>,
    pub storages: Arc<dyn StorageRepository>,
    pub tags: Arc<dyn TagRepository>,
    pub permissions: Arc<dyn StoragePermissionRepository>,
    pub shares: Arc<dyn ShareRepository>,
    pub statistics: Arc<dyn StatisticsRepository>,
    pub favorites: Arc<dyn FavoriteRepository>,
    pub user_groups: Arc<dyn UserGroupRepository>,
    pub operation_logs: Arc<dyn OperationLogRepository>,
}

impl Repos {
    pub fn memory() -> Self {
        Repos {
            users: Arc::new(MemoryUserRepository::new()),
            storages: Arc::new(MemoryStorageRepository::new()),
            tags: Arc::new(MemoryTagRepository::new()),
            permissions: Arc::new(MemoryPermissionRepository::new()),
            shares: Arc::new(MemoryShareRepository::new()),
            statistics: Arc::new(MemoryStatisticsRepository::new()),
            favorites: Arc::new(MemoryFavoriteRepository::new()),
            user_groups: Arc::new(MemoryUserGroupRepository::new()),
            operation_logs: Arc::new(MemoryOperationLogRepository::new()),
        }
    }

    pub fn postgres(pool: &Pool) -> Self {
        Repos {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            storages: Arc::new(PgStorageRepository::new(pool.clone())),
            tags: Arc::new(PgTagRepository::new(pool.clone())),
            permissions: Arc::new(PgPermissionRepository::new(pool.clone())),
            shares: Arc::new(PgShareRepository::new(pool.clone())),
            statistics: Arc::new(PgStatisticsRepository::new(pool.clone())),
            favorites: Arc::new(PgFavoriteRepository::new(pool.clone())),
            user_groups: Arc::new(PgUserGroupRepository::new(pool.clone())),
            operation_logs: Arc::new(PgOperationLogRepository::new(pool.clone())),
        }
    }

    /// puts the permission repository behind a read through cache
    pub fn with_cache(mut self, capacity: u64) -> Self {
        if capacity > 0 {
            self.permissions = Arc::new(CachedPermissionRepository::new(self.permissions, capacity));
        }

        self
    }
}

pub struct Shared {
    repos: Repos,
    permissions: Arc<StoragePermissionService>,
    tags: Arc<TagService>,
    storages: StorageService,
    search: SearchService,
    shares: ShareService,
    favorites: FavoriteService,
    user_groups: UserGroupService,
    authenticator: ResourceAuthenticator,
    registry: JobRegistry,
    persist: Arc<DataPersistTask>,
}

impl Shared {
    pub async fn from_config(config: &config::Config) -> error::Result<Shared> {
        let repos = match config.settings.store {
            config::Store::Memory => {
                tracing::info!("using memory store");

                Repos::memory()
            }
            config::Store::Postgres => {
                let pool = db::from_config(config)?;

                db::setup(&pool).await?;

                Repos::postgres(&pool)
            }
        };

        Self::from_repos(repos.with_cache(config.settings.cache.capacity), &config.settings.jobs).await
    }

    pub async fn from_repos(repos: Repos, jobs: &config::Jobs) -> error::Result<Shared> {
        tracing::debug!("creating Shared state");

        let permissions = Arc::new(StoragePermissionService::new(
            repos.storages.clone(),
            repos.users.clone(),
            repos.permissions.clone(),
        ));

        let tag_search = Arc::new(TagSearchProvider::load(
            repos.tags.clone(),
            repos.storages.clone(),
        ).await?);

        let tags = Arc::new(TagService::new(
            repos.tags.clone(),
            vec![tag_search.clone() as ArcTagListener],
        ));

        let search = SearchService::new(vec![
            Arc::new(StorageSearchProvider::new(repos.storages.clone())) as ArcSearchProvider,
            tag_search as ArcSearchProvider,
        ]);

        let authenticator = ResourceAuthenticator::new(vec![
            Arc::new(StorageAuthenticationProvider::new(permissions.clone())) as ArcAuthenticationProvider,
            Arc::new(ShareAuthenticationProvider::new(repos.shares.clone())) as ArcAuthenticationProvider,
        ]).with_log(repos.operation_logs.clone());

        let persist = Arc::new(DataPersistTask::new(
            repos.statistics.clone(),
            vec![Arc::new(StorageStatistics::new(repos.storages.clone())) as ArcPersistable],
        ));

        let executor = Arc::new(JobExecutor::new(jobs.workers, jobs.queue));

        Ok(Shared {
            storages: StorageService::new(repos.storages.clone(), tags.clone()),
            shares: ShareService::new(repos.shares.clone(), repos.storages.clone()),
            favorites: FavoriteService::new(repos.favorites.clone(), repos.storages.clone()),
            user_groups: UserGroupService::new(repos.user_groups.clone()),
            registry: JobRegistry::new(executor),
            repos,
            permissions,
            tags,
            search,
            authenticator,
            persist,
        })
    }

    pub fn repos(&self) -> &Repos {
        &self.repos
    }

    pub fn permissions(&self) -> &StoragePermissionService {
        &self.permissions
    }

    pub fn tags(&self) -> &TagService {
        &self.tags
    }

    pub fn storages(&self) -> &StorageService {
        &self.storages
    }

    pub fn search(&self) -> &SearchService {
        &self.search
    }

    pub fn shares(&self) -> &ShareService {
        &self.shares
    }

    pub fn favorites(&self) -> &FavoriteService {
        &self.favorites
    }

    pub fn user_groups(&self) -> &UserGroupService {
        &self.user_groups
    }

    pub fn authenticator(&self) -> &ResourceAuthenticator {
        &self.authenticator
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    pub fn persist(&self) -> Arc<DataPersistTask> {
        self.persist.clone()
    }
}

#[cfg(test)]
mod test {
    use disk_lib::query::Page;

    use super::*;
    use crate::favorites::DEFAULT_GROUP_ID;
    use crate::permission::Action;
    use crate::sec::Operator;
    use crate::sec::authz::SystemResource;
    use crate::storage::{StorageOwner, StorageType};

    fn jobs() -> config::Jobs {
        config::Jobs {
            workers: 1,
            queue: 1,
            persist_cron: config::DEFAULT_PERSIST_CRON.to_owned(),
        }
    }

    #[tokio::test]
    async fn wired_services() {
        let state = Shared::from_repos(Repos::memory().with_cache(16), &jobs()).await.unwrap();
        let owner = state.repos().users.create("owner").await.unwrap();
        let other = state.repos().users.create("other").await.unwrap();
        let storage_owner = StorageOwner::user(owner.id);

        let group = state.tags().create_group("color", "colors of things").await.unwrap();
        state.tags().add_tag(group.id, "red").await.unwrap();

        let folder = state.storages().create_folder(storage_owner, None, "docs").await.unwrap();

        assert_eq!(folder.storage_type(), StorageType::Folder);

        let found = state.search().search("name:docs", &storage_owner).await.unwrap();

        assert_eq!(found.len(), 1);
        assert!(state.search().search("color:red", &storage_owner).await.unwrap().is_empty());

        let resource = SystemResource::from(folder.identity);
        let allowed = state.authenticator()
            .authenticate(&resource, &Operator::new(owner.id), Action::Edit)
            .await
            .unwrap();

        assert!(allowed.allow);

        let denied = state.authenticator()
            .authenticate(&resource, &Operator::new(other.id), Action::Access)
            .await
            .unwrap();

        assert!(!denied.allow);

        state.authenticator()
            .guard(&resource, &Operator::new(owner.id), Action::Rename, || async { Ok(()) })
            .await
            .unwrap();

        let logged = state.repos().operation_logs.by_resource(resource, Page::default()).await.unwrap();

        assert_eq!(logged.len(), 1);
        assert_eq!(logged[0].operator, owner.id);

        state.favorites()
            .add(DEFAULT_GROUP_ID, folder.identity, &Operator::new(owner.id))
            .await
            .unwrap();

        let team = state.user_groups().create_group("team", "").await.unwrap();
        state.user_groups().add_member(team.id, storage_owner).await.unwrap();

        assert_eq!(state.user_groups().group_of(storage_owner).await.unwrap().id, team.id);
    }
}
