use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use disk_lib::ids;
use futures::future::BoxFuture;

use crate::error::{self, api};
use crate::jobs::{JobEvent, JobTask};

pub mod memory;
pub mod pg;
pub mod storage;

pub type StatisticsValue = HashMap<String, String>;

/// a named set of values persisted by [`DataPersistTask`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statistics {
    pub id: ids::StatisticsId,
    pub key: String,
    pub value: StatisticsValue,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

pub trait StatisticsRepository: Send + Sync {
    fn find_by_key<'a>(&'a self, key: &'a str) -> BoxFuture<'a, api::Result<Option<Statistics>>>;

    fn create(&self, key: String, value: StatisticsValue) -> BoxFuture<'_, api::Result<Statistics>>;

    fn update<'a>(&'a self, statistics: &'a Statistics) -> BoxFuture<'a, api::Result<()>>;
}

/// a source of statistics. the version changes whenever the values of any
/// key change
pub trait StatisticsPersistable: Send + Sync {
    fn keys(&self) -> Vec<String>;

    fn version(&self) -> BoxFuture<'_, api::Result<u64>>;

    /// an empty map means the source has nothing yet
    fn statistics(&self, key: &str) -> StatisticsValue;

    fn rescan(&self) -> BoxFuture<'_, api::Result<()>>;
}

pub type ArcPersistable = Arc<dyn StatisticsPersistable>;

/// writes the values of every persistable to the repository, skipping keys
/// whose version has not changed since the last write
pub struct DataPersistTask {
    repo: Arc<dyn StatisticsRepository>,
    persistables: Vec<ArcPersistable>,
    by_key: DashMap<String, Statistics>,
    last_version: DashMap<String, u64>,
}

impl DataPersistTask {
    pub fn new(repo: Arc<dyn StatisticsRepository>, persistables: Vec<ArcPersistable>) -> Self {
        DataPersistTask {
            repo,
            persistables,
            by_key: DashMap::new(),
            last_version: DashMap::new(),
        }
    }

    pub async fn persist(&self) -> api::Result<()> {
        for persistable in &self.persistables {
            for key in persistable.keys() {
                self.persist_key(persistable, key).await?;
            }
        }

        Ok(())
    }

    async fn persist_key(&self, persistable: &ArcPersistable, key: String) -> api::Result<()> {
        let version = persistable.version().await?;

        if self.last_version.get(&key).map(|last| *last) == Some(version) {
            return Ok(());
        }

        let value = persistable.statistics(&key);

        if value.is_empty() {
            tracing::debug!("statistics {} returned nothing, rescanning", key);

            return persistable.rescan().await;
        }

        let mut statistics = self.stored(&key).await?;

        if statistics.value == value {
            self.last_version.insert(key, version);

            return Ok(());
        }

        statistics.value = value;
        statistics.updated = Utc::now();

        // a failed write leaves the version unrecorded so the next run retries
        self.repo.update(&statistics).await?;

        tracing::debug!("persisted statistics {} version {}", key, version);

        self.last_version.insert(key.clone(), version);
        self.by_key.insert(key, statistics);

        Ok(())
    }

    async fn stored(&self, key: &str) -> api::Result<Statistics> {
        if let Some(found) = self.by_key.get(key) {
            return Ok(found.value().clone());
        }

        let statistics = match self.repo.find_by_key(key).await? {
            Some(found) => found,
            None => self.repo.create(key.to_owned(), StatisticsValue::new()).await?,
        };

        self.by_key.insert(key.to_owned(), statistics.clone());

        Ok(statistics)
    }
}

impl JobTask for DataPersistTask {
    fn execute<'a>(&'a self, _event: &'a JobEvent) -> BoxFuture<'a, error::Result<()>> {
        Box::pin(async move {
            self.persist().await?;

            Ok(())
        })
    }
}

#[cfg(test)]
mod test {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

    use super::*;
    use crate::stats::memory::MemoryStatisticsRepository;

    #[derive(Default)]
    struct Counter {
        version: AtomicU64,
        value: Mutex<StatisticsValue>,
        rescans: AtomicUsize,
    }

    impl Counter {
        fn set(&self, count: u64) {
            if let Ok(mut value) = self.value.lock() {
                value.insert("count".into(), count.to_string());
            }

            self.version.fetch_add(1, Ordering::Relaxed);
        }
    }

    impl StatisticsPersistable for Counter {
        fn keys(&self) -> Vec<String> {
            vec!["counter".into()]
        }

        fn version(&self) -> BoxFuture<'_, api::Result<u64>> {
            Box::pin(async move { Ok(self.version.load(Ordering::Relaxed)) })
        }

        fn statistics(&self, _key: &str) -> StatisticsValue {
            self.value.lock().unwrap().clone()
        }

        fn rescan(&self) -> BoxFuture<'_, api::Result<()>> {
            Box::pin(async move {
                self.rescans.fetch_add(1, Ordering::Relaxed);

                Ok(())
            })
        }
    }

    /// fails the first update it is given
    #[derive(Default)]
    struct FlakyRepository {
        inner: MemoryStatisticsRepository,
        failed: AtomicBool,
    }

    impl StatisticsRepository for FlakyRepository {
        fn find_by_key<'a>(&'a self, key: &'a str) -> BoxFuture<'a, api::Result<Option<Statistics>>> {
            self.inner.find_by_key(key)
        }

        fn create(&self, key: String, value: StatisticsValue) -> BoxFuture<'_, api::Result<Statistics>> {
            self.inner.create(key, value)
        }

        fn update<'a>(&'a self, statistics: &'a Statistics) -> BoxFuture<'a, api::Result<()>> {
            if !self.failed.swap(true, Ordering::Relaxed) {
                return Box::pin(async move {
                    Err(api::Error::api((api::GeneralKind::InternalFailure, "connection reset")))
                });
            }

            self.inner.update(statistics)
        }
    }

    #[tokio::test]
    async fn retries_after_failed_write() {
        let repo = Arc::new(FlakyRepository::default());
        let counter = Arc::new(Counter::default());
        let task = DataPersistTask::new(repo.clone(), vec![counter.clone() as ArcPersistable]);

        counter.set(3);

        assert!(task.persist().await.is_err());

        let stored = repo.find_by_key("counter").await.unwrap().unwrap();

        assert!(stored.value.is_empty());

        // same version as the failed run
        task.persist().await.unwrap();

        let stored = repo.find_by_key("counter").await.unwrap().unwrap();

        assert_eq!(stored.value.get("count").map(String::as_str), Some("3"));
    }

    #[tokio::test]
    async fn persists_changed_versions() {
        let repo = Arc::new(MemoryStatisticsRepository::new());
        let counter = Arc::new(Counter::default());
        let task = DataPersistTask::new(repo.clone(), vec![counter.clone() as ArcPersistable]);

        task.persist().await.unwrap();

        assert_eq!(counter.rescans.load(Ordering::Relaxed), 1);
        assert!(repo.find_by_key("counter").await.unwrap().is_none());

        counter.set(5);
        task.persist().await.unwrap();

        let stored = repo.find_by_key("counter").await.unwrap().unwrap();

        assert_eq!(stored.value.get("count").map(String::as_str), Some("5"));

        // same version, nothing is written even if the values moved
        counter.value.lock().unwrap().insert("count".into(), "6".into());
        task.persist().await.unwrap();

        let stored = repo.find_by_key("counter").await.unwrap().unwrap();

        assert_eq!(stored.value.get("count").map(String::as_str), Some("5"));

        counter.set(7);
        task.persist().await.unwrap();

        let stored = repo.find_by_key("counter").await.unwrap().unwrap();

        assert_eq!(stored.value.get("count").map(String::as_str), Some("7"));
    }
}
