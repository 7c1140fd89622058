use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicU64, Ordering};

use futures::future::BoxFuture;

use crate::error::api::{self, Context};
use crate::storage::{StorageRepository, StorageTotals};

use super::{StatisticsPersistable, StatisticsValue};

pub const STORAGE_TOTALS: &str = "storage_totals";

/// counts of the live storage items of every owner
pub struct StorageStatistics {
    repo: Arc<dyn StorageRepository>,
    version: AtomicU64,
    totals: Mutex<Option<StorageTotals>>,
}

impl StorageStatistics {
    pub fn new(repo: Arc<dyn StorageRepository>) -> Self {
        StorageStatistics {
            repo,
            version: AtomicU64::new(0),
            totals: Mutex::new(None),
        }
    }

    /// stores the latest totals, moving the version forward if they changed
    async fn refresh(&self) -> api::Result<u64> {
        let latest = self.repo.totals().await?;

        let mut totals = self.totals.lock()
            .ok()
            .context("storage totals lock poisoned")?;

        if *totals != Some(latest) {
            *totals = Some(latest);

            Ok(self.version.fetch_add(1, Ordering::Relaxed) + 1)
        } else {
            Ok(self.version.load(Ordering::Relaxed))
        }
    }
}

impl StatisticsPersistable for StorageStatistics {
    fn keys(&self) -> Vec<String> {
        vec![STORAGE_TOTALS.to_owned()]
    }

    fn version(&self) -> BoxFuture<'_, api::Result<u64>> {
        Box::pin(self.refresh())
    }

    fn statistics(&self, key: &str) -> StatisticsValue {
        let mut value = StatisticsValue::new();

        if key != STORAGE_TOTALS {
            return value;
        }

        let Some(totals) = self.totals.lock().ok().and_then(|totals| *totals) else {
            return value;
        };

        value.insert("files".into(), totals.files.to_string());
        value.insert("folders".into(), totals.folders.to_string());
        value.insert("links".into(), totals.links.to_string());
        value.insert("bytes".into(), totals.bytes.to_string());
        value
    }

    fn rescan(&self) -> BoxFuture<'_, api::Result<()>> {
        Box::pin(async move {
            self.refresh().await?;

            Ok(())
        })
    }
}

#[cfg(test)]
mod test {
    use disk_lib::storage::StorageType;

    use super::*;
    use crate::stats::{ArcPersistable, DataPersistTask, StatisticsRepository};
    use crate::stats::memory::MemoryStatisticsRepository;
    use crate::storage::{NewStorage, StorageOwner};
    use crate::storage::memory::MemoryStorageRepository;

    fn file(name: &str, size: u64) -> NewStorage {
        NewStorage {
            storage_type: StorageType::File,
            name: name.into(),
            owner: StorageOwner::user(1),
            parent_id: None,
            file_type: None,
            size,
        }
    }

    #[tokio::test]
    async fn version_follows_totals() {
        let storages = Arc::new(MemoryStorageRepository::new());
        let stats = StorageStatistics::new(storages.clone());

        assert!(stats.statistics(STORAGE_TOTALS).is_empty());

        let first = stats.version().await.unwrap();

        assert_eq!(stats.version().await.unwrap(), first);

        storages.create(file("a.txt", 12)).await.unwrap();

        let second = stats.version().await.unwrap();
        let value = stats.statistics(STORAGE_TOTALS);

        assert!(second > first);
        assert_eq!(value.get("files").map(String::as_str), Some("1"));
        assert_eq!(value.get("bytes").map(String::as_str), Some("12"));
        assert!(stats.statistics("unknown").is_empty());
    }

    #[tokio::test]
    async fn persisted_by_task() {
        let storages = Arc::new(MemoryStorageRepository::new());
        let repo = Arc::new(MemoryStatisticsRepository::new());
        let task = DataPersistTask::new(
            repo.clone(),
            vec![Arc::new(StorageStatistics::new(storages.clone())) as ArcPersistable]
        );

        storages.create(file("a.txt", 3)).await.unwrap();
        storages.create(file("b.txt", 4)).await.unwrap();

        task.persist().await.unwrap();

        let stored = repo.find_by_key(STORAGE_TOTALS).await.unwrap().unwrap();

        assert_eq!(stored.value.get("files").map(String::as_str), Some("2"));
        assert_eq!(stored.value.get("bytes").map(String::as_str), Some("7"));
        assert_eq!(stored.value.get("folders").map(String::as_str), Some("0"));
    }
}
