use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use dashmap::DashMap;
use futures::future::BoxFuture;

use crate::error::api;

use super::{Statistics, StatisticsValue, StatisticsRepository};

#[derive(Debug, Default)]
pub struct MemoryStatisticsRepository {
    seq: AtomicI64,
    by_key: DashMap<String, Statistics>,
}

impl MemoryStatisticsRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StatisticsRepository for MemoryStatisticsRepository {
    fn find_by_key<'a>(&'a self, key: &'a str) -> BoxFuture<'a, api::Result<Option<Statistics>>> {
        Box::pin(async move {
            Ok(self.by_key.get(key).map(|found| found.value().clone()))
        })
    }

    fn create(&self, key: String, value: StatisticsValue) -> BoxFuture<'_, api::Result<Statistics>> {
        Box::pin(async move {
            if self.by_key.contains_key(&key) {
                return Err(api::Error::api(api::GeneralKind::AlreadyExists)
                    .context(format!("statistics \"{key}\" already exist")));
            }

            let now = Utc::now();
            let statistics = Statistics {
                id: self.seq.fetch_add(1, Ordering::Relaxed) + 1,
                key,
                value,
                created: now,
                updated: now,
            };

            self.by_key.insert(statistics.key.clone(), statistics.clone());

            Ok(statistics)
        })
    }

    fn update<'a>(&'a self, statistics: &'a Statistics) -> BoxFuture<'a, api::Result<()>> {
        Box::pin(async move {
            let Some(mut found) = self.by_key.get_mut(&statistics.key) else {
                return Err(api::Error::api(api::GeneralKind::NotFound)
                    .context(format!("statistics \"{}\" not found", statistics.key)));
            };

            *found = statistics.clone();

            Ok(())
        })
    }
}
