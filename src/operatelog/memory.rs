use std::sync::atomic::{AtomicI64, Ordering};

use dashmap::DashMap;
use disk_lib::ids;
use disk_lib::query::Page;
use futures::future::BoxFuture;

use crate::error::api;
use crate::sec::authz::SystemResource;

use super::{NewOperationLog, OperationLog, OperationLogRepository};

#[derive(Debug, Default)]
pub struct MemoryOperationLogRepository {
    seq: AtomicI64,
    logs: DashMap<ids::OperationLogId, OperationLog>,
}

impl MemoryOperationLogRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn matching<F>(&self, page: Page, predicate: F) -> Vec<OperationLog>
    where
        F: Fn(&OperationLog) -> bool
    {
        let mut list: Vec<OperationLog> = self.logs.iter()
            .filter(|entry| predicate(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();

        list.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));

        list.into_iter()
            .skip(page.limit.skip(page.offset))
            .take(page.limit.take())
            .collect()
    }
}

impl OperationLogRepository for MemoryOperationLogRepository {
    fn record(&self, log: NewOperationLog) -> BoxFuture<'_, api::Result<OperationLog>> {
        Box::pin(async move {
            let record = OperationLog {
                id: self.seq.fetch_add(1, Ordering::Relaxed) + 1,
                operator: log.operator,
                resource: log.resource,
                action: log.action,
                error_code: log.error_code,
                timestamp: log.timestamp,
            };

            self.logs.insert(record.id, record.clone());

            Ok(record)
        })
    }

    fn by_operator(&self, operator: ids::UserId, page: Page) -> BoxFuture<'_, api::Result<Vec<OperationLog>>> {
        Box::pin(async move {
            Ok(self.matching(page, |log| log.operator == operator))
        })
    }

    fn by_resource(&self, resource: SystemResource, page: Page) -> BoxFuture<'_, api::Result<Vec<OperationLog>>> {
        Box::pin(async move {
            Ok(self.matching(page, |log| log.resource == resource))
        })
    }
}
