use chrono::{DateTime, Utc};
use disk_lib::ids;
use disk_lib::query::Page;
use futures::future::BoxFuture;

use crate::error::api;
use crate::permission::Action;
use crate::sec::authz::SystemResource;

pub mod memory;
pub mod pg;

/// a guarded action taken by an operator on a resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationLog {
    pub id: ids::OperationLogId,
    pub operator: ids::UserId,
    pub resource: SystemResource,
    pub action: Action,
    /// business code of the error that stopped the action
    pub error_code: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl OperationLog {
    pub fn succeeded(&self) -> bool {
        self.error_code.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct NewOperationLog {
    pub operator: ids::UserId,
    pub resource: SystemResource,
    pub action: Action,
    pub error_code: Option<String>,
    pub timestamp: DateTime<Utc>,
}

pub trait OperationLogRepository: Send + Sync {
    fn record(&self, log: NewOperationLog) -> BoxFuture<'_, api::Result<OperationLog>>;

    /// newest first
    fn by_operator(&self, operator: ids::UserId, page: Page) -> BoxFuture<'_, api::Result<Vec<OperationLog>>>;

    /// newest first
    fn by_resource(&self, resource: SystemResource, page: Page) -> BoxFuture<'_, api::Result<Vec<OperationLog>>>;
}
