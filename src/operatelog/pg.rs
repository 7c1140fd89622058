use deadpool_postgres::Pool;
use disk_lib::ids;
use disk_lib::query::Page;
use futures::future::BoxFuture;
use tokio_postgres::Row;

use crate::error::api;
use crate::sec::authz::{SystemResource, SystemResourceKind};

use super::{NewOperationLog, OperationLog, OperationLogRepository};

const COLUMNS: &str = "\
    id, \
    operator_id, \
    resource_id, \
    resource_kind, \
    action, \
    error_code, \
    operate_time";

impl OperationLog {
    /// `None` for a resource kind this build does not know of
    fn from_row(row: &Row) -> Option<Self> {
        let given: &str = row.get(3);

        let Some(kind) = SystemResourceKind::from_str(given) else {
            tracing::warn!("operation log {} has unknown resource kind \"{}\"", row.get::<_, i64>(0), given);

            return None;
        };

        Some(OperationLog {
            id: row.get(0),
            operator: row.get(1),
            resource: SystemResource::new(row.get(2), kind),
            action: row.get(4),
            error_code: row.get(5),
            timestamp: row.get(6),
        })
    }
}

#[derive(Debug, Clone)]
pub struct PgOperationLogRepository {
    pool: Pool,
}

impl PgOperationLogRepository {
    pub fn new(pool: Pool) -> Self {
        PgOperationLogRepository { pool }
    }
}

impl OperationLogRepository for PgOperationLogRepository {
    fn record(&self, log: NewOperationLog) -> BoxFuture<'_, api::Result<OperationLog>> {
        Box::pin(async move {
            let conn = self.pool.get().await?;

            let row = conn.query_one(
                "\
                insert into operation_logs ( \
                    operator_id, resource_id, resource_kind, action, error_code, operate_time \
                ) values ($1, $2, $3, $4, $5, $6) \
                returning id",
                &[
                    &log.operator,
                    &log.resource.id,
                    &log.resource.kind.as_str(),
                    &log.action,
                    &log.error_code,
                    &log.timestamp,
                ]
            ).await?;

            Ok(OperationLog {
                id: row.get(0),
                operator: log.operator,
                resource: log.resource,
                action: log.action,
                error_code: log.error_code,
                timestamp: log.timestamp,
            })
        })
    }

    fn by_operator(&self, operator: ids::UserId, page: Page) -> BoxFuture<'_, api::Result<Vec<OperationLog>>> {
        Box::pin(async move {
            let conn = self.pool.get().await?;
            let offset = page.limit.sql_offset(page.offset);
            let query = format!(
                "select {COLUMNS} from operation_logs \
                where operator_id = $1 \
                order by operate_time desc, id desc \
                limit $2 offset $3"
            );

            Ok(conn.query(query.as_str(), &[&operator, &page.limit, &offset])
                .await?
                .iter()
                .filter_map(OperationLog::from_row)
                .collect())
        })
    }

    fn by_resource(&self, resource: SystemResource, page: Page) -> BoxFuture<'_, api::Result<Vec<OperationLog>>> {
        Box::pin(async move {
            let conn = self.pool.get().await?;
            let offset = page.limit.sql_offset(page.offset);
            let query = format!(
                "select {COLUMNS} from operation_logs \
                where resource_id = $1 and resource_kind = $2 \
                order by operate_time desc, id desc \
                limit $3 offset $4"
            );

            Ok(conn.query(
                query.as_str(),
                &[&resource.id, &resource.kind.as_str(), &page.limit, &offset]
            )
                .await?
                .iter()
                .filter_map(OperationLog::from_row)
                .collect())
        })
    }
}
