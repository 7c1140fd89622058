use chrono::Utc;
use deadpool_postgres::{GenericClient, Pool};
use futures::future::BoxFuture;
use tokio_postgres::Error as PgError;

use crate::error::api;
use crate::sql::PgJson;

use super::{Statistics, StatisticsValue, StatisticsRepository};

impl Statistics {
    pub async fn retrieve_key(
        conn: &impl GenericClient,
        key: &str,
    ) -> Result<Option<Self>, PgError> {
        Ok(conn.query_opt(
            "select id, key, value, created, updated from statistics where key = $1",
            &[&key]
        )
            .await?
            .map(|row| {
                let PgJson(value): PgJson<StatisticsValue> = row.get(2);

                Statistics {
                    id: row.get(0),
                    key: row.get(1),
                    value,
                    created: row.get(3),
                    updated: row.get(4),
                }
            }))
    }
}

#[derive(Debug, Clone)]
pub struct PgStatisticsRepository {
    pool: Pool,
}

impl PgStatisticsRepository {
    pub fn new(pool: Pool) -> Self {
        PgStatisticsRepository { pool }
    }
}

impl StatisticsRepository for PgStatisticsRepository {
    fn find_by_key<'a>(&'a self, key: &'a str) -> BoxFuture<'a, api::Result<Option<Statistics>>> {
        Box::pin(async move {
            let conn = self.pool.get().await?;

            Ok(Statistics::retrieve_key(&conn, key).await?)
        })
    }

    fn create(&self, key: String, value: StatisticsValue) -> BoxFuture<'_, api::Result<Statistics>> {
        Box::pin(async move {
            let conn = self.pool.get().await?;
            let now = Utc::now();
            let json = PgJson(&value);

            let result = conn.query_one(
                "\
                insert into statistics (key, value, created, updated) \
                values ($1, $2, $3, $3) \
                returning id",
                &[&key, &json, &now]
            ).await;

            let row = match result {
                Ok(row) => row,
                Err(err) => if crate::sql::unique_constraint_error(&err).is_some() {
                    return Err(api::Error::api(api::GeneralKind::AlreadyExists)
                        .context(format!("statistics \"{key}\" already exist")));
                } else {
                    return Err(err.into());
                }
            };

            Ok(Statistics {
                id: row.get(0),
                key,
                value,
                created: now,
                updated: now,
            })
        })
    }

    fn update<'a>(&'a self, statistics: &'a Statistics) -> BoxFuture<'a, api::Result<()>> {
        Box::pin(async move {
            let conn = self.pool.get().await?;
            let json = PgJson(&statistics.value);

            let count = conn.execute(
                "update statistics set value = $2, updated = $3 where id = $1",
                &[&statistics.id, &json, &statistics.updated]
            ).await?;

            if count == 0 {
                return Err(api::Error::api(api::GeneralKind::NotFound)
                    .context(format!("statistics \"{}\" not found", statistics.key)));
            }

            Ok(())
        })
    }
}
