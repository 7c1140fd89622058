use chrono::Utc;
use deadpool_postgres::{GenericClient, Pool};
use disk_lib::ids;
use disk_lib::query::Page;
use futures::future::BoxFuture;
use tokio_postgres::{Error as PgError, Row};

use crate::error::api;
use crate::storage::StorageIdentity;

use super::{NewShare, UserShare, ShareRepository};

const COLUMNS: &str = "\
    id, \
    share_code, \
    storage_id, \
    storage_type, \
    user_id, \
    password, \
    expire_time, \
    created, \
    updated";

impl UserShare {
    fn from_row(row: &Row) -> Self {
        UserShare {
            id: row.get(0),
            share_code: row.get(1),
            identity: StorageIdentity::new(row.get(2), row.get(3)),
            user_id: row.get(4),
            password: row.get(5),
            expire_time: row.get(6),
            created: row.get(7),
            updated: row.get(8),
        }
    }

    pub async fn retrieve(
        conn: &impl GenericClient,
        id: &ids::ShareId,
    ) -> Result<Option<Self>, PgError> {
        let query = format!("select {COLUMNS} from user_shares where id = $1");

        Ok(conn.query_opt(query.as_str(), &[id])
            .await?
            .map(|row| Self::from_row(&row)))
    }

    pub async fn retrieve_code(
        conn: &impl GenericClient,
        code: &str,
    ) -> Result<Option<Self>, PgError> {
        let query = format!("select {COLUMNS} from user_shares where share_code = $1");

        Ok(conn.query_opt(query.as_str(), &[&code])
            .await?
            .map(|row| Self::from_row(&row)))
    }
}

#[derive(Debug, Clone)]
pub struct PgShareRepository {
    pool: Pool,
}

impl PgShareRepository {
    pub fn new(pool: Pool) -> Self {
        PgShareRepository { pool }
    }
}

impl ShareRepository for PgShareRepository {
    fn find(&self, id: ids::ShareId) -> BoxFuture<'_, api::Result<Option<UserShare>>> {
        Box::pin(async move {
            let conn = self.pool.get().await?;

            Ok(UserShare::retrieve(&conn, &id).await?)
        })
    }

    fn find_by_code<'a>(&'a self, code: &'a str) -> BoxFuture<'a, api::Result<Option<UserShare>>> {
        Box::pin(async move {
            let conn = self.pool.get().await?;

            Ok(UserShare::retrieve_code(&conn, code).await?)
        })
    }

    fn by_user(&self, user_id: ids::UserId, page: Page) -> BoxFuture<'_, api::Result<Vec<UserShare>>> {
        Box::pin(async move {
            let conn = self.pool.get().await?;
            let offset = page.limit.sql_offset(page.offset);
            let query = format!(
                "select {COLUMNS} from user_shares \
                where user_id = $1 \
                order by created desc, id desc \
                limit $2 offset $3"
            );

            Ok(conn.query(query.as_str(), &[&user_id, &page.limit, &offset])
                .await?
                .iter()
                .map(UserShare::from_row)
                .collect())
        })
    }

    fn create(&self, share: NewShare) -> BoxFuture<'_, api::Result<UserShare>> {
        Box::pin(async move {
            let conn = self.pool.get().await?;
            let now = Utc::now();

            let row = conn.query_one(
                "\
                insert into user_shares ( \
                    share_code, storage_id, storage_type, user_id, \
                    password, expire_time, created, updated \
                ) values ($1, $2, $3, $4, $5, $6, $7, $7) \
                returning id",
                &[
                    &share.share_code,
                    &share.identity.storage_id,
                    &share.identity.storage_type,
                    &share.user_id,
                    &share.password,
                    &share.expire_time,
                    &now,
                ]
            ).await?;

            Ok(UserShare {
                id: row.get(0),
                share_code: share.share_code,
                identity: share.identity,
                user_id: share.user_id,
                password: share.password,
                expire_time: share.expire_time,
                created: now,
                updated: now,
            })
        })
    }

    fn update<'a>(&'a self, share: &'a UserShare) -> BoxFuture<'a, api::Result<()>> {
        Box::pin(async move {
            let conn = self.pool.get().await?;
            let count = conn.execute(
                "\
                update user_shares \
                set password = $2, expire_time = $3, updated = $4 \
                where id = $1",
                &[
                    &share.id,
                    &share.password,
                    &share.expire_time,
                    &share.updated,
                ]
            ).await?;

            if count == 0 {
                return Err(api::Error::api(api::ShareKind::NotFound));
            }

            Ok(())
        })
    }
}
