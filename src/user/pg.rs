use chrono::Utc;
use deadpool_postgres::{GenericClient, Pool};
use disk_lib::ids;
use futures::future::BoxFuture;
use tokio_postgres::{Error as PgError, Row};

use crate::error::api;
use crate::sql;

use super::{User, UserRepository, check_username};

impl User {
    fn from_row(row: &Row) -> Self {
        User {
            id: row.get(0),
            username: row.get(1),
            created: row.get(2),
            updated: row.get(3),
        }
    }

    pub async fn retrieve(
        conn: &impl GenericClient,
        id: &ids::UserId,
    ) -> Result<Option<Self>, PgError> {
        Ok(conn.query_opt(
            "select id, username, created, updated from users where id = $1",
            &[id]
        )
            .await?
            .map(|row| Self::from_row(&row)))
    }

    pub async fn retrieve_username(
        conn: &impl GenericClient,
        username: &str,
    ) -> Result<Option<Self>, PgError> {
        Ok(conn.query_opt(
            "select id, username, created, updated from users where username = $1",
            &[&username]
        )
            .await?
            .map(|row| Self::from_row(&row)))
    }
}

#[derive(Debug, Clone)]
pub struct PgUserRepository {
    pool: Pool,
}

impl PgUserRepository {
    pub fn new(pool: Pool) -> Self {
        PgUserRepository { pool }
    }
}

impl UserRepository for PgUserRepository {
    fn find(&self, id: ids::UserId) -> BoxFuture<'_, api::Result<Option<User>>> {
        Box::pin(async move {
            let conn = self.pool.get().await?;

            Ok(User::retrieve(&conn, &id).await?)
        })
    }

    fn find_by_username<'a>(&'a self, username: &'a str) -> BoxFuture<'a, api::Result<Option<User>>> {
        Box::pin(async move {
            let conn = self.pool.get().await?;

            Ok(User::retrieve_username(&conn, username).await?)
        })
    }

    fn create<'a>(&'a self, username: &'a str) -> BoxFuture<'a, api::Result<User>> {
        Box::pin(async move {
            check_username(username)?;

            let conn = self.pool.get().await?;
            let created = Utc::now();

            let result = conn.query_one(
                "insert into users (username, created) values ($1, $2) returning id",
                &[&username, &created]
            ).await;

            match result {
                Ok(row) => Ok(User {
                    id: row.get(0),
                    username: username.to_owned(),
                    created,
                    updated: None,
                }),
                Err(err) => if sql::unique_constraint_error(&err).is_some() {
                    Err(api::Error::api(api::UserKind::UsernameExisted))
                } else {
                    Err(err.into())
                }
            }
        })
    }
}
