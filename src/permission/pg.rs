use deadpool_postgres::{GenericClient, Pool};
use disk_lib::ids;
use futures::future::BoxFuture;
use tokio_postgres::{Error as PgError, Row};

use crate::error::api::{self, Context};
use crate::storage::StorageIdentity;

use super::{StoragePermission, StorageUserPermission, StoragePermissionRepository};

impl StoragePermission {
    fn from_row(row: &Row) -> Self {
        StoragePermission {
            id: row.get(0),
            identity: StorageIdentity::new(row.get(1), row.get(2)),
            public_permission: row.get(3),
            created: row.get(4),
            updated: row.get(5),
            deleted: row.get(6),
        }
    }

    pub async fn retrieve(
        conn: &impl GenericClient,
        identity: &StorageIdentity,
    ) -> Result<Option<Self>, PgError> {
        Ok(conn.query_opt(
            "\
            select id, storage_id, storage_type, public_permission, created, updated, deleted \
            from storage_permissions \
            where storage_id = $1 and storage_type = $2",
            &[&identity.storage_id, &identity.storage_type]
        )
            .await?
            .map(|row| Self::from_row(&row)))
    }
}

const USER_COLUMNS: &str = "\
    id, \
    permission_id, \
    storage_id, \
    storage_type, \
    user_id, \
    permission_types, \
    created, \
    updated, \
    deleted";

impl StorageUserPermission {
    fn from_row(row: &Row) -> Self {
        StorageUserPermission {
            id: row.get(0),
            permission_id: row.get(1),
            identity: StorageIdentity::new(row.get(2), row.get(3)),
            user_id: row.get(4),
            permission_types: row.get(5),
            created: row.get(6),
            updated: row.get(7),
            deleted: row.get(8),
        }
    }

    pub async fn retrieve(
        conn: &impl GenericClient,
        identity: &StorageIdentity,
        user_id: &ids::UserId,
    ) -> Result<Option<Self>, PgError> {
        let query = format!(
            "select {USER_COLUMNS} from storage_user_permissions \
            where storage_id = $1 and storage_type = $2 and user_id = $3"
        );

        Ok(conn.query_opt(
            query.as_str(),
            &[&identity.storage_id, &identity.storage_type, user_id]
        )
            .await?
            .map(|row| Self::from_row(&row)))
    }

    pub async fn retrieve_storage(
        conn: &impl GenericClient,
        identity: &StorageIdentity,
    ) -> Result<Vec<Self>, PgError> {
        let query = format!(
            "select {USER_COLUMNS} from storage_user_permissions \
            where storage_id = $1 and storage_type = $2 \
            order by id"
        );

        Ok(conn.query(query.as_str(), &[&identity.storage_id, &identity.storage_type])
            .await?
            .iter()
            .map(Self::from_row)
            .collect())
    }
}

#[derive(Debug, Clone)]
pub struct PgPermissionRepository {
    pool: Pool,
}

impl PgPermissionRepository {
    pub fn new(pool: Pool) -> Self {
        PgPermissionRepository { pool }
    }
}

impl StoragePermissionRepository for PgPermissionRepository {
    fn find(&self, identity: StorageIdentity) -> BoxFuture<'_, api::Result<Option<StoragePermission>>> {
        Box::pin(async move {
            let conn = self.pool.get().await?;

            Ok(StoragePermission::retrieve(&conn, &identity).await?)
        })
    }

    fn create(&self, permission: StoragePermission) -> BoxFuture<'_, api::Result<StoragePermission>> {
        Box::pin(async move {
            let conn = self.pool.get().await?;

            conn.execute(
                "\
                insert into storage_permissions ( \
                    storage_id, storage_type, public_permission, created, updated, deleted \
                ) values ($1, $2, $3, $4, $5, $6) \
                on conflict (storage_id, storage_type) do nothing",
                &[
                    &permission.identity.storage_id,
                    &permission.identity.storage_type,
                    &permission.public_permission,
                    &permission.created,
                    &permission.updated,
                    &permission.deleted,
                ]
            ).await?;

            StoragePermission::retrieve(&conn, &permission.identity)
                .await?
                .context("storage permission missing after insert")
        })
    }

    fn update<'a>(&'a self, permission: &'a StoragePermission) -> BoxFuture<'a, api::Result<()>> {
        Box::pin(async move {
            let conn = self.pool.get().await?;
            let count = conn.execute(
                "\
                update storage_permissions \
                set public_permission = $2, updated = $3, deleted = $4 \
                where id = $1",
                &[
                    &permission.id,
                    &permission.public_permission,
                    &permission.updated,
                    &permission.deleted,
                ]
            ).await?;

            if count == 0 {
                return Err(api::Error::api(api::PermissionKind::NotFound));
            }

            Ok(())
        })
    }

    fn find_user(
        &self,
        identity: StorageIdentity,
        user_id: ids::UserId
    ) -> BoxFuture<'_, api::Result<Option<StorageUserPermission>>> {
        Box::pin(async move {
            let conn = self.pool.get().await?;

            Ok(StorageUserPermission::retrieve(&conn, &identity, &user_id).await?)
        })
    }

    fn users(&self, identity: StorageIdentity) -> BoxFuture<'_, api::Result<Vec<StorageUserPermission>>> {
        Box::pin(async move {
            let conn = self.pool.get().await?;

            Ok(StorageUserPermission::retrieve_storage(&conn, &identity).await?)
        })
    }

    fn create_user(&self, mut permission: StorageUserPermission) -> BoxFuture<'_, api::Result<StorageUserPermission>> {
        Box::pin(async move {
            let conn = self.pool.get().await?;
            let result = conn.query_one(
                "\
                insert into storage_user_permissions ( \
                    permission_id, storage_id, storage_type, user_id, \
                    permission_types, created, updated, deleted \
                ) values ($1, $2, $3, $4, $5, $6, $7, $8) \
                returning id",
                &[
                    &permission.permission_id,
                    &permission.identity.storage_id,
                    &permission.identity.storage_type,
                    &permission.user_id,
                    &permission.permission_types,
                    &permission.created,
                    &permission.updated,
                    &permission.deleted,
                ]
            ).await;

            match result {
                Ok(row) => {
                    permission.id = row.get(0);

                    Ok(permission)
                }
                Err(err) => if crate::sql::unique_constraint_error(&err).is_some() {
                    Err(api::Error::api(api::PermissionKind::AlreadyExist))
                } else {
                    Err(err.into())
                }
            }
        })
    }

    fn update_user<'a>(&'a self, permission: &'a StorageUserPermission) -> BoxFuture<'a, api::Result<()>> {
        Box::pin(async move {
            let conn = self.pool.get().await?;
            let count = conn.execute(
                "\
                update storage_user_permissions \
                set permission_types = $2, updated = $3, deleted = $4 \
                where id = $1",
                &[
                    &permission.id,
                    &permission.permission_types,
                    &permission.updated,
                    &permission.deleted,
                ]
            ).await?;

            if count == 0 {
                return Err(api::Error::api(api::PermissionKind::NotFound));
            }

            Ok(())
        })
    }
}
