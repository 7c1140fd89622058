use chrono::Utc;
use deadpool_postgres::{GenericClient, Pool};
use disk_lib::ids;
use futures::future::BoxFuture;
use tokio_postgres::{Error as PgError, Row};

use crate::error::api;
use crate::storage::StorageIdentity;

use super::{
    FavoriteGroup,
    FavoriteItem,
    FavoriteRepository,
    NewFavoriteGroup,
    NewFavoriteItem,
};

const GROUP_COLUMNS: &str = "id, name, user_id, public, created, updated, deleted";

const ITEM_COLUMNS: &str = "\
    id, \
    group_id, \
    user_id, \
    storage_id, \
    storage_type, \
    created, \
    updated, \
    deleted";

impl FavoriteGroup {
    fn from_row(row: &Row) -> Self {
        FavoriteGroup {
            id: row.get(0),
            name: row.get(1),
            user_id: row.get(2),
            public: row.get(3),
            created: row.get(4),
            updated: row.get(5),
            deleted: row.get(6),
        }
    }

    pub async fn retrieve(
        conn: &impl GenericClient,
        id: &ids::FavoriteGroupId,
    ) -> Result<Option<Self>, PgError> {
        let query = format!("select {GROUP_COLUMNS} from favorite_groups where id = $1");

        Ok(conn.query_opt(query.as_str(), &[id])
            .await?
            .map(|row| Self::from_row(&row)))
    }
}

impl FavoriteItem {
    fn from_row(row: &Row) -> Self {
        FavoriteItem {
            id: row.get(0),
            group_id: row.get(1),
            user_id: row.get(2),
            identity: StorageIdentity::new(row.get(3), row.get(4)),
            created: row.get(5),
            updated: row.get(6),
            deleted: row.get(7),
        }
    }

    pub async fn retrieve(
        conn: &impl GenericClient,
        id: &ids::FavoriteItemId,
    ) -> Result<Option<Self>, PgError> {
        let query = format!("select {ITEM_COLUMNS} from favorite_items where id = $1");

        Ok(conn.query_opt(query.as_str(), &[id])
            .await?
            .map(|row| Self::from_row(&row)))
    }
}

#[derive(Debug, Clone)]
pub struct PgFavoriteRepository {
    pool: Pool,
}

impl PgFavoriteRepository {
    pub fn new(pool: Pool) -> Self {
        PgFavoriteRepository { pool }
    }
}

impl FavoriteRepository for PgFavoriteRepository {
    fn find_group(&self, id: ids::FavoriteGroupId) -> BoxFuture<'_, api::Result<Option<FavoriteGroup>>> {
        Box::pin(async move {
            let conn = self.pool.get().await?;

            Ok(FavoriteGroup::retrieve(&conn, &id).await?)
        })
    }

    fn find_group_by_name<'a>(
        &'a self,
        user_id: ids::UserId,
        name: &'a str
    ) -> BoxFuture<'a, api::Result<Option<FavoriteGroup>>> {
        Box::pin(async move {
            let conn = self.pool.get().await?;
            let query = format!(
                "select {GROUP_COLUMNS} from favorite_groups \
                where user_id = $1 and name = $2 and not deleted"
            );

            Ok(conn.query_opt(query.as_str(), &[&user_id, &name])
                .await?
                .map(|row| FavoriteGroup::from_row(&row)))
        })
    }

    fn groups_of(&self, user_id: ids::UserId) -> BoxFuture<'_, api::Result<Vec<FavoriteGroup>>> {
        Box::pin(async move {
            let conn = self.pool.get().await?;
            let query = format!(
                "select {GROUP_COLUMNS} from favorite_groups \
                where user_id = $1 and not deleted \
                order by id"
            );

            Ok(conn.query(query.as_str(), &[&user_id])
                .await?
                .iter()
                .map(FavoriteGroup::from_row)
                .collect())
        })
    }

    fn create_group(&self, group: NewFavoriteGroup) -> BoxFuture<'_, api::Result<FavoriteGroup>> {
        Box::pin(async move {
            let mut conn = self.pool.get().await?;
            let transaction = conn.transaction().await?;

            let existing = transaction.query_opt(
                "select id from favorite_groups where user_id = $1 and name = $2 and not deleted",
                &[&group.user_id, &group.name]
            ).await?;

            if existing.is_some() {
                return Err(api::Error::api(api::FavoriteKind::Existed));
            }

            let now = Utc::now();
            let row = transaction.query_one(
                "\
                insert into favorite_groups (name, user_id, public, created, updated) \
                values ($1, $2, $3, $4, $4) \
                returning id",
                &[&group.name, &group.user_id, &group.public, &now]
            ).await?;

            transaction.commit().await?;

            Ok(FavoriteGroup {
                id: row.get(0),
                name: group.name,
                user_id: group.user_id,
                public: group.public,
                created: now,
                updated: now,
                deleted: false,
            })
        })
    }

    fn update_group<'a>(&'a self, group: &'a FavoriteGroup) -> BoxFuture<'a, api::Result<()>> {
        Box::pin(async move {
            let conn = self.pool.get().await?;
            let count = conn.execute(
                "\
                update favorite_groups \
                set name = $2, public = $3, updated = $4, deleted = $5 \
                where id = $1",
                &[&group.id, &group.name, &group.public, &group.updated, &group.deleted]
            ).await?;

            if count == 0 {
                return Err(api::Error::api(api::FavoriteKind::NotFound));
            }

            Ok(())
        })
    }

    fn find_item(&self, id: ids::FavoriteItemId) -> BoxFuture<'_, api::Result<Option<FavoriteItem>>> {
        Box::pin(async move {
            let conn = self.pool.get().await?;

            Ok(FavoriteItem::retrieve(&conn, &id).await?)
        })
    }

    fn find_item_by(
        &self,
        group_id: ids::FavoriteGroupId,
        user_id: ids::UserId,
        identity: StorageIdentity,
    ) -> BoxFuture<'_, api::Result<Option<FavoriteItem>>> {
        Box::pin(async move {
            let conn = self.pool.get().await?;
            let query = format!(
                "select {ITEM_COLUMNS} from favorite_items \
                where group_id = $1 and user_id = $2 and storage_id = $3 and storage_type = $4"
            );

            Ok(conn.query_opt(
                query.as_str(),
                &[&group_id, &user_id, &identity.storage_id, &identity.storage_type]
            )
                .await?
                .map(|row| FavoriteItem::from_row(&row)))
        })
    }

    fn items_of(
        &self,
        group_id: ids::FavoriteGroupId,
        user_id: ids::UserId
    ) -> BoxFuture<'_, api::Result<Vec<FavoriteItem>>> {
        Box::pin(async move {
            let conn = self.pool.get().await?;
            let query = format!(
                "select {ITEM_COLUMNS} from favorite_items \
                where group_id = $1 and user_id = $2 and not deleted \
                order by id"
            );

            Ok(conn.query(query.as_str(), &[&group_id, &user_id])
                .await?
                .iter()
                .map(FavoriteItem::from_row)
                .collect())
        })
    }

    fn create_item(&self, item: NewFavoriteItem) -> BoxFuture<'_, api::Result<FavoriteItem>> {
        Box::pin(async move {
            let conn = self.pool.get().await?;
            let now = Utc::now();

            let row = conn.query_opt(
                "\
                insert into favorite_items ( \
                    group_id, user_id, storage_id, storage_type, created, updated \
                ) values ($1, $2, $3, $4, $5, $5) \
                on conflict (group_id, user_id, storage_id, storage_type) do nothing \
                returning id",
                &[
                    &item.group_id,
                    &item.user_id,
                    &item.identity.storage_id,
                    &item.identity.storage_type,
                    &now,
                ]
            ).await?;

            let Some(row) = row else {
                return Err(api::Error::api(api::FavoriteKind::ItemExisted));
            };

            Ok(FavoriteItem {
                id: row.get(0),
                group_id: item.group_id,
                user_id: item.user_id,
                identity: item.identity,
                created: now,
                updated: now,
                deleted: false,
            })
        })
    }

    fn update_item<'a>(&'a self, item: &'a FavoriteItem) -> BoxFuture<'a, api::Result<()>> {
        Box::pin(async move {
            let conn = self.pool.get().await?;
            let count = conn.execute(
                "update favorite_items set updated = $2, deleted = $3 where id = $1",
                &[&item.id, &item.updated, &item.deleted]
            ).await?;

            if count == 0 {
                return Err(api::Error::api(api::FavoriteKind::NotFound));
            }

            Ok(())
        })
    }
}
