use chrono::Utc;
use deadpool_postgres::{GenericClient, Pool};
use disk_lib::ids;
use futures::future::BoxFuture;
use tokio_postgres::{Error as PgError, Row};

use crate::error::api;
use crate::sql;

use super::{TagGroup, ContentTag, TagRepository};

impl TagGroup {
    fn from_row(row: &Row) -> Self {
        TagGroup {
            id: row.get(0),
            name: row.get(1),
            description: row.get(2),
            tags: Vec::new(),
            created: row.get(3),
            updated: row.get(4),
        }
    }

    async fn with_tags(
        conn: &impl GenericClient,
        mut group: TagGroup
    ) -> Result<Self, PgError> {
        group.tags = ContentTag::retrieve_group(conn, &group.id).await?;

        Ok(group)
    }

    pub async fn retrieve(
        conn: &impl GenericClient,
        id: &ids::TagGroupId,
    ) -> Result<Option<Self>, PgError> {
        let Some(row) = conn.query_opt(
            "select id, name, description, created, updated from tag_groups where id = $1",
            &[id]
        ).await? else {
            return Ok(None);
        };

        Ok(Some(Self::with_tags(conn, Self::from_row(&row)).await?))
    }

    pub async fn retrieve_name(
        conn: &impl GenericClient,
        name: &str,
    ) -> Result<Option<Self>, PgError> {
        let Some(row) = conn.query_opt(
            "select id, name, description, created, updated from tag_groups where name = $1",
            &[&name]
        ).await? else {
            return Ok(None);
        };

        Ok(Some(Self::with_tags(conn, Self::from_row(&row)).await?))
    }
}

impl ContentTag {
    pub async fn retrieve_group(
        conn: &impl GenericClient,
        group_id: &ids::TagGroupId,
    ) -> Result<Vec<Self>, PgError> {
        Ok(conn.query(
            "select id, group_id, name, created from content_tags where group_id = $1 order by id",
            &[group_id]
        )
            .await?
            .into_iter()
            .map(|row| ContentTag {
                id: row.get(0),
                group_id: row.get(1),
                name: row.get(2),
                created: row.get(3),
            })
            .collect())
    }
}

#[derive(Debug, Clone)]
pub struct PgTagRepository {
    pool: Pool,
}

impl PgTagRepository {
    pub fn new(pool: Pool) -> Self {
        PgTagRepository { pool }
    }
}

impl TagRepository for PgTagRepository {
    fn find_group(&self, id: ids::TagGroupId) -> BoxFuture<'_, api::Result<Option<TagGroup>>> {
        Box::pin(async move {
            let conn = self.pool.get().await?;

            Ok(TagGroup::retrieve(&conn, &id).await?)
        })
    }

    fn find_group_by_name<'a>(&'a self, name: &'a str) -> BoxFuture<'a, api::Result<Option<TagGroup>>> {
        Box::pin(async move {
            let conn = self.pool.get().await?;

            Ok(TagGroup::retrieve_name(&conn, name).await?)
        })
    }

    fn groups(&self) -> BoxFuture<'_, api::Result<Vec<TagGroup>>> {
        Box::pin(async move {
            let conn = self.pool.get().await?;
            let rows = conn.query(
                "select id, name, description, created, updated from tag_groups order by id",
                &[]
            ).await?;

            let mut rtn = Vec::with_capacity(rows.len());

            for row in rows {
                rtn.push(TagGroup::with_tags(&conn, TagGroup::from_row(&row)).await?);
            }

            Ok(rtn)
        })
    }

    fn create_group(&self, name: String, description: String) -> BoxFuture<'_, api::Result<TagGroup>> {
        Box::pin(async move {
            let conn = self.pool.get().await?;
            let created = Utc::now();

            let result = conn.query_one(
                "\
                insert into tag_groups (name, description, created) \
                values ($1, $2, $3) \
                returning id",
                &[&name, &description, &created]
            ).await;

            match result {
                Ok(row) => Ok(TagGroup {
                    id: row.get(0),
                    name,
                    description,
                    tags: Vec::new(),
                    created,
                    updated: None,
                }),
                Err(err) => if sql::unique_constraint_error(&err).is_some() {
                    Err(api::Error::api(api::TagKind::GroupExisted))
                } else {
                    Err(err.into())
                }
            }
        })
    }

    fn delete_group(&self, id: ids::TagGroupId) -> BoxFuture<'_, api::Result<Option<TagGroup>>> {
        Box::pin(async move {
            let mut conn = self.pool.get().await?;
            let transaction = conn.transaction().await?;

            let Some(found) = TagGroup::retrieve(&transaction, &id).await? else {
                return Ok(None);
            };

            transaction.execute("delete from tag_groups where id = $1", &[&id]).await?;
            transaction.commit().await?;

            Ok(Some(found))
        })
    }

    fn create_tag(&self, group_id: ids::TagGroupId, name: String) -> BoxFuture<'_, api::Result<ContentTag>> {
        Box::pin(async move {
            let mut conn = self.pool.get().await?;
            let transaction = conn.transaction().await?;
            let created = Utc::now();

            let count = transaction.execute(
                "update tag_groups set updated = $2 where id = $1",
                &[&group_id, &created]
            ).await?;

            if count == 0 {
                return Err(api::Error::api(api::TagKind::GroupNotFound));
            }

            let result = transaction.query_one(
                "\
                insert into content_tags (group_id, name, created) \
                values ($1, $2, $3) \
                returning id",
                &[&group_id, &name, &created]
            ).await;

            let row = match result {
                Ok(row) => row,
                Err(err) => return if sql::unique_constraint_error(&err).is_some() {
                    Err(api::Error::api(api::TagKind::TagExisted))
                } else {
                    Err(err.into())
                }
            };

            transaction.commit().await?;

            Ok(ContentTag {
                id: row.get(0),
                group_id,
                name,
                created,
            })
        })
    }

    fn delete_tag(&self, group_id: ids::TagGroupId, tag_id: ids::TagId) -> BoxFuture<'_, api::Result<bool>> {
        Box::pin(async move {
            let conn = self.pool.get().await?;
            let count = conn.execute(
                "delete from content_tags where id = $1 and group_id = $2",
                &[&tag_id, &group_id]
            ).await?;

            Ok(count > 0)
        })
    }
}
