use chrono::Utc;
use deadpool_postgres::{GenericClient, Pool};
use disk_lib::ids;
use disk_lib::query::Page;
use futures::future::BoxFuture;
use tokio_postgres::{Error as PgError, Row};

use crate::error::api;
use crate::sql::PgJson;
use crate::storage::StorageOwner;

use super::{GroupSettings, NewUserGroup, UserGroup, UserGroupMember, UserGroupRepository};

const GROUP_COLUMNS: &str = "id, name, description, settings, created, updated, deleted";

const MEMBER_COLUMNS: &str = "id, group_id, owner_id, owner_type, created, updated, deleted";

impl UserGroup {
    fn from_row(row: &Row) -> Self {
        let PgJson(settings): PgJson<GroupSettings> = row.get(3);

        UserGroup {
            id: row.get(0),
            name: row.get(1),
            description: row.get(2),
            settings,
            created: row.get(4),
            updated: row.get(5),
            deleted: row.get(6),
        }
    }

    pub async fn retrieve(
        conn: &impl GenericClient,
        id: &ids::UserGroupId,
    ) -> Result<Option<Self>, PgError> {
        let query = format!("select {GROUP_COLUMNS} from user_groups where id = $1");

        Ok(conn.query_opt(query.as_str(), &[id])
            .await?
            .map(|row| Self::from_row(&row)))
    }
}

impl UserGroupMember {
    fn from_row(row: &Row) -> Self {
        UserGroupMember {
            id: row.get(0),
            group_id: row.get(1),
            member: StorageOwner::new(row.get(2), row.get(3)),
            created: row.get(4),
            updated: row.get(5),
            deleted: row.get(6),
        }
    }

    pub async fn retrieve_member(
        conn: &impl GenericClient,
        member: &StorageOwner,
    ) -> Result<Option<Self>, PgError> {
        let query = format!(
            "select {MEMBER_COLUMNS} from user_group_members \
            where owner_id = $1 and owner_type = $2"
        );

        Ok(conn.query_opt(query.as_str(), &[&member.owner_id, &member.owner_type])
            .await?
            .map(|row| Self::from_row(&row)))
    }
}

#[derive(Debug, Clone)]
pub struct PgUserGroupRepository {
    pool: Pool,
}

impl PgUserGroupRepository {
    pub fn new(pool: Pool) -> Self {
        PgUserGroupRepository { pool }
    }
}

impl UserGroupRepository for PgUserGroupRepository {
    fn find_group(&self, id: ids::UserGroupId) -> BoxFuture<'_, api::Result<Option<UserGroup>>> {
        Box::pin(async move {
            let conn = self.pool.get().await?;

            Ok(UserGroup::retrieve(&conn, &id).await?)
        })
    }

    fn find_group_by_name<'a>(&'a self, name: &'a str) -> BoxFuture<'a, api::Result<Option<UserGroup>>> {
        Box::pin(async move {
            let conn = self.pool.get().await?;
            let query = format!("select {GROUP_COLUMNS} from user_groups where name = $1");

            Ok(conn.query_opt(query.as_str(), &[&name])
                .await?
                .map(|row| UserGroup::from_row(&row)))
        })
    }

    fn groups(&self, page: Page) -> BoxFuture<'_, api::Result<Vec<UserGroup>>> {
        Box::pin(async move {
            let conn = self.pool.get().await?;
            let offset = page.limit.sql_offset(page.offset);
            let query = format!(
                "select {GROUP_COLUMNS} from user_groups \
                where not deleted \
                order by id \
                limit $1 offset $2"
            );

            Ok(conn.query(query.as_str(), &[&page.limit, &offset])
                .await?
                .iter()
                .map(UserGroup::from_row)
                .collect())
        })
    }

    fn create_group(&self, group: NewUserGroup) -> BoxFuture<'_, api::Result<UserGroup>> {
        Box::pin(async move {
            let conn = self.pool.get().await?;
            let now = Utc::now();
            let settings = PgJson(&group.settings);

            let result = conn.query_one(
                "\
                insert into user_groups (name, description, settings, created, updated) \
                values ($1, $2, $3, $4, $4) \
                returning id",
                &[&group.name, &group.description, &settings, &now]
            ).await;

            let row = match result {
                Ok(row) => row,
                Err(err) => if crate::sql::unique_constraint_error(&err).is_some() {
                    return Err(api::Error::api(api::UserGroupKind::NameExisted));
                } else {
                    return Err(err.into());
                }
            };

            Ok(UserGroup {
                id: row.get(0),
                name: group.name,
                description: group.description,
                settings: group.settings,
                created: now,
                updated: now,
                deleted: false,
            })
        })
    }

    fn update_group<'a>(&'a self, group: &'a UserGroup) -> BoxFuture<'a, api::Result<()>> {
        Box::pin(async move {
            let conn = self.pool.get().await?;
            let settings = PgJson(&group.settings);
            let count = conn.execute(
                "\
                update user_groups \
                set name = $2, description = $3, settings = $4, updated = $5, deleted = $6 \
                where id = $1",
                &[
                    &group.id,
                    &group.name,
                    &group.description,
                    &settings,
                    &group.updated,
                    &group.deleted,
                ]
            ).await?;

            if count == 0 {
                return Err(api::Error::api(api::UserGroupKind::NotFound));
            }

            Ok(())
        })
    }

    fn find_member(&self, member: StorageOwner) -> BoxFuture<'_, api::Result<Option<UserGroupMember>>> {
        Box::pin(async move {
            let conn = self.pool.get().await?;

            Ok(UserGroupMember::retrieve_member(&conn, &member).await?)
        })
    }

    fn members_of(&self, group_id: ids::UserGroupId) -> BoxFuture<'_, api::Result<Vec<UserGroupMember>>> {
        Box::pin(async move {
            let conn = self.pool.get().await?;
            let query = format!(
                "select {MEMBER_COLUMNS} from user_group_members \
                where group_id = $1 and not deleted \
                order by id"
            );

            Ok(conn.query(query.as_str(), &[&group_id])
                .await?
                .iter()
                .map(UserGroupMember::from_row)
                .collect())
        })
    }

    fn create_member(
        &self,
        group_id: ids::UserGroupId,
        member: StorageOwner
    ) -> BoxFuture<'_, api::Result<UserGroupMember>> {
        Box::pin(async move {
            let conn = self.pool.get().await?;
            let now = Utc::now();

            let row = conn.query_opt(
                "\
                insert into user_group_members ( \
                    group_id, owner_id, owner_type, created, updated \
                ) values ($1, $2, $3, $4, $4) \
                on conflict (owner_id, owner_type) do nothing \
                returning id",
                &[&group_id, &member.owner_id, &member.owner_type, &now]
            ).await?;

            let Some(row) = row else {
                return Err(api::Error::api(api::UserGroupKind::MemberExisted));
            };

            Ok(UserGroupMember {
                id: row.get(0),
                group_id,
                member,
                created: now,
                updated: now,
                deleted: false,
            })
        })
    }

    fn update_member<'a>(&'a self, member: &'a UserGroupMember) -> BoxFuture<'a, api::Result<()>> {
        Box::pin(async move {
            let conn = self.pool.get().await?;
            let count = conn.execute(
                "update user_group_members set group_id = $2, updated = $3, deleted = $4 where id = $1",
                &[&member.id, &member.group_id, &member.updated, &member.deleted]
            ).await?;

            if count == 0 {
                return Err(api::Error::api(api::UserGroupKind::MemberNotFound));
            }

            Ok(())
        })
    }
}
