use std::collections::HashMap;
use std::fmt::Write;

use chrono::Utc;
use deadpool_postgres::{GenericClient, Pool};
use disk_lib::ids;
use futures::future::BoxFuture;
use tokio_postgres::{Error as PgError, Row};

use crate::error::api;
use crate::sql;

use super::{
    UserStorage,
    NewStorage,
    StorageQuery,
    StorageTag,
    StorageTotals,
    StorageRepository,
    StorageIdentity,
    StorageOwner,
    StorageType,
    not_exist,
};

const COLUMNS: &str = "\
    user_storages.id, \
    user_storages.storage_type, \
    user_storages.name, \
    user_storages.owner_id, \
    user_storages.owner_type, \
    user_storages.parent_id, \
    user_storages.file_type, \
    user_storages.size, \
    user_storages.created, \
    user_storages.updated, \
    user_storages.deleted";

impl UserStorage {
    fn from_row(row: &Row) -> Self {
        UserStorage {
            identity: StorageIdentity::new(row.get(0), row.get(1)),
            name: row.get(2),
            owner: StorageOwner::new(row.get(3), row.get(4)),
            parent_id: row.get(5),
            file_type: row.get(6),
            size: sql::u64_from_sql(row.get(7)),
            tags: Vec::new(),
            created: row.get(8),
            updated: row.get(9),
            deleted: row.get(10),
        }
    }

    pub async fn retrieve(
        conn: &impl GenericClient,
        identity: &StorageIdentity,
    ) -> Result<Option<Self>, PgError> {
        let query = format!(
            "select {COLUMNS} from user_storages where id = $1 and storage_type = $2"
        );

        let Some(row) = conn.query_opt(
            query.as_str(),
            &[&identity.storage_id, &identity.storage_type]
        ).await? else {
            return Ok(None);
        };

        let mut rtn = Self::from_row(&row);

        load_tags(conn, std::slice::from_mut(&mut rtn)).await?;

        Ok(Some(rtn))
    }
}

/// fills in the tags for the given list of storage items
async fn load_tags(
    conn: &impl GenericClient,
    list: &mut [UserStorage],
) -> Result<(), PgError> {
    if list.is_empty() {
        return Ok(());
    }

    let storage_ids: Vec<ids::StorageId> = list.iter()
        .map(|storage| storage.storage_id())
        .collect();

    let rows = conn.query(
        "\
        select storage_id, storage_type, group_id, tag_id \
        from user_storage_tags \
        where storage_id = any($1)",
        &[&storage_ids]
    ).await?;

    let mut tags: HashMap<StorageIdentity, Vec<StorageTag>> = HashMap::new();

    for row in rows {
        let identity = StorageIdentity::new(row.get(0), row.get(1));

        tags.entry(identity)
            .or_default()
            .push(StorageTag {
                group_id: row.get(2),
                tag_id: row.get(3),
            });
    }

    for storage in list.iter_mut() {
        if let Some(found) = tags.remove(&storage.identity) {
            storage.tags = found;
        }
    }

    Ok(())
}

#[derive(Debug, Clone)]
pub struct PgStorageRepository {
    pool: Pool,
}

impl PgStorageRepository {
    pub fn new(pool: Pool) -> Self {
        PgStorageRepository { pool }
    }
}

impl StorageRepository for PgStorageRepository {
    fn find(&self, identity: StorageIdentity) -> BoxFuture<'_, api::Result<Option<UserStorage>>> {
        Box::pin(async move {
            let conn = self.pool.get().await?;

            Ok(UserStorage::retrieve(&conn, &identity).await?)
        })
    }

    fn query<'a>(&'a self, query: &'a StorageQuery) -> BoxFuture<'a, api::Result<Vec<UserStorage>>> {
        Box::pin(async move {
            let conn = self.pool.get().await?;

            let name_pattern = query.name.as_ref()
                .map(|name| format!("%{}%", escape_like(&name.to_lowercase())));
            let size_value = query.size.as_ref()
                .map(|size| sql::u64_to_sql(size.value()));

            let mut params: sql::ParamsVec = vec![&query.owner.owner_id, &query.owner.owner_type];
            let mut statement = format!(
                "select {COLUMNS} from user_storages \
                where owner_id = $1 and owner_type = $2 and deleted = false"
            );

            if let Some(pattern) = &name_pattern {
                write!(
                    &mut statement,
                    " and lower(name) like ${}",
                    sql::push_param(&mut params, pattern)
                )?;
            }

            if let Some(storage_type) = &query.storage_type {
                write!(
                    &mut statement,
                    " and storage_type = ${}",
                    sql::push_param(&mut params, storage_type)
                )?;
            }

            if let Some(file_type) = &query.file_type {
                write!(
                    &mut statement,
                    " and file_type = ${}",
                    sql::push_param(&mut params, file_type)
                )?;
            }

            for (column, range) in [("created", &query.created), ("updated", &query.updated)] {
                let Some(range) = range else {
                    continue;
                };

                if let Some(start) = &range.start {
                    write!(
                        &mut statement,
                        " and {column} >= ${}",
                        sql::push_param(&mut params, start)
                    )?;
                }

                if let Some(end) = &range.end {
                    write!(
                        &mut statement,
                        " and {column} <= ${}",
                        sql::push_param(&mut params, end)
                    )?;
                }
            }

            if let (Some(size), Some(value)) = (&query.size, &size_value) {
                write!(
                    &mut statement,
                    " and storage_type = 'FILE' and size {} ${}",
                    size.operator(),
                    sql::push_param(&mut params, value)
                )?;
            }

            for tag in &query.tags {
                write!(
                    &mut statement,
                    " and exists (\
                        select 1 from user_storage_tags \
                        where user_storage_tags.storage_id = user_storages.id and \
                              user_storage_tags.storage_type = user_storages.storage_type and \
                              user_storage_tags.tag_id = ${})",
                    sql::push_param(&mut params, &tag.tag_id)
                )?;
            }

            statement.push_str(" order by created, id");

            let rows = conn.query(statement.as_str(), &params).await?;
            let mut list: Vec<UserStorage> = rows.iter()
                .map(UserStorage::from_row)
                .collect();

            load_tags(&conn, &mut list).await?;

            Ok(list)
        })
    }

    fn children(
        &self,
        owner: StorageOwner,
        parent_id: Option<ids::StorageId>
    ) -> BoxFuture<'_, api::Result<Vec<UserStorage>>> {
        Box::pin(async move {
            let conn = self.pool.get().await?;
            let query = format!(
                "select {COLUMNS} from user_storages \
                where owner_id = $1 and \
                      owner_type = $2 and \
                      parent_id is not distinct from $3 and \
                      deleted = false \
                order by created, id"
            );

            let rows = conn.query(
                query.as_str(),
                &[&owner.owner_id, &owner.owner_type, &parent_id]
            ).await?;
            let mut list: Vec<UserStorage> = rows.iter()
                .map(UserStorage::from_row)
                .collect();

            load_tags(&conn, &mut list).await?;

            Ok(list)
        })
    }

    fn create(&self, storage: NewStorage) -> BoxFuture<'_, api::Result<UserStorage>> {
        Box::pin(async move {
            let conn = self.pool.get().await?;
            let now = Utc::now();
            let size = sql::u64_to_sql(storage.size);

            let row = conn.query_one(
                "\
                insert into user_storages ( \
                    storage_type, name, owner_id, owner_type, parent_id, \
                    file_type, size, created, updated \
                ) values ($1, $2, $3, $4, $5, $6, $7, $8, $8) \
                returning id",
                &[
                    &storage.storage_type,
                    &storage.name,
                    &storage.owner.owner_id,
                    &storage.owner.owner_type,
                    &storage.parent_id,
                    &storage.file_type,
                    &size,
                    &now,
                ]
            ).await?;

            Ok(UserStorage {
                identity: StorageIdentity::new(row.get(0), storage.storage_type),
                name: storage.name,
                owner: storage.owner,
                parent_id: storage.parent_id,
                file_type: storage.file_type,
                size: storage.size,
                tags: Vec::new(),
                created: now,
                updated: now,
                deleted: false,
            })
        })
    }

    fn set_deleted(&self, identity: StorageIdentity, deleted: bool) -> BoxFuture<'_, api::Result<()>> {
        Box::pin(async move {
            let conn = self.pool.get().await?;
            let now = Utc::now();

            let count = conn.execute(
                "\
                update user_storages \
                set deleted = $3, updated = $4 \
                where id = $1 and storage_type = $2",
                &[&identity.storage_id, &identity.storage_type, &deleted, &now]
            ).await?;

            if count == 0 {
                return Err(not_exist(&identity));
            }

            Ok(())
        })
    }

    fn set_tags(&self, identity: StorageIdentity, tags: Vec<StorageTag>) -> BoxFuture<'_, api::Result<()>> {
        Box::pin(async move {
            let mut conn = self.pool.get().await?;
            let transaction = conn.transaction().await?;
            let now = Utc::now();

            let count = transaction.execute(
                "update user_storages set updated = $3 where id = $1 and storage_type = $2",
                &[&identity.storage_id, &identity.storage_type, &now]
            ).await?;

            if count == 0 {
                return Err(not_exist(&identity));
            }

            transaction.execute(
                "delete from user_storage_tags where storage_id = $1 and storage_type = $2",
                &[&identity.storage_id, &identity.storage_type]
            ).await?;

            if !tags.is_empty() {
                let mut query = String::from(
                    "insert into user_storage_tags (storage_id, storage_type, group_id, tag_id) values "
                );
                let mut params: sql::ParamsVec = vec![&identity.storage_id, &identity.storage_type];
                let mut first = true;

                for tag in &tags {
                    if first {
                        first = false;
                    } else {
                        query.push(',');
                    }

                    write!(
                        &mut query,
                        "($1, $2, ${}, ${})",
                        sql::push_param(&mut params, &tag.group_id),
                        sql::push_param(&mut params, &tag.tag_id),
                    )?;
                }

                transaction.execute(query.as_str(), &params).await?;
            }

            transaction.commit().await?;

            Ok(())
        })
    }

    fn totals(&self) -> BoxFuture<'_, api::Result<StorageTotals>> {
        Box::pin(async move {
            let conn = self.pool.get().await?;
            let rows = conn.query(
                "\
                select storage_type, count(*), coalesce(sum(size), 0)::bigint \
                from user_storages \
                where deleted = false \
                group by storage_type",
                &[]
            ).await?;

            let mut totals = StorageTotals::default();

            for row in rows {
                let storage_type: StorageType = row.get(0);
                let count = sql::u64_from_sql(row.get(1));

                match storage_type {
                    StorageType::File => {
                        totals.files = count;
                        totals.bytes = sql::u64_from_sql(row.get(2));
                    }
                    StorageType::Folder => totals.folders = count,
                    StorageType::Link => totals.links = count,
                }
            }

            Ok(totals)
        })
    }
}

fn escape_like(given: &str) -> String {
    let mut rtn = String::with_capacity(given.len());

    for ch in given.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            rtn.push('\\');
        }

        rtn.push(ch);
    }

    rtn
}
