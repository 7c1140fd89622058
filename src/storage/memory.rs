use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use dashmap::DashMap;
use disk_lib::ids;
use futures::future::BoxFuture;

use crate::error::api;

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

/// files, folders and links each have their own id sequence
#[derive(Debug, Default)]
pub struct MemoryStorageRepository {
    files: AtomicI64,
    folders: AtomicI64,
    links: AtomicI64,
    items: DashMap<StorageIdentity, UserStorage>,
}

impl MemoryStorageRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self, storage_type: StorageType) -> ids::StorageId {
        let seq = match storage_type {
            StorageType::File => &self.files,
            StorageType::Folder => &self.folders,
            StorageType::Link => &self.links,
        };

        seq.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn sorted(mut list: Vec<UserStorage>) -> Vec<UserStorage> {
        list.sort_by(|a, b| a.created.cmp(&b.created)
            .then(a.identity.storage_id.cmp(&b.identity.storage_id)));
        list
    }
}

impl StorageRepository for MemoryStorageRepository {
    fn find(&self, identity: StorageIdentity) -> BoxFuture<'_, api::Result<Option<UserStorage>>> {
        Box::pin(async move {
            Ok(self.items.get(&identity).map(|found| found.value().clone()))
        })
    }

    fn query<'a>(&'a self, query: &'a StorageQuery) -> BoxFuture<'a, api::Result<Vec<UserStorage>>> {
        Box::pin(async move {
            let list = self.items.iter()
                .filter(|entry| query.matches(entry.value()))
                .map(|entry| entry.value().clone())
                .collect();

            Ok(Self::sorted(list))
        })
    }

    fn children(
        &self,
        owner: StorageOwner,
        parent_id: Option<ids::StorageId>
    ) -> BoxFuture<'_, api::Result<Vec<UserStorage>>> {
        Box::pin(async move {
            let list = self.items.iter()
                .filter(|entry| {
                    let storage = entry.value();

                    !storage.deleted && storage.owner == owner && storage.parent_id == parent_id
                })
                .map(|entry| entry.value().clone())
                .collect();

            Ok(Self::sorted(list))
        })
    }

    fn create(&self, storage: NewStorage) -> BoxFuture<'_, api::Result<UserStorage>> {
        Box::pin(async move {
            let now = Utc::now();
            let identity = StorageIdentity::new(
                self.next_id(storage.storage_type),
                storage.storage_type
            );

            let record = UserStorage {
                identity,
                name: storage.name,
                owner: storage.owner,
                parent_id: storage.parent_id,
                file_type: storage.file_type,
                size: storage.size,
                tags: Vec::new(),
                created: now,
                updated: now,
                deleted: false,
            };

            self.items.insert(identity, record.clone());

            Ok(record)
        })
    }

    fn set_deleted(&self, identity: StorageIdentity, deleted: bool) -> BoxFuture<'_, api::Result<()>> {
        Box::pin(async move {
            let Some(mut found) = self.items.get_mut(&identity) else {
                return Err(not_exist(&identity));
            };

            found.deleted = deleted;
            found.updated = Utc::now();

            Ok(())
        })
    }

    fn set_tags(&self, identity: StorageIdentity, tags: Vec<StorageTag>) -> BoxFuture<'_, api::Result<()>> {
        Box::pin(async move {
            let Some(mut found) = self.items.get_mut(&identity) else {
                return Err(not_exist(&identity));
            };

            found.tags = tags;
            found.updated = Utc::now();

            Ok(())
        })
    }

    fn totals(&self) -> BoxFuture<'_, api::Result<StorageTotals>> {
        Box::pin(async move {
            let mut totals = StorageTotals::default();

            for entry in self.items.iter() {
                let storage = entry.value();

                if storage.deleted {
                    continue;
                }

                match storage.storage_type() {
                    StorageType::File => {
                        totals.files += 1;
                        totals.bytes += storage.size;
                    }
                    StorageType::Folder => totals.folders += 1,
                    StorageType::Link => totals.links += 1,
                }
            }

            Ok(totals)
        })
    }
}
