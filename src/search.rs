use std::collections::HashSet;
use std::sync::Arc;

use futures::future::BoxFuture;

pub use disk_lib::search::{SearchCondition, parse};

use crate::error::api;
use crate::storage::{StorageOwner, StorageType, FileType, UserStorage};

pub mod service;
pub mod storage;
pub mod tags;

pub use service::SearchService;

/// well known condition names. tag group names are conditions as well
pub mod names {
    pub const NAME: &str = "name";
    pub const TYPE: &str = "type";
    pub const TIME: &str = "time";
    pub const LAST_MODIFIED: &str = "last_modified";
    pub const SIZE: &str = "size";
}

/// the parsed conditions of a single search expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConditionGroup {
    conditions: Vec<SearchCondition>,
}

impl SearchConditionGroup {
    pub fn new(conditions: Vec<SearchCondition>) -> Self {
        SearchConditionGroup { conditions }
    }

    pub fn get(&self, name: &str) -> Option<&SearchCondition> {
        self.conditions.iter().find(|condition| condition.name == name)
    }

    pub fn keyword(&self, name: &str) -> Option<&str> {
        self.get(name).map(|condition| condition.keyword.as_str())
    }

    pub fn conditions(&self) -> &[SearchCondition] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn has_duplicate_names(&self) -> bool {
        let mut seen = HashSet::with_capacity(self.conditions.len());

        !self.conditions.iter().all(|condition| seen.insert(condition.name.as_str()))
    }
}

/// the value of a `type` condition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKeyword {
    Storage(StorageType),
    File(FileType),
}

impl TypeKeyword {
    pub fn parse(keyword: &str) -> Option<Self> {
        if let Some(storage_type) = StorageType::from_str(keyword) {
            Some(TypeKeyword::Storage(storage_type))
        } else {
            FileType::from_str(keyword).map(TypeKeyword::File)
        }
    }

    /// an unknown keyword leaves the search unfiltered by type
    pub fn from_group(group: &SearchConditionGroup) -> Option<Self> {
        let keyword = group.keyword(names::TYPE)?;
        let found = Self::parse(keyword);

        if found.is_none() {
            tracing::debug!("ignoring unknown type keyword \"{keyword}\"");
        }

        found
    }
}

pub trait SearchConditionProvider: Send + Sync {
    fn supports(&self, name: &str) -> bool;

    /// evaluates every condition of the group that the provider knows of
    fn search<'a>(
        &'a self,
        group: &'a SearchConditionGroup,
        owner: &'a StorageOwner,
    ) -> BoxFuture<'a, api::Result<Vec<UserStorage>>>;
}

pub type ArcSearchProvider = Arc<dyn SearchConditionProvider>;
