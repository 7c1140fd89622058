use std::error::Error;

use bytes::BytesMut;
use postgres_types::{to_sql_checked, Type, IsNull, ToSql};
use serde::Deserialize;
use serde_repr::{Serialize_repr, Deserialize_repr};

pub type Offset = u32;

/// page sizes available to list operations
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default,
    Serialize_repr, Deserialize_repr
)]
#[repr(u8)]
pub enum Limit {
    #[default]
    Small = 25,
    Medium = 50,
    Large = 100
}

impl Limit {
    pub fn sql_offset(&self, offset: Offset) -> i64 {
        (*self as i64) * (offset as i64)
    }

    pub fn skip(&self, offset: Offset) -> usize {
        (*self as usize) * (offset as usize)
    }

    pub fn take(&self) -> usize {
        *self as usize
    }
}

impl ToSql for Limit {
    fn to_sql(&self, ty: &Type, w: &mut BytesMut) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        let v = *self as i64;

        v.to_sql(ty, w)
    }

    fn accepts(ty: &Type) -> bool {
        <i64 as ToSql>::accepts(ty)
    }

    to_sql_checked!();
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub limit: Limit,
    #[serde(default)]
    pub offset: Offset,
}
