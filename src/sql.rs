use tokio_postgres::{Error as PgError};
use tokio_postgres::error::SqlState;
use tokio_postgres::types::ToSql;

pub use tokio_postgres::types::Json as PgJson;

pub type ParamsVec<'a> = Vec<&'a (dyn ToSql + Sync)>;

/// adds a parameter to the list and returns its 1 based position for use in
/// a query string
pub fn push_param<'a, T>(params: &mut ParamsVec<'a>, v: &'a T) -> usize
where
    T: ToSql + Sync
{
    params.push(v);
    params.len()
}

pub fn u64_from_sql(value: i64) -> u64 {
    if value >= 0 {
        value as u64
    } else {
        0
    }
}

pub fn u64_to_sql(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

pub fn unique_constraint_error(error: &PgError) -> Option<&str> {
    let db_error = error.as_db_error()?;

    if *db_error.code() == SqlState::UNIQUE_VIOLATION {
        db_error.constraint()
    } else {
        None
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn param_positions() {
        let a = 1i64;
        let b = String::from("b");
        let mut params: ParamsVec = Vec::new();

        assert_eq!(push_param(&mut params, &a), 1);
        assert_eq!(push_param(&mut params, &b), 2);
    }

    #[test]
    fn size_conversion() {
        assert_eq!(u64_from_sql(-1), 0);
        assert_eq!(u64_to_sql(u64::MAX), i64::MAX);
    }
}
