/// implements `postgres_types::ToSql` and `FromSql` for an enum that
/// provides `as_str` and `from_str` and is stored as a text column
#[macro_export]
macro_rules! text_sql_enum {
    ($t:ty, $expecting:expr) => {
        impl<'a> postgres_types::FromSql<'a> for $t {
            fn from_sql(
                ty: &postgres_types::Type,
                raw: &'a [u8]
            ) -> Result<Self, Box<dyn std::error::Error + Sync + Send>> {
                let v = <&str as postgres_types::FromSql>::from_sql(ty, raw)?;

                <$t>::from_str(v).ok_or(concat!(
                    "invalid sql value for ", stringify!($t), ". expecting ", $expecting
                ).into())
            }

            fn accepts(ty: &postgres_types::Type) -> bool {
                <&str as postgres_types::FromSql>::accepts(ty)
            }
        }

        impl postgres_types::ToSql for $t {
            fn to_sql(
                &self,
                ty: &postgres_types::Type,
                w: &mut bytes::BytesMut
            ) -> Result<postgres_types::IsNull, Box<dyn std::error::Error + Sync + Send>> {
                <&str as postgres_types::ToSql>::to_sql(&self.as_str(), ty, w)
            }

            fn accepts(ty: &postgres_types::Type) -> bool {
                <&str as postgres_types::ToSql>::accepts(ty)
            }

            postgres_types::to_sql_checked!();
        }
    };
}
