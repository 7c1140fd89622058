use tracing::Level;

pub use disk_api::error::{
    Detail,
    ApiErrorKind,
    ApiError,
    GeneralKind,
    AuthKind,
    UserKind,
    StorageKind,
    SearchKind,
    PermissionKind,
    ShareKind,
    TagKind,
    JobKind,
    FavoriteKind,
    UserGroupKind,
};

use super::BoxDynError;

/// a business error along with where it happened and what caused it
#[derive(Debug)]
pub struct Error {
    inner: ApiError,
    context: Option<String>,
    src: Option<BoxDynError>,
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn new() -> Self {
        Error {
            inner: Default::default(),
            context: None,
            src: None,
        }
    }

    pub fn api<T>(value: T) -> Self
    where
        T: Into<ApiError>
    {
        Error {
            inner: value.into(),
            context: None,
            src: None
        }
    }

    pub fn kind<K>(mut self, kind: K) -> Self
    where
        K: Into<ApiErrorKind>
    {
        self.inner = self.inner.with_kind(kind);
        self
    }

    pub fn message<M>(mut self, msg: M) -> Self
    where
        M: Into<String>
    {
        self.inner = self.inner.with_message(msg);
        self
    }

    pub fn context<C>(mut self, ctx: C) -> Self
    where
        C: Into<String>
    {
        self.context = Some(ctx.into());
        self
    }

    pub fn source<S>(mut self, src: S) -> Self
    where
        S: Into<BoxDynError>
    {
        self.src = Some(src.into());
        self
    }

    pub fn inner(&self) -> &ApiError {
        &self.inner
    }

    pub fn api_kind(&self) -> &ApiErrorKind {
        self.inner.kind()
    }

    /// logs the source of the error if one is present and returns the
    /// business error for the caller
    pub fn into_api(self) -> ApiError {
        if let Some(err) = self.src.as_ref() {
            tracing::event!(
                Level::ERROR,
                "unhandled error when processing operation: {:#?}",
                err
            );
        }

        self.inner
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)?;

        if let Some(cxt) = &self.context {
            write!(f, " ({cxt})")?;
        }

        match &self.src {
            Some(err) if f.alternate() => write!(f, "\ncaused by: {err:#?}"),
            Some(err) => write!(f, "\ncaused by: {err}"),
            None => Ok(()),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.src.as_ref().map(|v| & **v as _)
    }
}

impl From<ApiError> for Error {
    fn from(api_err: ApiError) -> Self {
        Error::api(api_err)
    }
}

macro_rules! kind_from {
    ($($k:path),*) => {
        $(
            impl From<$k> for Error {
                fn from(kind: $k) -> Self {
                    Error::api(kind)
                }
            }
        )*
    };
}

kind_from!(
    GeneralKind,
    AuthKind,
    UserKind,
    StorageKind,
    SearchKind,
    PermissionKind,
    ShareKind,
    TagKind,
    JobKind,
    FavoriteKind,
    UserGroupKind
);

impl From<disk_lib::search::ParseError> for Error {
    fn from(err: disk_lib::search::ParseError) -> Self {
        use disk_lib::search::ParseError;

        let kind = match &err {
            ParseError::InvalidCondition(_) |
            ParseError::EmptyName(_) |
            ParseError::EmptyKeyword(_) => SearchKind::InvalidExpression,
            ParseError::InvalidTime(_) |
            ParseError::InvalidSize(_) => SearchKind::InvalidKeyword,
        };

        Error::api((kind, err.to_string()))
    }
}

impl From<deadpool_postgres::PoolError> for Error {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Error::new()
            .context("failed to retrieve database connection")
            .source(err)
    }
}

macro_rules! simple_from {
    ($e:path) => {
        impl From<$e> for Error {
            fn from(err: $e) -> Self {
                Error::new()
                    .source(err)
            }
        }
    };
    ($e:path, $k:expr) => {
        impl From<$e> for Error {
            fn from(err: $e) -> Self {
                Error::new()
                    .kind($k)
                    .source(err)
            }
        }
    };
}

simple_from!(std::io::Error);
simple_from!(std::fmt::Error);
simple_from!(tokio_postgres::Error);
simple_from!(cron::error::Error, JobKind::InvalidTrigger);

// ----------------------------------------------------------------------------

use disk_lib::context_trait;

context_trait!(Error);

impl<T, E> Context<T, E> for std::result::Result<T, E>
where
    E: Into<BoxDynError>
{
    fn context<C>(self, cxt: C) -> std::result::Result<T, Error>
    where
        C: Into<String>
    {
        self.map_err(|err| Error::new().context(cxt).source(err))
    }
}

impl<T> Context<T, ()> for std::option::Option<T> {
    fn context<C>(self, cxt: C) -> std::result::Result<T, Error>
    where
        C: Into<String>
    {
        self.ok_or_else(|| Error::new().context(cxt))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_errors_map_to_search_kinds() {
        let err = Error::from(disk_lib::search::ParseError::InvalidCondition("bad".into()));

        assert_eq!(err.api_kind(), &ApiErrorKind::Search(SearchKind::InvalidExpression));

        let err = Error::from(disk_lib::search::ParseError::InvalidTime("x".into()));

        assert_eq!(err.api_kind(), &ApiErrorKind::Search(SearchKind::InvalidKeyword));
    }

    #[test]
    fn kinds_convert() {
        let err: Error = PermissionKind::NotAllowedToRead.into();

        assert_eq!(err.inner().code(), "B3307");
    }
}
