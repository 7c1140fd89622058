pub mod api;

pub type BoxDynError = Box<dyn std::error::Error + Send + Sync>;

/// the area an [`Error`] came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    General,
    Config,
    Database,
    Io,
    Job,
    Api,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::General => "general",
            ErrorKind::Config => "config",
            ErrorKind::Database => "database",
            ErrorKind::Io => "io",
            ErrorKind::Job => "job",
            ErrorKind::Api => "api",
        }
    }
}

/// error returned by startup, configuration and background jobs
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    msg: Option<String>,
    src: Option<BoxDynError>,
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn new() -> Error {
        Error {
            kind: ErrorKind::General,
            msg: None,
            src: None,
        }
    }

    pub fn kind(mut self, kind: ErrorKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn message<M>(mut self, msg: M) -> Error
    where
        M: Into<String>
    {
        self.msg = Some(msg.into());
        self
    }

    pub fn source<S>(mut self, src: S) -> Error
    where
        S: Into<BoxDynError>
    {
        self.src = Some(src.into());
        self
    }

    pub fn error_kind(&self) -> ErrorKind {
        self.kind
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = self.kind.as_str();

        match (self.msg.as_ref(), self.src.as_ref()) {
            (Some(msg), Some(err)) => write!(f, "{kind} error: {msg}\n{err}"),
            (Some(msg), None) => write!(f, "{kind} error: {msg}"),
            (None, Some(err)) => write!(f, "{kind} error: {err}"),
            (None, None) => write!(f, "{kind} error"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.src.as_ref().map(|v| & **v as _)
    }
}

impl From<api::Error> for Error {
    fn from(err: api::Error) -> Self {
        let msg = match err.inner().message() {
            Some(msg) => format!("{} {}", err.inner().code(), msg),
            None => err.inner().code().to_owned(),
        };

        Error::new()
            .kind(ErrorKind::Api)
            .message(msg)
            .source(err)
    }
}

impl From<deadpool_postgres::BuildError> for Error {
    fn from(err: deadpool_postgres::BuildError) -> Self {
        Error::new()
            .kind(ErrorKind::Database)
            .message("failed to build database connection pool")
            .source(err)
    }
}

macro_rules! kind_catch {
    ($k:expr, $e:path) => {
        impl From<$e> for Error {
            fn from(err: $e) -> Self {
                Error::new()
                    .kind($k)
                    .source(err)
            }
        }
    };
    ($k:expr, $e:path, $m:expr) => {
        impl From<$e> for Error {
            fn from(err: $e) -> Self {
                Error::new()
                    .kind($k)
                    .message($m)
                    .source(err)
            }
        }
    }
}

kind_catch!(ErrorKind::Io, std::io::Error);
kind_catch!(ErrorKind::Database, tokio_postgres::Error);
kind_catch!(ErrorKind::Database, deadpool_postgres::PoolError, "failed to retrieve database connection");
kind_catch!(ErrorKind::Config, serde_yaml::Error, "invalid yaml");
kind_catch!(ErrorKind::Config, serde_json::Error, "invalid json");
kind_catch!(ErrorKind::Job, cron::error::Error, "invalid cron expression");

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
        self.map_err(|err| Error::new().message(cxt).source(err))
    }
}

impl<T> Context<T, ()> for std::option::Option<T> {
    fn context<C>(self, cxt: C) -> std::result::Result<T, Error>
    where
        C: Into<String>
    {
        self.ok_or_else(|| Error::new().message(cxt))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn api_errors_keep_code() {
        let err = Error::from(api::Error::api(api::ShareKind::Expired));

        assert_eq!(err.error_kind(), ErrorKind::Api);
        assert!(err.to_string().starts_with("api error: "));
    }

    #[test]
    fn option_context() {
        let err = None::<u8>.context("missing value").unwrap_err();

        assert_eq!(err.to_string(), "general error: missing value");
    }
}
