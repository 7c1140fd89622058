use http::StatusCode;
use serde::{Serialize, Deserialize};
use strum::{AsRefStr as StrumAsRefStr, EnumIter, IntoEnumIterator};

/// declares a kind enum along with its business code, http status and the
/// matching [`ApiErrorKind`] variant
macro_rules! error_kind {
    (
        $(#[$meta:meta])*
        $name:ident => $wrap:ident {
            $($variant:ident => ($code:literal, $status:ident),)*
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash,
            StrumAsRefStr, EnumIter,
            Serialize, Deserialize
        )]
        pub enum $name {
            $($variant,)*
        }

        impl $name {
            pub fn code(&self) -> &'static str {
                match self {
                    $($name::$variant => $code,)*
                }
            }

            pub fn from_code(code: &str) -> Option<Self> {
                <$name as IntoEnumIterator>::iter().find(|kind| kind.code() == code)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                std::fmt::Display::fmt(self.as_ref(), f)
            }
        }

        impl From<&$name> for StatusCode {
            fn from(kind: &$name) -> Self {
                match kind {
                    $($name::$variant => StatusCode::$status,)*
                }
            }
        }

        impl From<$name> for ApiErrorKind {
            fn from(v: $name) -> Self {
                ApiErrorKind::$wrap(v)
            }
        }
    };
}

error_kind! {
    GeneralKind => General {
        InternalFailure => ("A0000", INTERNAL_SERVER_ERROR),
        Timeout => ("A0001", REQUEST_TIMEOUT),
        AlreadyExists => ("A0002", CONFLICT),
        NotFound => ("A0003", NOT_FOUND),
        ValidationFailed => ("A0004", BAD_REQUEST),
        InvalidData => ("A0005", BAD_REQUEST),
        MissingData => ("A0006", BAD_REQUEST),
        Noop => ("A0007", BAD_REQUEST),
    }
}

error_kind! {
    AuthKind => Auth {
        Unauthenticated => ("A0100", UNAUTHORIZED),
        PermissionDenied => ("A0101", FORBIDDEN),
    }
}

error_kind! {
    UserKind => User {
        UserError => ("B2000", BAD_REQUEST),
        NotFound => ("B2001", NOT_FOUND),
        UsernameExisted => ("B2002", BAD_REQUEST),
        InvalidUsername => ("B2003", BAD_REQUEST),
    }
}

error_kind! {
    StorageKind => Storage {
        StorageError => ("B3100", BAD_REQUEST),
        DirectoryNotExist => ("B3101", NOT_FOUND),
        DirectoryExisted => ("B3102", BAD_REQUEST),
        NameEmpty => ("B3110", BAD_REQUEST),
        NameTooLong => ("B3111", BAD_REQUEST),
        NameIllegal => ("B3113", BAD_REQUEST),
        FileNotExist => ("B3151", NOT_FOUND),
        FileExisted => ("B3152", BAD_REQUEST),
        FileAlreadyDeleted => ("B3161", BAD_REQUEST),
        DirectoryAlreadyDeleted => ("B3163", BAD_REQUEST),
    }
}

error_kind! {
    SearchKind => Search {
        SearchError => ("B3200", BAD_REQUEST),
        InvalidExpression => ("B3201", BAD_REQUEST),
        InvalidKeyword => ("B3202", BAD_REQUEST),
    }
}

error_kind! {
    PermissionKind => Permission {
        PermissionError => ("B3300", BAD_REQUEST),
        NotFound => ("B3301", NOT_FOUND),
        AlreadyExist => ("B3302", BAD_REQUEST),
        NotAllowed => ("B3303", FORBIDDEN),
        NotAllowedToUpdate => ("B3305", FORBIDDEN),
        NotAllowedToCreate => ("B3306", FORBIDDEN),
        NotAllowedToRead => ("B3307", FORBIDDEN),
        NotAllowedToWrite => ("B3308", FORBIDDEN),
        AssignNotAllowed => ("B3315", FORBIDDEN),
        NotAllowUser => ("B3316", FORBIDDEN),
        TypeEmpty => ("B3320", BAD_REQUEST),
    }
}

error_kind! {
    ShareKind => Share {
        ShareError => ("B3400", BAD_REQUEST),
        NotFound => ("B3401", NOT_FOUND),
        Expired => ("B3402", FORBIDDEN),
        Cancel => ("B3403", FORBIDDEN),
        Password => ("B3404", FORBIDDEN),
        PasswordFormat => ("B3405", BAD_REQUEST),
        StorageNotFound => ("B3406", NOT_FOUND),
    }
}

error_kind! {
    TagKind => Tag {
        TagError => ("B3500", BAD_REQUEST),
        GroupNotFound => ("B3501", NOT_FOUND),
        TagNotFound => ("B3502", NOT_FOUND),
        GroupExisted => ("B3503", BAD_REQUEST),
        TagExisted => ("B3504", BAD_REQUEST),
        InvalidName => ("B3505", BAD_REQUEST),
    }
}

error_kind! {
    JobKind => Job {
        JobError => ("B3600", INTERNAL_SERVER_ERROR),
        NotFound => ("B3601", NOT_FOUND),
        InvalidTrigger => ("B3602", BAD_REQUEST),
        Rejected => ("B3603", SERVICE_UNAVAILABLE),
    }
}

error_kind! {
    FavoriteKind => Favorite {
        FavoriteError => ("B3700", BAD_REQUEST),
        NotFound => ("B3701", NOT_FOUND),
        Existed => ("B3702", BAD_REQUEST),
        NameNonCompliance => ("B3703", BAD_REQUEST),
        ItemExisted => ("B3704", BAD_REQUEST),
    }
}

error_kind! {
    UserGroupKind => UserGroup {
        UserGroupError => ("B2100", BAD_REQUEST),
        NotFound => ("B2101", NOT_FOUND),
        NameExisted => ("B2102", BAD_REQUEST),
        NameInvalid => ("B2103", BAD_REQUEST),
        DescriptionInvalid => ("B2104", BAD_REQUEST),
        MemberExisted => ("B2105", BAD_REQUEST),
        MemberNotFound => ("B2106", NOT_FOUND),
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash,
    Serialize, Deserialize
)]
pub enum ApiErrorKind {
    General(GeneralKind),
    Auth(AuthKind),
    User(UserKind),
    Storage(StorageKind),
    Search(SearchKind),
    Permission(PermissionKind),
    Share(ShareKind),
    Tag(TagKind),
    Job(JobKind),
    Favorite(FavoriteKind),
    UserGroup(UserGroupKind),
}

impl ApiErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            ApiErrorKind::General(v) => v.code(),
            ApiErrorKind::Auth(v) => v.code(),
            ApiErrorKind::User(v) => v.code(),
            ApiErrorKind::Storage(v) => v.code(),
            ApiErrorKind::Search(v) => v.code(),
            ApiErrorKind::Permission(v) => v.code(),
            ApiErrorKind::Share(v) => v.code(),
            ApiErrorKind::Tag(v) => v.code(),
            ApiErrorKind::Job(v) => v.code(),
            ApiErrorKind::Favorite(v) => v.code(),
            ApiErrorKind::UserGroup(v) => v.code(),
        }
    }

    /// finds the kind that owns the given business code
    pub fn from_code(code: &str) -> Option<Self> {
        GeneralKind::from_code(code).map(ApiErrorKind::General)
            .or_else(|| AuthKind::from_code(code).map(ApiErrorKind::Auth))
            .or_else(|| UserKind::from_code(code).map(ApiErrorKind::User))
            .or_else(|| StorageKind::from_code(code).map(ApiErrorKind::Storage))
            .or_else(|| SearchKind::from_code(code).map(ApiErrorKind::Search))
            .or_else(|| PermissionKind::from_code(code).map(ApiErrorKind::Permission))
            .or_else(|| ShareKind::from_code(code).map(ApiErrorKind::Share))
            .or_else(|| TagKind::from_code(code).map(ApiErrorKind::Tag))
            .or_else(|| JobKind::from_code(code).map(ApiErrorKind::Job))
            .or_else(|| FavoriteKind::from_code(code).map(ApiErrorKind::Favorite))
            .or_else(|| UserGroupKind::from_code(code).map(ApiErrorKind::UserGroup))
    }
}

impl std::fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiErrorKind::General(v) => std::fmt::Display::fmt(v, f),
            ApiErrorKind::Auth(v) => std::fmt::Display::fmt(v, f),
            ApiErrorKind::User(v) => std::fmt::Display::fmt(v, f),
            ApiErrorKind::Storage(v) => std::fmt::Display::fmt(v, f),
            ApiErrorKind::Search(v) => std::fmt::Display::fmt(v, f),
            ApiErrorKind::Permission(v) => std::fmt::Display::fmt(v, f),
            ApiErrorKind::Share(v) => std::fmt::Display::fmt(v, f),
            ApiErrorKind::Tag(v) => std::fmt::Display::fmt(v, f),
            ApiErrorKind::Job(v) => std::fmt::Display::fmt(v, f),
            ApiErrorKind::Favorite(v) => std::fmt::Display::fmt(v, f),
            ApiErrorKind::UserGroup(v) => std::fmt::Display::fmt(v, f),
        }
    }
}

impl From<&ApiErrorKind> for StatusCode {
    fn from(kind: &ApiErrorKind) -> Self {
        match kind {
            ApiErrorKind::General(v) => v.into(),
            ApiErrorKind::Auth(v) => v.into(),
            ApiErrorKind::User(v) => v.into(),
            ApiErrorKind::Storage(v) => v.into(),
            ApiErrorKind::Search(v) => v.into(),
            ApiErrorKind::Permission(v) => v.into(),
            ApiErrorKind::Share(v) => v.into(),
            ApiErrorKind::Tag(v) => v.into(),
            ApiErrorKind::Job(v) => v.into(),
            ApiErrorKind::Favorite(v) => v.into(),
            ApiErrorKind::UserGroup(v) => v.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Detail {
    Keys(Vec<String>),
}

impl Detail {
    pub fn with_key(key: impl Into<String>) -> Self {
        Detail::Keys(vec![key.into()])
    }
}

impl std::fmt::Display for Detail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Detail::Keys(list) => {
                let mut iter = list.iter();

                if let Some(first) = iter.next() {
                    write!(f, "{}", first)?;

                    for key in iter {
                        write!(f, ",{}", key)?;
                    }
                }
            },
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    kind: ApiErrorKind,
    detail: Option<Detail>,
    msg: Option<String>,
}

impl ApiError {
    pub fn new() -> Self {
        ApiError {
            kind: ApiErrorKind::General(GeneralKind::InternalFailure),
            detail: None,
            msg: None
        }
    }

    pub fn with_kind<K>(mut self, kind: K) -> Self
    where
        K: Into<ApiErrorKind>
    {
        self.kind = kind.into();
        self
    }

    pub fn with_detail(mut self, detail: Detail) -> Self {
        self.detail = Some(detail);
        self
    }

    pub fn with_message<M>(mut self, msg: M) -> Self
    where
        M: Into<String>
    {
        self.msg = Some(msg.into());
        self
    }

    pub fn kind(&self) -> &ApiErrorKind {
        &self.kind
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn status(&self) -> StatusCode {
        (&self.kind).into()
    }

    pub fn detail(&self) -> Option<&Detail> {
        self.detail.as_ref()
    }

    pub fn message(&self) -> Option<&str> {
        self.msg.as_deref()
    }
}

impl std::default::Default for ApiError {
    fn default() -> Self {
        ApiError::new()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.kind.code(), self.kind)?;

        if let Some(detail) = &self.detail {
            write!(f, ": {}", detail)?;
        }

        if let Some(msg) = &self.msg {
            write!(f, ": {}", msg)?;
        }

        Ok(())
    }
}

impl std::error::Error for ApiError {}

impl<K> From<K> for ApiError
where
    K: Into<ApiErrorKind>
{
    fn from(kind: K) -> Self {
        ApiError {
            kind: kind.into(),
            detail: None,
            msg: None
        }
    }
}

impl<K,M> From<(K, M)> for ApiError
where
    K: Into<ApiErrorKind>,
    M: Into<String>,
{
    fn from((kind, msg): (K, M)) -> Self {
        ApiError {
            kind: kind.into(),
            detail: None,
            msg: Some(msg.into())
        }
    }
}

impl<K> From<(K, Detail)> for ApiError
where
    K: Into<ApiErrorKind>
{
    fn from((kind, detail): (K, Detail)) -> Self {
        ApiError {
            kind: kind.into(),
            detail: Some(detail),
            msg: None
        }
    }
}

impl<K,M> From<(K, Detail, M)> for ApiError
where
    K: Into<ApiErrorKind>,
    M: Into<String>
{
    fn from((kind, detail, msg): (K, Detail, M)) -> Self {
        ApiError {
            kind: kind.into(),
            detail: Some(detail),
            msg: Some(msg.into())
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn codes_are_unique() {
        let mut seen = std::collections::HashSet::new();
        let all = GeneralKind::iter().map(ApiErrorKind::from)
            .chain(AuthKind::iter().map(ApiErrorKind::from))
            .chain(UserKind::iter().map(ApiErrorKind::from))
            .chain(StorageKind::iter().map(ApiErrorKind::from))
            .chain(SearchKind::iter().map(ApiErrorKind::from))
            .chain(PermissionKind::iter().map(ApiErrorKind::from))
            .chain(ShareKind::iter().map(ApiErrorKind::from))
            .chain(TagKind::iter().map(ApiErrorKind::from))
            .chain(JobKind::iter().map(ApiErrorKind::from))
            .chain(FavoriteKind::iter().map(ApiErrorKind::from))
            .chain(UserGroupKind::iter().map(ApiErrorKind::from));

        for kind in all {
            assert!(seen.insert(kind.code()), "duplicate code {} for {}", kind.code(), kind);
            assert_eq!(ApiErrorKind::from_code(kind.code()), Some(kind));
        }
    }

    #[test]
    fn permission_statuses() {
        let read: StatusCode = (&ApiErrorKind::from(PermissionKind::NotAllowedToRead)).into();
        let missing: StatusCode = (&ApiErrorKind::from(ShareKind::NotFound)).into();

        assert_eq!(read, StatusCode::FORBIDDEN);
        assert_eq!(missing, StatusCode::NOT_FOUND);
        assert_eq!(ApiErrorKind::from_code("B9999"), None);
    }

    #[test]
    fn display_includes_code() {
        let err = ApiError::from((StorageKind::FileNotExist, "file 12"));

        assert_eq!(err.to_string(), "B3151 FileNotExist: file 12");
        assert_eq!(err.code(), "B3151");
    }
}
