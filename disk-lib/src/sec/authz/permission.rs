use serde::{Serialize, Deserialize};

/// a permission granted to a single user on a storage item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PermissionType {
    Read,
    Write,
    Denied,
}

impl PermissionType {
    pub fn from_str(v: &str) -> Option<Self> {
        if v.eq_ignore_ascii_case("READ") {
            Some(PermissionType::Read)
        } else if v.eq_ignore_ascii_case("WRITE") {
            Some(PermissionType::Write)
        } else if v.eq_ignore_ascii_case("DENIED") {
            Some(PermissionType::Denied)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionType::Read => "READ",
            PermissionType::Write => "WRITE",
            PermissionType::Denied => "DENIED",
        }
    }
}

crate::text_sql_enum!(PermissionType, "\"READ\", \"WRITE\" or \"DENIED\"");

/// the permission applied to anyone that has no specific grant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PublicPermissionType {
    #[default]
    Private,
    PublicRead,
    PublicReadWrite,
}

impl PublicPermissionType {
    pub fn from_str(v: &str) -> Option<Self> {
        if v.eq_ignore_ascii_case("PRIVATE") {
            Some(PublicPermissionType::Private)
        } else if v.eq_ignore_ascii_case("PUBLIC_READ") {
            Some(PublicPermissionType::PublicRead)
        } else if v.eq_ignore_ascii_case("PUBLIC_READ_WRITE") {
            Some(PublicPermissionType::PublicReadWrite)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PublicPermissionType::Private => "PRIVATE",
            PublicPermissionType::PublicRead => "PUBLIC_READ",
            PublicPermissionType::PublicReadWrite => "PUBLIC_READ_WRITE",
        }
    }

    pub fn is_read(&self) -> bool {
        match self {
            PublicPermissionType::Private => false,
            PublicPermissionType::PublicRead |
            PublicPermissionType::PublicReadWrite => true,
        }
    }

    pub fn is_write(&self) -> bool {
        *self == PublicPermissionType::PublicReadWrite
    }
}

crate::text_sql_enum!(
    PublicPermissionType,
    "\"PRIVATE\", \"PUBLIC_READ\" or \"PUBLIC_READ_WRITE\""
);

/// an operation performed against a storage item. only `Access` is a read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    Create,
    Update,
    Access,
    Edit,
    Delete,
    Move,
    Copy,
    Rename,
}

impl Action {
    pub fn from_str(v: &str) -> Option<Self> {
        let action = match v.to_ascii_uppercase().as_str() {
            "CREATE" => Action::Create,
            "UPDATE" => Action::Update,
            "ACCESS" => Action::Access,
            "EDIT" => Action::Edit,
            "DELETE" => Action::Delete,
            "MOVE" => Action::Move,
            "COPY" => Action::Copy,
            "RENAME" => Action::Rename,
            _ => return None,
        };

        Some(action)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "CREATE",
            Action::Update => "UPDATE",
            Action::Access => "ACCESS",
            Action::Edit => "EDIT",
            Action::Delete => "DELETE",
            Action::Move => "MOVE",
            Action::Copy => "COPY",
            Action::Rename => "RENAME",
        }
    }

    pub fn is_write(&self) -> bool {
        !matches!(self, Action::Access)
    }
}

crate::text_sql_enum!(
    Action,
    "\"CREATE\", \"UPDATE\", \"ACCESS\", \"EDIT\", \"DELETE\", \"MOVE\", \"COPY\" or \"RENAME\""
);

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn public_permission_flags() {
        assert!(!PublicPermissionType::Private.is_read());
        assert!(!PublicPermissionType::Private.is_write());
        assert!(PublicPermissionType::PublicRead.is_read());
        assert!(!PublicPermissionType::PublicRead.is_write());
        assert!(PublicPermissionType::PublicReadWrite.is_read());
        assert!(PublicPermissionType::PublicReadWrite.is_write());
    }

    #[test]
    fn only_access_reads() {
        let writes = [
            Action::Create,
            Action::Update,
            Action::Edit,
            Action::Delete,
            Action::Move,
            Action::Copy,
            Action::Rename,
        ];

        for action in writes {
            assert!(action.is_write(), "{} should be a write", action.as_str());
        }

        assert!(!Action::Access.is_write());
        assert_eq!(Action::from_str("rename"), Some(Action::Rename));
        assert_eq!(Action::from_str("read"), None);
    }

    #[test]
    fn permission_type_strings() {
        for permission in [PermissionType::Read, PermissionType::Write, PermissionType::Denied] {
            assert_eq!(PermissionType::from_str(permission.as_str()), Some(permission));
        }

        assert_eq!(
            PublicPermissionType::from_str("public_read"),
            Some(PublicPermissionType::PublicRead)
        );
        assert_eq!(PublicPermissionType::from_str("public"), None);
    }
}
