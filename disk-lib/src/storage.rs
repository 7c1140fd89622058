use serde::{Serialize, Deserialize};

use crate::ids;
use crate::validation::trimmed_printable;

pub const MAX_NAME_CHARS: usize = 255;

pub fn name_valid(given: &str) -> bool {
    !given.is_empty() && trimmed_printable(given, Some(MAX_NAME_CHARS))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StorageType {
    File,
    Folder,
    Link,
}

impl StorageType {
    /// case insensitive
    pub fn from_str(v: &str) -> Option<Self> {
        if v.eq_ignore_ascii_case("FILE") {
            Some(StorageType::File)
        } else if v.eq_ignore_ascii_case("FOLDER") {
            Some(StorageType::Folder)
        } else if v.eq_ignore_ascii_case("LINK") {
            Some(StorageType::Link)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StorageType::File => "FILE",
            StorageType::Folder => "FOLDER",
            StorageType::Link => "LINK",
        }
    }

    pub fn is_file(&self) -> bool {
        *self == StorageType::File
    }
}

impl std::fmt::Display for StorageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

crate::text_sql_enum!(StorageType, "\"FILE\", \"FOLDER\" or \"LINK\"");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OwnerType {
    User,
    Space,
    Organization,
    Group,
}

impl OwnerType {
    pub fn from_str(v: &str) -> Option<Self> {
        if v.eq_ignore_ascii_case("USER") {
            Some(OwnerType::User)
        } else if v.eq_ignore_ascii_case("SPACE") {
            Some(OwnerType::Space)
        } else if v.eq_ignore_ascii_case("ORGANIZATION") {
            Some(OwnerType::Organization)
        } else if v.eq_ignore_ascii_case("GROUP") {
            Some(OwnerType::Group)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OwnerType::User => "USER",
            OwnerType::Space => "SPACE",
            OwnerType::Organization => "ORGANIZATION",
            OwnerType::Group => "GROUP",
        }
    }
}

impl std::fmt::Display for OwnerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

crate::text_sql_enum!(OwnerType, "\"USER\", \"SPACE\", \"ORGANIZATION\" or \"GROUP\"");

/// the category of a file derived from its content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileType {
    Image,
    Video,
    Audio,
    Document,
    Text,
    Compressed,
    Other,
}

impl FileType {
    pub fn from_str(v: &str) -> Option<Self> {
        let list = [
            FileType::Image,
            FileType::Video,
            FileType::Audio,
            FileType::Document,
            FileType::Text,
            FileType::Compressed,
            FileType::Other,
        ];

        list.into_iter().find(|file_type| v.eq_ignore_ascii_case(file_type.as_str()))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Image => "IMAGE",
            FileType::Video => "VIDEO",
            FileType::Audio => "AUDIO",
            FileType::Document => "DOCUMENT",
            FileType::Text => "TEXT",
            FileType::Compressed => "COMPRESSED",
            FileType::Other => "OTHER",
        }
    }
}

crate::text_sql_enum!(
    FileType,
    "\"IMAGE\", \"VIDEO\", \"AUDIO\", \"DOCUMENT\", \"TEXT\", \"COMPRESSED\" or \"OTHER\""
);

/// identifies an item in the storage tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StorageIdentity {
    pub storage_id: ids::StorageId,
    pub storage_type: StorageType,
}

impl StorageIdentity {
    pub fn new(storage_id: ids::StorageId, storage_type: StorageType) -> Self {
        StorageIdentity { storage_id, storage_type }
    }

    pub fn file(storage_id: ids::StorageId) -> Self {
        Self::new(storage_id, StorageType::File)
    }

    pub fn folder(storage_id: ids::StorageId) -> Self {
        Self::new(storage_id, StorageType::Folder)
    }
}

impl std::fmt::Display for StorageIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.storage_type, self.storage_id)
    }
}

/// identifies who owns a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StorageOwner {
    pub owner_id: ids::OwnerId,
    pub owner_type: OwnerType,
}

impl StorageOwner {
    pub fn new(owner_id: ids::OwnerId, owner_type: OwnerType) -> Self {
        StorageOwner { owner_id, owner_type }
    }

    pub fn user(owner_id: ids::UserId) -> Self {
        Self::new(owner_id, OwnerType::User)
    }
}

impl std::fmt::Display for StorageOwner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.owner_type, self.owner_id)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn storage_type_ignores_case() {
        assert_eq!(StorageType::from_str("file"), Some(StorageType::File));
        assert_eq!(StorageType::from_str("Folder"), Some(StorageType::Folder));
        assert_eq!(StorageType::from_str("LINK"), Some(StorageType::Link));
        assert_eq!(StorageType::from_str("image"), None);
    }

    #[test]
    fn file_type_ignores_case() {
        assert_eq!(FileType::from_str("image"), Some(FileType::Image));
        assert_eq!(FileType::from_str("Compressed"), Some(FileType::Compressed));
        assert_eq!(FileType::from_str("folder"), None);
    }

    #[test]
    fn name_validation() {
        let valid = [
            String::from("report.pdf"),
            String::from("holiday photos 😈"),
        ];

        for test in valid {
            assert!(name_valid(&test), "valid string failed {:?}", test);
        }

        let invalid = [
            String::new(),
            String::from(" leading"),
            crate::string_to_len(MAX_NAME_CHARS + 1),
        ];

        for test in invalid {
            assert!(!name_valid(&test), "invalid string failed {:?}", test);
        }
    }
}
