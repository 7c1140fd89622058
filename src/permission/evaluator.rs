use disk_lib::ids;

use crate::storage::{StorageIdentity, StorageOwner, UserStorage};

use super::{PermissionType, PublicPermissionType};

/// the resolved permissions of one operator for one storage item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePermissionDto {
    pub owner: StorageOwner,
    pub identity: StorageIdentity,
    pub operator: ids::UserId,
    pub permissions: Vec<PermissionType>,
    pub public_permission: Option<PublicPermissionType>,
}

impl StoragePermissionDto {
    pub fn of(
        storage: &UserStorage,
        operator: ids::UserId,
        permissions: Vec<PermissionType>,
        public_permission: Option<PublicPermissionType>,
    ) -> Self {
        StoragePermissionDto {
            owner: storage.owner,
            identity: storage.identity,
            operator,
            permissions,
            public_permission,
        }
    }

    /// the owner id is compared whatever the owner type is
    pub fn is_owner(&self) -> bool {
        self.owner.owner_id == self.operator
    }

    pub fn denied(&self) -> bool {
        if self.is_owner() {
            return false;
        }

        self.permissions.contains(&PermissionType::Denied)
    }

    pub fn allow_read(&self) -> bool {
        if self.is_owner() {
            return true;
        }

        if self.denied() {
            return false;
        }

        if self.permissions.contains(&PermissionType::Read) {
            return true;
        }

        self.public_permission.map(|public| public.is_read()).unwrap_or(false)
    }

    pub fn allow_write(&self) -> bool {
        if self.is_owner() {
            return true;
        }

        if self.denied() {
            return false;
        }

        if self.permissions.contains(&PermissionType::Write) {
            return true;
        }

        self.public_permission.map(|public| public.is_write()).unwrap_or(false)
    }
}
