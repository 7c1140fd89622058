pub type UserId = i64;
pub type OwnerId = i64;
pub type StorageId = i64;
pub type PermissionId = i64;
pub type UserPermissionId = i64;
pub type TagGroupId = i64;
pub type TagId = i64;
pub type ShareId = i64;
pub type StatisticsId = i64;
pub type FavoriteGroupId = i64;
pub type FavoriteItemId = i64;
pub type UserGroupId = i64;
pub type UserGroupMemberId = i64;
pub type OperationLogId = i64;
