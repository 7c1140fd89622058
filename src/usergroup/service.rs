use std::sync::Arc;

use chrono::Utc;
use disk_lib::ids;
use disk_lib::query::Page;

use crate::error::api;
use crate::storage::StorageOwner;

use super::{
    DEFAULT_GROUP_ID,
    default_settings,
    NewUserGroup,
    UserGroup,
    UserGroupMember,
    UserGroupRepository,
};

fn not_found(id: ids::UserGroupId) -> api::Error {
    api::Error::api((api::UserGroupKind::NotFound, format!("user group {id} not found")))
}

fn check_name(name: &str) -> api::Result<()> {
    if !disk_lib::usergroup::name_valid(name) {
        return Err(api::Error::api((
            api::UserGroupKind::NameInvalid,
            format!("invalid user group name \"{name}\"")
        )));
    }

    if name == disk_lib::usergroup::DEFAULT_NAME {
        return Err(api::Error::api(api::UserGroupKind::NameExisted));
    }

    Ok(())
}

fn check_description(description: &str) -> api::Result<()> {
    if !disk_lib::usergroup::description_valid(description) {
        return Err(api::Error::api(api::UserGroupKind::DescriptionInvalid));
    }

    Ok(())
}

/// groups of storage owners. an owner outside of every group belongs to the
/// default group
pub struct UserGroupService {
    repo: Arc<dyn UserGroupRepository>,
}

impl UserGroupService {
    pub fn new(repo: Arc<dyn UserGroupRepository>) -> Self {
        UserGroupService { repo }
    }

    /// a deleted group of the same name is brought back with fresh settings
    pub async fn create_group(&self, name: &str, description: &str) -> api::Result<UserGroup> {
        check_name(name)?;
        check_description(description)?;

        match self.repo.find_group_by_name(name).await? {
            Some(group) if !group.deleted => Err(api::Error::api((
                api::UserGroupKind::NameExisted,
                format!("user group \"{name}\" already exists")
            ))),
            Some(mut group) => {
                group.description = description.to_owned();
                group.settings = default_settings();
                group.deleted = false;
                group.updated = Utc::now();

                self.repo.update_group(&group).await?;

                tracing::debug!("revived user group {} \"{}\"", group.id, group.name);

                Ok(group)
            }
            None => {
                let group = self.repo.create_group(NewUserGroup {
                    name: name.to_owned(),
                    description: description.to_owned(),
                    settings: default_settings(),
                }).await?;

                tracing::debug!("created user group {} \"{}\"", group.id, group.name);

                Ok(group)
            }
        }
    }

    pub async fn group(&self, id: ids::UserGroupId) -> api::Result<UserGroup> {
        if id == DEFAULT_GROUP_ID {
            return Ok(UserGroup::default_group());
        }

        match self.repo.find_group(id).await? {
            Some(group) if !group.deleted => Ok(group),
            _ => Err(not_found(id)),
        }
    }

    async fn stored_group(&self, id: ids::UserGroupId) -> api::Result<UserGroup> {
        if id == DEFAULT_GROUP_ID {
            return Err(api::Error::api((
                api::UserGroupKind::UserGroupError,
                "the default group cannot be changed"
            )));
        }

        self.group(id).await
    }

    pub async fn groups(&self, page: Page) -> api::Result<Vec<UserGroup>> {
        self.repo.groups(page).await
    }

    /// the group the owner is a member of
    pub async fn group_of(&self, owner: StorageOwner) -> api::Result<UserGroup> {
        match self.repo.find_member(owner).await? {
            Some(member) if !member.deleted => self.group(member.group_id).await,
            _ => Ok(UserGroup::default_group()),
        }
    }

    pub async fn members(&self, id: ids::UserGroupId) -> api::Result<Vec<StorageOwner>> {
        if id == DEFAULT_GROUP_ID {
            return Ok(Vec::new());
        }

        Ok(self.repo.members_of(id)
            .await?
            .into_iter()
            .map(|member| member.member)
            .collect())
    }

    pub async fn rename(&self, id: ids::UserGroupId, name: &str) -> api::Result<UserGroup> {
        check_name(name)?;

        let mut group = self.stored_group(id).await?;

        if group.name == name {
            return Ok(group);
        }

        if self.repo.find_group_by_name(name).await?.is_some() {
            return Err(api::Error::api(api::UserGroupKind::NameExisted));
        }

        group.name = name.to_owned();
        group.updated = Utc::now();

        self.repo.update_group(&group).await?;

        Ok(group)
    }

    pub async fn set_description(&self, id: ids::UserGroupId, description: &str) -> api::Result<UserGroup> {
        check_description(description)?;

        let mut group = self.stored_group(id).await?;

        group.description = description.to_owned();
        group.updated = Utc::now();

        self.repo.update_group(&group).await?;

        Ok(group)
    }

    pub async fn set_setting(&self, id: ids::UserGroupId, key: &str, value: &str) -> api::Result<UserGroup> {
        let mut group = self.stored_group(id).await?;

        group.settings.insert(key.to_owned(), value.to_owned());
        group.updated = Utc::now();

        self.repo.update_group(&group).await?;

        Ok(group)
    }

    /// members of a deleted group fall back to the default group
    pub async fn delete_group(&self, id: ids::UserGroupId) -> api::Result<()> {
        let mut group = self.stored_group(id).await?;

        for mut member in self.repo.members_of(id).await? {
            member.deleted = true;
            member.updated = Utc::now();

            self.repo.update_member(&member).await?;
        }

        group.deleted = true;
        group.updated = Utc::now();

        self.repo.update_group(&group).await?;

        tracing::debug!("deleted user group {} \"{}\"", group.id, group.name);

        Ok(())
    }

    /// moves the owner out of any group it was in before
    pub async fn add_member(&self, id: ids::UserGroupId, owner: StorageOwner) -> api::Result<UserGroupMember> {
        let group = self.stored_group(id).await?;

        match self.repo.find_member(owner).await? {
            Some(member) if !member.deleted && member.group_id == group.id => Err(api::Error::api((
                api::UserGroupKind::MemberExisted,
                format!("{owner} is already in user group {}", group.id)
            ))),
            Some(mut member) => {
                member.group_id = group.id;
                member.deleted = false;
                member.updated = Utc::now();

                self.repo.update_member(&member).await?;

                Ok(member)
            }
            None => self.repo.create_member(group.id, owner).await,
        }
    }

    pub async fn remove_member(&self, id: ids::UserGroupId, owner: StorageOwner) -> api::Result<()> {
        let group = self.stored_group(id).await?;

        let Some(mut member) = self.repo.find_member(owner).await? else {
            return Err(api::Error::api(api::UserGroupKind::MemberNotFound));
        };

        if member.deleted || member.group_id != group.id {
            return Err(api::Error::api(api::UserGroupKind::MemberNotFound));
        }

        member.deleted = true;
        member.updated = Utc::now();

        self.repo.update_member(&member).await
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::storage::OwnerType;
    use crate::usergroup::{GROUP_QUOTA, memory::MemoryUserGroupRepository};

    fn service() -> UserGroupService {
        UserGroupService::new(Arc::new(MemoryUserGroupRepository::new()))
    }

    #[tokio::test]
    async fn create_rules() {
        let service = service();

        let err = service.create_group("a", "").await.unwrap_err();
        assert_eq!(err.api_kind(), &api::ApiErrorKind::UserGroup(api::UserGroupKind::NameInvalid));

        let err = service.create_group("default", "").await.unwrap_err();
        assert_eq!(err.api_kind(), &api::ApiErrorKind::UserGroup(api::UserGroupKind::NameExisted));

        let long = disk_lib::string_to_len(disk_lib::usergroup::MAX_DESCRIPTION_CHARS + 1);
        let err = service.create_group("ops", &long).await.unwrap_err();
        assert_eq!(err.api_kind(), &api::ApiErrorKind::UserGroup(api::UserGroupKind::DescriptionInvalid));

        let group = service.create_group("ops", "").await.unwrap();

        let err = service.create_group("ops", "again").await.unwrap_err();
        assert_eq!(err.api_kind(), &api::ApiErrorKind::UserGroup(api::UserGroupKind::NameExisted));

        service.set_setting(group.id, GROUP_QUOTA, "5").await.unwrap();
        service.delete_group(group.id).await.unwrap();

        assert!(service.group(group.id).await.is_err());
        assert!(service.groups(Page::default()).await.unwrap().is_empty());

        let revived = service.create_group("ops", "second life").await.unwrap();

        assert_eq!(revived.id, group.id);
        assert_eq!(revived.description, "second life");
        assert_eq!(revived.limit(GROUP_QUOTA), Some(10240));
    }

    #[tokio::test]
    async fn membership() {
        let service = service();
        let first = service.create_group("first", "").await.unwrap();
        let second = service.create_group("second", "").await.unwrap();
        let user = StorageOwner::user(3);
        let team = StorageOwner::new(3, OwnerType::Group);

        assert_eq!(service.group_of(user).await.unwrap().id, DEFAULT_GROUP_ID);

        service.add_member(first.id, user).await.unwrap();
        service.add_member(first.id, team).await.unwrap();

        let err = service.add_member(first.id, user).await.unwrap_err();
        assert_eq!(err.api_kind(), &api::ApiErrorKind::UserGroup(api::UserGroupKind::MemberExisted));

        assert_eq!(service.members(first.id).await.unwrap(), vec![user, team]);
        assert_eq!(service.group_of(user).await.unwrap().id, first.id);

        // joining another group leaves the first one
        service.add_member(second.id, user).await.unwrap();

        assert_eq!(service.members(first.id).await.unwrap(), vec![team]);
        assert_eq!(service.group_of(user).await.unwrap().id, second.id);

        let err = service.remove_member(first.id, user).await.unwrap_err();
        assert_eq!(err.api_kind(), &api::ApiErrorKind::UserGroup(api::UserGroupKind::MemberNotFound));

        service.remove_member(second.id, user).await.unwrap();

        assert_eq!(service.group_of(user).await.unwrap().id, DEFAULT_GROUP_ID);

        service.delete_group(first.id).await.unwrap();

        assert_eq!(service.group_of(team).await.unwrap().id, DEFAULT_GROUP_ID);
        assert!(service.members(DEFAULT_GROUP_ID).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn default_group_fixed() {
        let service = service();

        let err = service.rename(DEFAULT_GROUP_ID, "everyone").await.unwrap_err();
        assert_eq!(err.api_kind(), &api::ApiErrorKind::UserGroup(api::UserGroupKind::UserGroupError));

        let err = service.add_member(DEFAULT_GROUP_ID, StorageOwner::user(1)).await.unwrap_err();
        assert_eq!(err.api_kind(), &api::ApiErrorKind::UserGroup(api::UserGroupKind::UserGroupError));

        let err = service.group(42).await.unwrap_err();
        assert_eq!(err.api_kind(), &api::ApiErrorKind::UserGroup(api::UserGroupKind::NotFound));
    }
}
