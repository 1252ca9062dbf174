//! User operations

use tracing::info;

use super::{exists, found, require, unique, AuthApi};
use crate::error::{ApiError, ApiResult};
use crate::iam::actions;
use crate::model::{CallerContext, GroupIdentity, User};
use crate::urn::{Urn, RESOURCE_USER};
use crate::validation::{is_valid_path, is_valid_user_external_id};

impl AuthApi {
    pub fn add_user(
        &self,
        caller: &CallerContext,
        external_id: &str,
        path: &str,
    ) -> ApiResult<User> {
        require(is_valid_user_external_id(external_id), "externalId", external_id)?;
        require(is_valid_path(path), "path", path)?;

        let user = self.authorize_one(caller, actions::CREATE_USER, User::new(external_id, path))?;

        if exists(self.users.get_user_by_external_id(external_id))? {
            return Err(ApiError::UserAlreadyExists(format!(
                "user with externalId {}",
                external_id
            )));
        }

        let created = unique(self.users.add_user(user), || {
            ApiError::UserAlreadyExists(format!("user with externalId {}", external_id))
        })?;
        info!(caller = %caller.identifier, urn = %created.urn, "user created");
        Ok(created)
    }

    pub fn get_user_by_external_id(
        &self,
        caller: &CallerContext,
        external_id: &str,
    ) -> ApiResult<User> {
        require(is_valid_user_external_id(external_id), "externalId", external_id)?;

        let user = found(self.users.get_user_by_external_id(external_id), || {
            ApiError::UserNotFound(format!("user with externalId {}", external_id))
        })?;

        self.authorize_one(caller, actions::GET_USER, user)
    }

    /// External IDs of the users under `path_prefix`
    pub fn list_users(&self, caller: &CallerContext, path_prefix: &str) -> ApiResult<Vec<String>> {
        if !path_prefix.is_empty() {
            require(is_valid_path(path_prefix), "pathPrefix", path_prefix)?;
        }
        let path_prefix = if path_prefix.is_empty() { "/" } else { path_prefix };

        let users = self.users.get_users_filtered(path_prefix)?;
        let urn_prefix = Urn::prefix("", RESOURCE_USER, path_prefix);
        let allowed = self.filter(caller, urn_prefix.as_str(), actions::LIST_USERS, users)?;

        Ok(allowed.into_iter().map(|user| user.external_id).collect())
    }

    pub fn list_groups_by_user(
        &self,
        caller: &CallerContext,
        external_id: &str,
    ) -> ApiResult<Vec<GroupIdentity>> {
        let user = self.get_user_by_external_id(caller, external_id)?;
        let user = self.authorize_one(caller, actions::LIST_GROUPS_FOR_USER, user)?;

        let groups = self.users.get_groups_by_user_id(&user.id)?;
        Ok(groups.iter().map(GroupIdentity::from).collect())
    }

    pub fn remove_user(&self, caller: &CallerContext, external_id: &str) -> ApiResult<()> {
        let user = self.get_user_by_external_id(caller, external_id)?;
        let user = self.authorize_one(caller, actions::DELETE_USER, user)?;

        self.users.remove_user(&user.id)?;
        info!(caller = %caller.identifier, urn = %user.urn, "user removed");
        Ok(())
    }
}
