//! Group operations

use tracing::info;

use super::{exists, found, require, unique, AuthApi};
use crate::error::{ApiError, ApiResult};
use crate::iam::actions;
use crate::model::{CallerContext, Group, GroupIdentity};
use crate::urn::{normalize_path, Urn, RESOURCE_GROUP};
use crate::validation::{is_valid_name, is_valid_org, is_valid_path, is_valid_user_external_id};

impl AuthApi {
    /// Create a group if no group with the same org and name exists
    pub fn add_group(
        &self,
        caller: &CallerContext,
        org: &str,
        name: &str,
        path: &str,
    ) -> ApiResult<Group> {
        require(is_valid_name(name), "name", name)?;
        require(is_valid_org(org), "org", org)?;
        require(is_valid_path(path), "path", path)?;

        let group = self.authorize_one(caller, actions::CREATE_GROUP, Group::new(org, name, path))?;

        if exists(self.groups.get_group_by_name(org, name))? {
            return Err(ApiError::GroupAlreadyExists(format!(
                "group with org {} and name {}",
                org, name
            )));
        }

        let created = unique(self.groups.add_group(group), || {
            ApiError::GroupAlreadyExists(format!("group with org {} and name {}", org, name))
        })?;
        info!(caller = %caller.identifier, urn = %created.urn, "group created");
        Ok(created)
    }

    pub fn get_group_by_name(
        &self,
        caller: &CallerContext,
        org: &str,
        name: &str,
    ) -> ApiResult<Group> {
        require(is_valid_name(name), "name", name)?;
        require(is_valid_org(org), "org", org)?;

        let group = found(self.groups.get_group_by_name(org, name), || {
            ApiError::GroupNotFound(format!("group with org {} and name {}", org, name))
        })?;

        self.authorize_one(caller, actions::GET_GROUP, group)
    }

    /// List the groups of `org` (every org when empty) under `path_prefix`
    pub fn list_groups(
        &self,
        caller: &CallerContext,
        org: &str,
        path_prefix: &str,
    ) -> ApiResult<Vec<GroupIdentity>> {
        if !org.is_empty() {
            require(is_valid_org(org), "org", org)?;
        }
        if !path_prefix.is_empty() {
            require(is_valid_path(path_prefix), "pathPrefix", path_prefix)?;
        }
        let path_prefix = if path_prefix.is_empty() { "/" } else { path_prefix };

        let groups = self.groups.get_groups_filtered(org, path_prefix)?;

        let urn_prefix = if org.is_empty() {
            "*".to_string()
        } else {
            Urn::prefix(org, RESOURCE_GROUP, path_prefix).into_string()
        };
        let allowed = self.filter(caller, &urn_prefix, actions::LIST_GROUPS, groups)?;

        Ok(allowed.iter().map(GroupIdentity::from).collect())
    }

    /// Rename or move a group
    ///
    /// The caller needs the update permission on both the current and the new URN.
    pub fn update_group(
        &self,
        caller: &CallerContext,
        org: &str,
        name: &str,
        new_name: &str,
        new_path: &str,
    ) -> ApiResult<Group> {
        require(is_valid_name(new_name), "name", new_name)?;
        require(is_valid_org(org), "org", org)?;
        require(is_valid_path(new_path), "path", new_path)?;

        let group = self.get_group_by_name(caller, org, name)?;
        let group = self.authorize_one(caller, actions::UPDATE_GROUP, group)?;

        match self.groups.get_group_by_name(org, new_name) {
            Ok(existing) if existing.id != group.id => {
                return Err(ApiError::GroupAlreadyExists(format!(
                    "group with org {} and name {}",
                    org, new_name
                )));
            }
            Ok(_) | Err(crate::error::LookupError::NotFound(_)) => {}
            Err(err) => return Err(err.into()),
        }

        let new_path = normalize_path(new_path);
        let target = Urn::new(org, RESOURCE_GROUP, &new_path, new_name);
        self.authorize_one(caller, actions::UPDATE_GROUP, target.clone())?;

        let updated = unique(
            self.groups.update_group(&group, new_name, &new_path, target),
            || ApiError::GroupAlreadyExists(format!("group with org {} and name {}", org, new_name)),
        )?;
        info!(caller = %caller.identifier, from = %group.urn, to = %updated.urn, "group updated");
        Ok(updated)
    }

    pub fn remove_group(&self, caller: &CallerContext, org: &str, name: &str) -> ApiResult<()> {
        let group = self.get_group_by_name(caller, org, name)?;
        let group = self.authorize_one(caller, actions::DELETE_GROUP, group)?;

        self.groups.remove_group(&group.id)?;
        info!(caller = %caller.identifier, urn = %group.urn, "group removed");
        Ok(())
    }

    pub fn add_member(
        &self,
        caller: &CallerContext,
        external_id: &str,
        group_name: &str,
        org: &str,
    ) -> ApiResult<()> {
        require(is_valid_user_external_id(external_id), "externalId", external_id)?;
        require(is_valid_org(org), "org", org)?;
        require(is_valid_name(group_name), "name", group_name)?;

        let group = self.get_group_by_name(caller, org, group_name)?;
        let group = self.authorize_one(caller, actions::ADD_MEMBER, group)?;
        let user = self.get_user_by_external_id(caller, external_id)?;

        if self.groups.is_member_of_group(&user.id, &group.id)? {
            return Err(ApiError::AlreadyMember {
                user: external_id.to_string(),
                group: group_name.to_string(),
            });
        }

        self.groups.add_member(&user.id, &group.id)?;
        info!(caller = %caller.identifier, user = external_id, group = %group.urn, "member added");
        Ok(())
    }

    pub fn remove_member(
        &self,
        caller: &CallerContext,
        external_id: &str,
        group_name: &str,
        org: &str,
    ) -> ApiResult<()> {
        require(is_valid_user_external_id(external_id), "externalId", external_id)?;
        require(is_valid_org(org), "org", org)?;
        require(is_valid_name(group_name), "name", group_name)?;

        let group = self.get_group_by_name(caller, org, group_name)?;
        let group = self.authorize_one(caller, actions::REMOVE_MEMBER, group)?;
        let user = self.get_user_by_external_id(caller, external_id)?;

        if !self.groups.is_member_of_group(&user.id, &group.id)? {
            return Err(ApiError::NotMember {
                user: external_id.to_string(),
                group: group_name.to_string(),
            });
        }

        self.groups.remove_member(&user.id, &group.id)?;
        info!(caller = %caller.identifier, user = external_id, group = %group.urn, "member removed");
        Ok(())
    }

    /// External IDs of the members of a group
    pub fn list_members(
        &self,
        caller: &CallerContext,
        org: &str,
        group_name: &str,
    ) -> ApiResult<Vec<String>> {
        let group = self.get_group_by_name(caller, org, group_name)?;
        let group = self.authorize_one(caller, actions::LIST_MEMBERS, group)?;

        let members = self.groups.get_group_members(&group.id)?;
        Ok(members.into_iter().map(|user| user.external_id).collect())
    }

    pub fn attach_policy_to_group(
        &self,
        caller: &CallerContext,
        org: &str,
        group_name: &str,
        policy_name: &str,
    ) -> ApiResult<()> {
        require(is_valid_name(group_name), "group name", group_name)?;
        require(is_valid_org(org), "org", org)?;
        require(is_valid_name(policy_name), "policy name", policy_name)?;

        let group = self.get_group_by_name(caller, org, group_name)?;
        let group = self.authorize_one(caller, actions::ATTACH_GROUP_POLICY, group)?;
        let policy = self.get_policy_by_name(caller, org, policy_name)?;

        if self.groups.is_attached_to_group(&group.id, &policy.id)? {
            return Err(ApiError::PolicyAlreadyAttached {
                policy: policy.name,
                group: group.name,
            });
        }

        self.groups.attach_policy(&group.id, &policy.id)?;
        info!(caller = %caller.identifier, group = %group.urn, policy = %policy.urn, "policy attached");
        Ok(())
    }

    pub fn detach_policy_to_group(
        &self,
        caller: &CallerContext,
        org: &str,
        group_name: &str,
        policy_name: &str,
    ) -> ApiResult<()> {
        require(is_valid_name(group_name), "group name", group_name)?;
        require(is_valid_org(org), "org", org)?;
        require(is_valid_name(policy_name), "policy name", policy_name)?;

        let group = self.get_group_by_name(caller, org, group_name)?;
        let group = self.authorize_one(caller, actions::DETACH_GROUP_POLICY, group)?;
        let policy = self.get_policy_by_name(caller, org, policy_name)?;

        if !self.groups.is_attached_to_group(&group.id, &policy.id)? {
            return Err(ApiError::PolicyNotAttached {
                policy: policy.name,
                group: group.name,
            });
        }

        self.groups.detach_policy(&group.id, &policy.id)?;
        info!(caller = %caller.identifier, group = %group.urn, policy = %policy.urn, "policy detached");
        Ok(())
    }

    /// Names of the policies attached to a group
    pub fn list_attached_group_policies(
        &self,
        caller: &CallerContext,
        org: &str,
        group_name: &str,
    ) -> ApiResult<Vec<String>> {
        let group = self.get_group_by_name(caller, org, group_name)?;
        let group = self.authorize_one(caller, actions::LIST_ATTACHED_GROUP_POLICIES, group)?;

        let policies = self.groups.get_attached_policies(&group.id)?;
        Ok(policies.into_iter().map(|policy| policy.name).collect())
    }
}
