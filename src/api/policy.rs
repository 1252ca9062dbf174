//! Policy operations

use tracing::info;

use super::{exists, found, require, unique, AuthApi};
use crate::error::{ApiError, ApiResult, LookupError};
use crate::iam::{actions, validate_statements, Statement};
use crate::model::{CallerContext, GroupIdentity, Policy, PolicyIdentity};
use crate::urn::{normalize_path, Urn, RESOURCE_POLICY};
use crate::validation::{is_valid_name, is_valid_org, is_valid_path};

impl AuthApi {
    /// Create a policy; statements are validated here, never during evaluation
    pub fn add_policy(
        &self,
        caller: &CallerContext,
        org: &str,
        name: &str,
        path: &str,
        statements: Vec<Statement>,
    ) -> ApiResult<Policy> {
        require(is_valid_name(name), "name", name)?;
        require(is_valid_org(org), "org", org)?;
        require(is_valid_path(path), "path", path)?;
        validate_statements(&statements).map_err(ApiError::InvalidPolicy)?;

        let policy = self.authorize_one(
            caller,
            actions::CREATE_POLICY,
            Policy::new(org, name, path, statements),
        )?;

        if exists(self.policies.get_policy_by_name(org, name))? {
            return Err(ApiError::PolicyAlreadyExists(format!(
                "policy with org {} and name {}",
                org, name
            )));
        }

        let created = unique(self.policies.add_policy(policy), || {
            ApiError::PolicyAlreadyExists(format!("policy with org {} and name {}", org, name))
        })?;
        info!(caller = %caller.identifier, urn = %created.urn, "policy created");
        Ok(created)
    }

    pub fn get_policy_by_name(
        &self,
        caller: &CallerContext,
        org: &str,
        name: &str,
    ) -> ApiResult<Policy> {
        require(is_valid_name(name), "name", name)?;
        require(is_valid_org(org), "org", org)?;

        let policy = found(self.policies.get_policy_by_name(org, name), || {
            ApiError::PolicyNotFound(format!("policy with org {} and name {}", org, name))
        })?;

        self.authorize_one(caller, actions::GET_POLICY, policy)
    }

    /// List the policies of `org` (every org when empty) under `path_prefix`
    pub fn list_policies(
        &self,
        caller: &CallerContext,
        org: &str,
        path_prefix: &str,
    ) -> ApiResult<Vec<PolicyIdentity>> {
        if !org.is_empty() {
            require(is_valid_org(org), "org", org)?;
        }
        if !path_prefix.is_empty() {
            require(is_valid_path(path_prefix), "pathPrefix", path_prefix)?;
        }
        let path_prefix = if path_prefix.is_empty() { "/" } else { path_prefix };

        let policies = self.policies.get_policies_filtered(org, path_prefix)?;

        let urn_prefix = if org.is_empty() {
            "*".to_string()
        } else {
            Urn::prefix(org, RESOURCE_POLICY, path_prefix).into_string()
        };
        let allowed = self.filter(caller, &urn_prefix, actions::LIST_POLICIES, policies)?;

        Ok(allowed.iter().map(PolicyIdentity::from).collect())
    }

    /// Rename, move or rewrite a policy
    ///
    /// The caller needs the update permission on both the current and the new URN.
    pub fn update_policy(
        &self,
        caller: &CallerContext,
        org: &str,
        name: &str,
        new_name: &str,
        new_path: &str,
        statements: Vec<Statement>,
    ) -> ApiResult<Policy> {
        require(is_valid_name(new_name), "name", new_name)?;
        require(is_valid_org(org), "org", org)?;
        require(is_valid_path(new_path), "path", new_path)?;
        validate_statements(&statements).map_err(ApiError::InvalidPolicy)?;

        let policy = self.get_policy_by_name(caller, org, name)?;
        let policy = self.authorize_one(caller, actions::UPDATE_POLICY, policy)?;

        match self.policies.get_policy_by_name(org, new_name) {
            Ok(existing) if existing.id != policy.id => {
                return Err(ApiError::PolicyAlreadyExists(format!(
                    "policy with org {} and name {}",
                    org, new_name
                )));
            }
            Ok(_) | Err(LookupError::NotFound(_)) => {}
            Err(err) => return Err(err.into()),
        }

        let new_path = normalize_path(new_path);
        let target = Urn::new(org, RESOURCE_POLICY, &new_path, new_name);
        self.authorize_one(caller, actions::UPDATE_POLICY, target.clone())?;

        let updated = unique(
            self.policies
                .update_policy(&policy, new_name, &new_path, target, statements),
            || ApiError::PolicyAlreadyExists(format!("policy with org {} and name {}", org, new_name)),
        )?;
        info!(caller = %caller.identifier, from = %policy.urn, to = %updated.urn, "policy updated");
        Ok(updated)
    }

    pub fn remove_policy(&self, caller: &CallerContext, org: &str, name: &str) -> ApiResult<()> {
        let policy = self.get_policy_by_name(caller, org, name)?;
        let policy = self.authorize_one(caller, actions::DELETE_POLICY, policy)?;

        self.policies.remove_policy(&policy.id)?;
        info!(caller = %caller.identifier, urn = %policy.urn, "policy removed");
        Ok(())
    }

    /// Groups a policy is attached to
    pub fn list_attached_groups(
        &self,
        caller: &CallerContext,
        org: &str,
        policy_name: &str,
    ) -> ApiResult<Vec<GroupIdentity>> {
        let policy = self.get_policy_by_name(caller, org, policy_name)?;
        let policy = self.authorize_one(caller, actions::LIST_ATTACHED_GROUPS, policy)?;

        let groups = self.policies.get_attached_groups(&policy.id)?;
        Ok(groups.iter().map(GroupIdentity::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    fn read_all() -> Vec<Statement> {
        vec![Statement::allow(["iam:Get*"], ["urn:iws:iam:org1:*"])]
    }

    #[test]
    fn test_add_policy_rejects_malformed_statements() {
        let api = AuthApi::new(Arc::new(MemoryStore::new()));
        let admin = CallerContext::admin("root");

        let no_resources = vec![Statement::allow(["iam:GetGroup"], Vec::<String>::new())];
        assert!(matches!(
            api.add_policy(&admin, "org1", "p", "/", no_resources),
            Err(ApiError::InvalidPolicy(_))
        ));
        assert!(matches!(
            api.add_policy(&admin, "org1", "p", "/", Vec::new()),
            Err(ApiError::InvalidPolicy(_))
        ));
    }

    #[test]
    fn test_policy_lifecycle() {
        let api = AuthApi::new(Arc::new(MemoryStore::new()));
        let admin = CallerContext::admin("root");

        let created = api
            .add_policy(&admin, "org1", "readers", "/base/", read_all())
            .unwrap();
        assert_eq!(created.urn.as_str(), "urn:iws:iam:org1:policy/base/readers");
        assert!(matches!(
            api.add_policy(&admin, "org1", "readers", "/", read_all()),
            Err(ApiError::PolicyAlreadyExists(_))
        ));

        let updated = api
            .update_policy(
                &admin,
                "org1",
                "readers",
                "viewers",
                "/v2/",
                vec![Statement::allow(["iam:List*"], ["*"])],
            )
            .unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.urn.as_str(), "urn:iws:iam:org1:policy/v2/viewers");
        assert_eq!(updated.statements[0].actions, vec!["iam:List*"]);

        let listed = api.list_policies(&admin, "org1", "").unwrap();
        assert_eq!(
            listed,
            vec![PolicyIdentity { org: "org1".into(), name: "viewers".into() }]
        );

        api.remove_policy(&admin, "org1", "viewers").unwrap();
        assert!(matches!(
            api.get_policy_by_name(&admin, "org1", "viewers"),
            Err(ApiError::PolicyNotFound(_))
        ));
    }

    #[test]
    fn test_policy_update_applies_to_next_decision() {
        let api = AuthApi::new(Arc::new(MemoryStore::new()));
        let admin = CallerContext::admin("root");
        api.add_user(&admin, "alice", "/").unwrap();
        api.add_group(&admin, "org1", "g", "/").unwrap();
        api.add_policy(&admin, "org1", "p", "/", read_all()).unwrap();
        api.add_member(&admin, "alice", "g", "org1").unwrap();
        api.attach_policy_to_group(&admin, "org1", "g", "p").unwrap();

        let alice = CallerContext::user("alice");
        assert!(api.get_group_by_name(&alice, "org1", "g").is_ok());

        api.update_policy(
            &admin,
            "org1",
            "p",
            "p",
            "/",
            vec![
                Statement::allow(["iam:Get*"], ["urn:iws:iam:org1:*"]),
                Statement::deny(["iam:GetGroup"], ["urn:iws:iam:org1:group/g"]),
            ],
        )
        .unwrap();
        assert!(matches!(
            api.get_group_by_name(&alice, "org1", "g"),
            Err(ApiError::Unauthorized { .. })
        ));
    }

    #[test]
    fn test_list_attached_groups() {
        let api = AuthApi::new(Arc::new(MemoryStore::new()));
        let admin = CallerContext::admin("root");
        api.add_group(&admin, "org1", "a", "/").unwrap();
        api.add_policy(&admin, "org1", "p", "/", read_all()).unwrap();
        api.attach_policy_to_group(&admin, "org1", "a", "p").unwrap();

        assert_eq!(
            api.list_attached_groups(&admin, "org1", "p").unwrap(),
            vec![GroupIdentity { org: "org1".into(), name: "a".into() }]
        );
    }
}
