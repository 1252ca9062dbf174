//! IAM statement structure
//!
//! A statement allows or denies a set of actions on a set of resource URN
//! patterns. Policies own an ordered list of statements.

use serde::{Deserialize, Serialize};

use crate::iam::PatternMatcher;
use crate::urn::Urn;

/// Action wildcard matching every action
pub const ANY_ACTION: &str = "*";

/// Effect of a policy statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effect {
    /// Allow the action
    Allow,
    /// Deny the action (takes precedence over Allow)
    Deny,
}

/// Check if an action pattern covers a requested action
///
/// Patterns are either `*`, an exact identifier such as `iam:GetGroup`, or an
/// identifier ending in `*` such as `iam:*` or `iam:Get*`.
///
/// ```
/// use bastion::iam::action_matches;
///
/// assert!(action_matches("iam:*", "iam:CreateGroup"));
/// assert!(action_matches("*", "example:Get"));
/// assert!(!action_matches("iam:GetGroup", "iam:GetGroups"));
/// ```
pub fn action_matches(pattern: &str, action: &str) -> bool {
    if pattern == ANY_ACTION {
        return true;
    }
    match pattern.strip_suffix('*') {
        Some(prefix) => action.starts_with(prefix),
        None => pattern == action,
    }
}

/// A single policy statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    /// Effect of this statement
    pub effect: Effect,

    /// Actions this statement applies to (supports trailing wildcards)
    pub actions: Vec<String>,

    /// Resource URN patterns this statement applies to (supports wildcards)
    pub resources: Vec<String>,
}

impl Statement {
    /// Create a new statement
    pub fn new<A, R>(effect: Effect, actions: A, resources: R) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Statement {
            effect,
            actions: actions.into_iter().map(Into::into).collect(),
            resources: resources.into_iter().map(Into::into).collect(),
        }
    }

    pub fn allow<A, R>(actions: A, resources: R) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Self::new(Effect::Allow, actions, resources)
    }

    pub fn deny<A, R>(actions: A, resources: R) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Self::new(Effect::Deny, actions, resources)
    }

    /// Check if any action pattern of this statement covers `action`
    pub fn applies_to_action(&self, action: &str) -> bool {
        self.actions.iter().any(|pattern| action_matches(pattern, action))
    }

    /// Check if any resource pattern of this statement covers `urn`
    pub fn applies_to_resource(&self, urn: &Urn) -> bool {
        self.resources
            .iter()
            .any(|pattern| PatternMatcher::matches(pattern, urn.as_str()))
    }

    /// Check if this statement applies to the given action and resource
    pub fn applies_to(&self, action: &str, urn: &Urn) -> bool {
        self.applies_to_action(action) && self.applies_to_resource(urn)
    }
}

/// Validate a list of statements before it is stored in a policy
///
/// Evaluation assumes every statement passed this check.
pub fn validate_statements(statements: &[Statement]) -> Result<(), String> {
    if statements.is_empty() {
        return Err("Policy must have at least one statement".to_string());
    }

    for (i, stmt) in statements.iter().enumerate() {
        if stmt.actions.is_empty() {
            return Err(format!("Statement {} has no actions", i));
        }
        if stmt.resources.is_empty() {
            return Err(format!("Statement {} has no resources", i));
        }
        if let Some(action) = stmt
            .actions
            .iter()
            .find(|a| !crate::validation::is_valid_action(a))
        {
            return Err(format!("Statement {} has invalid action {}", i, action));
        }
        if let Some(resource) = stmt
            .resources
            .iter()
            .find(|r| !crate::validation::is_valid_resource(r))
        {
            return Err(format!("Statement {} has invalid resource {}", i, resource));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_matches() {
        assert!(action_matches("*", "iam:GetGroup"));
        assert!(action_matches("iam:*", "iam:GetGroup"));
        assert!(action_matches("group:*", "group:create"));
        assert!(action_matches("group:*", "group:delete"));
        assert!(action_matches("iam:Get*", "iam:GetPolicy"));
        assert!(action_matches("iam:GetGroup", "iam:GetGroup"));
        assert!(!action_matches("iam:GetGroup", "iam:getgroup"));
        assert!(!action_matches("group:*", "policy:create"));
        assert!(!action_matches("iam:Get*", "iam:ListGroups"));
    }

    #[test]
    fn test_statement_applies_to() {
        let stmt = Statement::allow(["group:get"], ["urn:org1:group:/*"]);

        assert!(stmt.applies_to("group:get", &Urn::from_external("urn:org1:group:/g1")));
        assert!(!stmt.applies_to("group:delete", &Urn::from_external("urn:org1:group:/g1")));
        assert!(!stmt.applies_to("group:get", &Urn::from_external("urn:org2:group:/g1")));
    }

    #[test]
    fn test_statement_any_entry_matches() {
        let stmt = Statement::deny(
            ["iam:GetGroup", "iam:UpdateGroup"],
            ["urn:iws:iam:org1:group/a/*", "urn:iws:iam:org1:group/b/*"],
        );
        let urn = Urn::new("org1", "group", "/b/", "g1");

        assert!(stmt.applies_to("iam:UpdateGroup", &urn));
        assert!(!stmt.applies_to("iam:DeleteGroup", &urn));
    }

    #[test]
    fn test_statement_json_format() {
        let json = r#"{
            "effect": "allow",
            "actions": ["iam:*"],
            "resources": ["urn:iws:iam:org1:*"]
        }"#;
        let stmt: Statement = serde_json::from_str(json).unwrap();
        assert_eq!(stmt.effect, Effect::Allow);
        assert_eq!(stmt.actions, vec!["iam:*"]);

        let out = serde_json::to_value(&stmt).unwrap();
        assert_eq!(out["effect"], "allow");
    }

    #[test]
    fn test_validate_statements() {
        assert!(validate_statements(&[]).is_err());

        let no_actions = Statement::allow(Vec::<String>::new(), ["urn:iws:iam:org1:*"]);
        assert!(validate_statements(&[no_actions]).is_err());

        let no_resources = Statement::allow(["iam:*"], Vec::<String>::new());
        assert!(validate_statements(&[no_resources]).is_err());

        let bad_action = Statement::allow(["GetGroup"], ["urn:iws:iam:org1:*"]);
        assert!(validate_statements(&[bad_action]).is_err());

        let bad_resource = Statement::allow(["iam:GetGroup"], ["group/g1"]);
        assert!(validate_statements(&[bad_resource]).is_err());

        let valid = Statement::allow(["iam:GetGroup"], ["urn:iws:iam:org1:group/*"]);
        assert!(validate_statements(&[valid]).is_ok());
    }
}
