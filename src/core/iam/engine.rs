//! Authorization engine with deny precedence
//!
//! Resolves the caller's effective policy set and reduces it against each
//! candidate resource:
//! - Admin callers bypass evaluation entirely, without any lookup
//! - Explicit deny takes precedence over allow, across all policies
//! - A candidate no statement matches is denied
//! - Lookup failures are returned, never turned into a decision

use ahash::AHashSet;
use std::sync::Arc;
use tracing::{debug, warn};

use super::Statement;
use crate::error::AuthzResult;
use crate::model::{CallerContext, Policy, Resource};
use crate::store::{GroupLookup, PolicyLookup};
use crate::urn::Urn;

/// Outcome of evaluating a policy set for one action on one resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// At least one statement allows and none denies
    Allow,
    /// At least one statement denies
    Deny,
    /// No statement matches (denied by default)
    NotApplicable,
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        self == Decision::Allow
    }
}

/// Evaluate a set of policies for `action` on `urn`
///
/// # Examples
///
/// ```
/// use bastion::iam::{evaluate, Decision, Statement};
/// use bastion::{Policy, Urn};
///
/// let policy = Policy::new("org1", "readers", "/", vec![
///     Statement::allow(["iam:GetGroup"], ["urn:iws:iam:org1:group/*"]),
///     Statement::deny(["iam:GetGroup"], ["urn:iws:iam:org1:group/secret/*"]),
/// ]);
///
/// let open = Urn::new("org1", "group", "/", "g1");
/// let secret = Urn::new("org1", "group", "/secret/", "g2");
/// assert_eq!(evaluate(&[policy.clone()], "iam:GetGroup", &open), Decision::Allow);
/// assert_eq!(evaluate(&[policy.clone()], "iam:GetGroup", &secret), Decision::Deny);
/// assert_eq!(evaluate(&[policy], "iam:DeleteGroup", &open), Decision::NotApplicable);
/// ```
pub fn evaluate(policies: &[Policy], action: &str, urn: &Urn) -> Decision {
    let statements = statements_for_action(policies, action);
    decide(&statements, urn)
}

/// Statements of `policies` whose actions cover `action`
fn statements_for_action<'a>(policies: &'a [Policy], action: &str) -> Vec<&'a Statement> {
    policies
        .iter()
        .flat_map(|policy| policy.statements.iter())
        .filter(|statement| statement.applies_to_action(action))
        .collect()
}

/// Reduce pre-filtered statements against one resource
fn decide(statements: &[&Statement], urn: &Urn) -> Decision {
    let mut has_allow = false;

    for statement in statements {
        if !statement.applies_to_resource(urn) {
            continue;
        }

        match statement.effect {
            // Deny is terminal; no allow from any policy can override it
            super::Effect::Deny => return Decision::Deny,
            super::Effect::Allow => has_allow = true,
        }
    }

    if has_allow {
        Decision::Allow
    } else {
        Decision::NotApplicable
    }
}

/// Authorization engine
///
/// Holds no mutable state: every call reads through the lookups and performs
/// pure matching, so one engine can serve concurrent requests.
#[derive(Clone)]
pub struct AuthorizationEngine {
    groups: Arc<dyn GroupLookup>,
    policies: Arc<dyn PolicyLookup>,
}

impl AuthorizationEngine {
    pub fn new(groups: Arc<dyn GroupLookup>, policies: Arc<dyn PolicyLookup>) -> Self {
        AuthorizationEngine { groups, policies }
    }

    /// Build an engine whose group and policy lookups share one store
    pub fn with_store<S>(store: Arc<S>) -> Self
    where
        S: GroupLookup + PolicyLookup + 'static,
    {
        AuthorizationEngine {
            groups: store.clone(),
            policies: store,
        }
    }

    /// Return the subset of `candidates` the caller may perform `action` on
    ///
    /// The input order is preserved. Admin callers get every candidate back
    /// without any lookup.
    pub fn authorize<R: Resource>(
        &self,
        caller: &CallerContext,
        action: &str,
        candidates: Vec<R>,
    ) -> AuthzResult<Vec<R>> {
        if caller.admin {
            debug!(
                caller = %caller.identifier,
                action,
                candidates = candidates.len(),
                "admin bypass"
            );
            return Ok(candidates);
        }

        let policies = self.effective_policies(caller)?;
        let statements = statements_for_action(&policies, action);

        let total = candidates.len();
        let allowed: Vec<R> = candidates
            .into_iter()
            .filter(|candidate| decide(&statements, candidate.urn()).is_allowed())
            .collect();

        debug!(
            caller = %caller.identifier,
            action,
            policies = policies.len(),
            candidates = total,
            allowed = allowed.len(),
            "authorization evaluated"
        );

        Ok(allowed)
    }

    /// Resolve the union of policies attached to the caller's groups, deduplicated by ID
    pub fn effective_policies(&self, caller: &CallerContext) -> AuthzResult<Vec<Policy>> {
        let groups = self
            .groups
            .groups_for_user(&caller.identifier)
            .inspect_err(|err| warn!(caller = %caller.identifier, error = %err, "group lookup failed"))?;

        let group_ids: Vec<String> = groups.into_iter().map(|group| group.id).collect();

        let policies = self
            .policies
            .policies_for_groups(&group_ids)
            .inspect_err(|err| warn!(caller = %caller.identifier, error = %err, "policy lookup failed"))?;

        let mut seen = AHashSet::with_capacity(policies.len());
        Ok(policies
            .into_iter()
            .filter(|policy| seen.insert(policy.id.clone()))
            .collect())
    }
}
