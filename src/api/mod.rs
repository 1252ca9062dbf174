//! Management API for users, groups and policies
//!
//! Each operation validates its fields, checks existence, asks the
//! authorization engine once per decision, then mutates the stores.
//! Single-object operations treat an empty filtered result as forbidden.

mod group;
mod policy;
mod user;

use std::sync::Arc;
use tracing::warn;

use crate::error::{ApiError, ApiResult, AuthzError, LookupError};
use crate::iam::AuthorizationEngine;
use crate::model::{CallerContext, Resource};
use crate::store::{GroupLookup, GroupRepo, PolicyLookup, PolicyRepo, UserRepo};
use crate::urn::Urn;

/// Management API over abstract stores
#[derive(Clone)]
pub struct AuthApi {
    users: Arc<dyn UserRepo>,
    groups: Arc<dyn GroupRepo>,
    policies: Arc<dyn PolicyRepo>,
    engine: AuthorizationEngine,
}

impl AuthApi {
    /// Build an API whose repositories and lookups all share one store
    pub fn new<S>(store: Arc<S>) -> Self
    where
        S: UserRepo + GroupRepo + PolicyRepo + GroupLookup + PolicyLookup + 'static,
    {
        AuthApi {
            users: store.clone(),
            groups: store.clone(),
            policies: store.clone(),
            engine: AuthorizationEngine::with_store(store),
        }
    }

    /// The engine shared with other consumers such as the proxy
    pub fn engine(&self) -> &AuthorizationEngine {
        &self.engine
    }

    /// Filter the URNs of externally named resources the caller may act on
    pub fn authorized_external_resources(
        &self,
        caller: &CallerContext,
        action: &str,
        resources: Vec<String>,
    ) -> ApiResult<Vec<String>> {
        if !crate::validation::is_valid_action(action) || action.ends_with('*') {
            return Err(ApiError::InvalidParameter(format!("action {}", action)));
        }
        if let Some(bad) = resources
            .iter()
            .find(|r| r.contains('*') || !crate::validation::is_valid_resource(r))
        {
            return Err(ApiError::InvalidParameter(format!("resource {}", bad)));
        }

        let urns: Vec<Urn> = resources.into_iter().map(Urn::from_external).collect();
        let allowed = self.filter(caller, "*", action, urns)?;
        Ok(allowed.into_iter().map(Urn::into_string).collect())
    }

    /// Filter `candidates`, mapping engine failures to API errors
    fn filter<R: Resource>(
        &self,
        caller: &CallerContext,
        urn_prefix: &str,
        action: &str,
        candidates: Vec<R>,
    ) -> ApiResult<Vec<R>> {
        self.engine
            .filter_authorized_resources(caller, urn_prefix, action, candidates)
            .map_err(|err| authz_error(err, caller, urn_prefix))
    }

    /// Authorize a single resource, returning it back when permitted
    fn authorize_one<R: Resource>(
        &self,
        caller: &CallerContext,
        action: &str,
        resource: R,
    ) -> ApiResult<R> {
        let urn = resource.urn().to_string();
        self.filter(caller, &urn, action, vec![resource])?
            .pop()
            .ok_or_else(|| unauthorized(caller, &urn))
    }
}

fn unauthorized(caller: &CallerContext, urn: &str) -> ApiError {
    ApiError::Unauthorized {
        identifier: caller.identifier.clone(),
        urn: urn.to_string(),
    }
}

/// A caller unknown to the user store cannot be granted anything; any other
/// lookup failure is internal and must not look like a denial.
fn authz_error(err: AuthzError, caller: &CallerContext, urn: &str) -> ApiError {
    match err {
        AuthzError::Lookup(LookupError::NotFound(_)) => unauthorized(caller, urn),
        AuthzError::Lookup(err) => {
            warn!(caller = %caller.identifier, urn, error = %err, "authorization lookup failed");
            err.into()
        }
    }
}

fn require(valid: bool, field: &str, value: &str) -> ApiResult<()> {
    if valid {
        Ok(())
    } else {
        Err(ApiError::InvalidParameter(format!("{} {}", field, value)))
    }
}

/// Map a store read of a named record, turning `NotFound` into `not_found`
fn found<T>(result: Result<T, LookupError>, not_found: impl FnOnce() -> ApiError) -> ApiResult<T> {
    match result {
        Ok(value) => Ok(value),
        Err(LookupError::NotFound(_)) => Err(not_found()),
        Err(err) => Err(err.into()),
    }
}

/// `Ok(true)` if a record exists, `Ok(false)` if the store reports it missing
fn exists<T>(result: Result<T, LookupError>) -> ApiResult<bool> {
    match result {
        Ok(_) => Ok(true),
        Err(LookupError::NotFound(_)) => Ok(false),
        Err(err) => Err(err.into()),
    }
}

/// Map a store write, turning a unique-key `Conflict` into `already_exists`
fn unique<T>(
    result: Result<T, LookupError>,
    already_exists: impl FnOnce() -> ApiError,
) -> ApiResult<T> {
    match result {
        Ok(value) => Ok(value),
        Err(LookupError::Conflict(_)) => Err(already_exists()),
        Err(err) => Err(err.into()),
    }
}
