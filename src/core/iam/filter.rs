//! Resource filtering entry points
//!
//! Both call shapes are pass-throughs to [`AuthorizationEngine::authorize`]:
//! the management API filters typed resources, the proxy authorizes a single
//! externally named URN. Neither adds rules of its own.

use tracing::debug;

use super::AuthorizationEngine;
use crate::error::AuthzResult;
use crate::model::{CallerContext, ExternalResource, Resource};
use crate::urn::Urn;

impl AuthorizationEngine {
    /// Filter `candidates` down to those the caller may perform `action` on
    ///
    /// `resource_urn_prefix` names the scope being queried (a single URN for
    /// one-object operations, a prefix pattern for listings) and is only used
    /// for tracing. With a single candidate, an empty result means forbidden.
    pub fn filter_authorized_resources<R: Resource>(
        &self,
        caller: &CallerContext,
        resource_urn_prefix: &str,
        action: &str,
        candidates: Vec<R>,
    ) -> AuthzResult<Vec<R>> {
        debug!(
            caller = %caller.identifier,
            scope = resource_urn_prefix,
            action,
            "filtering resources"
        );
        self.authorize(caller, action, candidates)
    }

    /// Decide whether the caller may perform `action` on an externally named resource
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use bastion::{AuthorizationEngine, CallerContext, MemoryStore, Urn};
    ///
    /// let engine = AuthorizationEngine::with_store(Arc::new(MemoryStore::new()));
    /// let urn = Urn::from_external("urn:ews:example:instance:resource/1");
    ///
    /// assert!(engine.authorize_external_resource(&CallerContext::admin("root"), &urn, "example:Get").unwrap());
    /// ```
    pub fn authorize_external_resource(
        &self,
        caller: &CallerContext,
        resource_urn: &Urn,
        action: &str,
    ) -> AuthzResult<bool> {
        let candidates = vec![ExternalResource::new(resource_urn.clone())];
        let allowed = self.authorize(caller, action, candidates)?;
        Ok(!allowed.is_empty())
    }
}
