//! # Bastion - Identity and Access Management
//!
//! `bastion-iam` decides who may do what on which resource. Organizations hold
//! users, groups and policies; users belong to groups, groups have policies
//! attached, and policy statements allow or deny actions on resource URNs.
//!
//! - **One authorization primitive** shared by the management API and the proxy
//! - **Explicit deny precedence** over every allow, default deny otherwise
//! - **Admin bypass** without touching the stores
//! - **Segment-wise wildcard matching** on URNs, no regex translation
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use bastion::{AuthApi, CallerContext, MemoryStore, Statement};
//!
//! # fn main() -> bastion::ApiResult<()> {
//! let api = AuthApi::new(Arc::new(MemoryStore::new()));
//! let admin = CallerContext::admin("root");
//!
//! api.add_user(&admin, "alice", "/")?;
//! api.add_group(&admin, "acme", "readers", "/")?;
//! api.add_policy(&admin, "acme", "read-groups", "/", vec![
//!     Statement::allow(["iam:GetGroup"], ["urn:iws:iam:acme:group/*"]),
//! ])?;
//! api.add_member(&admin, "alice", "readers", "acme")?;
//! api.attach_policy_to_group(&admin, "acme", "readers", "read-groups")?;
//!
//! let alice = CallerContext::user("alice");
//! assert!(api.get_group_by_name(&alice, "acme", "readers").is_ok());
//! assert!(api.remove_group(&alice, "acme", "readers").is_err());
//! # Ok(())
//! # }
//! ```
//!
//! ## Proxy usage
//!
//! ```rust
//! use std::sync::Arc;
//! use bastion::{AuthorizationEngine, CallerContext, MemoryStore, Urn};
//!
//! let engine = AuthorizationEngine::with_store(Arc::new(MemoryStore::new()));
//! let urn = Urn::from_external("urn:ews:example:instance:resource/1");
//!
//! // Unknown callers fail the lookup; the proxy must answer 500, not forward
//! assert!(engine
//!     .authorize_external_resource(&CallerContext::user("ghost"), &urn, "example:Get")
//!     .is_err());
//! ```

pub mod api;
pub mod config;
pub mod core;
pub mod error;
pub mod proxy;

// Core modules at the crate root
pub use crate::core::{iam, model, store, urn, validation};

pub use crate::api::AuthApi;
pub use crate::config::{Config, ProxyConfig, ProxyResource};
pub use crate::core::{
    iam::{AuthorizationEngine, Decision, Effect, Statement},
    model::{CallerContext, ExternalResource, Group, GroupIdentity, Policy, PolicyIdentity, Resource, User},
    store::{GroupLookup, GroupRepo, MemoryStore, PolicyLookup, PolicyRepo, UserRepo},
    urn::Urn,
};
pub use crate::error::{
    ApiError, ApiResult, AuthzError, AuthzResult, ConfigError, LookupError, LookupResult,
};
pub use crate::proxy::{ProxyDecision, ProxyGate};
