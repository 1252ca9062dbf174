//! Identity and Access Management (IAM) policy evaluation
//!
//! Provides the authorization primitive shared by the management API and the proxy:
//! - Allow/Deny statements with explicit deny precedence across all policies
//! - Wildcard pattern matching for resource URNs and actions
//! - Admin bypass without any store lookup
//! - Resource filtering that preserves candidate order

pub mod actions;
mod engine;
mod filter;
mod pattern;
mod policy;

pub use engine::{evaluate, AuthorizationEngine, Decision};
pub use pattern::PatternMatcher;
pub use policy::{action_matches, validate_statements, Effect, Statement, ANY_ACTION};
