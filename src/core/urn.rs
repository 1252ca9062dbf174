//! Uniform Resource Names for IAM resources
//!
//! A URN is the ordered concatenation of a fixed prefix, the organization,
//! the resource type, a hierarchical path and the resource name:
//!
//! ```text
//! urn:iws:iam:<org>:<resource-type><path><name>
//! urn:iws:iam:acme:group/engineering/backend
//! ```
//!
//! An empty organization is written as `*`, which matches any organization
//! when the URN is used as a statement pattern.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::iam::PatternMatcher;

/// Prefix shared by every URN this service builds
pub const URN_PREFIX: &str = "urn:iws:iam";

/// Segment written in place of an empty organization
pub const ANY_ORG: &str = "*";

pub const RESOURCE_GROUP: &str = "group";
pub const RESOURCE_USER: &str = "user";
pub const RESOURCE_POLICY: &str = "policy";

/// Canonical resource name
///
/// Built once and never mutated; equality is string equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Urn(String);

impl Urn {
    /// Build the URN of a named resource
    ///
    /// # Examples
    /// ```
    /// use bastion::Urn;
    ///
    /// let urn = Urn::new("acme", "group", "/eng", "backend");
    /// assert_eq!(urn.as_str(), "urn:iws:iam:acme:group/eng/backend");
    /// ```
    pub fn new(org: &str, resource_type: &str, path: &str, name: &str) -> Self {
        Urn(format!(
            "{}:{}:{}{}{}",
            URN_PREFIX,
            org_segment(org),
            resource_type,
            normalize_path(path),
            name
        ))
    }

    /// Build a pattern covering every resource under `path_prefix`
    ///
    /// ```
    /// use bastion::Urn;
    ///
    /// let prefix = Urn::prefix("acme", "group", "/eng");
    /// assert_eq!(prefix.as_str(), "urn:iws:iam:acme:group/eng/*");
    /// assert!(prefix.matches(&Urn::new("acme", "group", "/eng/", "backend")));
    /// ```
    pub fn prefix(org: &str, resource_type: &str, path_prefix: &str) -> Self {
        Urn(format!(
            "{}:{}:{}{}*",
            URN_PREFIX,
            org_segment(org),
            resource_type,
            normalize_path(path_prefix)
        ))
    }

    /// Wrap an already constructed URN supplied from outside the service
    pub fn from_external(urn: impl Into<String>) -> Self {
        Urn(urn.into())
    }

    /// Treat `self` as a pattern and test `candidate` against it
    pub fn matches(&self, candidate: &Urn) -> bool {
        PatternMatcher::matches(&self.0, &candidate.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for Urn {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Urn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn org_segment(org: &str) -> &str {
    if org.is_empty() {
        ANY_ORG
    } else {
        org
    }
}

/// Force a path to start and end with `/`
pub fn normalize_path(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{}/", trimmed)
    }
}
