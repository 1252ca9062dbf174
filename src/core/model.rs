//! Domain entities: users, groups and policies
//!
//! Every entity exposes its URN through [`Resource`], which is all the
//! authorization engine needs to know about it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::iam::Statement;
use crate::urn::{normalize_path, Urn, RESOURCE_GROUP, RESOURCE_POLICY, RESOURCE_USER};

/// Anything that can be authorized by URN
pub trait Resource {
    fn urn(&self) -> &Urn;
}

impl<T: Resource + ?Sized> Resource for &T {
    fn urn(&self) -> &Urn {
        (**self).urn()
    }
}

/// Who is calling, as established by the authentication layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerContext {
    /// External identifier of the caller
    pub identifier: String,
    /// Admin callers bypass policy evaluation
    pub admin: bool,
}

impl CallerContext {
    pub fn user(identifier: impl Into<String>) -> Self {
        CallerContext {
            identifier: identifier.into(),
            admin: false,
        }
    }

    pub fn admin(identifier: impl Into<String>) -> Self {
        CallerContext {
            identifier: identifier.into(),
            admin: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub external_id: String,
    pub path: String,
    pub create_at: DateTime<Utc>,
    pub urn: Urn,
}

impl User {
    /// Build a new user with a generated ID; users are not scoped to an organization
    pub fn new(external_id: &str, path: &str) -> Self {
        let path = normalize_path(path);
        User {
            id: Uuid::new_v4().to_string(),
            external_id: external_id.to_string(),
            urn: Urn::new("", RESOURCE_USER, &path, external_id),
            path,
            create_at: Utc::now(),
        }
    }
}

impl Resource for User {
    fn urn(&self) -> &Urn {
        &self.urn
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    pub name: String,
    pub path: String,
    pub org: String,
    pub create_at: DateTime<Utc>,
    pub urn: Urn,
}

impl Group {
    /// Build a new group with a generated ID
    pub fn new(org: &str, name: &str, path: &str) -> Self {
        let path = normalize_path(path);
        Group {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            org: org.to_string(),
            urn: Urn::new(org, RESOURCE_GROUP, &path, name),
            path,
            create_at: Utc::now(),
        }
    }
}

impl Resource for Group {
    fn urn(&self) -> &Urn {
        &self.urn
    }
}

/// Group reference returned by list operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupIdentity {
    pub org: String,
    pub name: String,
}

impl From<&Group> for GroupIdentity {
    fn from(group: &Group) -> Self {
        GroupIdentity {
            org: group.org.clone(),
            name: group.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    pub id: String,
    pub name: String,
    pub path: String,
    pub org: String,
    pub create_at: DateTime<Utc>,
    pub urn: Urn,
    pub statements: Vec<Statement>,
}

impl Policy {
    /// Build a new policy with a generated ID
    ///
    /// Statements are not validated here; see [`crate::iam::validate_statements`].
    pub fn new(org: &str, name: &str, path: &str, statements: Vec<Statement>) -> Self {
        let path = normalize_path(path);
        Policy {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            org: org.to_string(),
            urn: Urn::new(org, RESOURCE_POLICY, &path, name),
            path,
            create_at: Utc::now(),
            statements,
        }
    }
}

impl Resource for Policy {
    fn urn(&self) -> &Urn {
        &self.urn
    }
}

/// Policy reference returned by list operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyIdentity {
    pub org: String,
    pub name: String,
}

impl From<&Policy> for PolicyIdentity {
    fn from(policy: &Policy) -> Self {
        PolicyIdentity {
            org: policy.org.clone(),
            name: policy.name.clone(),
        }
    }
}

/// Resource named by an external service, authorized through the proxy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalResource {
    pub urn: Urn,
}

impl ExternalResource {
    pub fn new(urn: Urn) -> Self {
        ExternalResource { urn }
    }
}

impl Resource for ExternalResource {
    fn urn(&self) -> &Urn {
        &self.urn
    }
}

impl Resource for Urn {
    fn urn(&self) -> &Urn {
        self
    }
}
