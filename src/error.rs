//! Error types for the authorization engine, the management API and configuration loading

use thiserror::Error;

/// Result type returned by store collaborators
pub type LookupResult<T> = Result<T, LookupError>;

/// Result type returned by the authorization engine
pub type AuthzResult<T> = Result<T, AuthzError>;

/// Result type returned by the management API
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors reported by user, group and policy stores
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// The requested record does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// A record with the same unique key already exists
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The store could not be read or written
    #[error("Internal store error: {0}")]
    Internal(String),
}

/// Errors reported by the authorization engine
///
/// A denied request is not an error: it is an empty allowed set (or `false`).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthzError {
    /// Resolving the caller's groups or policies failed
    #[error("Lookup failed: {0}")]
    Lookup(#[from] LookupError),
}

/// Errors reported by the management API
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("User with externalId {identifier} is not allowed to access to resource {urn}")]
    Unauthorized { identifier: String, urn: String },

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Group not found: {0}")]
    GroupNotFound(String),

    #[error("Policy not found: {0}")]
    PolicyNotFound(String),

    #[error("User already exists: {0}")]
    UserAlreadyExists(String),

    #[error("Group already exists: {0}")]
    GroupAlreadyExists(String),

    #[error("Policy already exists: {0}")]
    PolicyAlreadyExists(String),

    #[error("User {user} is already a member of group {group}")]
    AlreadyMember { user: String, group: String },

    #[error("User {user} is not a member of group {group}")]
    NotMember { user: String, group: String },

    #[error("Policy {policy} is already attached to group {group}")]
    PolicyAlreadyAttached { policy: String, group: String },

    #[error("Policy {policy} is not attached to group {group}")]
    PolicyNotAttached { policy: String, group: String },

    #[error("Invalid policy: {0}")]
    InvalidPolicy(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// HTTP status a transport layer should answer with
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::InvalidParameter(_) | ApiError::InvalidPolicy(_) => 400,
            ApiError::Unauthorized { .. } => 403,
            ApiError::UserNotFound(_) | ApiError::GroupNotFound(_) | ApiError::PolicyNotFound(_) => {
                404
            }
            ApiError::UserAlreadyExists(_)
            | ApiError::GroupAlreadyExists(_)
            | ApiError::PolicyAlreadyExists(_)
            | ApiError::AlreadyMember { .. }
            | ApiError::NotMember { .. }
            | ApiError::PolicyAlreadyAttached { .. }
            | ApiError::PolicyNotAttached { .. } => 409,
            ApiError::Internal(_) => 500,
        }
    }
}

impl From<LookupError> for ApiError {
    fn from(err: LookupError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

/// Errors reported while loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid proxy resource '{id}': {reason}")]
    InvalidResource { id: String, reason: String },
}
