//! Field validation for names, organizations, paths and policy content
//!
//! The management API validates every field before touching a store, so the
//! authorization engine only ever sees well-formed URNs and statements.

use regex::Regex;
use std::sync::LazyLock;

/// Maximum length of any name-like field
const MAX_LENGTH: usize = 128;

/// Maximum length of a path
const MAX_PATH_LENGTH: usize = 512;

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w+.@\-]+$").expect("name pattern is valid"));

static ORG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w\-]+$").expect("org pattern is valid"));

static PATH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/$|^/[\w+\-]+(/[\w+\-]+)*/$").expect("path pattern is valid"));

static EXTERNAL_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w+.@=\-]+$").expect("external id pattern is valid"));

static ACTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\*$|^[\w\-]+:(\*|[\w\-]+\*?)$").expect("action pattern is valid")
});

static RESOURCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\*$|^urn:[\w+.@=/*:\-]*$").expect("resource pattern is valid")
});

/// Validate a group or policy name
///
/// # Examples
/// ```
/// use bastion::validation::is_valid_name;
///
/// assert!(is_valid_name("backend-devs"));
/// assert!(!is_valid_name("back end"));
/// ```
pub fn is_valid_name(name: &str) -> bool {
    name.len() <= MAX_LENGTH && NAME_RE.is_match(name)
}

/// Validate an organization identifier
pub fn is_valid_org(org: &str) -> bool {
    org.len() <= MAX_LENGTH && ORG_RE.is_match(org)
}

/// Validate a hierarchical path (`/` or `/a/b/`)
pub fn is_valid_path(path: &str) -> bool {
    path.len() <= MAX_PATH_LENGTH && PATH_RE.is_match(path)
}

/// Validate the external identifier of a user
pub fn is_valid_user_external_id(id: &str) -> bool {
    id.len() <= MAX_LENGTH && EXTERNAL_ID_RE.is_match(id)
}

/// Validate an action pattern (`*`, `namespace:Verb`, `namespace:*`, `namespace:Prefix*`)
pub fn is_valid_action(action: &str) -> bool {
    action.len() <= MAX_LENGTH && ACTION_RE.is_match(action)
}

/// Validate a resource pattern (`*` or a URN, possibly with wildcards)
pub fn is_valid_resource(resource: &str) -> bool {
    resource.len() <= MAX_PATH_LENGTH && RESOURCE_RE.is_match(resource)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names() {
        assert!(is_valid_name("group1"));
        assert!(is_valid_name("ops.team@eu"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("a/b"));
        assert!(!is_valid_name("a:b"));
        assert!(!is_valid_name(&"x".repeat(MAX_LENGTH + 1)));
    }

    #[test]
    fn test_orgs() {
        assert!(is_valid_org("acme"));
        assert!(is_valid_org("acme-eu_1"));
        assert!(!is_valid_org("acme.eu"));
        assert!(!is_valid_org("*"));
        assert!(!is_valid_org(""));
    }

    #[test]
    fn test_paths() {
        assert!(is_valid_path("/"));
        assert!(is_valid_path("/eng/"));
        assert!(is_valid_path("/eng/backend/"));
        assert!(!is_valid_path("eng/"));
        assert!(!is_valid_path("/eng"));
        assert!(!is_valid_path("/eng//backend/"));
        assert!(!is_valid_path("/eng/*/"));
        assert!(!is_valid_path("/../"));
    }

    #[test]
    fn test_external_ids() {
        assert!(is_valid_user_external_id("alice@example.com"));
        assert!(is_valid_user_external_id("user=42"));
        assert!(!is_valid_user_external_id("alice smith"));
    }

    #[test]
    fn test_actions() {
        assert!(is_valid_action("*"));
        assert!(is_valid_action("iam:*"));
        assert!(is_valid_action("iam:GetGroup"));
        assert!(is_valid_action("iam:Get*"));
        assert!(is_valid_action("example-svc:read"));
        assert!(!is_valid_action("iam"));
        assert!(!is_valid_action("iam:"));
        assert!(!is_valid_action("*:GetGroup"));
        assert!(!is_valid_action("iam:G*t"));
    }

    #[test]
    fn test_resources() {
        assert!(is_valid_resource("*"));
        assert!(is_valid_resource("urn:iws:iam:org1:group/*"));
        assert!(is_valid_resource("urn:ews:example:instance:resource/1"));
        assert!(!is_valid_resource("group/g1"));
        assert!(!is_valid_resource("urn:iws:iam:org1:group/ g1"));
    }
}
