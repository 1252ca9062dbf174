//! Store contracts and an in-memory implementation
//!
//! Persistence is owned by the stores; the authorization engine only reads
//! through [`GroupLookup`] and [`PolicyLookup`].

use ahash::{AHashMap, AHashSet};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{LookupError, LookupResult};
use crate::iam::Statement;
use crate::model::{Group, Policy, User};
use crate::urn::Urn;

/// Resolves the groups a caller belongs to
pub trait GroupLookup: Send + Sync {
    /// Groups of the user with external identifier `external_id`
    fn groups_for_user(&self, external_id: &str) -> LookupResult<Vec<Group>>;
}

/// Resolves the policies attached to groups
pub trait PolicyLookup: Send + Sync {
    /// Policies attached to any of `group_ids`; empty input yields empty output
    fn policies_for_groups(&self, group_ids: &[String]) -> LookupResult<Vec<Policy>>;
}

pub trait UserRepo: Send + Sync {
    fn get_user_by_external_id(&self, external_id: &str) -> LookupResult<User>;
    fn add_user(&self, user: User) -> LookupResult<User>;
    fn get_users_filtered(&self, path_prefix: &str) -> LookupResult<Vec<User>>;
    fn get_groups_by_user_id(&self, user_id: &str) -> LookupResult<Vec<Group>>;
    fn remove_user(&self, user_id: &str) -> LookupResult<()>;
}

pub trait GroupRepo: Send + Sync {
    fn get_group_by_name(&self, org: &str, name: &str) -> LookupResult<Group>;
    /// Groups whose path starts with `path_prefix`; an empty org selects all orgs
    fn get_groups_filtered(&self, org: &str, path_prefix: &str) -> LookupResult<Vec<Group>>;
    fn add_group(&self, group: Group) -> LookupResult<Group>;
    fn update_group(
        &self,
        group: &Group,
        new_name: &str,
        new_path: &str,
        new_urn: Urn,
    ) -> LookupResult<Group>;
    fn remove_group(&self, group_id: &str) -> LookupResult<()>;

    fn is_member_of_group(&self, user_id: &str, group_id: &str) -> LookupResult<bool>;
    fn add_member(&self, user_id: &str, group_id: &str) -> LookupResult<()>;
    fn remove_member(&self, user_id: &str, group_id: &str) -> LookupResult<()>;
    fn get_group_members(&self, group_id: &str) -> LookupResult<Vec<User>>;

    fn is_attached_to_group(&self, group_id: &str, policy_id: &str) -> LookupResult<bool>;
    fn attach_policy(&self, group_id: &str, policy_id: &str) -> LookupResult<()>;
    fn detach_policy(&self, group_id: &str, policy_id: &str) -> LookupResult<()>;
    fn get_attached_policies(&self, group_id: &str) -> LookupResult<Vec<Policy>>;
}

pub trait PolicyRepo: Send + Sync {
    fn get_policy_by_name(&self, org: &str, name: &str) -> LookupResult<Policy>;
    /// Policies whose path starts with `path_prefix`; an empty org selects all orgs
    fn get_policies_filtered(&self, org: &str, path_prefix: &str) -> LookupResult<Vec<Policy>>;
    fn add_policy(&self, policy: Policy) -> LookupResult<Policy>;
    fn update_policy(
        &self,
        policy: &Policy,
        new_name: &str,
        new_path: &str,
        new_urn: Urn,
        statements: Vec<Statement>,
    ) -> LookupResult<Policy>;
    fn remove_policy(&self, policy_id: &str) -> LookupResult<()>;
    fn get_attached_groups(&self, policy_id: &str) -> LookupResult<Vec<Group>>;
}

#[derive(Default)]
struct Tables {
    users: AHashMap<String, User>,
    groups: AHashMap<String, Group>,
    policies: AHashMap<String, Policy>,
    /// (user_id, group_id)
    members: AHashSet<(String, String)>,
    /// (group_id, policy_id)
    attachments: AHashSet<(String, String)>,
}

/// Thread-safe in-memory store implementing every store contract
///
/// List operations return records ordered by creation time, then ID.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with [`LookupError::Internal`]
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> LookupResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(LookupError::Internal("store unavailable".to_string()));
        }
        Ok(())
    }
}

fn sorted<T, F>(mut items: Vec<T>, key: F) -> Vec<T>
where
    F: Fn(&T) -> (chrono::DateTime<chrono::Utc>, String),
{
    items.sort_by_key(|item| key(item));
    items
}

fn sorted_groups(groups: Vec<Group>) -> Vec<Group> {
    sorted(groups, |g| (g.create_at, g.id.clone()))
}

fn sorted_policies(policies: Vec<Policy>) -> Vec<Policy> {
    sorted(policies, |p| (p.create_at, p.id.clone()))
}

/// Records scoped by org and name
trait OrgNamed {
    fn id(&self) -> &str;
    fn org(&self) -> &str;
    fn name(&self) -> &str;
}

impl OrgNamed for Group {
    fn id(&self) -> &str {
        &self.id
    }
    fn org(&self) -> &str {
        &self.org
    }
    fn name(&self) -> &str {
        &self.name
    }
}

impl OrgNamed for Policy {
    fn id(&self) -> &str {
        &self.id
    }
    fn org(&self) -> &str {
        &self.org
    }
    fn name(&self) -> &str {
        &self.name
    }
}

/// True if a record other than `id` already holds `name` in `org`
fn name_taken<'a, T: OrgNamed + 'a>(
    records: impl IntoIterator<Item = &'a T>,
    org: &str,
    name: &str,
    id: &str,
) -> bool {
    records
        .into_iter()
        .any(|r| r.org() == org && r.name() == name && r.id() != id)
}

fn sorted_users(users: Vec<User>) -> Vec<User> {
    sorted(users, |u| (u.create_at, u.id.clone()))
}

impl UserRepo for MemoryStore {
    fn get_user_by_external_id(&self, external_id: &str) -> LookupResult<User> {
        self.check_available()?;
        let tables = self.tables.read();
        tables
            .users
            .values()
            .find(|u| u.external_id == external_id)
            .cloned()
            .ok_or_else(|| LookupError::NotFound(format!("user {}", external_id)))
    }

    fn add_user(&self, user: User) -> LookupResult<User> {
        self.check_available()?;
        let mut tables = self.tables.write();
        if tables.users.values().any(|u| u.external_id == user.external_id) {
            return Err(LookupError::Conflict(format!("user {}", user.external_id)));
        }
        tables.users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    fn get_users_filtered(&self, path_prefix: &str) -> LookupResult<Vec<User>> {
        self.check_available()?;
        let tables = self.tables.read();
        let users = tables
            .users
            .values()
            .filter(|u| u.path.starts_with(path_prefix))
            .cloned()
            .collect();
        Ok(sorted_users(users))
    }

    fn get_groups_by_user_id(&self, user_id: &str) -> LookupResult<Vec<Group>> {
        self.check_available()?;
        let tables = self.tables.read();
        let groups = tables
            .members
            .iter()
            .filter(|(uid, _)| uid == user_id)
            .filter_map(|(_, gid)| tables.groups.get(gid).cloned())
            .collect();
        Ok(sorted_groups(groups))
    }

    fn remove_user(&self, user_id: &str) -> LookupResult<()> {
        self.check_available()?;
        let mut tables = self.tables.write();
        if tables.users.remove(user_id).is_none() {
            return Err(LookupError::NotFound(format!("user id {}", user_id)));
        }
        tables.members.retain(|(uid, _)| uid != user_id);
        Ok(())
    }
}

impl GroupRepo for MemoryStore {
    fn get_group_by_name(&self, org: &str, name: &str) -> LookupResult<Group> {
        self.check_available()?;
        let tables = self.tables.read();
        tables
            .groups
            .values()
            .find(|g| g.org == org && g.name == name)
            .cloned()
            .ok_or_else(|| LookupError::NotFound(format!("group {} in org {}", name, org)))
    }

    fn get_groups_filtered(&self, org: &str, path_prefix: &str) -> LookupResult<Vec<Group>> {
        self.check_available()?;
        let tables = self.tables.read();
        let groups = tables
            .groups
            .values()
            .filter(|g| (org.is_empty() || g.org == org) && g.path.starts_with(path_prefix))
            .cloned()
            .collect();
        Ok(sorted_groups(groups))
    }

    fn add_group(&self, group: Group) -> LookupResult<Group> {
        self.check_available()?;
        let mut tables = self.tables.write();
        if name_taken(tables.groups.values(), &group.org, &group.name, &group.id) {
            return Err(LookupError::Conflict(format!(
                "group {} in org {}",
                group.name, group.org
            )));
        }
        tables.groups.insert(group.id.clone(), group.clone());
        Ok(group)
    }

    fn update_group(
        &self,
        group: &Group,
        new_name: &str,
        new_path: &str,
        new_urn: Urn,
    ) -> LookupResult<Group> {
        self.check_available()?;
        let mut tables = self.tables.write();
        if name_taken(tables.groups.values(), &group.org, new_name, &group.id) {
            return Err(LookupError::Conflict(format!(
                "group {} in org {}",
                new_name, group.org
            )));
        }
        let stored = tables
            .groups
            .get_mut(&group.id)
            .ok_or_else(|| LookupError::NotFound(format!("group id {}", group.id)))?;
        stored.name = new_name.to_string();
        stored.path = new_path.to_string();
        stored.urn = new_urn;
        Ok(stored.clone())
    }

    fn remove_group(&self, group_id: &str) -> LookupResult<()> {
        self.check_available()?;
        let mut tables = self.tables.write();
        if tables.groups.remove(group_id).is_none() {
            return Err(LookupError::NotFound(format!("group id {}", group_id)));
        }
        tables.members.retain(|(_, gid)| gid != group_id);
        tables.attachments.retain(|(gid, _)| gid != group_id);
        Ok(())
    }

    fn is_member_of_group(&self, user_id: &str, group_id: &str) -> LookupResult<bool> {
        self.check_available()?;
        let tables = self.tables.read();
        Ok(tables
            .members
            .contains(&(user_id.to_string(), group_id.to_string())))
    }

    fn add_member(&self, user_id: &str, group_id: &str) -> LookupResult<()> {
        self.check_available()?;
        let mut tables = self.tables.write();
        tables
            .members
            .insert((user_id.to_string(), group_id.to_string()));
        Ok(())
    }

    fn remove_member(&self, user_id: &str, group_id: &str) -> LookupResult<()> {
        self.check_available()?;
        let mut tables = self.tables.write();
        tables
            .members
            .remove(&(user_id.to_string(), group_id.to_string()));
        Ok(())
    }

    fn get_group_members(&self, group_id: &str) -> LookupResult<Vec<User>> {
        self.check_available()?;
        let tables = self.tables.read();
        let users = tables
            .members
            .iter()
            .filter(|(_, gid)| gid == group_id)
            .filter_map(|(uid, _)| tables.users.get(uid).cloned())
            .collect();
        Ok(sorted_users(users))
    }

    fn is_attached_to_group(&self, group_id: &str, policy_id: &str) -> LookupResult<bool> {
        self.check_available()?;
        let tables = self.tables.read();
        Ok(tables
            .attachments
            .contains(&(group_id.to_string(), policy_id.to_string())))
    }

    fn attach_policy(&self, group_id: &str, policy_id: &str) -> LookupResult<()> {
        self.check_available()?;
        let mut tables = self.tables.write();
        tables
            .attachments
            .insert((group_id.to_string(), policy_id.to_string()));
        Ok(())
    }

    fn detach_policy(&self, group_id: &str, policy_id: &str) -> LookupResult<()> {
        self.check_available()?;
        let mut tables = self.tables.write();
        tables
            .attachments
            .remove(&(group_id.to_string(), policy_id.to_string()));
        Ok(())
    }

    fn get_attached_policies(&self, group_id: &str) -> LookupResult<Vec<Policy>> {
        self.check_available()?;
        let tables = self.tables.read();
        let policies = tables
            .attachments
            .iter()
            .filter(|(gid, _)| gid == group_id)
            .filter_map(|(_, pid)| tables.policies.get(pid).cloned())
            .collect();
        Ok(sorted_policies(policies))
    }
}

impl PolicyRepo for MemoryStore {
    fn get_policy_by_name(&self, org: &str, name: &str) -> LookupResult<Policy> {
        self.check_available()?;
        let tables = self.tables.read();
        tables
            .policies
            .values()
            .find(|p| p.org == org && p.name == name)
            .cloned()
            .ok_or_else(|| LookupError::NotFound(format!("policy {} in org {}", name, org)))
    }

    fn get_policies_filtered(&self, org: &str, path_prefix: &str) -> LookupResult<Vec<Policy>> {
        self.check_available()?;
        let tables = self.tables.read();
        let policies = tables
            .policies
            .values()
            .filter(|p| (org.is_empty() || p.org == org) && p.path.starts_with(path_prefix))
            .cloned()
            .collect();
        Ok(sorted_policies(policies))
    }

    fn add_policy(&self, policy: Policy) -> LookupResult<Policy> {
        self.check_available()?;
        let mut tables = self.tables.write();
        if name_taken(tables.policies.values(), &policy.org, &policy.name, &policy.id) {
            return Err(LookupError::Conflict(format!(
                "policy {} in org {}",
                policy.name, policy.org
            )));
        }
        tables.policies.insert(policy.id.clone(), policy.clone());
        Ok(policy)
    }

    fn update_policy(
        &self,
        policy: &Policy,
        new_name: &str,
        new_path: &str,
        new_urn: Urn,
        statements: Vec<Statement>,
    ) -> LookupResult<Policy> {
        self.check_available()?;
        let mut tables = self.tables.write();
        if name_taken(tables.policies.values(), &policy.org, new_name, &policy.id) {
            return Err(LookupError::Conflict(format!(
                "policy {} in org {}",
                new_name, policy.org
            )));
        }
        let stored = tables
            .policies
            .get_mut(&policy.id)
            .ok_or_else(|| LookupError::NotFound(format!("policy id {}", policy.id)))?;
        stored.name = new_name.to_string();
        stored.path = new_path.to_string();
        stored.urn = new_urn;
        stored.statements = statements;
        Ok(stored.clone())
    }

    fn remove_policy(&self, policy_id: &str) -> LookupResult<()> {
        self.check_available()?;
        let mut tables = self.tables.write();
        if tables.policies.remove(policy_id).is_none() {
            return Err(LookupError::NotFound(format!("policy id {}", policy_id)));
        }
        tables.attachments.retain(|(_, pid)| pid != policy_id);
        Ok(())
    }

    fn get_attached_groups(&self, policy_id: &str) -> LookupResult<Vec<Group>> {
        self.check_available()?;
        let tables = self.tables.read();
        let groups = tables
            .attachments
            .iter()
            .filter(|(_, pid)| pid == policy_id)
            .filter_map(|(gid, _)| tables.groups.get(gid).cloned())
            .collect();
        Ok(sorted_groups(groups))
    }
}

impl GroupLookup for MemoryStore {
    fn groups_for_user(&self, external_id: &str) -> LookupResult<Vec<Group>> {
        let user = self.get_user_by_external_id(external_id)?;
        self.get_groups_by_user_id(&user.id)
    }
}

impl PolicyLookup for MemoryStore {
    fn policies_for_groups(&self, group_ids: &[String]) -> LookupResult<Vec<Policy>> {
        if group_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.check_available()?;
        let tables = self.tables.read();
        let wanted: AHashSet<&str> = group_ids.iter().map(String::as_str).collect();
        let policies = tables
            .attachments
            .iter()
            .filter(|(gid, _)| wanted.contains(gid.as_str()))
            .filter_map(|(_, pid)| tables.policies.get(pid).cloned())
            .collect();
        // One entry per attachment; the engine deduplicates by ID
        Ok(sorted_policies(policies))
    }
}
