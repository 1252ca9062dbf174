//! Action identifiers checked by the management API

pub const CREATE_GROUP: &str = "iam:CreateGroup";
pub const DELETE_GROUP: &str = "iam:DeleteGroup";
pub const GET_GROUP: &str = "iam:GetGroup";
pub const LIST_GROUPS: &str = "iam:ListGroups";
pub const UPDATE_GROUP: &str = "iam:UpdateGroup";
pub const LIST_MEMBERS: &str = "iam:ListMembers";
pub const ADD_MEMBER: &str = "iam:AddMember";
pub const REMOVE_MEMBER: &str = "iam:RemoveMember";
pub const ATTACH_GROUP_POLICY: &str = "iam:AttachGroupPolicy";
pub const DETACH_GROUP_POLICY: &str = "iam:DetachGroupPolicy";
pub const LIST_ATTACHED_GROUP_POLICIES: &str = "iam:ListAttachedGroupPolicies";

pub const CREATE_USER: &str = "iam:CreateUser";
pub const DELETE_USER: &str = "iam:DeleteUser";
pub const GET_USER: &str = "iam:GetUser";
pub const LIST_USERS: &str = "iam:ListUsers";
pub const LIST_GROUPS_FOR_USER: &str = "iam:ListGroupsForUser";

pub const CREATE_POLICY: &str = "iam:CreatePolicy";
pub const DELETE_POLICY: &str = "iam:DeletePolicy";
pub const GET_POLICY: &str = "iam:GetPolicy";
pub const LIST_POLICIES: &str = "iam:ListPolicies";
pub const UPDATE_POLICY: &str = "iam:UpdatePolicy";
pub const LIST_ATTACHED_GROUPS: &str = "iam:ListAttachedGroups";
