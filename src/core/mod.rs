//! Core authorization model: URNs, entities, stores and the IAM engine

pub mod iam;
pub mod model;
pub mod store;
pub mod urn;
pub mod validation;
