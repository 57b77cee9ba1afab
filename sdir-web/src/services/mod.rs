//! External collaborator clients

pub mod face;
pub mod identity;
pub mod record_store;
