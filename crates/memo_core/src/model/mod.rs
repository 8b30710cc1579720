//! Client data model.
//!
//! # Responsibility
//! - Define memo, identity and profile records mirrored from the remote
//!   service.
//! - Provide the partition key that scopes every memo operation.
//!
//! # Invariants
//! - A `PartitionKey` can only be derived from an authenticated identity.

pub mod memo;
pub mod user;
