//! Remote-store access contracts and their local implementations.
//!
//! # Responsibility
//! - Define the memo, profile and batch-write operations the client issues
//!   against the remote document store.
//! - Keep SQL details of the local backend behind those contracts.
//!
//! # Invariants
//! - Every memo operation is addressed by a `PartitionKey`; no API reaches
//!   across partitions.
//! - Repository APIs return semantic errors (`NotFound`) in addition to
//!   transport errors.

pub mod batch;
pub mod memo_repo;
pub mod profile_repo;
