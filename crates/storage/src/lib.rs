//! Data-store boundary for charterops.
//!
//! The rules and monitor only talk to the [`Store`] trait. The backing
//! database is external; [`MemoryStore`] is the in-process backend used
//! for development, demos, and tests.

pub mod error;
pub mod memory;
pub mod store;

pub use error::StoreError;
pub use memory::{MemoryStore, StoreOp};
pub use store::{
    commit_sequentially, ActivationCommit, ActivationStep, AlertFilter, CommitError, Store,
};
