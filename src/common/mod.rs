//! Collaborator interfaces, their in-memory implementations, and config loading

pub mod config;
pub mod memory;
pub mod traits;
