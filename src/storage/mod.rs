//! Key-value storage used to hold the bearer credential and session state.
//!
//! # Structure
//!
//! - `file` - Persistent storage backed by a JSON file (survives restarts)
//! - `memory` - Session-scoped storage that lives as long as the process

mod file;
mod memory;

use anyhow::Result;

pub use file::FileStorage;
pub use memory::MemoryStorage;

/// Key under which the bearer credential is kept in persistent storage.
pub const TOKEN_KEY: &str = "token";

#[cfg_attr(test, mockall::automock)]
pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;

    /// Remove every entry. Clearing an already empty storage is not an error.
    fn clear(&self) -> Result<()>;
}
