//! Connection lifecycle: one stored token set per (owner, provider).

mod manager;
mod memory;
mod model;
mod storage;

pub use manager::Manager;
pub use memory::MemoryStorage;
pub use model::Connection;
pub use storage::Storage;
