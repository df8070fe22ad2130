mod config;
mod store;

pub use config::MemoryConfig;
pub use store::MemoryStore;
