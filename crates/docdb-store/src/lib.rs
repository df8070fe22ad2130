mod filter;
mod memory;
mod sort;

pub use filter::matches;
pub use memory::{MemoryConfig, MemoryStore};
pub use sort::{compare_values, sort_documents};
