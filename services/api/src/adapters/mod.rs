pub mod cache;
pub mod db;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;

pub use cache::RedisCache;
pub use db::DbAdapter;
#[cfg(any(test, feature = "test-util"))]
pub use memory::{MemoryCache, MemoryStore};
