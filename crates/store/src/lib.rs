//! Key-value store backends for the Redis provider.
//!
//! [`KvStore`] is the narrow string key-value surface the provider needs:
//! EXISTS, GET, SET without expiry, DEL and PING. [`RedisKvStore`] talks to a
//! real server through a `deadpool-redis` pool; [`MemoryKvStore`] keeps
//! everything in a [`dashmap::DashMap`].
//!
//! The [`testing`] module carries failure-injecting doubles and a
//! conformance suite every backend is expected to pass.

mod config;
pub mod error;
mod memory;
mod redis_store;
pub mod store;
pub mod testing;

pub use config::RedisConfig;
pub use error::StoreError;
pub use memory::MemoryKvStore;
pub use redis_store::RedisKvStore;
pub use store::KvStore;
