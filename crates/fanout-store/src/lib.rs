pub mod backend;
pub mod config;
pub mod redis_store;

pub use backend::Store;
pub use config::StoreConfig;
pub use redis_store::RedisStore;
