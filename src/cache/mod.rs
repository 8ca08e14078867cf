// 缓存模块
// 后端适配器（Redis / 进程内替身）与缓存键

mod backend;
pub mod keys;
mod memory_backend;
mod redis_backend;

pub use backend::{CacheBackend, init_cache_backend};
pub use keys::{USERS_ALL_KEY, user_key};
pub use memory_backend::MemoryCacheBackend;
pub use redis_backend::{ConnectionState, RedisCacheBackend};
