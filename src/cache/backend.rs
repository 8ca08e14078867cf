use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::{MemoryCacheBackend, RedisCacheBackend};
use crate::config::Config;

/// 缓存后端接口
///
/// 所有操作都不向调用方返回错误：失败时记录日志并返回中性值
/// （`get` 返回 `None`，写操作视为成功的空操作）。缓存只是加速手段，
/// 不可用时不应导致请求失败。
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// 后端名称，用于日志和健康检查
    fn name(&self) -> &'static str;

    fn is_available(&self) -> bool;

    async fn get(&self, key: &str) -> Option<String>;

    /// `ttl` 为 `None` 时不过期
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>);

    async fn del(&self, key: &str);

    async fn hget_all(&self, key: &str) -> HashMap<String, String>;

    async fn hset(&self, key: &str, field: &str, value: &str);

    async fn expire(&self, key: &str, ttl: Duration);

    /// 被吸收的失败次数
    fn failure_count(&self) -> u64 {
        0
    }

    /// 关闭连接，之后 `is_available` 返回 false
    fn close(&self) {}
}

/// 按配置选择缓存后端
///
/// 未启用缓存、未配置 Redis 或连接失败时，使用报告不可用的进程内替身。
pub async fn init_cache_backend(config: &Config) -> Arc<dyn CacheBackend> {
    if !config.cache_enabled {
        tracing::info!("Cache is disabled in configuration, using in-memory stand-in");
        return Arc::new(MemoryCacheBackend::fallback());
    }

    let Some(redis_url) = config.redis_url.as_deref() else {
        tracing::warn!("REDIS_URL is not set, using in-memory stand-in");
        return Arc::new(MemoryCacheBackend::fallback());
    };

    tracing::info!("Initializing Redis client...");
    match RedisCacheBackend::connect(
        redis_url,
        config.cache_op_timeout(),
        config.cache_health_interval(),
    )
    .await
    {
        Ok(backend) => Arc::new(backend),
        Err(e) => {
            tracing::warn!("Redis connection error: {}, falling back to in-memory stand-in", e);
            Arc::new(MemoryCacheBackend::fallback())
        }
    }
}
