use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;

use super::CacheBackend;

#[derive(Debug, Clone)]
enum MemoryValue {
    Text(String),
    Hash(HashMap<String, String>),
}

#[derive(Debug)]
struct MemoryEntry {
    value: MemoryValue,
    /// 每次 `set`/`expire` 都会换新，旧的过期任务因此失效
    expiry_token: u64,
}

/// 进程内缓存后端
///
/// 过期通过在 `set`/`expire` 时派生的延迟删除任务实现。
pub struct MemoryCacheBackend {
    entries: Arc<DashMap<String, MemoryEntry>>,
    next_token: AtomicU64,
    available: bool,
}

impl MemoryCacheBackend {
    /// 作为可用缓存使用（单机运行、测试）
    pub fn new() -> Self {
        Self::with_availability(true)
    }

    /// Redis 不可用时的替身：操作照常执行，但报告不可用，读模型因此不走缓存
    pub fn fallback() -> Self {
        tracing::warn!("Using in-memory cache stand-in, read model caching is disabled");
        Self::with_availability(false)
    }

    fn with_availability(available: bool) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            next_token: AtomicU64::new(1),
            available,
        }
    }

    fn token(&self) -> u64 {
        self.next_token.fetch_add(1, Ordering::Relaxed)
    }

    fn schedule_expiry(&self, key: &str, token: u64, ttl: Duration) {
        let entries = Arc::clone(&self.entries);
        let key = key.to_string();
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            // 与显式删除竞争是无害的：条目已不存在或已被重新写入时什么都不做
            entries.remove_if(&key, |_, entry| entry.expiry_token == token);
        });
    }
}

impl Default for MemoryCacheBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheBackend for MemoryCacheBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn is_available(&self) -> bool {
        self.available
    }

    async fn get(&self, key: &str) -> Option<String> {
        let entry = self.entries.get(key)?;
        match &entry.value {
            MemoryValue::Text(value) => Some(value.clone()),
            MemoryValue::Hash(_) => {
                tracing::warn!("Cache get on hash key {}, treating as miss", key);
                None
            }
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) {
        let token = self.token();
        self.entries.insert(
            key.to_string(),
            MemoryEntry {
                value: MemoryValue::Text(value.to_string()),
                expiry_token: token,
            },
        );
        if let Some(ttl) = ttl {
            self.schedule_expiry(key, token, ttl);
        }
    }

    async fn del(&self, key: &str) {
        self.entries.remove(key);
    }

    async fn hget_all(&self, key: &str) -> HashMap<String, String> {
        match self.entries.get(key).map(|entry| entry.value.clone()) {
            Some(MemoryValue::Hash(fields)) => fields,
            Some(MemoryValue::Text(_)) => {
                tracing::warn!("Cache hget_all on string key {}, returning empty hash", key);
                HashMap::new()
            }
            None => HashMap::new(),
        }
    }

    async fn hset(&self, key: &str, field: &str, value: &str) {
        let token = self.token();
        let mut entry = self.entries.entry(key.to_string()).or_insert(MemoryEntry {
            value: MemoryValue::Hash(HashMap::new()),
            expiry_token: token,
        });
        match &mut entry.value {
            MemoryValue::Hash(fields) => {
                fields.insert(field.to_string(), value.to_string());
            }
            MemoryValue::Text(_) => {
                tracing::warn!("Cache hset on string key {}, ignoring", key);
            }
        }
    }

    async fn expire(&self, key: &str, ttl: Duration) {
        let token = self.token();
        let found = match self.entries.get_mut(key) {
            Some(mut entry) => {
                entry.expiry_token = token;
                true
            }
            None => false,
        };
        if found {
            self.schedule_expiry(key, token, ttl);
        }
    }
}
