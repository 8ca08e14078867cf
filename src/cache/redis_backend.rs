use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, RedisError, RedisResult};
use tokio::task::AbortHandle;

use super::CacheBackend;

/// 建立初始连接的最长等待时间
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// 重连探测的最大间隔
const MAX_RECONNECT_DELAY: Duration = Duration::from_millis(3000);

/// Redis 连接状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectionState {
    Connecting = 0,
    Ready = 1,
    Error = 2,
    Closed = 3,
}

impl ConnectionState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => ConnectionState::Connecting,
            1 => ConnectionState::Ready,
            2 => ConnectionState::Error,
            _ => ConnectionState::Closed,
        }
    }
}

#[derive(Debug, Default)]
struct SharedState(AtomicU8);

impl SharedState {
    fn get(&self) -> ConnectionState {
        ConnectionState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// 返回之前的状态；已关闭的连接不会被重新打开
    fn transition(&self, next: ConnectionState) -> ConnectionState {
        let mut current = self.0.load(Ordering::Acquire);
        loop {
            if current == ConnectionState::Closed as u8 {
                return ConnectionState::Closed;
            }
            match self.0.compare_exchange(
                current,
                next as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(previous) => return ConnectionState::from_u8(previous),
                Err(actual) => current = actual,
            }
        }
    }
}

/// Redis 缓存后端
///
/// 连接由 [`ConnectionManager`] 维护并自动重连；后台任务定期 PING，
/// 在 Ready 与 Error 之间切换状态。每个命令都受超时约束，
/// 超时与其他失败一样被吸收。
pub struct RedisCacheBackend {
    conn: ConnectionManager,
    state: Arc<SharedState>,
    failures: AtomicU64,
    op_timeout: Duration,
    monitor: AbortHandle,
}

impl RedisCacheBackend {
    pub async fn connect(
        redis_url: &str,
        op_timeout: Duration,
        health_interval: Duration,
    ) -> Result<Self, RedisError> {
        let client = redis::Client::open(redis_url)?;
        let state = Arc::new(SharedState::default());

        let conn = match tokio::time::timeout(CONNECT_TIMEOUT, ConnectionManager::new(client)).await
        {
            Ok(conn) => conn?,
            Err(_) => {
                return Err(RedisError::from((
                    redis::ErrorKind::IoError,
                    "Connection timed out",
                    redis_url.to_string(),
                )));
            }
        };
        tracing::info!("Redis client connected");

        state.transition(ConnectionState::Ready);
        tracing::info!("Redis client ready");

        let monitor = tokio::spawn(monitor_connection(
            conn.clone(),
            Arc::clone(&state),
            health_interval,
            op_timeout,
        ))
        .abort_handle();

        Ok(Self {
            conn,
            state,
            failures: AtomicU64::new(0),
            op_timeout,
            monitor,
        })
    }

    pub fn state(&self) -> ConnectionState {
        self.state.get()
    }

    async fn run<T, F>(&self, op: &'static str, key: &str, fallback: T, command: F) -> T
    where
        F: Future<Output = RedisResult<T>>,
    {
        if !self.is_available() {
            return fallback;
        }

        match tokio::time::timeout(self.op_timeout, command).await {
            Ok(Ok(value)) => value,
            Ok(Err(e)) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                tracing::warn!("Redis {} failed for key {}: {}", op, key, e);
                if is_connection_lost(&e)
                    && self.state.transition(ConnectionState::Error) == ConnectionState::Ready
                {
                    tracing::error!("Redis client error, caching suspended until reconnect");
                }
                fallback
            }
            Err(_) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    "Redis {} timed out after {:?} for key {}",
                    op,
                    self.op_timeout,
                    key
                );
                fallback
            }
        }
    }
}

#[async_trait]
impl CacheBackend for RedisCacheBackend {
    fn name(&self) -> &'static str {
        "redis"
    }

    fn is_available(&self) -> bool {
        self.state() == ConnectionState::Ready
    }

    fn failure_count(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    async fn get(&self, key: &str) -> Option<String> {
        let mut conn = self.conn.clone();
        self.run("GET", key, None, async move {
            conn.get::<_, Option<String>>(key).await
        })
        .await
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) {
        let mut conn = self.conn.clone();
        self.run("SET", key, (), async move {
            match ttl {
                Some(ttl) => conn.set_ex::<_, _, ()>(key, value, ttl.as_secs().max(1)).await,
                None => conn.set::<_, _, ()>(key, value).await,
            }
        })
        .await
    }

    async fn del(&self, key: &str) {
        let mut conn = self.conn.clone();
        self.run("DEL", key, (), async move { conn.del::<_, ()>(key).await })
            .await
    }

    async fn hget_all(&self, key: &str) -> HashMap<String, String> {
        let mut conn = self.conn.clone();
        self.run("HGETALL", key, HashMap::new(), async move {
            conn.hgetall::<_, HashMap<String, String>>(key).await
        })
        .await
    }

    async fn hset(&self, key: &str, field: &str, value: &str) {
        let mut conn = self.conn.clone();
        self.run("HSET", key, (), async move {
            conn.hset::<_, _, _, ()>(key, field, value).await
        })
        .await
    }

    async fn expire(&self, key: &str, ttl: Duration) {
        let mut conn = self.conn.clone();
        let seconds = i64::try_from(ttl.as_secs().max(1)).unwrap_or(i64::MAX);
        self.run("EXPIRE", key, (), async move {
            conn.expire::<_, ()>(key, seconds).await
        })
        .await
    }

    fn close(&self) {
        self.state.transition(ConnectionState::Closed);
        self.monitor.abort();
        tracing::info!("Redis client connection closed");
    }
}

/// 定期探活：正常时按 `interval` 探测，失败后按递增退避重试
async fn monitor_connection(
    mut conn: ConnectionManager,
    state: Arc<SharedState>,
    interval: Duration,
    op_timeout: Duration,
) {
    let mut retries: u32 = 0;
    loop {
        let delay = if retries == 0 {
            interval
        } else {
            reconnect_delay(retries)
        };
        tokio::time::sleep(delay).await;

        if state.get() == ConnectionState::Closed {
            break;
        }

        let cmd = redis::cmd("PING");
        let ping = cmd.query_async::<String>(&mut conn);
        let healthy = matches!(tokio::time::timeout(op_timeout, ping).await, Ok(Ok(_)));

        if healthy {
            if state.transition(ConnectionState::Ready) != ConnectionState::Ready {
                tracing::info!("Redis client ready");
            }
            retries = 0;
        } else {
            if state.transition(ConnectionState::Error) == ConnectionState::Ready {
                tracing::error!("Redis health check failed, caching suspended until reconnect");
            }
            retries = retries.saturating_add(1);
        }
    }
}

/// 连接层面的错误才会让后端进入 Error；命令本身的错误（如 `-ERR`）只计数
fn is_connection_lost(e: &RedisError) -> bool {
    e.is_connection_dropped() || e.is_connection_refusal() || e.is_io_error()
}

fn reconnect_delay(retries: u32) -> Duration {
    Duration::from_millis(u64::from(retries) * 50).min(MAX_RECONNECT_DELAY)
}
