// 集成测试共用的替身：内存主存储与记录调用的缓存
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tokio::sync::Barrier;
use user_service::{
    AppState,
    cache::{CacheBackend, MemoryCacheBackend},
    config::Config,
    database::{StoreError, UserStore},
    models::{NewUser, Role, SortField, SortOrder, UserChanges, UserEntity, UserFilter},
    queries::UserReadModel,
    utils::hash_password,
};
use uuid::Uuid;

pub const TEST_PASSWORD: &str = "password123";

pub fn test_config() -> Config {
    Config {
        database_url: String::new(),
        jwt_secret: "integration-test-secret".into(),
        jwt_expiration_secs: 3600,
        bcrypt_cost: 4,
        server_host: "127.0.0.1".into(),
        server_port: 0,
        api_base_uri: "/api/v1".into(),
        cache_enabled: true,
        redis_url: None,
        cache_ttl_secs: 3600,
        cache_op_timeout_ms: 100,
        cache_health_interval_secs: 1,
    }
}

/// 内存主存储，行为与 PostgreSQL 实现保持一致
#[derive(Default)]
pub struct InMemoryUserStore {
    users: Mutex<Vec<UserEntity>>,
    calls: Mutex<HashMap<&'static str, usize>>,
    failing: AtomicBool,
    // 创建时间按插入顺序递增，保证排序稳定
    clock: AtomicI64,
    find_by_id_gate: Mutex<Option<Arc<Barrier>>>,
}

impl InMemoryUserStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// 直接写入一条记录，不经过命令，也不计入调用次数
    pub fn seed(&self, email: &str, first_name: &str, last_name: &str, role: Role) -> UserEntity {
        let entity = self.build(NewUser {
            email: email.to_lowercase(),
            password_hash: hash_password(TEST_PASSWORD, 4).unwrap(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            role,
        });
        self.users.lock().unwrap().push(entity.clone());
        entity
    }

    /// 之后的所有操作都返回持久化错误
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// `find_by_id` 在凑齐 `tasks` 个调用者之前不返回
    pub fn gate_find_by_id(&self, tasks: usize) {
        *self.find_by_id_gate.lock().unwrap() = Some(Arc::new(Barrier::new(tasks)));
    }

    pub fn calls(&self, op: &str) -> usize {
        self.calls.lock().unwrap().get(op).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }

    pub fn reset_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn len(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    fn record(&self, op: &'static str) -> Result<(), StoreError> {
        *self.calls.lock().unwrap().entry(op).or_insert(0) += 1;
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Persistence("connection refused".into()));
        }
        Ok(())
    }

    fn build(&self, user: NewUser) -> UserEntity {
        let tick = self.clock.fetch_add(1, Ordering::SeqCst);
        let created_at = Utc.timestamp_opt(1_700_000_000 + tick, 0).unwrap();
        UserEntity {
            id: Uuid::new_v4(),
            email: user.email,
            password_hash: user.password_hash,
            first_name: user.first_name,
            last_name: user.last_name,
            role: user.role,
            is_active: true,
            created_at,
            updated_at: created_at,
        }
    }

    fn matches(filter: &UserFilter, user: &UserEntity) -> bool {
        filter.role.is_none_or(|role| user.role == role)
            && filter.is_active.is_none_or(|active| user.is_active == active)
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserEntity>, StoreError> {
        self.record("find_by_id")?;
        let gate = self.find_by_id_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.wait().await;
        }
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserEntity>, StoreError> {
        self.record("find_by_email")?;
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn insert(&self, user: NewUser) -> Result<UserEntity, StoreError> {
        self.record("insert")?;
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate {
                constraint: "users_email_key".into(),
            });
        }
        let entity = self.build(user);
        users.push(entity.clone());
        Ok(entity)
    }

    async fn update(
        &self,
        id: Uuid,
        changes: UserChanges,
    ) -> Result<Option<UserEntity>, StoreError> {
        self.record("update")?;
        let mut users = self.users.lock().unwrap();

        if let Some(email) = &changes.email {
            if users.iter().any(|u| u.id != id && &u.email == email) {
                return Err(StoreError::Duplicate {
                    constraint: "users_email_key".into(),
                });
            }
        }

        let Some(user) = users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(first_name) = changes.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = changes.last_name {
            user.last_name = last_name;
        }
        if let Some(role) = changes.role {
            user.role = role;
        }
        if let Some(is_active) = changes.is_active {
            user.is_active = is_active;
        }
        user.updated_at = user.updated_at + chrono::Duration::seconds(1);
        Ok(Some(user.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<Option<UserEntity>, StoreError> {
        self.record("delete")?;
        let mut users = self.users.lock().unwrap();
        let position = users.iter().position(|u| u.id == id);
        Ok(position.map(|i| users.remove(i)))
    }

    async fn find(
        &self,
        filter: &UserFilter,
        sort_by: SortField,
        sort_order: SortOrder,
        limit: u32,
        skip: u64,
    ) -> Result<Vec<UserEntity>, StoreError> {
        self.record("find")?;
        let users = self.users.lock().unwrap();
        let mut matched: Vec<UserEntity> = users
            .iter()
            .filter(|u| Self::matches(filter, u))
            .cloned()
            .collect();

        matched.sort_by(|a, b| {
            let ordering = match sort_by {
                SortField::CreatedAt => a.created_at.cmp(&b.created_at),
                SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
                SortField::Email => a.email.cmp(&b.email),
                SortField::FirstName => a.first_name.cmp(&b.first_name),
                SortField::LastName => a.last_name.cmp(&b.last_name),
            }
            .then_with(|| a.id.cmp(&b.id));
            match sort_order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });

        Ok(matched
            .into_iter()
            .skip(skip as usize)
            .take(limit as usize)
            .collect())
    }

    async fn count(&self, filter: &UserFilter) -> Result<u64, StoreError> {
        self.record("count")?;
        let users = self.users.lock().unwrap();
        Ok(users.iter().filter(|u| Self::matches(filter, u)).count() as u64)
    }

    async fn search(&self, term: &str, limit: u32) -> Result<Vec<UserEntity>, StoreError> {
        self.record("search")?;
        let term = term.to_lowercase();
        let users = self.users.lock().unwrap();
        let mut matched: Vec<UserEntity> = users
            .iter()
            .filter(|u| {
                u.email.to_lowercase().contains(&term)
                    || u.first_name.to_lowercase().contains(&term)
                    || u.last_name.to_lowercase().contains(&term)
            })
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matched.truncate(limit as usize);
        Ok(matched)
    }
}

/// 记录每次调用的缓存，实际存取委托给内存后端
pub struct RecordingCache {
    inner: MemoryCacheBackend,
    available: AtomicBool,
    failures: AtomicU64,
    ops: Mutex<Vec<(&'static str, String)>>,
}

impl RecordingCache {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryCacheBackend::new(),
            available: AtomicBool::new(true),
            failures: AtomicU64::new(0),
            ops: Mutex::new(Vec::new()),
        })
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// 模拟后端吸收了若干次失败
    pub fn add_failures(&self, count: u64) {
        self.failures.fetch_add(count, Ordering::SeqCst);
    }

    /// 某个操作在某个键上的调用次数
    pub fn count(&self, op: &str, key: &str) -> usize {
        self.ops
            .lock()
            .unwrap()
            .iter()
            .filter(|(o, k)| *o == op && k == key)
            .count()
    }

    /// 某个键上的全部操作，按调用顺序
    pub fn ops_for(&self, key: &str) -> Vec<&'static str> {
        self.ops
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, k)| k == key)
            .map(|(o, _)| *o)
            .collect()
    }

    pub fn total_ops(&self) -> usize {
        self.ops.lock().unwrap().len()
    }

    pub fn reset(&self) {
        self.ops.lock().unwrap().clear();
    }

    /// 不记录调用地查看缓存内容
    pub async fn peek(&self, key: &str) -> Option<String> {
        self.inner.get(key).await
    }

    fn record(&self, op: &'static str, key: &str) {
        self.ops.lock().unwrap().push((op, key.to_string()));
    }
}

#[async_trait]
impl CacheBackend for RecordingCache {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    fn failure_count(&self) -> u64 {
        self.failures.load(Ordering::SeqCst)
    }

    async fn get(&self, key: &str) -> Option<String> {
        self.record("get", key);
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) {
        self.record("set", key);
        self.inner.set(key, value, ttl).await
    }

    async fn del(&self, key: &str) {
        self.record("del", key);
        self.inner.del(key).await
    }

    async fn hget_all(&self, key: &str) -> HashMap<String, String> {
        self.record("hget_all", key);
        self.inner.hget_all(key).await
    }

    async fn hset(&self, key: &str, field: &str, value: &str) {
        self.record("hset", key);
        self.inner.hset(key, field, value).await
    }

    async fn expire(&self, key: &str, ttl: Duration) {
        self.record("expire", key);
        self.inner.expire(key, ttl).await
    }
}

pub fn read_model(store: &Arc<InMemoryUserStore>, cache: &Arc<RecordingCache>) -> UserReadModel {
    UserReadModel::from_config(store.clone(), cache.clone(), &test_config())
}

pub fn app_state(store: &Arc<InMemoryUserStore>, cache: &Arc<RecordingCache>) -> AppState {
    AppState::new(test_config(), store.clone(), read_model(store, cache))
}
