use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::cache::{CacheBackend, USERS_ALL_KEY, user_key};
use crate::config::Config;
use crate::database::{StoreError, UserStore};
use crate::error::AppError;
use crate::models::{ListOptions, Pagination, UserPage, UserRecord};

/// 搜索结果上限
pub const SEARCH_RESULT_LIMIT: u32 = 20;

/// 搜索词最短长度
pub const MIN_SEARCH_LENGTH: usize = 2;

/// 用户读模型
///
/// 旁路缓存：先查缓存，未命中回源主存储，再回填缓存。写命令提交后同步调用
/// `handle_user_*` 使相关键失效或重建。缓存不可用时退化为直接读主存储，
/// 调用方看不到任何差别。
///
/// 同一用户的并发更新不在这一层串行化，缓存最终反映哪个写入者取决于调用顺序。
pub struct UserReadModel {
    store: Arc<dyn UserStore>,
    cache: Arc<dyn CacheBackend>,
    cache_enabled: bool,
    ttl: Duration,
}

impl UserReadModel {
    pub fn new(
        store: Arc<dyn UserStore>,
        cache: Arc<dyn CacheBackend>,
        cache_enabled: bool,
        ttl: Duration,
    ) -> Self {
        Self {
            store,
            cache,
            cache_enabled,
            ttl,
        }
    }

    pub fn from_config(
        store: Arc<dyn UserStore>,
        cache: Arc<dyn CacheBackend>,
        config: &Config,
    ) -> Self {
        Self::new(store, cache, config.cache_enabled, config.cache_ttl())
    }

    /// 配置启用了缓存且后端当前可用
    pub fn is_caching_available(&self) -> bool {
        self.cache_enabled && self.cache.is_available()
    }

    pub fn cache_backend_name(&self) -> &'static str {
        self.cache.name()
    }

    /// 缓存后端吸收的失败次数，供健康检查展示
    pub fn cache_failure_count(&self) -> u64 {
        self.cache.failure_count()
    }

    pub async fn get_user_by_id(&self, user_id: Uuid) -> Result<UserRecord, AppError> {
        if let Some(user) = self.get_user_from_cache(user_id).await {
            tracing::debug!("User {} retrieved from cache", user_id);
            return Ok(user);
        }

        let entity = self.store.find_by_id(user_id).await.map_err(|e| {
            tracing::error!("Database lookup failed for user {}: {}", user_id, e);
            AppError::Internal("Failed to retrieve user".into())
        })?;
        let user = UserRecord::from(entity.ok_or_else(AppError::user_not_found)?);

        self.cache_user(&user).await;

        Ok(user)
    }

    /// 只有规范查询（无过滤、第一页、每页10条、按创建时间倒序）读写 `users:all`，
    /// 其余参数组合完全绕过缓存。
    pub async fn list_users(&self, options: &ListOptions) -> Result<UserPage, AppError> {
        if options.page == 0 || options.limit == 0 {
            return Err(AppError::Validation(
                "Page and limit must be at least 1".into(),
            ));
        }

        let use_cache = self.is_caching_available() && options.is_canonical();

        if use_cache {
            if let Some(json) = self.cache.get(USERS_ALL_KEY).await {
                match serde_json::from_str::<UserPage>(&json) {
                    Ok(page) => {
                        tracing::debug!("Users list retrieved from cache");
                        return Ok(page);
                    }
                    Err(e) => {
                        tracing::warn!("Discarding unreadable cached users list: {}", e);
                    }
                }
            }
        }

        let page = self.load_page(options).await?;

        if use_cache {
            match serde_json::to_string(&page) {
                Ok(json) => self.cache.set(USERS_ALL_KEY, &json, Some(self.ttl)).await,
                Err(e) => tracing::warn!("Failed to cache users list: {}", e),
            }

            // 顺带预热单个用户，列表之后的详情查询直接命中
            for user in &page.users {
                self.cache_user(user).await;
            }
        }

        Ok(page)
    }

    /// 搜索从不经过缓存
    pub async fn search_users(&self, query: &str) -> Result<Vec<UserRecord>, AppError> {
        let term = query.trim();
        if term.chars().count() < MIN_SEARCH_LENGTH {
            return Err(AppError::Validation(format!(
                "Search query must be at least {} characters",
                MIN_SEARCH_LENGTH
            )));
        }

        let users = self
            .store
            .search(term, SEARCH_RESULT_LIMIT)
            .await
            .map_err(|e| {
                tracing::error!("User search failed: {}", e);
                AppError::Internal("Failed to search users".into())
            })?;

        Ok(users.into_iter().map(UserRecord::from).collect())
    }

    /// 用户创建后：写入 `user:<id>`，删除 `users:all`
    pub async fn handle_user_created(&self, user: &UserRecord) {
        if !self.is_caching_available() {
            return;
        }

        self.cache_user(user).await;
        self.cache.del(USERS_ALL_KEY).await;
        tracing::info!("User created event handled for user {}", user.id);
    }

    /// 用户更新后：先删除 `user:<id>` 再写入新值，最后删除 `users:all`
    pub async fn handle_user_updated(&self, user: &UserRecord) {
        if !self.is_caching_available() {
            return;
        }

        self.cache.del(&user_key(user.id)).await;
        self.cache_user(user).await;
        self.cache.del(USERS_ALL_KEY).await;
        tracing::info!("User updated event handled for user {}", user.id);
    }

    /// 用户删除后：删除 `user:<id>` 与 `users:all`
    pub async fn handle_user_deleted(&self, user_id: Uuid) {
        if !self.is_caching_available() {
            return;
        }

        self.cache.del(&user_key(user_id)).await;
        self.cache.del(USERS_ALL_KEY).await;
        tracing::info!("User deleted event handled for user {}", user_id);
    }

    async fn load_page(&self, options: &ListOptions) -> Result<UserPage, AppError> {
        let store_failure = |e: StoreError| {
            tracing::error!("Database query failed: {}", e);
            AppError::Internal("Failed to retrieve users list".into())
        };

        let total = self
            .store
            .count(&options.filter)
            .await
            .map_err(store_failure)?;
        let users = self
            .store
            .find(
                &options.filter,
                options.sort_by,
                options.sort_order,
                options.limit,
                options.skip(),
            )
            .await
            .map_err(store_failure)?;

        Ok(UserPage {
            users: users.into_iter().map(UserRecord::from).collect(),
            pagination: Pagination::new(total, options.page, options.limit),
        })
    }

    async fn cache_user(&self, user: &UserRecord) {
        if !self.is_caching_available() {
            return;
        }

        match serde_json::to_string(user) {
            Ok(json) => {
                self.cache
                    .set(&user_key(user.id), &json, Some(self.ttl))
                    .await
            }
            Err(e) => tracing::warn!("Failed to cache user {}: {}", user.id, e),
        }
    }

    /// 未命中、缓存不可用、内容无法解析都返回 `None`
    async fn get_user_from_cache(&self, user_id: Uuid) -> Option<UserRecord> {
        if !self.is_caching_available() {
            return None;
        }

        let json = self.cache.get(&user_key(user_id)).await?;
        match serde_json::from_str(&json) {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::warn!("Error reading user {} from cache: {}", user_id, e);
                None
            }
        }
    }
}
