// 主存储模块
// 定义用户存储接口，以及基于 PostgreSQL 的实现

pub mod repositories;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{NewUser, SortField, SortOrder, UserChanges, UserEntity, UserFilter};

pub use repositories::user::PgUserRepository;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("persistence error: {0}")]
    Persistence(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.is_unique_violation() {
                return StoreError::Duplicate {
                    constraint: db.constraint().unwrap_or("unknown").to_string(),
                };
            }
        }
        StoreError::Persistence(err.to_string())
    }
}

/// 用户主存储接口
///
/// 邮箱唯一性由存储保证，冲突时返回 [`StoreError::Duplicate`]。
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserEntity>, StoreError>;

    /// 按（已规范化的）邮箱精确查找
    async fn find_by_email(&self, email: &str) -> Result<Option<UserEntity>, StoreError>;

    async fn insert(&self, user: NewUser) -> Result<UserEntity, StoreError>;

    /// 部分更新并返回更新后的记录；用户不存在时返回 `None`
    async fn update(&self, id: Uuid, changes: UserChanges)
    -> Result<Option<UserEntity>, StoreError>;

    /// 删除并返回被删除的记录；用户不存在时返回 `None`
    async fn delete(&self, id: Uuid) -> Result<Option<UserEntity>, StoreError>;

    async fn find(
        &self,
        filter: &UserFilter,
        sort_by: SortField,
        sort_order: SortOrder,
        limit: u32,
        skip: u64,
    ) -> Result<Vec<UserEntity>, StoreError>;

    async fn count(&self, filter: &UserFilter) -> Result<u64, StoreError>;

    /// 邮箱、名、姓任一字段不区分大小写地包含 `term`，按创建时间倒序
    async fn search(&self, term: &str, limit: u32) -> Result<Vec<UserEntity>, StoreError>;
}
