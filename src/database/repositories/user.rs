use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::database::{StoreError, UserStore};
use crate::models::{NewUser, SortField, SortOrder, UserChanges, UserEntity, UserFilter};

const SELECT_USERS: &str = r#"
    SELECT id, email, password_hash, first_name, last_name, role, is_active, created_at, updated_at
    FROM users
"#;

/// 用户存储库实现
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserEntity>, StoreError> {
        let user = sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT id, email, password_hash, first_name, last_name, role, is_active, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserEntity>, StoreError> {
        let user = sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT id, email, password_hash, first_name, last_name, role, is_active, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn insert(&self, user: NewUser) -> Result<UserEntity, StoreError> {
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            INSERT INTO users (id, email, password_hash, first_name, last_name, role)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, email, password_hash, first_name, last_name, role, is_active, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.role)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(user) => {
                tracing::debug!("Inserted user {}", user.id);
                Ok(user)
            }
            Err(e) => {
                tracing::error!("Failed to insert user: {:?}", e);
                Err(e.into())
            }
        }
    }

    async fn update(
        &self,
        id: Uuid,
        changes: UserChanges,
    ) -> Result<Option<UserEntity>, StoreError> {
        let user = sqlx::query_as::<_, UserEntity>(
            r#"
            UPDATE users
            SET email = COALESCE($2, email),
                first_name = COALESCE($3, first_name),
                last_name = COALESCE($4, last_name),
                role = COALESCE($5, role),
                is_active = COALESCE($6, is_active),
                updated_at = now()
            WHERE id = $1
            RETURNING id, email, password_hash, first_name, last_name, role, is_active, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(changes.email)
        .bind(changes.first_name)
        .bind(changes.last_name)
        .bind(changes.role)
        .bind(changes.is_active)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> Result<Option<UserEntity>, StoreError> {
        let user = sqlx::query_as::<_, UserEntity>(
            r#"
            DELETE FROM users
            WHERE id = $1
            RETURNING id, email, password_hash, first_name, last_name, role, is_active, created_at, updated_at
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find(
        &self,
        filter: &UserFilter,
        sort_by: SortField,
        sort_order: SortOrder,
        limit: u32,
        skip: u64,
    ) -> Result<Vec<UserEntity>, StoreError> {
        let mut builder = QueryBuilder::<Postgres>::new(SELECT_USERS);
        push_filter(&mut builder, filter);

        // 以 id 作为次级排序，保证分页稳定
        builder
            .push(" ORDER BY ")
            .push(sort_by.column())
            .push(" ")
            .push(sort_order.keyword())
            .push(", id ")
            .push(sort_order.keyword());
        builder
            .push(" LIMIT ")
            .push_bind(i64::from(limit))
            .push(" OFFSET ")
            .push_bind(i64::try_from(skip).unwrap_or(i64::MAX));

        let users = builder
            .build_query_as::<UserEntity>()
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }

    async fn count(&self, filter: &UserFilter) -> Result<u64, StoreError> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users");
        push_filter(&mut builder, filter);

        let total = builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        Ok(total.max(0) as u64)
    }

    async fn search(&self, term: &str, limit: u32) -> Result<Vec<UserEntity>, StoreError> {
        let pattern = format!("%{}%", escape_like(term));

        let users = sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT id, email, password_hash, first_name, last_name, role, is_active, created_at, updated_at
            FROM users
            WHERE email ILIKE $1 OR first_name ILIKE $1 OR last_name ILIKE $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(pattern)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }
}

fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &UserFilter) {
    let mut separator = " WHERE ";
    if let Some(role) = filter.role {
        builder.push(separator).push("role = ").push_bind(role);
        separator = " AND ";
    }
    if let Some(is_active) = filter.is_active {
        builder.push(separator).push("is_active = ").push_bind(is_active);
    }
}

/// 转义 LIKE 通配符，使搜索词按字面匹配
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
