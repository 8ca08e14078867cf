use serde::Deserialize;

use crate::database::{StoreError, UserStore};
use crate::error::AppError;
use crate::models::{NewUser, Role, UserRecord};
use crate::queries::UserReadModel;
use crate::utils::{hash_password, normalize_email};

/// 创建用户所需数据（密码为明文）
#[derive(Debug, Clone, Deserialize)]
pub struct NewUserInput {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub role: Role,
}

/// 创建用户：检查邮箱唯一、哈希密码、写入主存储，然后同步通知读模型
pub async fn create_user(
    store: &dyn UserStore,
    read_model: &UserReadModel,
    bcrypt_cost: u32,
    input: NewUserInput,
) -> Result<UserRecord, AppError> {
    let email = normalize_email(&input.email);

    match store.find_by_email(&email).await {
        Ok(Some(_)) => return Err(duplicate_email()),
        Ok(None) => {}
        Err(e) => {
            tracing::error!("Failed to check existing user {}: {}", email, e);
            return Err(AppError::Internal("Failed to create user".into()));
        }
    }

    // bcrypt 是 CPU 密集操作，放到阻塞线程池
    let password = input.password;
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password, bcrypt_cost))
        .await
        .map_err(|e| {
            tracing::error!("Password hashing task failed: {}", e);
            AppError::Internal("Failed to create user".into())
        })?
        .map_err(|e| {
            tracing::error!("Failed to hash password: {}", e);
            AppError::Internal("Failed to create user".into())
        })?;

    let entity = store
        .insert(NewUser {
            email,
            password_hash,
            first_name: input.first_name.trim().to_string(),
            last_name: input.last_name.trim().to_string(),
            role: input.role,
        })
        .await
        .map_err(|e| match e {
            StoreError::Duplicate { .. } => duplicate_email(),
            other => {
                tracing::error!("Failed to create user: {}", other);
                AppError::Internal("Failed to create user".into())
            }
        })?;

    let user = UserRecord::from(entity);
    read_model.handle_user_created(&user).await;

    Ok(user)
}

pub(crate) fn duplicate_email() -> AppError {
    AppError::Conflict("User with this email already exists".into())
}
