use serde::Serialize;

use crate::config::Config;
use crate::database::UserStore;
use crate::error::AppError;
use crate::models::UserRecord;
use crate::utils::{generate_token, normalize_email, verify_password};

/// 登录成功后返回的数据
#[derive(Debug, Serialize)]
pub struct AuthData {
    pub user: UserRecord,
    pub token: String,
    pub expires_at: i64,
}

fn invalid_credentials() -> AppError {
    AppError::Unauthorized("Invalid email or password".into())
}

/// 邮箱密码校验，直接读主存储（缓存中没有密码哈希）
pub async fn authenticate_user(
    store: &dyn UserStore,
    config: &Config,
    email: &str,
    password: &str,
) -> Result<AuthData, AppError> {
    let email = normalize_email(email);
    let user = store
        .find_by_email(&email)
        .await
        .map_err(|e| {
            tracing::error!("Database lookup failed during login: {}", e);
            AppError::Internal("Failed to authenticate user".into())
        })?
        .ok_or_else(invalid_credentials)?;

    let password = password.to_string();
    let password_hash = user.password_hash.clone();
    let password_valid =
        tokio::task::spawn_blocking(move || verify_password(&password, &password_hash))
            .await
            .map_err(|e| {
                tracing::error!("Password verification task failed: {}", e);
                AppError::Internal("Failed to authenticate user".into())
            })?
            .unwrap_or_else(|e| {
                tracing::warn!("Stored password hash for {} is unreadable: {}", user.id, e);
                false
            });

    if !password_valid {
        return Err(invalid_credentials());
    }

    if !user.is_active {
        return Err(AppError::Unauthorized("User is inactive".into()));
    }

    let user = UserRecord::from(user);
    let (token, expires_at) = generate_token(&user, config).map_err(|e| {
        tracing::error!("Failed to generate token: {}", e);
        AppError::Internal("Failed to authenticate user".into())
    })?;

    Ok(AuthData {
        user,
        token,
        expires_at,
    })
}
