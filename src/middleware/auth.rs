use axum::{
    body::Body,
    extract::{Extension, State},
    http::Request,
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
    typed_header::TypedHeaderRejection,
};

use crate::{
    AppState,
    error::AppError,
    models::Role,
    utils::{Claims, verify_token},
};

/// 校验 Bearer 令牌，并确认用户仍存在且处于激活状态
///
/// 用户从主存储读取而非缓存，角色以存储中的当前值为准。
pub async fn auth_middleware(
    State(state): State<AppState>,
    bearer: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let TypedHeader(Authorization(bearer)) = bearer.map_err(|_| {
        tracing::debug!("Authentication failed: no Bearer token provided");
        AppError::Unauthorized("Authentication token is required".into())
    })?;

    let mut claims = verify_token(bearer.token(), &state.config).map_err(|e| {
        tracing::debug!("JWT verification error: {}", e);
        AppError::Unauthorized(format!("Invalid token: {}", e))
    })?;
    let user_id = claims.user_id()?;

    let user = state
        .store
        .find_by_id(user_id)
        .await
        .map_err(|e| {
            tracing::error!("Database error during authentication: {}", e);
            AppError::Internal("Server error during authentication".into())
        })?
        .ok_or_else(|| AppError::Unauthorized("User not found".into()))?;

    if !user.is_active {
        tracing::debug!("User inactive: {}", user_id);
        return Err(AppError::Unauthorized("User is inactive".into()));
    }

    claims.role = user.role;
    tracing::debug!("User authenticated: {}, role: {:?}", user_id, claims.role);

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

/// 仅允许管理员，需在 [`auth_middleware`] 之后执行
pub async fn admin_middleware(
    Extension(claims): Extension<Claims>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    if claims.role != Role::Admin {
        return Err(AppError::Forbidden("Admin access required".into()));
    }

    Ok(next.run(request).await)
}
