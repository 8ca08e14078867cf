use axum::{
    extract::{Extension, Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use uuid::Uuid;

use crate::{
    AppState, commands,
    error::AppError,
    infrastructure::authenticate_user,
    queries,
    utils::{Claims, success_to_api_response},
};

use super::model::{
    AdminUpdateUserRequest, DeleteUserResponse, ListUsersQuery, LoginRequest, RegisterRequest,
    SearchQuery, UpdateProfileRequest,
};

#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<RegisterRequest>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let user = commands::create_user(
        state.store.as_ref(),
        &state.read_model,
        state.config.bcrypt_cost,
        req.into_input(),
    )
    .await?;
    tracing::info!("User registered: {}", user.id);

    Ok((
        StatusCode::CREATED,
        success_to_api_response("User registered successfully", user),
    ))
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<LoginRequest>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    let auth = authenticate_user(
        state.store.as_ref(),
        &state.config,
        &req.email,
        &req.password,
    )
    .await?;

    Ok(success_to_api_response("Login successful", auth))
}

#[axum::debug_handler]
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user = queries::get_user(&state.read_model, claims.user_id()?).await?;
    Ok(success_to_api_response("Profile retrieved successfully", user))
}

#[axum::debug_handler]
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Json(req), _): WithRejection<Json<UpdateProfileRequest>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    let changes = req.into_changes()?;
    let user = commands::update_user(
        state.store.as_ref(),
        &state.read_model,
        claims.user_id()?,
        changes,
    )
    .await?;

    Ok(success_to_api_response("Profile updated successfully", user))
}

#[axum::debug_handler]
pub async fn list_users(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<ListUsersQuery>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    let page = queries::list_users(&state.read_model, &query.into_options()).await?;
    Ok(success_to_api_response("Users retrieved successfully", page))
}

#[axum::debug_handler]
pub async fn search_users(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<SearchQuery>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    let users = queries::search_users(&state.read_model, &query.q).await?;
    Ok(success_to_api_response("Users retrieved successfully", users))
}

#[axum::debug_handler]
pub async fn get_user(
    State(state): State<AppState>,
    WithRejection(Path(user_id), _): WithRejection<Path<Uuid>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    let user = queries::get_user(&state.read_model, user_id).await?;
    Ok(success_to_api_response("User retrieved successfully", user))
}

// 管理员可以修改角色和激活状态
#[axum::debug_handler]
pub async fn update_user(
    State(state): State<AppState>,
    WithRejection(Path(user_id), _): WithRejection<Path<Uuid>, AppError>,
    WithRejection(Json(req), _): WithRejection<Json<AdminUpdateUserRequest>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    let changes = req.into_changes()?;
    let user =
        commands::update_user(state.store.as_ref(), &state.read_model, user_id, changes).await?;

    Ok(success_to_api_response("User updated successfully", user))
}

#[axum::debug_handler]
pub async fn delete_user(
    State(state): State<AppState>,
    WithRejection(Path(user_id), _): WithRejection<Path<Uuid>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    commands::delete_user(state.store.as_ref(), &state.read_model, user_id).await?;
    tracing::info!("User deleted: {}", user_id);

    Ok(success_to_api_response(
        "User deleted successfully",
        DeleteUserResponse { id: user_id },
    ))
}
