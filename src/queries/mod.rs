// 查询端（CQRS 读侧）
// 查询处理器只委托给读模型

mod read_model;

pub use read_model::{MIN_SEARCH_LENGTH, SEARCH_RESULT_LIMIT, UserReadModel};

use uuid::Uuid;

use crate::error::AppError;
use crate::models::{ListOptions, UserPage, UserRecord};

pub async fn get_user(read_model: &UserReadModel, user_id: Uuid) -> Result<UserRecord, AppError> {
    read_model.get_user_by_id(user_id).await
}

pub async fn list_users(
    read_model: &UserReadModel,
    options: &ListOptions,
) -> Result<UserPage, AppError> {
    read_model.list_users(options).await
}

pub async fn search_users(
    read_model: &UserReadModel,
    query: &str,
) -> Result<Vec<UserRecord>, AppError> {
    read_model.search_users(query).await
}
