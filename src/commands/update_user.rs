use uuid::Uuid;

use super::create_user::duplicate_email;
use crate::database::{StoreError, UserStore};
use crate::error::AppError;
use crate::models::{UserChanges, UserRecord};
use crate::queries::UserReadModel;
use crate::utils::normalize_email;

/// 更新用户：密码不能通过这里修改
pub async fn update_user(
    store: &dyn UserStore,
    read_model: &UserReadModel,
    user_id: Uuid,
    mut changes: UserChanges,
) -> Result<UserRecord, AppError> {
    if let Some(email) = changes.email.as_mut() {
        *email = normalize_email(email);
    }
    for name in [changes.first_name.as_mut(), changes.last_name.as_mut()]
        .into_iter()
        .flatten()
    {
        *name = name.trim().to_string();
    }

    let entity = store
        .update(user_id, changes)
        .await
        .map_err(|e| match e {
            StoreError::Duplicate { .. } => duplicate_email(),
            other => {
                tracing::error!("Failed to update user {}: {}", user_id, other);
                AppError::Internal("Failed to update user".into())
            }
        })?
        .ok_or_else(AppError::user_not_found)?;

    let user = UserRecord::from(entity);
    read_model.handle_user_updated(&user).await;

    Ok(user)
}
