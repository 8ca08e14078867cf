use uuid::Uuid;

use crate::database::UserStore;
use crate::error::AppError;
use crate::queries::UserReadModel;

pub async fn delete_user(
    store: &dyn UserStore,
    read_model: &UserReadModel,
    user_id: Uuid,
) -> Result<(), AppError> {
    store
        .delete(user_id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete user {}: {}", user_id, e);
            AppError::Internal("Failed to delete user".into())
        })?
        .ok_or_else(AppError::user_not_found)?;

    read_model.handle_user_deleted(user_id).await;

    Ok(())
}
