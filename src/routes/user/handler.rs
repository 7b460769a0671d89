use axum::{
    extract::{Extension, Json, Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use crate::{AppState, error::AppError, utils::hash_password};

use super::model::{UpdateUserRequest, User};

#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

#[axum::debug_handler]
pub async fn list_users(
    Extension(current_user): Extension<User>,
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<Vec<User>>, AppError> {
    if !current_user.is_superuser {
        return Err(AppError::Forbidden);
    }

    let skip = query.skip.unwrap_or(0).max(0);
    let limit = query.limit.unwrap_or(10).clamp(1, 100);

    let users = User::list(&state.pool, skip, limit).await?;
    Ok(Json(users))
}

#[axum::debug_handler]
pub async fn get_user(
    Extension(current_user): Extension<User>,
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<User>, AppError> {
    // 先确认存在再做权限检查
    let user = User::find_by_id(&state.pool, user_id)
        .await?
        .ok_or(AppError::NotFound("User not found"))?;

    if !current_user.is_superuser && current_user.id != user.id {
        return Err(AppError::Forbidden);
    }

    Ok(Json(user))
}

#[axum::debug_handler]
pub async fn update_user(
    Extension(current_user): Extension<User>,
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<User>, AppError> {
    let user = User::find_by_id(&state.pool, user_id)
        .await?
        .ok_or(AppError::NotFound("User not found"))?;

    if !current_user.is_superuser && current_user.id != user.id {
        return Err(AppError::Forbidden);
    }

    let hashed_password = match &req.password {
        Some(password) => Some(
            hash_password(password)
                .map_err(|e| sqlx::Error::Protocol(format!("Failed to hash password: {}", e)))?,
        ),
        None => None,
    };

    let updated = User::update(&state.pool, user_id, &req, hashed_password)
        .await?
        .ok_or(AppError::NotFound("User not found"))?;

    Ok(Json(updated))
}

#[axum::debug_handler]
pub async fn delete_user(
    Extension(current_user): Extension<User>,
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    User::find_by_id(&state.pool, user_id)
        .await?
        .ok_or(AppError::NotFound("User not found"))?;

    if !current_user.is_superuser {
        return Err(AppError::Forbidden);
    }

    User::delete(&state.pool, user_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
