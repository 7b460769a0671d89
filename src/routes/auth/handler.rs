use axum::extract::{Extension, Json, State};

use crate::{AppState, error::AppError, utils::generate_token};

use crate::routes::user::model::{LoginRequest, RegisterRequest, TokenResponse, User};

#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<User>, AppError> {
    if User::find_by_username(&state.pool, &req.username)
        .await?
        .is_some()
    {
        return Err(AppError::BadRequest(
            "Username already registered".to_string(),
        ));
    }

    if User::find_by_email(&state.pool, &req.email).await?.is_some() {
        return Err(AppError::BadRequest("Email already registered".to_string()));
    }

    let user = User::create(&state.pool, req).await?;
    Ok(Json(user))
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let user = User::find_by_username(&state.pool, &req.username)
        .await?
        .ok_or(AppError::Unauthorized)?;

    // 密码校验失败与用户不存在返回同样的 401，避免泄露账号是否存在
    match user.verify_login(&req.password) {
        Ok(true) => {}
        Ok(false) => return Err(AppError::Unauthorized),
        Err(e) => {
            tracing::error!("Password verification error: {}", e);
            return Err(AppError::Unauthorized);
        }
    }

    let access_token = generate_token(&user.username, &state.config)
        .map_err(|e| AppError::Internal(format!("Failed to generate token: {}", e)))?;

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
    }))
}

#[axum::debug_handler]
pub async fn refresh_token(
    Extension(current_user): Extension<User>,
    State(state): State<AppState>,
) -> Result<Json<TokenResponse>, AppError> {
    let access_token = generate_token(&current_user.username, &state.config)
        .map_err(|e| AppError::Internal(format!("Failed to generate token: {}", e)))?;

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
    }))
}
