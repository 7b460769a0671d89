use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};

use crate::{AppState, error::AppError, routes::user::model::User, utils::verify_token};

/// 认证中间件：校验 Bearer token 并把当前用户写入请求扩展
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or(AppError::Unauthorized)?;

    let claims = verify_token(token, &state.config).map_err(|_| AppError::Unauthorized)?;

    // token 有效但用户已被删除时同样视为未认证
    let user = User::find_by_username(&state.pool, &claims.sub)
        .await?
        .ok_or(AppError::Unauthorized)?;

    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}
