use axum::{
    body::{Body, to_bytes},
    http::Request,
    middleware::Next,
    response::Response,
};
use tracing::error;

// 日志中最多记录的响应体字节数，超出部分截断；客户端收到的响应体不受影响
const LOGGED_BODY_LIMIT: usize = 4096;

/// 记录服务端错误响应的中间件，响应体原样透传
pub async fn log_errors(req: Request<Body>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;

    if !response.status().is_server_error() {
        return response;
    }

    // 这里产生的 5xx 响应体都是小 JSON，整体读取没有放大风险
    let (mut parts, body) = response.into_parts();
    let bytes = match to_bytes(body, usize::MAX).await {
        Ok(b) => b,
        Err(e) => {
            error!("Failed to read error response body: {}", e);
            return Response::from_parts(parts, Body::empty());
        }
    };

    let shown = bytes.len().min(LOGGED_BODY_LIMIT);
    error!(
        "Server error - {} {} -> {}: {}",
        method,
        path,
        parts.status,
        String::from_utf8_lossy(&bytes[..shown])
    );

    // 读取后重建响应体
    parts.headers.remove(axum::http::header::CONTENT_LENGTH);
    Response::from_parts(parts, Body::from(bytes))
}
