use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json,
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, HeaderName, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use redis::AsyncCommands;

use crate::cache::RedisStore;
use crate::cache::keys::rate_limit_keys::rate_limit_key;
use crate::error::ErrorResponse;

const HEADER_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
const HEADER_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
const HEADER_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

const REJECTED_DETAIL: &str = "Too many requests. Please try again later.";

/// 限流参数，启动时从 Config 构造后传入限流器，不使用全局可变配置
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub max_requests: u32,
    pub window_secs: u64,
}

/// 基于 Redis 有序集合的滑动窗口限流器
#[derive(Clone)]
pub struct RateLimiter {
    redis: Arc<RedisStore>,
    config: RateLimitConfig,
}

impl RateLimiter {
    /// 限流器与缓存共用同一个进程级连接，不单独建连
    pub fn new(redis: Arc<RedisStore>, config: RateLimitConfig) -> Self {
        Self { redis, config }
    }

    /// 检查并记录一次请求，返回 (是否放行, 剩余配额)
    ///
    /// Redis 不可用时记录日志并放行（fail-open）：限流失效优于请求全部失败
    pub async fn check_and_record(&self, key: &str) -> (bool, i64) {
        match self.try_check_and_record(key).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!("Redis error in rate limiter, allowing request: {}", e);
                (true, self.config.max_requests as i64)
            }
        }
    }

    async fn try_check_and_record(&self, key: &str) -> Result<(bool, i64), redis::RedisError> {
        let mut conn = self.redis.connection().await?;

        // 使用 Redis 自身的时钟，多实例部署下窗口保持一致
        let (now, micros): (i64, i64) = redis::cmd("TIME").query_async(&mut conn).await?;
        let window_start = now - self.config.window_secs as i64;

        // 清除窗口外的请求标记
        let _: () = conn.zrembyscore(key, 0, window_start).await?;

        // 统计窗口内已接受的请求数
        let count: i64 = conn.zcard(key).await?;

        if count >= self.config.max_requests as i64 {
            // 拒绝的请求不记录
            return Ok((false, 0));
        }

        // 记录本次请求，成员带微秒避免同一秒内的请求互相覆盖；
        // 键的过期时间兜底窗口长度，即使清除步骤被跳过也不会泄漏
        let _: () = conn
            .zadd(key, format!("{}:{}", now, micros), now)
            .await?;
        let _: () = conn.expire(key, self.config.window_secs as i64).await?;

        Ok((true, self.config.max_requests as i64 - count - 1))
    }

    fn set_rate_limit_headers(&self, headers: &mut HeaderMap, remaining: i64) {
        headers.insert(HEADER_LIMIT, HeaderValue::from(self.config.max_requests));
        headers.insert(HEADER_REMAINING, HeaderValue::from(remaining.max(0)));
        // reset 固定报告窗口长度，不是计算出的过期时刻
        headers.insert(HEADER_RESET, HeaderValue::from(self.config.window_secs));
    }

    pub async fn check_rate_limit(self: Arc<Self>, req: Request<Body>, next: Next) -> Response {
        // 全局开关优先：关闭时不访问 Redis，也不加响应头
        if !self.config.enabled {
            return next.run(req).await;
        }

        let key = rate_limit_key(&client_ip(&req));
        let (allowed, remaining) = self.check_and_record(&key).await;

        if !allowed {
            let mut response = (
                StatusCode::TOO_MANY_REQUESTS,
                Json(ErrorResponse {
                    detail: REJECTED_DETAIL.to_string(),
                }),
            )
                .into_response();
            self.set_rate_limit_headers(response.headers_mut(), remaining);
            return response;
        }

        let mut response = next.run(req).await;
        self.set_rate_limit_headers(response.headers_mut(), remaining);
        response
    }
}

/// 取客户端IP：代理部署下取 X-Forwarded-For 的第一项，否则退回连接对端地址
fn client_ip(req: &Request<Body>) -> String {
    req.headers()
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .or_else(|| {
            req.extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ci| ci.0.ip().to_string())
        })
        .unwrap_or_else(|| "unknown".to_string())
}

pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    limiter.check_rate_limit(req, next).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> Request<Body> {
        Request::builder().uri("/").body(Body::empty()).unwrap()
    }

    #[test]
    fn forwarded_for_takes_first_entry() {
        let mut req = request();
        req.headers_mut().insert(
            "x-forwarded-for",
            HeaderValue::from_static("1.2.3.4, 10.0.0.1, 10.0.0.2"),
        );
        assert_eq!(client_ip(&req), "1.2.3.4");
    }

    #[test]
    fn forwarded_for_is_trimmed() {
        let mut req = request();
        req.headers_mut()
            .insert("x-forwarded-for", HeaderValue::from_static("  5.6.7.8  "));
        assert_eq!(client_ip(&req), "5.6.7.8");
    }

    #[test]
    fn falls_back_to_peer_address() {
        let mut req = request();
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([9, 9, 9, 9], 40000))));
        assert_eq!(client_ip(&req), "9.9.9.9");
    }

    #[test]
    fn forwarded_for_wins_over_peer_address() {
        let mut req = request();
        req.headers_mut()
            .insert("x-forwarded-for", HeaderValue::from_static("1.2.3.4"));
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([9, 9, 9, 9], 40000))));
        assert_eq!(client_ip(&req), "1.2.3.4");
    }

    #[test]
    fn unknown_without_any_source() {
        assert_eq!(client_ip(&request()), "unknown");
    }

    #[tokio::test]
    async fn fails_open_when_store_unreachable() {
        // 未监听的端口，建连在调用时失败
        let store = Arc::new(RedisStore::new(
            redis::Client::open("redis://127.0.0.1:6390/").unwrap(),
            std::time::Duration::from_millis(200),
            std::time::Duration::from_millis(200),
        ));
        let limiter = RateLimiter::new(
            store,
            RateLimitConfig {
                enabled: true,
                max_requests: 100,
                window_secs: 60,
            },
        );

        let (allowed, remaining) = limiter.check_and_record("rate_limit:1.2.3.4").await;
        assert!(allowed);
        assert_eq!(remaining, 100);
    }
}
