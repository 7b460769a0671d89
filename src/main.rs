use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::{
    Json, Router,
    routing::{get, post},
};
use catalog_backend::{
    AppState,
    cache::RedisStore,
    config::Config,
    middleware::{RateLimitConfig, RateLimiter, auth_middleware, log_errors, rate_limit},
    routes,
};
use serde_json::json;
use sqlx::Executor;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 加载配置
    let config = Config::from_env().expect("Failed to load configuration");

    // 设置数据库连接池
    let pool = PgPoolOptions::new()
        .max_connections(config.db_pool_size)
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                conn.execute("SET application_name = 'catalog_backend';")
                    .await?;
                Ok(())
            })
        })
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to Postgres");

    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    // 设置 Redis 存储：进程内共享一条连接，限流与缓存复用
    let redis_client =
        redis::Client::open(config.redis_url.clone()).expect("Failed to create Redis client");
    let redis_store = Arc::new(RedisStore::new(
        redis_client,
        config.redis_connect_timeout(),
        config.redis_response_timeout(),
    ));
    // 启动时先建好共享连接；失败只告警，限流和缓存读取降级到 fail-open
    if let Err(e) = redis_store.connection().await {
        tracing::warn!("Redis unavailable at startup, continuing degraded: {}", e);
    }

    // 设置应用状态
    let state = AppState {
        pool,
        config: config.clone(),
        redis: redis_store.clone(),
    };

    // 设置限流器，参数在启动时固定下来
    let rate_limiter = Arc::new(RateLimiter::new(
        redis_store,
        RateLimitConfig {
            enabled: config.rate_limit_enabled,
            max_requests: config.rate_limit_requests,
            window_secs: config.rate_limit_window_secs,
        },
    ));

    // 将路由分为公开路由和受保护路由
    let public_routes = Router::new()
        .route("/auth/register", post(routes::auth::register))
        .route("/auth/login", post(routes::auth::login));

    let protected_routes = Router::new()
        .route("/auth/refresh-token", post(routes::auth::refresh_token))
        // 用户路由
        .route("/users", get(routes::user::list_users))
        .route(
            "/users/{user_id}",
            get(routes::user::get_user)
                .put(routes::user::update_user)
                .delete(routes::user::delete_user),
        )
        // 物品路由
        .route(
            "/items",
            get(routes::item::list_items).post(routes::item::create_item),
        )
        .route(
            "/items/{item_id}",
            get(routes::item::get_item)
                .put(routes::item::update_item)
                .delete(routes::item::delete_item),
        )
        // 应用认证中间件
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // 创建基础路由
    let router = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .nest(
            &config.api_base_uri.clone(),
            Router::new().merge(public_routes).merge(protected_routes),
        );

    // 添加日志中间件和限流中间件，限流器在最外层先执行
    let router = router.layer(axum::middleware::from_fn(log_errors)).layer(
        axum::middleware::from_fn_with_state(rate_limiter, rate_limit),
    );

    // 根据编译模式决定是否添加CORS
    #[cfg(debug_assertions)]
    let router = {
        tracing::debug!("Adding CORS layer for development mode");
        router.layer(CorsLayer::permissive())
    };

    // 添加应用状态
    let app = router.with_state(state.clone());

    // 启动服务器
    let addr = SocketAddr::new(
        state.config.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to dual-stack default");
            IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED)
        }),
        state.config.server_port,
    );
    tracing::info!("Server listening on {}", addr);
    axum::serve(
        tokio::net::TcpListener::bind(&addr)
            .await
            .expect("Failed to bind"),
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Failed to start server");
}

async fn root() -> Json<serde_json::Value> {
    Json(json!({ "message": "Catalog backend service" }))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy" }))
}
