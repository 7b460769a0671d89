use std::future::Future;

use redis::AsyncCommands;
use serde::{Serialize, de::DeserializeOwned};

use crate::cache::store::RedisStore;

/// 读穿缓存：命中时直接反序列化返回，未命中时调用 loader 读取数据源
///
/// loader 返回 None（资源不存在）时不写入缓存，避免把"不存在"永久化；
/// Redis 出错时记录日志并降级到数据源（fail-open），缓存故障不影响读取。
pub async fn get_or_load<T, F, Fut, E>(
    redis: &RedisStore,
    key: &str,
    ttl_secs: u64,
    loader: F,
) -> Result<Option<T>, E>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
{
    // 尝试从缓存读取
    if let Ok(mut conn) = redis.connection().await {
        let cached: redis::RedisResult<Option<String>> = conn.get(key).await;
        match cached {
            Ok(Some(json)) => match serde_json::from_str(&json) {
                Ok(value) => {
                    tracing::debug!("Cache hit: {}", key);
                    return Ok(Some(value));
                }
                Err(e) => {
                    // 反序列化失败当作未命中处理，条目会被下面的写入覆盖
                    tracing::warn!("Failed to decode cached value for {}: {}", key, e);
                }
            },
            Ok(None) => {}
            Err(e) => {
                tracing::warn!("Cache read failed for {}: {}", key, e);
            }
        }
    }

    // 从数据源读取
    let loaded = loader().await?;

    // 缓存结果，资源不存在时不缓存
    if let Some(ref value) = loaded {
        if let Ok(mut conn) = redis.connection().await {
            if let Ok(json) = serde_json::to_string(value) {
                let stored: redis::RedisResult<()> = conn.set_ex(key, json, ttl_secs).await;
                match stored {
                    Ok(()) => tracing::debug!("Cache set: {} (ttl {}s)", key, ttl_secs),
                    Err(e) => tracing::warn!("Cache write failed for {}: {}", key, e),
                }
            }
        }
    }

    Ok(loaded)
}

/// 删除缓存条目，键不存在时也视为成功（幂等）
pub async fn invalidate(redis: &RedisStore, key: &str) -> Result<(), redis::RedisError> {
    let mut conn = redis.connection().await?;
    let _: () = conn.del(key).await?;
    tracing::debug!("Cache invalidated: {}", key);
    Ok(())
}
