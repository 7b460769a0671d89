use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use catalog_backend::cache::{RedisStore, get_or_load, invalidate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Snapshot {
    id: i64,
    title: String,
    description: Option<String>,
}

fn snapshot(id: i64) -> Snapshot {
    Snapshot {
        id,
        title: format!("Item {}", id),
        description: Some("A fruit".to_string()),
    }
}

fn live_redis() -> Option<Arc<RedisStore>> {
    let url = std::env::var("REDIS_URL").ok()?;
    let client = redis::Client::open(url).ok()?;
    Some(Arc::new(RedisStore::new(
        client,
        Duration::from_secs(5),
        Duration::from_secs(5),
    )))
}

// 测试间互不干扰的缓存键
fn unique_key(name: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("test:item:{}:{}:{}", std::process::id(), name, nanos)
}

#[tokio::test]
async fn first_read_populates_and_second_read_skips_loader() {
    let Some(redis) = live_redis() else {
        eprintln!("REDIS_URL not set, skipping");
        return;
    };
    let key = unique_key("hit");
    let calls = AtomicUsize::new(0);

    let first: Option<Snapshot> = get_or_load(&redis, &key, 300, || async {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok::<_, sqlx::Error>(Some(snapshot(1)))
    })
    .await
    .unwrap();

    let second: Option<Snapshot> = get_or_load(&redis, &key, 300, || async {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok::<_, sqlx::Error>(Some(snapshot(999)))
    })
    .await
    .unwrap();

    // 第二次读取来自缓存，loader 不再被调用，内容与首次完全一致
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        serde_json::to_string(&second).unwrap(),
        serde_json::to_string(&first).unwrap()
    );
}

#[tokio::test]
async fn not_found_is_never_cached() {
    let Some(redis) = live_redis() else {
        eprintln!("REDIS_URL not set, skipping");
        return;
    };
    let key = unique_key("missing");
    let calls = AtomicUsize::new(0);

    for _ in 0..2 {
        let result: Option<Snapshot> = get_or_load(&redis, &key, 300, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, sqlx::Error>(None)
        })
        .await
        .unwrap();
        assert!(result.is_none());
    }

    // 每次缺失读取都重新查询数据源
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn invalidation_forces_reload_from_source() {
    let Some(redis) = live_redis() else {
        eprintln!("REDIS_URL not set, skipping");
        return;
    };
    let key = unique_key("invalidate");
    let calls = AtomicUsize::new(0);

    let loader = |value: Snapshot| {
        let calls = &calls;
        move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, sqlx::Error>(Some(value))
        }
    };

    let first: Option<Snapshot> = get_or_load(&redis, &key, 300, loader(snapshot(1)))
        .await
        .unwrap();
    assert_eq!(first.unwrap().id, 1);

    invalidate(&redis, &key).await.unwrap();

    // 失效后读取的是新状态，不是旧缓存
    let mut updated = snapshot(1);
    updated.title = "Updated".to_string();
    let second: Option<Snapshot> = get_or_load(&redis, &key, 300, loader(updated))
        .await
        .unwrap();
    assert_eq!(second.unwrap().title, "Updated");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn invalidate_is_idempotent() {
    let Some(redis) = live_redis() else {
        eprintln!("REDIS_URL not set, skipping");
        return;
    };
    let key = unique_key("idempotent");

    // 键不存在时删除也不报错
    invalidate(&redis, &key).await.unwrap();
    invalidate(&redis, &key).await.unwrap();
}

#[tokio::test]
async fn fresh_entry_ttl_is_bounded_by_configured_ttl() {
    let Some(redis) = live_redis() else {
        eprintln!("REDIS_URL not set, skipping");
        return;
    };
    let key = unique_key("ttl");

    let _: Option<Snapshot> = get_or_load(&redis, &key, 300, || async {
        Ok::<_, sqlx::Error>(Some(snapshot(1)))
    })
    .await
    .unwrap();

    let mut conn = redis.connection().await.unwrap();
    let ttl: i64 = redis::cmd("TTL").arg(&key).query_async(&mut conn).await.unwrap();
    assert!(ttl > 0, "fresh entry must expire");
    assert!(ttl <= 300, "ttl must not exceed the configured bound");
}

#[tokio::test]
async fn operations_reuse_one_server_connection() {
    let Some(redis) = live_redis() else {
        eprintln!("REDIS_URL not set, skipping");
        return;
    };

    // 多次取连接拿到的是同一条服务端连接，不是每次新建
    let mut first = redis.connection().await.unwrap();
    let mut second = redis.connection().await.unwrap();
    let first_id: i64 = redis::cmd("CLIENT")
        .arg("ID")
        .query_async(&mut first)
        .await
        .unwrap();
    let second_id: i64 = redis::cmd("CLIENT")
        .arg("ID")
        .query_async(&mut second)
        .await
        .unwrap();
    assert_eq!(first_id, second_id);
}
