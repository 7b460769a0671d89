use std::time::Duration;

use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use tokio::sync::OnceCell;

/// 进程内共享的 Redis 连接：启动时建立一次，所有请求复用同一条多路复用连接，
/// 不做按请求建连
pub struct RedisStore {
    client: redis::Client,
    manager_config: ConnectionManagerConfig,
    manager: OnceCell<ConnectionManager>,
}

impl RedisStore {
    pub fn new(
        client: redis::Client,
        connect_timeout: Duration,
        response_timeout: Duration,
    ) -> Self {
        // 命令失败后管理器会在后台自动重连，初次建连只额外重试一次
        let manager_config = ConnectionManagerConfig::new()
            .set_connection_timeout(connect_timeout)
            .set_response_timeout(response_timeout)
            .set_number_of_retries(1);
        Self {
            client,
            manager_config,
            manager: OnceCell::new(),
        }
    }

    /// 取共享连接的句柄（廉价克隆）；尚未建立时先建立，建连失败不会固化，
    /// 下次调用会重试，调用方按 fail-open 处理返回的错误
    pub async fn connection(&self) -> redis::RedisResult<ConnectionManager> {
        let manager = self
            .manager
            .get_or_try_init(|| {
                ConnectionManager::new_with_config(self.client.clone(), self.manager_config.clone())
            })
            .await?;
        Ok(manager.clone())
    }
}
