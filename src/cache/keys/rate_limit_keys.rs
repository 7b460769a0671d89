/// 限流键前缀
const RATE_LIMIT_PREFIX: &str = "rate_limit:";

/// 生成按客户端IP划分的限流键
pub fn rate_limit_key(client_ip: &str) -> String {
    format!("{}{}", RATE_LIMIT_PREFIX, client_ip)
}
