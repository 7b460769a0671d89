/// 物品缓存键前缀
const ITEM_PREFIX: &str = "item:";

/// 生成物品缓存键
pub fn item_key(item_id: i64) -> String {
    format!("{}{}", ITEM_PREFIX, item_id)
}
