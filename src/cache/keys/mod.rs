pub mod item_keys;
pub mod rate_limit_keys;
