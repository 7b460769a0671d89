// 缓存模块
// 包含缓存键生成和读穿/失效操作逻辑

pub mod keys;
pub mod operations;
pub mod store;

// 重新导出常用函数，方便其他模块使用
pub use operations::{get_or_load, invalidate};
pub use store::RedisStore;
