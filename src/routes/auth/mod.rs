pub mod handler;

pub use handler::{login, refresh_token, register};
