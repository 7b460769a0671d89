pub mod handler;
pub mod model;

pub use handler::{create_item, delete_item, get_item, list_items, update_item};
