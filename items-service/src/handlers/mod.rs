pub mod health;
pub mod items;

pub use health::{health_check, metrics_endpoint, not_found, readiness_check, root};
pub use items::{create_item, get_item, list_items};
