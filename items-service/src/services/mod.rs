pub mod connection;
pub mod database;
pub mod memory;
pub mod metrics;
pub mod store;

pub use connection::ConnectionManager;
pub use database::{MongoConnector, MongoDb, MongoItemStore};
pub use memory::{InMemoryConnector, InMemoryItemStore};
pub use self::metrics::{get_metrics, init_metrics};
pub use store::{Connector, ItemStore};
