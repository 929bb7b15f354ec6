pub mod item;

pub use item::{InsertResponse, ItemId};
