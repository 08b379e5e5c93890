pub mod connection;
pub mod entity;
pub mod manager;
pub mod migrate;
pub mod models;
pub mod repository;
pub mod schema;
pub mod store;

pub use connection::{DatabaseCredentials, DatabaseTarget};
pub use entity::{Entity, SqlValue, Stored};
pub use manager::{DatabaseError, DatabaseManager};
pub use repository::Repository;
pub use store::{Executed, Row, Store, StoreTransaction};
