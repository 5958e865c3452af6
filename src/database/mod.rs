pub mod manager;
pub mod memory;
pub mod models;
pub mod patch;
pub mod postgres;
pub mod query_builder;
pub mod repository;
pub mod table;

pub use manager::{DatabaseError, DatabaseManager};
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use repository::Store;
