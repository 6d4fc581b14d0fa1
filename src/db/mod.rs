pub mod connection;
pub mod local_storage;
pub mod schema;

pub use connection::Database;
pub use local_storage::LocalStorage;
