mod diesel;
pub mod memory;
pub mod models;
pub mod schema;

pub use self::diesel::DbStore;
pub use memory::MemoryStore;
