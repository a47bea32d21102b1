//! Database connection pool module.
//!
//! Async PostgreSQL connection pooling using diesel_async with bb8.

mod pool;

pub use pool::{AsyncDbPool, check_connection, establish_async_connection_pool};
