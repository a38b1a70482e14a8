//! Database connection layer.
//!
//! - `SqlitePool`: sqlx pool wrapper preconfigured for WAL mode
//!
//! # Example
//!
//! ```ignore
//! let pool = SqlitePool::open("data/pingpal.db").await?;
//! let row = sqlx::query("SELECT 1").fetch_one(pool.inner()).await?;
//! ```

mod sqlite;

pub use sqlite::SqlitePool;
