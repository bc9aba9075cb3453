//! # Replied Redis
//!
//! Low-level Redis client used for admission counters.
//!
//! ## Design Principles
//!
//! - **No business logic** - Pure infrastructure layer
//! - **No dependencies** on other replied-* crates
//!
//! ## Example
//!
//! ```rust,no_run
//! use replied_redis::RedisClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = RedisClient::connect("redis://localhost:6379").await?;
//!
//!     // Count within a 10 minute window
//!     let count = client.incr_with_expiry("ratelimit:send:203.0.113.7", 600).await?;
//!     println!("{count} sends in the current window");
//!
//!     Ok(())
//! }
//! ```

mod client;

pub use client::RedisClient;

pub use redis::RedisError;

/// Result type for Redis operations
pub type Result<T> = std::result::Result<T, RedisError>;
