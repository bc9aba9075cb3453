//! Redis client implementation with connection management

use crate::Result;
use redis::aio::ConnectionManager;

/// INCR the key and set its TTL only when the increment created it.
/// One round trip, so concurrent first writes cannot race on the expiry.
const INCR_WITH_EXPIRY: &str = r"
local count = redis.call('INCR', KEYS[1])
if count == 1 then
    redis.call('EXPIRE', KEYS[1], ARGV[1])
end
return count
";

/// Redis client with automatic reconnection
#[derive(Clone)]
pub struct RedisClient {
    conn: ConnectionManager,
}

impl RedisClient {
    /// Connect to Redis server
    ///
    /// Supports both redis:// and rediss:// (TLS) URLs
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }

    // ============================================================================
    // Atomic Operations
    // ============================================================================

    /// Atomically increment `key`, starting a `ttl_seconds` expiry on first write.
    /// Returns the count after the increment.
    pub async fn incr_with_expiry(&mut self, key: &str, ttl_seconds: u64) -> Result<u64> {
        let count: u64 = redis::Script::new(INCR_WITH_EXPIRY)
            .key(key)
            .arg(ttl_seconds)
            .invoke_async(&mut self.conn)
            .await?;

        Ok(count)
    }

    /// PING - Health check
    pub async fn ping(&mut self) -> Result<()> {
        let _: String = redis::cmd("PING").query_async(&mut self.conn).await?;
        Ok(())
    }
}
