use redis::{aio::MultiplexedConnection, AsyncCommands, Client};
use std::time::Duration;

use crate::error::AppResult;

#[derive(Clone)]
pub struct RedisClient {
    conn: MultiplexedConnection,
}

impl RedisClient {
    pub async fn new(url: &str) -> AppResult<Self> {
        let client = Client::open(url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        Ok(Self { conn })
    }

    // User list page cache
    pub async fn get_list_page(&self, page: i64, per_page: i64) -> AppResult<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(Self::list_key(page, per_page)).await?;
        Ok(value)
    }

    pub async fn set_list_page(
        &self,
        page: i64,
        per_page: i64,
        payload: &str,
        ttl: Duration,
    ) -> AppResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(Self::list_key(page, per_page), payload, ttl.as_secs())
            .await?;
        Ok(())
    }

    /// Drop every cached list page. Called after any user mutation.
    pub async fn drop_list_pages(&self) -> AppResult<()> {
        let mut conn = self.conn.clone();
        let keys: Vec<String> = conn.keys("users:list:*").await?;
        if !keys.is_empty() {
            let _: () = conn.del(keys).await?;
        }
        Ok(())
    }

    fn list_key(page: i64, per_page: i64) -> String {
        format!("users:list:{}:{}", page, per_page)
    }
}
