//! Key/value preference storage on the SQLite store.

use async_trait::async_trait;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::OptionalExtension;

use super::connection::CacheDb;
use crate::Error;
use crate::store::KeyValueStore;

#[async_trait]
impl KeyValueStore for CacheDb {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, Error> {
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<Option<String>, Error> {
                let value = conn
                    .query_row("SELECT value_json FROM kv_store WHERE key = ?1", params![key], |row| row.get(0))
                    .optional()?;
                Ok(value)
            })
            .await
            .map_err(Error::from)
    }

    async fn set_raw(&self, key: &str, value: String) -> Result<(), Error> {
        let key = key.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO kv_store (key, value_json, updated_at) VALUES (?1, ?2, ?3)
                     ON CONFLICT(key) DO UPDATE SET
                        value_json = excluded.value_json,
                        updated_at = excluded.updated_at",
                    params![key, value, now],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn remove(&self, key: &str) -> Result<bool, Error> {
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }
}
