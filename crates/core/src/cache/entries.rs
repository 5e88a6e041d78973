//! Named cache operations on the SQLite store.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::OptionalExtension;

use super::connection::CacheDb;
use crate::Error;
use crate::http::{RequestKey, ResponseSnapshot};
use crate::store::NamedCacheStore;

/// Name and size of one named cache.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CacheSummary {
    pub name: String,
    pub entries: u64,
    pub created_at: String,
}

fn decode_response(status: i64, headers_json: &str, body: Vec<u8>) -> Result<ResponseSnapshot, Error> {
    let headers: Vec<(String, String)> = serde_json::from_str(headers_json)?;
    let status = u16::try_from(status).map_err(|_| Error::CacheOperation(format!("stored status {status} out of range")))?;
    Ok(ResponseSnapshot::new(status, headers, body))
}

impl CacheDb {
    /// Every cache with its entry count, in creation order.
    pub async fn cache_summaries(&self) -> Result<Vec<CacheSummary>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<CacheSummary>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT c.name, c.created_at, COUNT(e.id)
                     FROM caches c LEFT JOIN cache_entries e ON e.cache_name = c.name
                     GROUP BY c.id ORDER BY c.id",
                )?;
                let rows = stmt.query_map([], |row| {
                    Ok(CacheSummary { name: row.get(0)?, created_at: row.get(1)?, entries: row.get::<_, i64>(2)? as u64 })
                })?;
                let summaries = rows.collect::<Result<Vec<_>, _>>()?;
                Ok(summaries)
            })
            .await
            .map_err(Error::from)
    }
}

#[async_trait]
impl NamedCacheStore for CacheDb {
    async fn open(&self, cache: &str) -> Result<(), Error> {
        let cache = cache.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute("INSERT OR IGNORE INTO caches (name, created_at) VALUES (?1, ?2)", params![cache, now])?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn cache_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM caches ORDER BY id")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    async fn delete_cache(&self, cache: &str) -> Result<bool, Error> {
        let cache = cache.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM caches WHERE name = ?1", params![cache])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Replaces any previous entry in one transaction so readers never see a
    /// partial write.
    async fn put(&self, cache: &str, key: &RequestKey, response: &ResponseSnapshot) -> Result<(), Error> {
        key.ensure_cacheable()?;

        let cache = cache.to_string();
        let key = key.clone();
        let key_hash = key.hash();
        let headers_json = serde_json::to_string(&response.headers)?;
        let status = i64::from(response.status);
        let body = response.body.to_vec();
        let now = chrono::Utc::now().to_rfc3339();

        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute("INSERT OR IGNORE INTO caches (name, created_at) VALUES (?1, ?2)", params![cache, now])?;
                tx.execute(
                    "DELETE FROM cache_entries WHERE cache_name = ?1 AND key_hash = ?2",
                    params![cache, key_hash],
                )?;
                tx.execute(
                    "INSERT INTO cache_entries
                        (cache_name, key_hash, method, url, status, headers_json, body, stored_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    params![cache, key_hash, key.method, key.url, status, headers_json, body, now],
                )?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn get(&self, cache: &str, key: &RequestKey) -> Result<Option<ResponseSnapshot>, Error> {
        if key.method != "GET" {
            return Ok(None);
        }
        let cache = cache.to_string();
        let key_hash = key.hash();
        self.conn
            .call(move |conn| -> Result<Option<ResponseSnapshot>, Error> {
                let row = conn
                    .query_row(
                        "SELECT status, headers_json, body FROM cache_entries
                         WHERE cache_name = ?1 AND key_hash = ?2",
                        params![cache, key_hash],
                        |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?, row.get::<_, Vec<u8>>(2)?)),
                    )
                    .optional()?;

                row.map(|(status, headers, body)| decode_response(status, &headers, body))
                    .transpose()
            })
            .await
            .map_err(Error::from)
    }

    async fn match_any(&self, key: &RequestKey) -> Result<Option<ResponseSnapshot>, Error> {
        if key.method != "GET" {
            return Ok(None);
        }
        let key_hash = key.hash();
        self.conn
            .call(move |conn| -> Result<Option<ResponseSnapshot>, Error> {
                let row = conn
                    .query_row(
                        "SELECT e.status, e.headers_json, e.body
                         FROM cache_entries e JOIN caches c ON c.name = e.cache_name
                         WHERE e.key_hash = ?1
                         ORDER BY c.id LIMIT 1",
                        params![key_hash],
                        |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?, row.get::<_, Vec<u8>>(2)?)),
                    )
                    .optional()?;

                row.map(|(status, headers, body)| decode_response(status, &headers, body))
                    .transpose()
            })
            .await
            .map_err(Error::from)
    }

    async fn keys(&self, cache: &str) -> Result<Vec<RequestKey>, Error> {
        let cache = cache.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<RequestKey>, Error> {
                let mut stmt = conn.prepare("SELECT method, url FROM cache_entries WHERE cache_name = ?1 ORDER BY id")?;
                let keys = stmt
                    .query_map(params![cache], |row| Ok(RequestKey { method: row.get(0)?, url: row.get(1)? }))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(keys)
            })
            .await
            .map_err(Error::from)
    }

    async fn delete(&self, cache: &str, key: &RequestKey) -> Result<bool, Error> {
        let cache = cache.to_string();
        let key_hash = key.hash();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute(
                    "DELETE FROM cache_entries WHERE cache_name = ?1 AND key_hash = ?2",
                    params![cache, key_hash],
                )?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }
}
