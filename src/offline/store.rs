use anyhow::Result;
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;

use super::fetcher::{FetchResponse, ServedFrom};

/// SQLite-backed cache storage: one row per cached GET resource, scoped by
/// cache (generation) name. Writes are last-write-wins.
pub struct CacheStore {
    conn: Connection,
}

impl CacheStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS cache_entries(
                cache_name TEXT NOT NULL,
                url TEXT NOT NULL,
                method TEXT NOT NULL,
                status INTEGER NOT NULL,
                content_type TEXT,
                body BLOB NOT NULL,
                stored_at TEXT NOT NULL,
                PRIMARY KEY(cache_name, url, method)
            )",
            [],
        )?;
        Ok(CacheStore { conn })
    }

    pub fn put(
        &self,
        cache_name: &str,
        url: &str,
        method: &str,
        resp: &FetchResponse,
    ) -> Result<()> {
        self.conn.execute(
            "INSERT INTO cache_entries(cache_name, url, method, status, content_type, body, stored_at)
             VALUES(?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(cache_name, url, method) DO UPDATE SET
               status = excluded.status,
               content_type = excluded.content_type,
               body = excluded.body,
               stored_at = excluded.stored_at",
            rusqlite::params![
                cache_name,
                url,
                method,
                resp.status,
                resp.content_type,
                resp.body,
                Utc::now().to_rfc3339()
            ],
        )?;
        Ok(())
    }

    /// Stores a set of GET entries all-or-nothing.
    pub fn put_all(&mut self, cache_name: &str, entries: &[(String, FetchResponse)]) -> Result<()> {
        let tx = self.conn.transaction()?;
        for (url, resp) in entries {
            tx.execute(
                "INSERT INTO cache_entries(cache_name, url, method, status, content_type, body, stored_at)
                 VALUES(?, ?, 'GET', ?, ?, ?, ?)
                 ON CONFLICT(cache_name, url, method) DO UPDATE SET
                   status = excluded.status,
                   content_type = excluded.content_type,
                   body = excluded.body,
                   stored_at = excluded.stored_at",
                rusqlite::params![
                    cache_name,
                    url,
                    resp.status,
                    resp.content_type,
                    resp.body,
                    Utc::now().to_rfc3339()
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn lookup(&self, cache_name: &str, url: &str, method: &str) -> Result<Option<FetchResponse>> {
        self.conn
            .query_row(
                "SELECT status, content_type, body FROM cache_entries
                 WHERE cache_name = ? AND url = ? AND method = ?",
                rusqlite::params![cache_name, url, method],
                |r| {
                    Ok(FetchResponse {
                        status: r.get(0)?,
                        content_type: r.get(1)?,
                        body: r.get(2)?,
                        served_from: ServedFrom::Cache,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn cache_names(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT cache_name FROM cache_entries ORDER BY cache_name")?;
        let names = stmt
            .query_map([], |r| r.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(names)
    }

    pub fn delete_cache(&self, cache_name: &str) -> Result<usize> {
        Ok(self
            .conn
            .execute("DELETE FROM cache_entries WHERE cache_name = ?", [cache_name])?)
    }
}
