//! SQLite-backed metadata store
//!
//! One row per company, keyed by the content-addressed id. Puts are blind
//! `INSERT OR REPLACE` writes, matching the vector index's replace-by-id
//! semantics.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{params, Connection};

use crate::error::{Error, Result};
use crate::providers::kv_store::MetadataStore;
use crate::types::{CompanyRecord, IndexedRecord, SizeBucket};

pub struct SqliteMetadataStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteMetadataStore {
    /// Open (or create) the store at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path).map_err(db_err)?;
        conn.pragma_update(None, "journal_mode", "WAL").map_err(db_err)?;
        Self::init(conn)
    }

    /// Open an in-memory store (tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS companies (
                id TEXT PRIMARY KEY,
                company_name TEXT NOT NULL,
                company_website TEXT NOT NULL,
                employee_size TEXT NOT NULL,
                location TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )
        .map_err(db_err)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Look up one record by id.
    pub fn get(&self, id: &str) -> Result<Option<IndexedRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                "SELECT id, company_name, company_website, employee_size, location
                 FROM companies WHERE id = ?1",
            )
            .map_err(db_err)?;
        let mut rows = stmt.query(params![id]).map_err(db_err)?;
        match rows.next().map_err(db_err)? {
            Some(row) => {
                let size: String = row.get(3).map_err(db_err)?;
                Ok(Some(IndexedRecord {
                    id: row.get(0).map_err(db_err)?,
                    company: CompanyRecord {
                        company_name: row.get(1).map_err(db_err)?,
                        company_website: row.get(2).map_err(db_err)?,
                        employee_size: SizeBucket::from_label(&size)
                            .unwrap_or(SizeBucket::Unknown),
                        location: row.get(4).map_err(db_err)?,
                    },
                }))
            }
            None => Ok(None),
        }
    }

    /// Number of stored records.
    pub fn len(&self) -> Result<usize> {
        let conn = self.conn.lock();
        conn.query_row("SELECT COUNT(*) FROM companies", [], |row| row.get::<_, i64>(0))
            .map(|count| count as usize)
            .map_err(db_err)
    }
}

#[async_trait]
impl MetadataStore for SqliteMetadataStore {
    async fn put(&self, record: &IndexedRecord) -> Result<()> {
        let conn = Arc::clone(&self.conn);
        let record = record.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock();
            conn.execute(
                "INSERT OR REPLACE INTO companies
                     (id, company_name, company_website, employee_size, location, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    record.id,
                    record.company.company_name,
                    record.company.company_website,
                    record.company.employee_size.label(),
                    record.company.location,
                    chrono::Utc::now().to_rfc3339(),
                ],
            )
            .map_err(db_err)?;
            Ok(())
        })
        .await
        .map_err(|e| Error::MetadataStore(format!("task join error: {e}")))?
    }

    fn name(&self) -> &str {
        "sqlite"
    }
}

fn db_err(e: rusqlite::Error) -> Error {
    Error::MetadataStore(e.to_string())
}
