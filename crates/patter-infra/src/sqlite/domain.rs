//! SQLite domain id registry.
//!
//! Maps customer domains to the internal numeric ids the semantic index is
//! keyed by. Lookups are a single exact-match SELECT; normalization and
//! alternate-form probing happen in the core resolver, not here.

use patter_core::store::DomainLookup;
use patter_types::error::StoreError;
use sqlx::Row;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `DomainLookup`.
pub struct SqliteDomainLookup {
    pool: DatabasePool,
}

impl SqliteDomainLookup {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Insert or update the id mapping for a domain.
    pub async fn register(&self, domain: &str, id: i64) -> Result<(), StoreError> {
        sqlx::query(
            r#"INSERT INTO domain_ids (domain, id) VALUES (?, ?)
               ON CONFLICT(domain) DO UPDATE SET id = excluded.id"#,
        )
        .bind(domain)
        .bind(id)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(())
    }
}

impl DomainLookup for SqliteDomainLookup {
    async fn domain_id(&self, domain: &str) -> Result<Option<i64>, StoreError> {
        let row = sqlx::query("SELECT id FROM domain_ids WHERE domain = ?")
            .bind(domain)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let id: i64 = row
                    .try_get("id")
                    .map_err(|e| StoreError::Query(e.to_string()))?;
                Ok(Some(id))
            }
            None => Ok(None),
        }
    }
}
