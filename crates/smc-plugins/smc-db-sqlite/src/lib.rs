//! # smc-db-sqlite Implementation
//!
//! This module implements the `SiteRepo` port on top of SQLite. Each
//! collection is one table of flat documents keyed by an opaque id.

use async_trait::async_trait;
use smc_core::error::{AppError, Result};
use smc_core::models::{Collection, NewSite, SiteRecord};
use smc_core::traits::SiteRepo;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::str::FromStr;
use uuid::Uuid;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS sites_collection (
    id     TEXT PRIMARY KEY,
    domain TEXT NOT NULL,
    notes  TEXT NOT NULL,
    path   TEXT NOT NULL,
    reason TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS sites_collection_domain ON sites_collection (domain);

CREATE TABLE IF NOT EXISTS reports_collection (
    id     TEXT PRIMARY KEY,
    domain TEXT NOT NULL UNIQUE,
    notes  TEXT NOT NULL,
    path   TEXT NOT NULL,
    reason TEXT NOT NULL
);
"#;

pub struct SqliteSiteRepo {
    pool: SqlitePool,
}

impl SqliteSiteRepo {
    /// Opens the pool and creates both collections if missing.
    ///
    /// `sqlite::memory:` gets a single connection, since every in-memory
    /// connection would otherwise see its own empty database.
    pub async fn new(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(internal)?
            .create_if_missing(true);
        let in_memory = url.contains(":memory:");
        let mut pool_options = SqlitePoolOptions::new().max_connections(if in_memory { 1 } else { 8 });
        if in_memory {
            // Dropping the only connection drops the database with it.
            pool_options = pool_options.idle_timeout(None).max_lifetime(None);
        }

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(internal)?;

        sqlx::raw_sql(SCHEMA).execute(&pool).await.map_err(internal)?;
        tracing::info!(url, "document store ready");
        Ok(Self { pool })
    }

    /// Closes every pooled connection. Called once on shutdown.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn internal(err: sqlx::Error) -> AppError {
    AppError::Internal(err.to_string())
}

fn row_to_record(row: SqliteRow) -> SiteRecord {
    SiteRecord {
        id: row.get("id"),
        domain: row.get("domain"),
        notes: row.get("notes"),
        path: row.get("path"),
        reason: row.get("reason"),
    }
}

#[async_trait]
impl SiteRepo for SqliteSiteRepo {
    async fn find_all(&self, collection: Collection) -> Result<Vec<SiteRecord>> {
        let sql = format!("SELECT id, domain, notes, path, reason FROM {collection} ORDER BY rowid");
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(internal)?;
        Ok(rows.into_iter().map(row_to_record).collect())
    }

    async fn find_by_domain(&self, collection: Collection, domain: &str) -> Result<Vec<SiteRecord>> {
        let sql = format!(
            "SELECT id, domain, notes, path, reason FROM {collection} WHERE domain = ? ORDER BY rowid"
        );
        let rows = sqlx::query(&sql)
            .bind(domain)
            .fetch_all(&self.pool)
            .await
            .map_err(internal)?;
        Ok(rows.into_iter().map(row_to_record).collect())
    }

    async fn insert(&self, collection: Collection, site: NewSite) -> Result<()> {
        let sql = format!(
            "INSERT INTO {collection} (id, domain, notes, path, reason) VALUES (?, ?, ?, ?, ?)"
        );
        let result = sqlx::query(&sql)
            .bind(Uuid::new_v4().simple().to_string())
            .bind(&site.domain)
            .bind(&site.notes)
            .bind(&site.path)
            .bind(&site.reason)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(()),
            // Only the reports table carries a UNIQUE(domain) constraint.
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(AppError::DuplicateReport(site.domain))
            }
            Err(e) => Err(internal(e)),
        }
    }

    async fn update_by_domain(&self, collection: Collection, domain: &str, site: NewSite) -> Result<()> {
        let sql = format!(
            "UPDATE {collection} SET domain = ?, notes = ?, path = ?, reason = ? \
             WHERE rowid = (SELECT rowid FROM {collection} WHERE domain = ? ORDER BY rowid LIMIT 1)"
        );
        let result = sqlx::query(&sql)
            .bind(&site.domain)
            .bind(&site.notes)
            .bind(&site.path)
            .bind(&site.reason)
            .bind(domain)
            .execute(&self.pool)
            .await;

        match result {
            Ok(done) => {
                tracing::debug!(%collection, domain, rows = done.rows_affected(), "update by domain");
                Ok(())
            }
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(AppError::DuplicateReport(site.domain))
            }
            Err(e) => Err(internal(e)),
        }
    }

    async fn delete_by_domain(&self, collection: Collection, domain: &str) -> Result<()> {
        let sql = format!(
            "DELETE FROM {collection} \
             WHERE rowid = (SELECT rowid FROM {collection} WHERE domain = ? ORDER BY rowid LIMIT 1)"
        );
        let done = sqlx::query(&sql)
            .bind(domain)
            .execute(&self.pool)
            .await
            .map_err(internal)?;
        tracing::debug!(%collection, domain, rows = done.rows_affected(), "delete by domain");
        Ok(())
    }

    async fn count(&self, collection: Collection) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM {collection}");
        let n: i64 = sqlx::query_scalar(&sql)
            .fetch_one(&self.pool)
            .await
            .map_err(internal)?;
        Ok(n as u64)
    }
}
