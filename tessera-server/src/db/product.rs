//! Product repository
//!
//! PostgreSQL implementation of the registry's record store. Inserts never
//! overwrite: a `unique_id` conflict leaves the existing row untouched and is
//! reported as a duplicate so the registry can draw a fresh identifier.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use tessera_core::{NewProduct, ProductRecord, RecordStore, Result, TesseraError};

/// Product row from database
#[derive(Debug, Clone, FromRow)]
struct ProductRow {
    id: i64,
    unique_id: String,
    product_name: String,
    company_name: String,
    created_at: DateTime<Utc>,
    master_pattern_ref: String,
    pattern_digest: String,
}

impl From<ProductRow> for ProductRecord {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            unique_id: row.unique_id,
            product_name: row.product_name,
            company_name: row.company_name,
            created_at: row.created_at,
            master_pattern_ref: row.master_pattern_ref,
            pattern_digest: row.pattern_digest,
        }
    }
}

fn storage_error(context: &str, e: sqlx::Error) -> TesseraError {
    TesseraError::Storage(format!("{}: {}", context, e))
}

/// PostgreSQL-backed product store
#[derive(Clone)]
pub struct PostgresProductStore {
    pool: PgPool,
}

impl PostgresProductStore {
    /// Connect to the database and apply pending migrations.
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .connect(database_url)
            .await
            .map_err(|e| storage_error("Database connection failed", e))?;

        tracing::info!(max_connections, "Connected to PostgreSQL database");

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Run database migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| TesseraError::Storage(format!("Database migration failed: {}", e)))?;

        tracing::info!("Database migrations completed");
        Ok(())
    }
}

#[async_trait]
impl RecordStore for PostgresProductStore {
    async fn insert_if_absent(&self, product: NewProduct) -> Result<ProductRecord> {
        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            INSERT INTO products (
                unique_id, product_name, company_name, master_pattern_ref, pattern_digest
            )
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (unique_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(&product.unique_id)
        .bind(&product.product_name)
        .bind(&product.company_name)
        .bind(&product.master_pattern_ref)
        .bind(&product.pattern_digest)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("Product insert failed", e))?;

        match row {
            Some(row) => {
                tracing::debug!(unique_id = %row.unique_id, id = row.id, "Inserted product row");
                Ok(row.into())
            }
            None => Err(TesseraError::DuplicateIdentifier(product.unique_id)),
        }
    }

    async fn get(&self, unique_id: &str) -> Result<Option<ProductRecord>> {
        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT * FROM products WHERE unique_id = $1
            "#,
        )
        .bind(unique_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("Product lookup failed", e))?;

        Ok(row.map(Into::into))
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| storage_error("Database health check failed", e))?;
        Ok(())
    }
}
