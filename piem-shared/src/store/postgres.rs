/// PostgreSQL-backed document store
///
/// Each collection lives in its own table holding the document body as
/// JSONB next to the store-managed columns:
///
/// ```sql
/// CREATE TABLE categories (
///     id UUID PRIMARY KEY,
///     body JSONB NOT NULL DEFAULT '{}'::jsonb,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// Tables and the case-insensitive lookup indexes are created by the
/// migrations in `piem-shared/migrations` (see [`crate::db::migrations`]).
///
/// # Example
///
/// ```no_run
/// use piem_shared::db::pool::{create_pool, DatabaseConfig};
/// use piem_shared::store::postgres::PgDocumentStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig {
///     url: std::env::var("DATABASE_URL")?,
///     ..Default::default()
/// })
/// .await?;
///
/// let store = PgDocumentStore::new(pool);
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{debug, info};
use uuid::Uuid;

use super::{
    Collection, Document, DocumentStore, Query, SortOrder, StoreResult, StoredDocument,
};

const COLUMNS: &str = "id, body, created_at, updated_at";

/// Row shape shared by every collection table
#[derive(Debug, sqlx::FromRow)]
struct DocumentRow {
    id: Uuid,
    body: Json<Document>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<DocumentRow> for StoredDocument {
    fn from(row: DocumentRow) -> Self {
        StoredDocument {
            id: row.id,
            body: row.body.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Document store over a PostgreSQL connection pool
#[derive(Debug, Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    /// Wraps an initialized pool (migrations already applied)
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn find(&self, collection: Collection, query: &Query) -> StoreResult<Vec<StoredDocument>> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {COLUMNS} FROM {}", collection.name()));

        // Field names are bound as parameters, never interpolated.
        if let Some((field, value)) = &query.filter {
            builder
                .push(" WHERE body -> ")
                .push_bind(field.clone())
                .push(" = ")
                .push_bind(Json(value.clone()));
        }

        match query.sort {
            SortOrder::CreatedAt => {
                builder.push(" ORDER BY created_at ASC");
            }
            SortOrder::Field(field) => {
                builder
                    .push(" ORDER BY lower(body ->> ")
                    .push_bind(field)
                    .push(") ASC, created_at ASC");
            }
        }

        let rows = builder
            .build_query_as::<DocumentRow>()
            .fetch_all(&self.pool)
            .await?;

        debug!(%collection, count = rows.len(), "find");
        Ok(rows.into_iter().map(StoredDocument::from).collect())
    }

    async fn find_by_id(&self, collection: Collection, id: Uuid) -> StoreResult<Option<StoredDocument>> {
        let sql = format!("SELECT {COLUMNS} FROM {} WHERE id = $1", collection.name());

        let row = sqlx::query_as::<_, DocumentRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(StoredDocument::from))
    }

    async fn find_one_ci(
        &self,
        collection: Collection,
        field: &str,
        value: &str,
        exclude: Option<Uuid>,
    ) -> StoreResult<Option<StoredDocument>> {
        let sql = format!(
            r#"
            SELECT {COLUMNS}
            FROM {}
            WHERE lower(body ->> $1) = lower($2)
              AND ($3::uuid IS NULL OR id <> $3)
            LIMIT 1
            "#,
            collection.name()
        );

        let row = sqlx::query_as::<_, DocumentRow>(&sql)
            .bind(field)
            .bind(value)
            .bind(exclude)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(StoredDocument::from))
    }

    async fn insert(&self, collection: Collection, body: Document) -> StoreResult<StoredDocument> {
        // NOW() is fixed for the statement, so both timestamps match.
        let sql = format!(
            r#"
            INSERT INTO {} (id, body, created_at, updated_at)
            VALUES ($1, $2, NOW(), NOW())
            RETURNING {COLUMNS}
            "#,
            collection.name()
        );

        let row = sqlx::query_as::<_, DocumentRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(Json(body))
            .fetch_one(&self.pool)
            .await?;

        debug!(%collection, id = %row.id, "insert");
        Ok(row.into())
    }

    async fn update(
        &self,
        collection: Collection,
        id: Uuid,
        changes: Document,
    ) -> StoreResult<Option<StoredDocument>> {
        let sql = format!(
            r#"
            UPDATE {}
            SET body = body || $2,
                updated_at = GREATEST(clock_timestamp(), updated_at + INTERVAL '1 microsecond')
            WHERE id = $1
            RETURNING {COLUMNS}
            "#,
            collection.name()
        );

        let row = sqlx::query_as::<_, DocumentRow>(&sql)
            .bind(id)
            .bind(Json(changes))
            .fetch_optional(&self.pool)
            .await?;

        debug!(%collection, %id, found = row.is_some(), "update");
        Ok(row.map(StoredDocument::from))
    }

    async fn delete(&self, collection: Collection, id: Uuid) -> StoreResult<bool> {
        let sql = format!("DELETE FROM {} WHERE id = $1", collection.name());

        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;

        debug!(%collection, %id, "delete");
        Ok(result.rows_affected() > 0)
    }

    async fn close(&self) {
        if !self.pool.is_closed() {
            self.pool.close().await;
            info!("Database pool closed");
        }
    }
}
