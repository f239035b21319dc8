use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{error, info};
use uuid::Uuid;

use crate::models::{ColumnDelta, ColumnRecord, NewTable, TableDelta, TableRecord};
use crate::services::schema_store::{SchemaStore, StoreError};

// Global database instance
static DB: OnceCell<Arc<DbSchema>> = OnceCell::const_new();

/// Initialize the global database connection
///
/// # Arguments
/// * `database_url` - PostgreSQL connection string
pub async fn init_db(database_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let db = DbSchema::new(database_url).await?;
    DB.set(Arc::new(db))
        .map_err(|_| "Database already initialized")?;
    Ok(())
}

/// Get the global database instance
pub fn get_db() -> Option<Arc<DbSchema>> {
    DB.get().cloned()
}

/// Database connection pool
pub struct DbSchema {
    pool: PgPool,
}

impl DbSchema {
    /// Create a new database connection pool
    pub async fn new(database_url: &str) -> Result<Self, sqlx::Error> {
        info!("Connecting to database...");

        let pool = PgPoolOptions::new()
            .max_connections(20)
            .min_connections(2)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600)) // Close idle connections after 10 minutes
            .max_lifetime(Duration::from_secs(1800)) // Recycle connections after 30 minutes
            .connect(database_url)
            .await?;

        info!("Database connection pool created successfully");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

// Translate low-level constraint failures into the store's taxonomy.
fn map_write_error(e: sqlx::Error) -> StoreError {
    if let Some(db_err) = e.as_database_error() {
        match db_err.code().as_deref() {
            // foreign_key_violation: the referenced parent row is gone
            Some("23503") => return StoreError::NotFound("Schema"),
            // unique_violation
            Some("23505") => return StoreError::Conflict(db_err.message().to_string()),
            _ => {}
        }
    }
    StoreError::Database(e)
}

#[async_trait]
impl SchemaStore for DbSchema {
    async fn is_schema_member(&self, user_id: &str, schema_id: &str) -> Result<bool, StoreError> {
        // Resolves schema -> project -> workspace -> membership in one round
        // trip. A schema that does not exist yields no row, so the EXISTS
        // collapses to false and the caller denies.
        let query_sql = r#"
            SELECT EXISTS(
                SELECT 1
                FROM schemas s
                JOIN projects p ON p.id = s.project_id
                JOIN workspace_members m ON m.workspace_id = p.workspace_id
                WHERE s.id = $1
                  AND m.user_id = $2
            ) AS is_member
        "#;

        let is_member: bool = sqlx::query_scalar(query_sql)
            .bind(schema_id)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Membership lookup failed for schema '{}': {}", schema_id, e);
                StoreError::Database(e)
            })?;

        Ok(is_member)
    }

    async fn create_table(&self, schema_id: &str, table: &NewTable) -> Result<TableRecord, StoreError> {
        let table_id = Uuid::new_v4().to_string();
        info!("Creating table '{}' in schema '{}'", table.name, schema_id);

        let query_sql = r#"
            INSERT INTO tables(id, schema_id, name, position_x, position_y, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, NOW(), NOW())
            RETURNING id, schema_id, name, position_x, position_y, created_at, updated_at;
        "#;

        let record = sqlx::query_as::<_, TableRecord>(query_sql)
            .bind(&table_id)
            .bind(schema_id)
            .bind(&table.name)
            .bind(table.position_x)
            .bind(table.position_y)
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)?;

        Ok(record)
    }

    async fn update_table(&self, table_id: &str, delta: &TableDelta) -> Result<TableRecord, StoreError> {
        info!("Updating table '{}'", table_id);

        let query_sql = r#"
            UPDATE tables
            SET name = COALESCE($2, name),
                position_x = COALESCE($3, position_x),
                position_y = COALESCE($4, position_y),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, schema_id, name, position_x, position_y, created_at, updated_at;
        "#;

        let record = sqlx::query_as::<_, TableRecord>(query_sql)
            .bind(table_id)
            .bind(delta.name.as_deref())
            .bind(delta.position_x)
            .bind(delta.position_y)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_write_error)?;

        record.ok_or(StoreError::NotFound("Table"))
    }

    async fn delete_table(&self, table_id: &str) -> Result<(), StoreError> {
        info!("Deleting table '{}'", table_id);

        // Columns go with their table.
        let query_sql = r#"
            DELETE FROM tables
            WHERE id = $1
            RETURNING id;
        "#;

        let deleted: Option<(String,)> = sqlx::query_as(query_sql)
            .bind(table_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_write_error)?;

        match deleted {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound("Table")),
        }
    }

    async fn update_column(&self, column_id: &str, delta: &ColumnDelta) -> Result<ColumnRecord, StoreError> {
        info!("Updating column '{}'", column_id);

        let query_sql = r#"
            UPDATE columns
            SET name = COALESCE($2, name),
                type = COALESCE($3, type),
                is_primary = COALESCE($4, is_primary),
                is_nullable = COALESCE($5, is_nullable),
                is_unique = COALESCE($6, is_unique),
                default_value = COALESCE($7, default_value),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, table_id, name, type, is_primary, is_nullable, is_unique, default_value, created_at, updated_at;
        "#;

        let record = sqlx::query_as::<_, ColumnRecord>(query_sql)
            .bind(column_id)
            .bind(delta.name.as_deref())
            .bind(delta.data_type.as_deref())
            .bind(delta.is_primary)
            .bind(delta.is_nullable)
            .bind(delta.is_unique)
            .bind(delta.default_value.as_deref())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_write_error)?;

        record.ok_or(StoreError::NotFound("Column"))
    }
}
