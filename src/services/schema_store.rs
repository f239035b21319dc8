use async_trait::async_trait;

use crate::models::{ColumnDelta, ColumnRecord, NewTable, TableDelta, TableRecord};

/// Failure modes of the relational store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("Constraint violation: {0}")]
    Conflict(String),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// The relational store the collaboration engine runs against.
///
/// Membership resolution (schema → project → workspace → members) and the
/// table/column mutations confirmed back to participants both live behind
/// this seam, so the dispatcher can be exercised without Postgres.
#[async_trait]
pub trait SchemaStore: Send + Sync {
    /// Whether the user belongs to the workspace owning the schema.
    /// A missing schema resolves to `Ok(false)`, never to an error.
    async fn is_schema_member(&self, user_id: &str, schema_id: &str) -> Result<bool, StoreError>;

    async fn create_table(&self, schema_id: &str, table: &NewTable) -> Result<TableRecord, StoreError>;

    async fn update_table(&self, table_id: &str, delta: &TableDelta) -> Result<TableRecord, StoreError>;

    async fn delete_table(&self, table_id: &str) -> Result<(), StoreError>;

    async fn update_column(&self, column_id: &str, delta: &ColumnDelta) -> Result<ColumnRecord, StoreError>;
}
