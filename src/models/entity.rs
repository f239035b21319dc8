use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A diagram table as persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TableRecord {
    pub id: String,
    pub schema_id: String,
    pub name: String,
    pub position_x: f64,
    pub position_y: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A table column as persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ColumnRecord {
    pub id: String,
    pub table_id: String,
    pub name: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub data_type: String,
    pub is_primary: bool,
    pub is_nullable: bool,
    pub is_unique: bool,
    pub default_value: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for a table to be created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewTable {
    pub name: String,
    pub position_x: f64,
    pub position_y: f64,
}

/// Partial update for a table. Absent fields are left untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct TableDelta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_y: Option<f64>,
}

impl TableDelta {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.position_x.is_none() && self.position_y.is_none()
    }

    /// Project the requested fields back out of the persisted record, so a
    /// relayed delta carries the values the store confirmed rather than the
    /// values the client submitted.
    pub fn confirmed_by(&self, record: &TableRecord) -> TableDelta {
        TableDelta {
            name: self.name.as_ref().map(|_| record.name.clone()),
            position_x: self.position_x.map(|_| record.position_x),
            position_y: self.position_y.map(|_| record.position_y),
        }
    }
}

/// Partial update for a column. Absent fields are left untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDelta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_primary: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_nullable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_unique: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

impl ColumnDelta {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.data_type.is_none()
            && self.is_primary.is_none()
            && self.is_nullable.is_none()
            && self.is_unique.is_none()
            && self.default_value.is_none()
    }

    /// Same contract as [`TableDelta::confirmed_by`].
    pub fn confirmed_by(&self, record: &ColumnRecord) -> ColumnDelta {
        ColumnDelta {
            name: self.name.as_ref().map(|_| record.name.clone()),
            data_type: self.data_type.as_ref().map(|_| record.data_type.clone()),
            is_primary: self.is_primary.map(|_| record.is_primary),
            is_nullable: self.is_nullable.map(|_| record.is_nullable),
            is_unique: self.is_unique.map(|_| record.is_unique),
            default_value: self
                .default_value
                .as_ref()
                .and_then(|_| record.default_value.clone()),
        }
    }
}
