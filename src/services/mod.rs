pub mod auth_service;
pub mod schema_store;
