//! Infrastructure adapters for content query ports.

#![forbid(unsafe_code)]

mod content_item_storage_layout;
mod in_memory_content_catalog;
mod in_memory_content_item_store;
mod json_query_sql;
mod postgres_statement_runner;
mod sql_content_item_query_executor;

pub use content_item_storage_layout::ContentItemStorageLayout;
pub use in_memory_content_catalog::InMemoryContentCatalog;
pub use in_memory_content_item_store::InMemoryContentItemStore;
pub use json_query_sql::{JsonQuerySqlRenderer, SqlParam, SqlStatement};
pub use postgres_statement_runner::PostgresStatementRunner;
pub use sql_content_item_query_executor::{SqlContentItemQueryExecutor, SqlStatementRunner};
