use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::{Query, QueryScalar};
use sqlx::{PgPool, Postgres, Row};
use uuid::Uuid;
use vellum_core::{AppError, AppResult, ContentTypeId};
use vellum_domain::{ContentItem, DatabaseProvider};

use crate::{SqlParam, SqlStatement, SqlStatementRunner};

/// PostgreSQL-backed runner for rendered content item statements.
#[derive(Clone)]
pub struct PostgresStatementRunner {
    pool: PgPool,
}

impl PostgresStatementRunner {
    /// Creates a runner with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SqlStatementRunner for PostgresStatementRunner {
    fn provider(&self) -> DatabaseProvider {
        DatabaseProvider::Postgres
    }

    async fn fetch_content_items(&self, statement: &SqlStatement) -> AppResult<Vec<ContentItem>> {
        let rows = bind_all(sqlx::query(statement.sql.as_str()), &statement.params)
            .fetch_all(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to query content items: {error}")))?;

        rows.iter().map(content_item_from_row).collect()
    }

    async fn fetch_count(&self, statement: &SqlStatement) -> AppResult<i64> {
        bind_all_scalar(sqlx::query_scalar(statement.sql.as_str()), &statement.params)
            .fetch_one(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to count content items: {error}")))
    }
}

fn bind_all<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    params: &'q [SqlParam],
) -> Query<'q, Postgres, PgArguments> {
    for param in params {
        query = match param {
            SqlParam::Text(value) => query.bind(value.as_str()),
            SqlParam::Uuid(value) => query.bind(*value),
            SqlParam::Integer(value) => query.bind(*value),
        };
    }
    query
}

fn bind_all_scalar<'q>(
    mut query: QueryScalar<'q, Postgres, i64, PgArguments>,
    params: &'q [SqlParam],
) -> QueryScalar<'q, Postgres, i64, PgArguments> {
    for param in params {
        query = match param {
            SqlParam::Text(value) => query.bind(value.as_str()),
            SqlParam::Uuid(value) => query.bind(*value),
            SqlParam::Integer(value) => query.bind(*value),
        };
    }
    query
}

fn content_item_from_row(row: &PgRow) -> AppResult<ContentItem> {
    let decode_error =
        |error: sqlx::Error| AppError::Internal(format!("failed to decode content item row: {error}"));

    let published_content = match row.try_get::<Value, _>(7).map_err(decode_error)? {
        Value::Object(map) => map,
        Value::Null => serde_json::Map::new(),
        other => {
            return Err(AppError::Internal(format!(
                "content item payload must be a JSON object, found '{other}'"
            )));
        }
    };

    Ok(ContentItem::new(
        row.try_get::<Uuid, _>(0).map_err(decode_error)?,
        ContentTypeId::from_uuid(row.try_get::<Uuid, _>(1).map_err(decode_error)?),
        row.try_get::<DateTime<Utc>, _>(2).map_err(decode_error)?,
        row.try_get::<Option<DateTime<Utc>>, _>(3).map_err(decode_error)?,
        row.try_get::<Option<Uuid>, _>(4).map_err(decode_error)?,
        row.try_get::<Option<Uuid>, _>(5).map_err(decode_error)?,
        row.try_get::<bool, _>(6).map_err(decode_error)?,
        published_content,
    ))
}
