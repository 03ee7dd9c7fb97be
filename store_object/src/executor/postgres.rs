//! PostgreSQL executor over sqlx
//!
//! Binds [`PostgresValue`] parameters and decodes result columns by their
//! driver type name.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{Column, PgPool, Postgres, Row as _, TypeInfo};
use type_mapping::{pg_type_to_field_type, CoercionError, FieldType, PostgresValue};
use uuid::Uuid;

use crate::errors::{ModelError, Result};
use crate::executor::{BufferedRows, Executor, Row, RowIterator, Statement};

#[derive(Debug, Clone)]
pub struct PgExecutor {
    pool: PgPool,
}

impl PgExecutor {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Executor for PgExecutor {
    async fn execute(&self, statement: &Statement) -> Result<Box<dyn RowIterator>> {
        trace_log!(
            "[EXECUTE] {} ({} params)",
            statement.sql,
            statement.params.len()
        );

        let mut query = sqlx::query(&statement.sql);
        for value in &statement.params {
            query = bind_value(query, value)?;
        }

        let rows = query.fetch_all(&self.pool).await?;
        let rows = rows.iter().map(decode_row).collect::<Result<Vec<_>>>()?;

        Ok(Box::new(BufferedRows::new(rows)))
    }
}

fn bind_value<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: &PostgresValue,
) -> Result<Query<'q, Postgres, PgArguments>> {
    let query = match value {
        PostgresValue::Text(v) => query.bind(v.clone()),
        PostgresValue::Integer(v) => query.bind(*v),
        PostgresValue::BigInt(v) => query.bind(*v),
        PostgresValue::SmallInt(v) => query.bind(*v),
        PostgresValue::Float(v) => query.bind(*v),
        PostgresValue::Boolean(v) => query.bind(*v),
        PostgresValue::Uuid(v) => query.bind(*v),
        PostgresValue::Timestamp(v) => query.bind(*v),
        PostgresValue::Date(v) => query.bind(*v),
        PostgresValue::Time(v) => query.bind(*v),
        PostgresValue::Decimal(v) => {
            let decimal: rust_decimal::Decimal = v
                .parse()
                .map_err(|_| CoercionError::InvalidNumber(v.clone()))?;
            query.bind(decimal)
        }
        PostgresValue::Json(v) => query.bind(sqlx::types::Json(v.clone())),
        PostgresValue::Bytes(v) => query.bind(v.clone()),
        compound @ (PostgresValue::Array(_) | PostgresValue::Record(_)) => {
            query.bind(sqlx::types::Json(compound.to_json()))
        }
        PostgresValue::Null => query.bind(Option::<String>::None),
    };
    Ok(query)
}

fn decode_row(row: &PgRow) -> Result<Row> {
    let mut decoded = Row::new();
    for column in row.columns() {
        let value = decode_column(row, column.ordinal(), column.type_info().name())?;
        decoded.push(column.name(), value);
    }
    Ok(decoded)
}

fn decode_column(row: &PgRow, index: usize, type_name: &str) -> Result<PostgresValue> {
    let value = match type_name {
        "BOOL" => row.try_get::<Option<bool>, _>(index)?.map(PostgresValue::Boolean),
        "INT2" => row.try_get::<Option<i16>, _>(index)?.map(PostgresValue::SmallInt),
        "INT4" => row.try_get::<Option<i32>, _>(index)?.map(PostgresValue::Integer),
        "INT8" => row.try_get::<Option<i64>, _>(index)?.map(PostgresValue::BigInt),
        "FLOAT4" => row
            .try_get::<Option<f32>, _>(index)?
            .map(|v| PostgresValue::Float(f64::from(v))),
        "FLOAT8" => row.try_get::<Option<f64>, _>(index)?.map(PostgresValue::Float),
        "NUMERIC" => row
            .try_get::<Option<rust_decimal::Decimal>, _>(index)?
            .map(|v| PostgresValue::Decimal(v.to_string())),
        "UUID" => row.try_get::<Option<Uuid>, _>(index)?.map(PostgresValue::Uuid),
        "TIMESTAMPTZ" => row
            .try_get::<Option<DateTime<Utc>>, _>(index)?
            .map(PostgresValue::Timestamp),
        "TIMESTAMP" => row
            .try_get::<Option<NaiveDateTime>, _>(index)?
            .map(|v| PostgresValue::Timestamp(v.and_utc())),
        "DATE" => row.try_get::<Option<NaiveDate>, _>(index)?.map(PostgresValue::Date),
        "TIME" => row.try_get::<Option<NaiveTime>, _>(index)?.map(PostgresValue::Time),
        "JSON" | "JSONB" => row
            .try_get::<Option<serde_json::Value>, _>(index)?
            .map(PostgresValue::Json),
        "BYTEA" => row.try_get::<Option<Vec<u8>>, _>(index)?.map(PostgresValue::Bytes),
        other => match pg_type_to_field_type(other) {
            Some(FieldType::String) | None => row
                .try_get::<Option<String>, _>(index)
                .map_err(ModelError::from)?
                .map(PostgresValue::Text),
            Some(field_type) => {
                return Err(ModelError::Coercion(CoercionError::UnknownFieldType(format!(
                    "{} ({})",
                    other, field_type
                ))))
            }
        },
    };

    Ok(value.unwrap_or(PostgresValue::Null))
}
