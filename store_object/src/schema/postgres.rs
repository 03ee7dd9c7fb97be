//! PostgreSQL schema catalog
//!
//! Reads columns and key constraints of one table from `pg_catalog`,
//! scoped to a single schema.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::errors::Result;
use crate::schema::catalog::{
    ColumnDescription, ConstraintDescription, ConstraintKind, SchemaCatalog, TableDescription,
};

const COLUMNS_SQL: &str = r#"
SELECT
  a.attname::text AS column_name,
  pg_catalog.format_type(a.atttypid, a.atttypmod) AS data_type
FROM pg_catalog.pg_class c
JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
JOIN pg_catalog.pg_attribute a ON a.attrelid = c.oid
WHERE c.relkind IN ('r', 'p', 'v', 'm', 'f')
  AND a.attnum > 0
  AND NOT a.attisdropped
  AND n.nspname = $1
  AND c.relname = $2
ORDER BY a.attnum
"#;

const CONSTRAINTS_SQL: &str = r#"
SELECT
  con.conname::text AS constraint_name,
  con.contype::text AS kind,
  ARRAY(
    SELECT a.attname::text
    FROM unnest(con.conkey) WITH ORDINALITY AS k(attnum, ord)
    JOIN pg_catalog.pg_attribute a ON a.attrelid = con.conrelid AND a.attnum = k.attnum
    ORDER BY k.ord
  ) AS columns,
  ref.relname::text AS referenced_table,
  ARRAY(
    SELECT a.attname::text
    FROM unnest(con.confkey) WITH ORDINALITY AS k(attnum, ord)
    JOIN pg_catalog.pg_attribute a ON a.attrelid = con.confrelid AND a.attnum = k.attnum
    ORDER BY k.ord
  ) AS referenced_columns
FROM pg_catalog.pg_constraint con
JOIN pg_catalog.pg_class c ON c.oid = con.conrelid
JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
LEFT JOIN pg_catalog.pg_class ref ON ref.oid = con.confrelid
WHERE con.contype IN ('p', 'f', 'u')
  AND n.nspname = $1
  AND c.relname = $2
ORDER BY con.conname
"#;

#[derive(Debug, Clone)]
pub struct PgSchemaCatalog {
    pool: PgPool,
    schema: String,
}

impl PgSchemaCatalog {
    pub fn new(pool: PgPool, schema: impl Into<String>) -> Self {
        Self {
            pool,
            schema: schema.into(),
        }
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }
}

#[async_trait]
impl SchemaCatalog for PgSchemaCatalog {
    async fn describe_table(&self, name: &str) -> Result<Option<TableDescription>> {
        let rows = sqlx::query(COLUMNS_SQL)
            .bind(&self.schema)
            .bind(name)
            .fetch_all(&self.pool)
            .await?;

        if rows.is_empty() {
            return Ok(None);
        }

        let mut description = TableDescription::new(name);
        for row in rows {
            description.columns.push(ColumnDescription {
                name: row.try_get("column_name")?,
                data_type: row.try_get("data_type")?,
            });
        }

        let rows = sqlx::query(CONSTRAINTS_SQL)
            .bind(&self.schema)
            .bind(name)
            .fetch_all(&self.pool)
            .await?;

        for row in rows {
            let kind = match row.try_get::<String, _>("kind")?.as_str() {
                "p" => ConstraintKind::Primary,
                "f" => ConstraintKind::Foreign,
                _ => ConstraintKind::Unique,
            };

            description.constraints.push(ConstraintDescription {
                name: row.try_get("constraint_name")?,
                kind,
                table_name: name.to_string(),
                columns: row.try_get("columns")?,
                referenced_table_name: row.try_get("referenced_table")?,
                referenced_columns: row.try_get("referenced_columns")?,
            });
        }

        debug_log!(
            "[SCHEMA] Table: {}.{}, columns: {}, constraints: {}",
            self.schema,
            name,
            description.columns.len(),
            description.constraints.len()
        );

        Ok(Some(description))
    }
}
