//! SQL rendering
//!
//! Renders [`QuerySpec`]s and row writes as PostgreSQL statements with
//! double-quoted identifiers and `$n` placeholders.

use type_mapping::PostgresValue;

use crate::executor::Statement;
use crate::query_builder::filter::{LogicalOperator, QueryCondition, QueryFilter, QueryOperator};
use crate::query_builder::join::JoinClause;
use crate::query_builder::ordering::OrderBy;
use crate::query_builder::spec::QuerySpec;
use crate::validation::quote_identifier;

/// Positional parameter collector
#[derive(Debug, Default)]
struct Params {
    values: Vec<PostgresValue>,
}

impl Params {
    /// Placeholder for `value`; NULL is rendered inline
    fn placeholder(&mut self, value: &PostgresValue) -> String {
        if value.is_null() {
            return "NULL".to_string();
        }
        self.values.push(value.clone());
        format!("${}", self.values.len())
    }
}

pub struct SqlGenerator;

impl SqlGenerator {
    /// Render a SELECT (or COUNT) statement
    pub fn select(spec: &QuerySpec) -> Statement {
        let mut params = Params::default();

        let projection = if spec.count {
            format!("COUNT(*) AS {}", quote_identifier("count"))
        } else {
            Self::build_projection(spec)
        };

        let mut sql = format!(
            "SELECT {} FROM {} AS {}",
            projection,
            quote_identifier(&spec.from),
            quote_identifier(&spec.alias)
        );

        let joins = Self::build_join_clause(&spec.joins);
        if !joins.is_empty() {
            sql.push(' ');
            sql.push_str(&joins);
        }

        let where_clause = Self::build_where_clause(spec.predicate.as_ref(), &mut params);
        if !where_clause.is_empty() {
            sql.push(' ');
            sql.push_str(&where_clause);
        }

        let order_clause = Self::build_order_clause(&spec.order_by);
        if !order_clause.is_empty() {
            sql.push(' ');
            sql.push_str(&order_clause);
        }

        let limit_clause = Self::build_limit_clause(spec.limit, spec.offset);
        if !limit_clause.is_empty() {
            sql.push(' ');
            sql.push_str(&limit_clause);
        }

        Statement::new(sql, params.values)
    }

    /// `INSERT INTO table (...) VALUES (...) RETURNING ...`
    ///
    /// With no values the row is created from column defaults.
    pub fn insert(table: &str, values: &[(String, PostgresValue)], returning: &[String]) -> Statement {
        let mut params = Params::default();
        let mut sql = format!("INSERT INTO {}", quote_identifier(table));

        if values.is_empty() {
            sql.push_str(" DEFAULT VALUES");
        } else {
            let columns = values
                .iter()
                .map(|(column, _)| quote_identifier(column))
                .collect::<Vec<_>>()
                .join(", ");
            let placeholders = values
                .iter()
                .map(|(_, value)| params.placeholder(value))
                .collect::<Vec<_>>()
                .join(", ");
            sql.push_str(&format!(" ({}) VALUES ({})", columns, placeholders));
        }

        if !returning.is_empty() {
            let returning = returning
                .iter()
                .map(|column| quote_identifier(column))
                .collect::<Vec<_>>()
                .join(", ");
            sql.push_str(&format!(" RETURNING {}", returning));
        }

        Statement::new(sql, params.values)
    }

    /// `UPDATE table SET ... WHERE key = ... AND ...`
    pub fn update(
        table: &str,
        values: &[(String, PostgresValue)],
        keys: &[(String, PostgresValue)],
    ) -> Statement {
        let mut params = Params::default();
        let assignments = values
            .iter()
            .map(|(column, value)| format!("{} = {}", quote_identifier(column), params.placeholder(value)))
            .collect::<Vec<_>>()
            .join(", ");
        let key_filter = Self::build_key_filter(keys, &mut params);

        Statement::new(
            format!(
                "UPDATE {} SET {} WHERE {}",
                quote_identifier(table),
                assignments,
                key_filter
            ),
            params.values,
        )
    }

    /// `SELECT COUNT(*) AS count FROM table WHERE key = ... AND ...`
    pub fn count_by_keys(table: &str, keys: &[(String, PostgresValue)]) -> Statement {
        let mut params = Params::default();
        let key_filter = Self::build_key_filter(keys, &mut params);

        Statement::new(
            format!(
                "SELECT COUNT(*) AS {} FROM {} WHERE {}",
                quote_identifier("count"),
                quote_identifier(table),
                key_filter
            ),
            params.values,
        )
    }

    /// Quote a possibly qualified column reference: `t0.id` -> `"t0"."id"`
    pub fn quote_reference(reference: &str) -> String {
        reference
            .split('.')
            .map(quote_identifier)
            .collect::<Vec<_>>()
            .join(".")
    }

    fn build_projection(spec: &QuerySpec) -> String {
        let mut columns: Vec<String> = spec
            .columns
            .iter()
            .map(|column| Self::quote_reference(&format!("{}.{}", spec.alias, column)))
            .collect();

        for join in &spec.joins {
            columns.extend(
                join.columns
                    .iter()
                    .map(|column| Self::quote_reference(&format!("{}.{}", join.table_ref(), column))),
            );
        }

        if columns.is_empty() {
            format!("{}.*", quote_identifier(&spec.alias))
        } else {
            columns.join(", ")
        }
    }

    fn build_join_clause(joins: &[JoinClause]) -> String {
        joins
            .iter()
            .map(|join| {
                let mut sql = format!("{} {}", join.join_type.to_sql(), quote_identifier(&join.table));
                if let Some(alias) = &join.alias {
                    sql.push_str(&format!(" AS {}", quote_identifier(alias)));
                }
                if !join.conditions.is_empty() {
                    let conditions = join
                        .conditions
                        .iter()
                        .map(|condition| {
                            format!(
                                "{} = {}",
                                Self::quote_reference(&condition.left_field),
                                Self::quote_reference(&condition.right_field)
                            )
                        })
                        .collect::<Vec<_>>()
                        .join(" AND ");
                    sql.push_str(&format!(" ON {}", conditions));
                }
                sql
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn build_where_clause(filter: Option<&QueryFilter>, params: &mut Params) -> String {
        match filter {
            Some(filter) => format!("WHERE {}", Self::build_condition_sql(filter, params)),
            None => String::new(),
        }
    }

    fn build_condition_sql(filter: &QueryFilter, params: &mut Params) -> String {
        match filter {
            QueryFilter::Condition(condition) => Self::build_single_condition_sql(condition, params),
            QueryFilter::Group { filters, .. } if filters.is_empty() => "1=1".to_string(),
            QueryFilter::Group { operator, filters } => {
                let operator_str = match operator {
                    LogicalOperator::And => " AND ",
                    LogicalOperator::Or => " OR ",
                };

                let group_conditions = filters
                    .iter()
                    .map(|f| Self::build_condition_sql(f, params))
                    .collect::<Vec<_>>()
                    .join(operator_str);

                format!("({})", group_conditions)
            }
        }
    }

    fn build_single_condition_sql(condition: &QueryCondition, params: &mut Params) -> String {
        let field = Self::quote_reference(&condition.field);
        let value = condition.value.as_ref().filter(|value| !value.is_null());

        let comparison = |symbol: &str, params: &mut Params| match value {
            Some(value) => format!("{} {} {}", field, symbol, params.placeholder(value)),
            None => "1=0".to_string(),
        };

        match &condition.operator {
            QueryOperator::Eq => match value {
                Some(value) => format!("{} = {}", field, params.placeholder(value)),
                None => format!("{} IS NULL", field),
            },
            QueryOperator::Ne => match value {
                Some(value) => format!("{} != {}", field, params.placeholder(value)),
                None => format!("{} IS NOT NULL", field),
            },
            QueryOperator::Gt => comparison(">", params),
            QueryOperator::Gte => comparison(">=", params),
            QueryOperator::Lt => comparison("<", params),
            QueryOperator::Lte => comparison("<=", params),
            QueryOperator::Like => comparison("LIKE", params),
            QueryOperator::ILike => comparison("ILIKE", params),
            QueryOperator::In => match value {
                Some(PostgresValue::Array(values)) if !values.is_empty() => {
                    let placeholders: Vec<String> =
                        values.iter().map(|v| params.placeholder(v)).collect();
                    format!("{} IN ({})", field, placeholders.join(", "))
                }
                _ => "1=0".to_string(), // Empty IN clause
            },
            QueryOperator::NotIn => match value {
                Some(PostgresValue::Array(values)) if !values.is_empty() => {
                    let placeholders: Vec<String> =
                        values.iter().map(|v| params.placeholder(v)).collect();
                    format!("{} NOT IN ({})", field, placeholders.join(", "))
                }
                _ => "1=1".to_string(), // Empty NOT IN clause
            },
            QueryOperator::IsNull => format!("{} IS NULL", field),
            QueryOperator::IsNotNull => format!("{} IS NOT NULL", field),
        }
    }

    fn build_key_filter(keys: &[(String, PostgresValue)], params: &mut Params) -> String {
        keys.iter()
            .map(|(column, value)| {
                if value.is_null() {
                    format!("{} IS NULL", quote_identifier(column))
                } else {
                    format!("{} = {}", quote_identifier(column), params.placeholder(value))
                }
            })
            .collect::<Vec<_>>()
            .join(" AND ")
    }

    fn build_order_clause(order_by: &[OrderBy]) -> String {
        if order_by.is_empty() {
            return String::new();
        }

        let order_parts: Vec<String> = order_by
            .iter()
            .map(|order| format!("{} {}", Self::quote_reference(&order.field), order.order.to_sql()))
            .collect();

        format!("ORDER BY {}", order_parts.join(", "))
    }

    fn build_limit_clause(limit: Option<u64>, offset: Option<u64>) -> String {
        match (limit, offset) {
            (Some(limit), Some(offset)) => format!("LIMIT {} OFFSET {}", limit, offset),
            (Some(limit), None) => format!("LIMIT {}", limit),
            _ => String::new(),
        }
    }
}
