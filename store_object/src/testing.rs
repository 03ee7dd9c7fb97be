//! In-memory collaborators for exercising the mapping pipeline without a
//! database, plus a small set of hand-written models.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use type_mapping::PostgresValue;

use crate::errors::{ModelError, Result};
use crate::executor::{BufferedRows, Executor, Row, RowIterator, Statement};
use crate::schema::{SchemaCatalog, TableDescription};

/// Schema catalog over fixed table descriptions
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    tables: HashMap<String, TableDescription>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, table: TableDescription) -> Self {
        self.tables.insert(table.name.clone(), table);
        self
    }
}

#[async_trait]
impl SchemaCatalog for MemoryCatalog {
    async fn describe_table(&self, name: &str) -> Result<Option<TableDescription>> {
        Ok(self.tables.get(name).cloned())
    }
}

type Responder = Box<dyn Fn(&Statement) -> Option<Vec<Row>> + Send + Sync>;

/// Executor that records every statement and answers from scripted rules
///
/// Rules are tried in registration order; a statement no rule answers gets
/// an empty result.
#[derive(Default)]
pub struct RecordingExecutor {
    responders: Vec<Responder>,
    statements: Mutex<Vec<Statement>>,
    streaming: bool,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond<F>(mut self, responder: F) -> Self
    where
        F: Fn(&Statement) -> Option<Vec<Row>> + Send + Sync + 'static,
    {
        self.responders.push(Box::new(responder));
        self
    }

    /// Answer every statement whose SQL contains `fragment` with `rows`
    pub fn respond_to(self, fragment: &str, rows: Vec<Row>) -> Self {
        let fragment = fragment.to_string();
        self.respond(move |statement| statement.sql.contains(&fragment).then(|| rows.clone()))
    }

    /// Serve SELECTs from `table` out of `rows`, honouring LIMIT/OFFSET and
    /// answering COUNT(*) with the row count
    pub fn table(self, table: &str, rows: Vec<Row>) -> Self {
        let from = format!("FROM \"{}\"", table);
        self.respond(move |statement| {
            if !statement.sql.starts_with("SELECT") || !statement.sql.contains(&from) {
                return None;
            }
            if statement.sql.starts_with("SELECT COUNT(*)") {
                return Some(vec![Row::new().with("count", rows.len() as i64)]);
            }
            let offset = clause_value(&statement.sql, "OFFSET").unwrap_or(0);
            let limit = clause_value(&statement.sql, "LIMIT").unwrap_or(rows.len());
            Some(rows.iter().skip(offset).take(limit).cloned().collect())
        })
    }

    /// Return results through an iterator that does not know its length
    pub fn streaming(mut self) -> Self {
        self.streaming = true;
        self
    }

    pub fn statements(&self) -> Vec<Statement> {
        self.statements
            .lock()
            .map(|statements| statements.clone())
            .unwrap_or_default()
    }

    pub fn sql(&self) -> Vec<String> {
        self.statements()
            .into_iter()
            .map(|statement| statement.sql)
            .collect()
    }
}

#[async_trait]
impl Executor for RecordingExecutor {
    async fn execute(&self, statement: &Statement) -> Result<Box<dyn RowIterator>> {
        self.statements
            .lock()
            .map_err(|_| ModelError::lock_poisoned("statement log"))?
            .push(statement.clone());

        let rows = self
            .responders
            .iter()
            .find_map(|responder| responder(statement))
            .unwrap_or_default();

        if self.streaming {
            Ok(Box::new(StreamingRows::new(rows)))
        } else {
            Ok(Box::new(BufferedRows::new(rows)))
        }
    }
}

fn clause_value(sql: &str, keyword: &str) -> Option<usize> {
    let mut words = sql.split_whitespace();
    words.find(|word| *word == keyword)?;
    words.next()?.parse().ok()
}

/// Forward-only rows with no known length, like a driver cursor
pub struct StreamingRows {
    rows: std::vec::IntoIter<Row>,
    current: Option<Row>,
}

impl StreamingRows {
    pub fn new(rows: Vec<Row>) -> Self {
        Self {
            rows: rows.into_iter(),
            current: None,
        }
    }
}

impl RowIterator for StreamingRows {
    fn next_row(&mut self) -> Option<Row> {
        self.current = self.rows.next();
        self.current.clone()
    }

    fn current(&self) -> Option<&Row> {
        self.current.as_ref()
    }
}

/// Build a row from column/value pairs
pub fn row<I, V>(columns: I) -> Row
where
    I: IntoIterator<Item = (&'static str, V)>,
    V: Into<PostgresValue>,
{
    columns
        .into_iter()
        .fold(Row::new(), |row, (name, value)| row.with(name, value))
}

pub mod models {
    use std::sync::OnceLock;

    use chrono::{DateTime, Utc};

    use crate::metadata::Annotation;
    use crate::model::{FieldAccessors, Model, UnmappedProperties};
    use crate::model_field;
    use crate::tracking::ChangeTracker;

    /// Change-tracked user on one table, with roles through a link table
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct User {
        pub id: Option<i64>,
        pub forename: String,
        pub surname: String,
        pub email: String,
        pub created_at: Option<DateTime<Utc>>,
        pub unmapped: UnmappedProperties,
        pub tracker: ChangeTracker,
    }

    impl Model for User {
        const MODEL_NAME: &'static str = "User";

        fn annotations() -> Vec<Annotation> {
            vec![
                Annotation::target(["moduledev_user"]),
                Annotation::field("id", "integer"),
                Annotation::field("forename", "string"),
                Annotation::field("surname", "string"),
                Annotation::field("email", "string"),
                Annotation::field("created_at", "datetime"),
                Annotation::relationship([
                    ("name", "Roles"),
                    ("model", "Role"),
                    ("type", "manyToMany"),
                    ("mappedKey", "id"),
                    ("mappedBy", "user_id"),
                    ("foreignKey", "id"),
                    ("foreignBy", "role_id"),
                    ("referencedBy", "moduledev_user_role"),
                    ("referencedOrder", "sort"),
                ]),
                Annotation::relationship([
                    ("name", "Addresses"),
                    ("model", "Address"),
                    ("type", "toMany"),
                    ("mappedKey", "id"),
                    ("mappedBy", "user_id"),
                ]),
            ]
        }

        fn accessors() -> &'static FieldAccessors<Self> {
            static ACCESSORS: OnceLock<FieldAccessors<User>> = OnceLock::new();
            ACCESSORS.get_or_init(|| {
                FieldAccessors::new(vec![
                    model_field!(User, id),
                    model_field!(User, forename),
                    model_field!(User, surname),
                    model_field!(User, email),
                    model_field!(User, created_at),
                ])
            })
        }

        fn unmapped(&self) -> &UnmappedProperties {
            &self.unmapped
        }

        fn unmapped_mut(&mut self) -> &mut UnmappedProperties {
            &mut self.unmapped
        }

        fn change_tracker(&self) -> Option<&ChangeTracker> {
            Some(&self.tracker)
        }

        fn change_tracker_mut(&mut self) -> Option<&mut ChangeTracker> {
            Some(&mut self.tracker)
        }
    }

    /// Untracked customer spread over `customer` and the dependent `user` table
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Customer {
        pub id: Option<i64>,
        pub discount: Option<f64>,
        pub forename: String,
        pub unmapped: UnmappedProperties,
    }

    impl Model for Customer {
        const MODEL_NAME: &'static str = "Customer";

        fn annotations() -> Vec<Annotation> {
            vec![
                Annotation::target(["customer", "user"]),
                Annotation::field("forename", "string"),
            ]
        }

        fn accessors() -> &'static FieldAccessors<Self> {
            static ACCESSORS: OnceLock<FieldAccessors<Customer>> = OnceLock::new();
            ACCESSORS.get_or_init(|| {
                FieldAccessors::new(vec![
                    model_field!(Customer, id),
                    model_field!(Customer, discount),
                    model_field!(Customer, forename),
                ])
            })
        }

        fn unmapped(&self) -> &UnmappedProperties {
            &self.unmapped
        }

        fn unmapped_mut(&mut self) -> &mut UnmappedProperties {
            &mut self.unmapped
        }
    }

    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Role {
        pub id: Option<i64>,
        pub name: String,
        pub unmapped: UnmappedProperties,
    }

    impl Model for Role {
        const MODEL_NAME: &'static str = "Role";

        fn annotations() -> Vec<Annotation> {
            vec![
                Annotation::target(["moduledev_role"]),
                Annotation::field("name", "string"),
            ]
        }

        fn accessors() -> &'static FieldAccessors<Self> {
            static ACCESSORS: OnceLock<FieldAccessors<Role>> = OnceLock::new();
            ACCESSORS.get_or_init(|| {
                FieldAccessors::new(vec![model_field!(Role, id), model_field!(Role, name)])
            })
        }

        fn unmapped(&self) -> &UnmappedProperties {
            &self.unmapped
        }

        fn unmapped_mut(&mut self) -> &mut UnmappedProperties {
            &mut self.unmapped
        }
    }

    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Address {
        pub id: Option<i64>,
        pub user_id: Option<i64>,
        pub city: String,
        pub unmapped: UnmappedProperties,
    }

    impl Model for Address {
        const MODEL_NAME: &'static str = "Address";

        fn annotations() -> Vec<Annotation> {
            vec![
                Annotation::target(["moduledev_address"]),
                Annotation::relationship([
                    ("name", "User"),
                    ("model", "User"),
                    ("type", "toOne"),
                    ("mappedKey", "user_id"),
                    ("mappedBy", "id"),
                ]),
            ]
        }

        fn accessors() -> &'static FieldAccessors<Self> {
            static ACCESSORS: OnceLock<FieldAccessors<Address>> = OnceLock::new();
            ACCESSORS.get_or_init(|| {
                FieldAccessors::new(vec![
                    model_field!(Address, id),
                    model_field!(Address, user_id),
                    model_field!(Address, city),
                ])
            })
        }

        fn unmapped(&self) -> &UnmappedProperties {
            &self.unmapped
        }

        fn unmapped_mut(&mut self) -> &mut UnmappedProperties {
            &mut self.unmapped
        }
    }
}

/// Schema for the test models
pub fn model_catalog() -> MemoryCatalog {
    MemoryCatalog::new()
        .with_table(
            TableDescription::new("moduledev_user")
                .column("id", "int8")
                .column("forename", "text")
                .column("surname", "text")
                .column("email", "text")
                .column("created_at", "timestamptz")
                .primary_key(&["id"]),
        )
        .with_table(
            TableDescription::new("customer")
                .column("id", "int8")
                .column("discount", "float8")
                .primary_key(&["id"]),
        )
        .with_table(
            TableDescription::new("user")
                .column("customer_id", "int8")
                .column("id", "int8")
                .column("forename", "text")
                .primary_key(&["customer_id"])
                .foreign_key(&["customer_id"], "customer", &["id"]),
        )
        .with_table(
            TableDescription::new("moduledev_role")
                .column("id", "int8")
                .column("name", "text")
                .primary_key(&["id"]),
        )
        .with_table(
            TableDescription::new("moduledev_address")
                .column("id", "int8")
                .column("user_id", "int8")
                .column("city", "text")
                .primary_key(&["id"]),
        )
}
