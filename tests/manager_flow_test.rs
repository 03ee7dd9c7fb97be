//! End-to-end manager flows against the in-memory collaborators
//!
//! A customer spread over `customer` and `user` is queried, hydrated,
//! changed and written back; lifecycle listeners and cast stages take part
//! along the way.

use std::sync::{Arc, Mutex};

use modelhaus::prelude::*;
use store_object::schema::TableDescription;
use store_object::testing::{row, MemoryCatalog, RecordingExecutor};

#[derive(Debug, Clone, Default, Model)]
#[target("customer", "user")]
pub struct Customer {
    #[field(integer)]
    pub id: Option<i64>,

    #[field(float)]
    pub discount: Option<f64>,

    #[field(string)]
    pub forename: String,

    #[field(boolean)]
    pub newsletter: bool,

    #[unmapped]
    pub unmapped: UnmappedProperties,

    #[change_tracking]
    pub tracker: ChangeTracker,
}

fn catalog() -> MemoryCatalog {
    MemoryCatalog::new()
        .with_table(
            TableDescription::new("customer")
                .column("id", "int8")
                .column("discount", "float8")
                .primary_key(&["id"]),
        )
        .with_table(
            TableDescription::new("user")
                .column("customer_id", "int8")
                .column("forename", "text")
                .column("newsletter", "bool")
                .primary_key(&["customer_id"])
                .foreign_key(&["customer_id"], "customer", &["id"]),
        )
        .with_table(
            TableDescription::new("archived_customer")
                .column("id", "int8")
                .column("discount", "float8")
                .column("forename", "text")
                .column("newsletter", "bool")
                .primary_key(&["id"]),
        )
}

fn customer_rows() -> Vec<store_object::Row> {
    vec![
        row([
            ("id", PostgresValue::BigInt(1)),
            ("discount", PostgresValue::Float(0.1)),
            ("customer_id", PostgresValue::BigInt(1)),
            ("forename", PostgresValue::from("Ada")),
            ("newsletter", PostgresValue::Null),
        ]),
        row([
            ("id", PostgresValue::BigInt(2)),
            ("discount", PostgresValue::from("0.25")),
            ("customer_id", PostgresValue::BigInt(2)),
            ("forename", PostgresValue::from("Grace")),
            ("newsletter", PostgresValue::Boolean(true)),
        ]),
    ]
}

fn manager_with(executor: RecordingExecutor, signals: SignalManager, casts: CastPipeline) -> (ModelManager, Arc<RecordingExecutor>) {
    let executor = Arc::new(executor);
    let manager = ModelManager::new(Arc::new(catalog()), executor.clone())
        .with_signals(signals)
        .with_casts(casts);
    (manager, executor)
}

#[tokio::test]
async fn test_hierarchy_is_queried_with_one_join() {
    let (manager, executor) = manager_with(
        RecordingExecutor::new().table("customer", customer_rows()),
        SignalManager::new(),
        CastPipeline::new(),
    );

    let criteria = Criteria::for_model::<Customer>()
        .unwrap()
        .with_where(QueryFilter::gt("discount", 0.05))
        .unwrap()
        .with_order("forename DESC")
        .unwrap();
    let customers: Vec<Customer> = manager.find_all::<Customer>(criteria).await.unwrap().try_collect().unwrap();

    let statements = executor.statements();
    assert_eq!(
        statements[0].sql,
        "SELECT \"t0\".\"id\", \"t0\".\"discount\", \"t1\".\"customer_id\", \"t1\".\"forename\", \"t1\".\"newsletter\" \
         FROM \"customer\" AS \"t0\" \
         LEFT JOIN \"user\" AS \"t1\" ON \"t1\".\"customer_id\" = \"t0\".\"id\" \
         WHERE \"t0\".\"discount\" > $1 \
         ORDER BY \"t1\".\"forename\" DESC"
    );
    assert_eq!(statements[0].params, vec![PostgresValue::Float(0.05)]);

    assert_eq!(customers.len(), 2);
    // Null boolean coerces to false; text floats are parsed
    assert!(!customers[0].newsletter);
    assert_eq!(customers[1].discount, Some(0.25));
    assert!(customers[1].newsletter);
    // Join columns without a declared field stay reachable
    assert_eq!(
        customers[0].unmapped.get("customer_id"),
        Some(&PostgresValue::BigInt(1))
    );
}

#[tokio::test]
async fn test_changed_customer_updates_both_tables() {
    let (manager, executor) = manager_with(
        RecordingExecutor::new().table("customer", customer_rows()),
        SignalManager::new(),
        CastPipeline::new(),
    );

    let criteria = Criteria::for_model::<Customer>()
        .unwrap()
        .with_where(QueryFilter::eq("id", 2i64))
        .unwrap();
    let mut customer = manager.find_one::<Customer>(criteria).await.unwrap().unwrap();
    customer.forename = "Grace B.".to_string();

    let customer = Arc::new(tokio::sync::Mutex::new(customer));
    assert!(manager.persist(&customer).await.unwrap());
    assert_eq!(manager.write().await.unwrap(), 1);

    let sql = executor.sql();
    assert_eq!(
        &sql[1..],
        &[
            "UPDATE \"customer\" SET \"discount\" = $1 WHERE \"id\" = $2".to_string(),
            "UPDATE \"user\" SET \"forename\" = $1, \"newsletter\" = $2 WHERE \"customer_id\" = $3".to_string(),
        ]
    );
    assert!(!customer.lock().await.is_changed(None));

    // A second write finds nothing pending
    assert_eq!(manager.write().await.unwrap(), 0);
}

#[tokio::test]
async fn test_new_customer_gets_generated_keys() {
    let executor = RecordingExecutor::new()
        .respond_to("INSERT INTO \"customer\"", vec![row([("id", 30i64)])])
        .respond_to("INSERT INTO \"user\"", vec![row([("customer_id", 30i64)])]);
    let (manager, executor) = manager_with(executor, SignalManager::new(), CastPipeline::new());

    let customer = Arc::new(tokio::sync::Mutex::new(Customer {
        forename: "Katherine".to_string(),
        ..Customer::default()
    }));
    manager.persist(&customer).await.unwrap();
    manager.write().await.unwrap();

    assert_eq!(customer.lock().await.id, Some(30));
    assert_eq!(
        executor.sql(),
        vec![
            "INSERT INTO \"customer\" DEFAULT VALUES RETURNING \"id\"",
            "INSERT INTO \"user\" (\"customer_id\", \"forename\", \"newsletter\") VALUES ($1, $2, $3) RETURNING \"customer_id\"",
        ]
    );
}

#[tokio::test]
async fn test_listeners_take_part_in_every_stage() {
    let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let signals = SignalManager::new();

    // Point the model at a single archive table
    signals.add_callback(EventType::PrepareModelMetadata, |event| {
        event.data = vec![(
            "target".to_string(),
            PostgresValue::Array(vec![PostgresValue::from("archived_customer")]),
        )];
        Ok(HookOutcome::Pass)
    });
    // Legacy rows spell the name column differently
    signals.add_callback(EventType::PreHydrate, |event| {
        for (column, _) in event.data.iter_mut() {
            if column == "first_name" {
                *column = "forename".to_string();
            }
        }
        Ok(HookOutcome::Pass)
    });
    for event_type in [EventType::PrePersist, EventType::PreWrite, EventType::PostWrite] {
        let seen = seen.clone();
        signals.add_callback(event_type, move |event| {
            if let Ok(mut seen) = seen.lock() {
                seen.push(event.event_type.name().to_string());
            }
            Ok(HookOutcome::Pass)
        });
    }

    let casts = CastPipeline::new();
    casts.add_stage(|request| {
        if request.field == "forename" {
            let trimmed = request.value.as_str().unwrap_or_default().trim().to_string();
            return Ok(CastOutcome::Claim(PostgresValue::Text(trimmed)));
        }
        Ok(CastOutcome::Pass)
    });

    let rows = vec![row([
        ("id", PostgresValue::BigInt(8)),
        ("discount", PostgresValue::Null),
        ("first_name", PostgresValue::from("  Hedy ")),
        ("newsletter", PostgresValue::Boolean(false)),
    ])];
    let (manager, executor) = manager_with(
        RecordingExecutor::new().table("archived_customer", rows),
        signals,
        casts,
    );

    let metadata = manager.metadata::<Customer>().await.unwrap();
    assert_eq!(metadata.target, vec!["archived_customer"]);

    let mut customer = manager
        .find_one::<Customer>(Criteria::for_model::<Customer>().unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(customer.forename, "Hedy");
    assert!(customer.unmapped.is_empty());

    customer.newsletter = true;
    let customer = Arc::new(tokio::sync::Mutex::new(customer));
    manager.persist(&customer).await.unwrap();
    manager.write().await.unwrap();

    assert!(executor.sql()[1].starts_with("UPDATE \"archived_customer\""));
    assert_eq!(
        *seen.lock().unwrap(),
        vec!["prePersist", "preWrite", "postWrite"]
    );
}

#[tokio::test]
async fn test_halted_write_keeps_the_object_pending() {
    let signals = SignalManager::new();
    signals.add_callback(EventType::PreWrite, |event| {
        if event.model == "Customer" {
            return Ok(HookOutcome::halt("customers are read only"));
        }
        Ok(HookOutcome::Pass)
    });
    let (manager, executor) = manager_with(RecordingExecutor::new(), signals, CastPipeline::new());

    let customer = Arc::new(tokio::sync::Mutex::new(Customer::default()));
    manager.persist(&customer).await.unwrap();

    let error = manager.write().await.unwrap_err();
    assert!(matches!(error, ModelError::ValidationFailed { .. }));
    assert_eq!(manager.pending_len().await, 1);
    assert!(executor.statements().is_empty());
}

#[tokio::test]
async fn test_paginated_customers_count_the_whole_window() {
    let rows: Vec<store_object::Row> = (1..=7)
        .map(|id| {
            row([
                ("id", PostgresValue::BigInt(id)),
                ("forename", PostgresValue::Text(format!("Customer {}", id))),
            ])
        })
        .collect();
    let (manager, _) = manager_with(
        RecordingExecutor::new().table("customer", rows),
        SignalManager::new(),
        CastPipeline::new(),
    );

    let mut pages = manager
        .find_paginated::<Customer>(Criteria::for_model::<Customer>().unwrap(), 3)
        .unwrap();
    assert_eq!(pages.count().await.unwrap(), 7);

    let mut names = Vec::new();
    while let Some(customer) = pages.next().await {
        names.push(customer.unwrap().forename);
    }
    assert_eq!(names.len(), 7);
    assert_eq!(names[6], "Customer 7");
    assert_eq!(pages.page_fetches(), 3);
}
