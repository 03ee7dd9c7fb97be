//! Integration tests for the `Model` derive
//!
//! Checks the generated annotation list, accessor table and capability
//! wiring, then runs derived models through the manager against the
//! in-memory collaborators.

use std::sync::Arc;

use modelhaus::prelude::*;
use store_object::testing::{model_catalog, row, RecordingExecutor};

#[derive(Debug, Clone, Default, PartialEq, Model)]
#[model(name = "User")]
#[target("moduledev_user")]
#[relationship(
    name = "Roles",
    model = "Role",
    kind = "manyToMany",
    mapped_key = "id",
    mapped_by = "user_id",
    foreign_key = "id",
    foreign_by = "role_id",
    referenced_by = "moduledev_user_role",
    referenced_order = "sort"
)]
pub struct Member {
    #[field(integer)]
    pub id: Option<i64>,

    #[field(string)]
    pub forename: String,

    pub surname: String,

    #[field(string)]
    pub email: String,

    #[field(datetime)]
    pub created_at: Option<DateTime<Utc>>,

    #[unmapped]
    pub unmapped: UnmappedProperties,

    #[change_tracking]
    pub tracker: ChangeTracker,
}

#[derive(Debug, Clone, Default, PartialEq, Model)]
#[target("moduledev_role")]
pub struct Role {
    pub id: Option<i64>,
    pub name: String,

    #[unmapped]
    pub unmapped: UnmappedProperties,
}

/// No target: usable as a value object, never queried
#[derive(Debug, Clone, Default, Model)]
pub struct Settings {
    #[field(json_object)]
    pub preferences: serde_json::Value,

    #[unmapped]
    pub extra: UnmappedProperties,
}

fn manager(executor: RecordingExecutor) -> (ModelManager, Arc<RecordingExecutor>) {
    let executor = Arc::new(executor);
    let manager = ModelManager::new(Arc::new(model_catalog()), executor.clone());
    (manager, executor)
}

#[test]
fn test_generated_annotations_follow_declaration_order() {
    assert_eq!(Member::MODEL_NAME, "User");
    assert_eq!(
        Member::annotations(),
        vec![
            Annotation::target(["moduledev_user"]),
            Annotation::field("id", "integer"),
            Annotation::field("forename", "string"),
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
        ]
    );

    assert_eq!(Role::MODEL_NAME, "Role");
    assert_eq!(Role::annotations(), vec![Annotation::target(["moduledev_role"])]);
    assert!(Settings::annotations().iter().all(|annotation| !matches!(annotation, Annotation::Target(_))));
}

#[test]
fn test_every_plain_field_gets_an_accessor() {
    assert_eq!(
        Member::accessors().names(),
        vec!["id", "forename", "surname", "email", "created_at"]
    );
    assert_eq!(Settings::accessors().names(), vec!["preferences"]);
}

#[test]
fn test_accessors_read_and_write_fields() {
    let mut member = Member::default();

    member.set_field("surname", PostgresValue::from("Hopper")).unwrap();
    member.set_field("id", PostgresValue::BigInt(4)).unwrap();

    assert_eq!(member.surname, "Hopper");
    assert_eq!(member.id, Some(4));
    assert_eq!(member.get_field("id"), Some(PostgresValue::BigInt(4)));
    assert_eq!(member.get_field("created_at"), Some(PostgresValue::Null));
    assert!(matches!(
        member.property("nickname"),
        Err(ModelError::UnknownProperty { .. })
    ));
}

#[test]
fn test_change_tracking_is_opt_in() {
    let mut member = Member::default();
    assert!(member.tracks_changes());

    member.mark_clean();
    member.email = "grace@example.com".to_string();
    assert!(member.is_changed(Some("email")));
    assert!(!member.is_changed(Some("forename")));

    let role = Role::default();
    assert!(!role.tracks_changes());
    assert!(role.changes(false).is_empty());
}

#[tokio::test]
async fn test_derived_model_hydrates_through_the_manager() {
    let rows = vec![row([
        ("id", PostgresValue::BigInt(1)),
        ("forename", PostgresValue::from("Grace")),
        ("surname", PostgresValue::from("Hopper")),
        ("email", PostgresValue::from("grace@example.com")),
        ("created_at", PostgresValue::from("2024-03-01T12:00:00Z")),
        ("login_count", PostgresValue::BigInt(12)),
    ])];
    let (manager, _) = manager(RecordingExecutor::new().table("moduledev_user", rows));

    let member = manager
        .find_one::<Member>(Criteria::for_model::<Member>().unwrap())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(member.forename, "Grace");
    assert_eq!(
        member.created_at.map(|created| created.to_rfc3339()),
        Some("2024-03-01T12:00:00+00:00".to_string())
    );
    assert_eq!(
        member.unmapped.get("login_count"),
        Some(&PostgresValue::BigInt(12))
    );
    assert!(!member.is_changed(None));
}

#[tokio::test]
async fn test_derived_relationship_resolves_through_the_link_table() {
    let roles = vec![row([
        ("id", PostgresValue::BigInt(2)),
        ("name", PostgresValue::from("editor")),
    ])];
    let (manager, executor) = manager(RecordingExecutor::new().table("moduledev_role", roles));

    let member = Member {
        id: Some(9),
        ..Member::default()
    };
    let roles = manager
        .get_relationship::<Member, Role>(&member, "Roles", 0)
        .await
        .unwrap()
        .into_many()
        .unwrap();

    assert_eq!(roles.len(), 1);
    assert_eq!(roles.get(0).unwrap().unwrap().name, "editor");
    assert!(executor.sql()[0].contains("LEFT JOIN \"moduledev_user_role\""));
}

#[tokio::test]
async fn test_models_without_target_cannot_be_queried() {
    let (manager, _) = manager(RecordingExecutor::new());

    let metadata = manager.metadata::<Settings>().await.unwrap();
    assert!(!metadata.is_persistent());

    let error = manager
        .find_all::<Settings>(Criteria::for_model::<Settings>().unwrap())
        .await
        .unwrap_err();
    assert!(matches!(error, ModelError::Configuration(_)));
}
