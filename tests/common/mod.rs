#![allow(dead_code)]

use axum::{Json, Router, extract::State, routing::post};
use gridcrate::{
    ColumnDescriptor, ColumnRegistry, DataTable, DataTableRequest, EntityQuery, GridError,
    RelationLink, ResultEnvelope,
};
use sea_orm::EntityTrait;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, Database, DatabaseConnection, DbErr, Schema};
use sea_orm_migration::prelude::{MigrationName, MigrationTrait, MigratorTrait, SchemaManager, Table};
use serde_json::{Value, json};

pub mod department_entity;
pub mod person_entity;

pub async fn setup_test_db() -> Result<DatabaseConnection, DbErr> {
    // Several tests share the process; only the first install wins
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let db = Database::connect("sqlite::memory:").await?;

    // Run migrations
    Migrator::up(&db, None).await?;

    Ok(db)
}

pub fn setup_test_app(db: DatabaseConnection) -> Router {
    let api = Router::new()
        .route("/people/grid", post(people_grid))
        .route("/people/grid/entity", post(people_entity_grid))
        .route("/broken/grid", post(broken_grid))
        .with_state(db);

    Router::new().nest("/api/v1", api)
}

async fn people_grid(
    State(db): State<DatabaseConnection>,
    Json(request): Json<DataTableRequest>,
) -> Result<ResultEnvelope, GridError> {
    DataTable::new(&request, name_age_columns())
        .query_result(&db, "SELECT * FROM people")
        .await
}

async fn people_entity_grid(
    State(db): State<DatabaseConnection>,
    Json(request): Json<DataTableRequest>,
) -> Result<ResultEnvelope, GridError> {
    let columns = ColumnRegistry::new(vec![
        ColumnDescriptor::new("name", "name"),
        ColumnDescriptor::new("age", "age"),
        ColumnDescriptor::new("department", "name").relation("department"),
    ])?;
    let query = EntityQuery::new(person_entity::Entity::find(), &db).relation(RelationLink::new(
        "department",
        "departments",
        "department_id",
        "id",
    ));
    DataTable::new(&request, columns).builder_result(query).await
}

async fn broken_grid(
    State(db): State<DatabaseConnection>,
    Json(request): Json<DataTableRequest>,
) -> Result<ResultEnvelope, GridError> {
    DataTable::new(&request, name_age_columns())
        .query_result(&db, "SELECT * FROM no_such_table")
        .await
}

/// Departments 1 (Sales) and 2 (Engineering) plus the given people.
pub async fn seed(db: &DatabaseConnection, people: &[(&str, i32, Option<i32>)]) -> Result<(), DbErr> {
    for (id, name, code) in [(1, "Sales", "S1"), (2, "Engineering", "E1")] {
        department_entity::ActiveModel {
            id: Set(id),
            name: Set(name.to_string()),
            code: Set(code.to_string()),
        }
        .insert(db)
        .await?;
    }

    for (name, age, department_id) in people {
        person_entity::ActiveModel {
            name: Set((*name).to_string()),
            age: Set(*age),
            department_id: Set(*department_id),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }
    Ok(())
}

/// The three people used by the documented ordering example.
pub async fn seed_example(db: &DatabaseConnection) -> Result<(), DbErr> {
    seed(db, &[("Bob", 40, Some(1)), ("Ann", 25, Some(2)), ("Cy", 30, None)]).await
}

/// Twenty people, `Person 01`..`Person 20`, aged 1..20.
pub async fn seed_twenty(db: &DatabaseConnection) -> Result<(), DbErr> {
    let names: Vec<String> = (1..=20).map(|i| format!("Person {i:02}")).collect();
    let people: Vec<(&str, i32, Option<i32>)> = names
        .iter()
        .zip(1..)
        .map(|(name, age)| (name.as_str(), age, Some(if age % 2 == 0 { 1 } else { 2 })))
        .collect();
    seed(db, &people).await
}

pub fn name_age_columns() -> ColumnRegistry {
    ColumnRegistry::new(vec![
        ColumnDescriptor::new("name", "name"),
        ColumnDescriptor::new("age", "age"),
    ])
    .expect("valid registry")
}

/// A request over `name` and `age`, both searchable and orderable.
pub fn grid_request(start: i64, length: i64, global: &str, order: Value) -> DataTableRequest {
    serde_json::from_value(json!({
        "draw": 1,
        "start": start,
        "length": length,
        "search": { "value": global },
        "order": order,
        "columns": [
            { "data": "name", "searchable": "true", "orderable": "true", "search": { "value": "" } },
            { "data": "age", "searchable": "true", "orderable": "true", "search": { "value": "" } }
        ]
    }))
    .expect("valid request")
}

pub fn names(envelope: &ResultEnvelope) -> Vec<String> {
    envelope
        .data
        .iter()
        .map(|row| {
            row.get("name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        })
        .collect()
}

pub fn ages(envelope: &ResultEnvelope) -> Vec<i64> {
    envelope
        .data
        .iter()
        .filter_map(|row| row.get("age").and_then(Value::as_i64))
        .collect()
}

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(CreateGridTables)]
    }
}

pub struct CreateGridTables;

impl MigrationName for CreateGridTables {
    fn name(&self) -> &'static str {
        "m20250101_000001_create_grid_tables"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for CreateGridTables {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let schema = Schema::new(manager.get_database_backend());

        manager
            .create_table(schema.create_table_from_entity(department_entity::Entity))
            .await?;
        manager
            .create_table(schema.create_table_from_entity(person_entity::Entity))
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(person_entity::Entity).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(department_entity::Entity).to_owned())
            .await?;
        Ok(())
    }
}
