//! Example: registers a `books` table, inserts, queries, updates and deletes through resource identifiers.
//!
//! Config comes from `CONFIG_PATH` (JSON provider document) when set, otherwise the built-in one.
//! Database from `DATABASE_URL` (default `sqlite://provider.db`).

use resource_provider::{
    load_from_path, load_from_str, resolve, ChangeBus, Dispatcher, Selection, SqliteConnections, SqliteSettings,
    ValueSet,
};
use serde_json::json;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const BUILTIN_CONFIG: &str = r#"{
    "authority": "com.example.books",
    "tables": [
        {
            "name": "books",
            "columns": ["title", "author"],
            "projection": { "title": "title", "author": "author", "name": "author AS name" },
            "default_projection": ["_id", "title", "author", "version"],
            "default_sort_order": "title ASC"
        }
    ]
}"#;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("resource_provider=debug".parse()?))
        .init();

    let config = match std::env::var("CONFIG_PATH") {
        Ok(path) => load_from_path(&path).await?,
        Err(_) => load_from_str(BUILTIN_CONFIG)?,
    };
    let registry = Arc::new(resolve(&config)?);

    let connections = SqliteConnections::connect(&SqliteSettings::from_env()).await?;
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS books (
            _id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT,
            author TEXT,
            version INTEGER NOT NULL DEFAULT 1
        )",
    )
    .execute(connections.writer())
    .await?;

    let bus = ChangeBus::default();
    let books = registry
        .find_table("books")
        .ok_or("books table not registered")?
        .content_uri();
    let dispatcher = Dispatcher::new(registry.clone(), connections.clone(), Arc::new(bus.clone()));
    let mut changes = bus.subscribe(books.clone());

    let mut values = ValueSet::new();
    values.insert("title".into(), json!("The Dispossessed"));
    values.insert("author".into(), json!("Le Guin"));
    let created = dispatcher.insert(&books, values).await?;
    tracing::info!(uri = %created, content_type = %dispatcher.describe_type(&created)?, "inserted");

    let mut cursor = dispatcher
        .query(&books, Some(&["_id".to_string(), "name".to_string()]), Selection::all(), None)
        .await?;
    while let Some(row) = cursor.next().await {
        println!("{}", serde_json::Value::Object(row?));
    }

    let mut patch = ValueSet::new();
    patch.insert("version".into(), json!(2));
    let id = created.last_segment_id().unwrap_or_default().to_string();
    let updated = dispatcher
        .update(&created, &patch, Selection::new("_id = ?", vec![id]))
        .await?;
    let deleted = dispatcher.delete(&created, Selection::all()).await?;
    tracing::info!(updated, deleted, "done");

    while let Some(uri) = changes.try_recv() {
        tracing::info!(uri = %uri, "changed");
    }

    connections.close().await;
    Ok(())
}
