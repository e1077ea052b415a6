//! Dispatcher contract tests against a recording connection provider.
//!
//! No database is involved: every session call is captured so the tests can
//! assert exactly which table, columns and predicates reach the storage layer.

use async_trait::async_trait;
use resource_provider::{
    resolve, ChangeNotifier, ConnectionProvider, Dispatcher, NoopNotifier, ProviderConfig, ProviderError, ResourceUri, Row,
    RowCursor, Selection, Session, TableConfig, ValueSet,
};
use serde_json::json;
use std::sync::{Arc, Mutex};

#[derive(Clone, Debug, PartialEq)]
enum Call {
    ReadHandle,
    WriteHandle,
    Select {
        table: String,
        columns: Vec<String>,
        selection: Selection,
        sort_order: Option<String>,
    },
    Insert {
        table: String,
        null_column_hack: Option<String>,
        values: ValueSet,
    },
    Update {
        table: String,
        values: ValueSet,
        selection: Selection,
    },
    Delete {
        table: String,
        selection: Selection,
    },
}

#[derive(Clone)]
struct Recorder {
    calls: Arc<Mutex<Vec<Call>>>,
    row_id: i64,
    affected: u64,
    rows: Vec<Row>,
}

impl Recorder {
    fn new() -> Self {
        Recorder {
            calls: Arc::new(Mutex::new(Vec::new())),
            row_id: 12,
            affected: 1,
            rows: Vec::new(),
        }
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ConnectionProvider for Recorder {
    type Session = Recorder;

    async fn read_handle(&self) -> Result<Recorder, ProviderError> {
        self.record(Call::ReadHandle);
        Ok(self.clone())
    }

    async fn write_handle(&self) -> Result<Recorder, ProviderError> {
        self.record(Call::WriteHandle);
        Ok(self.clone())
    }
}

#[async_trait]
impl Session for Recorder {
    async fn select(
        &self,
        table: &str,
        columns: &[String],
        selection: &Selection,
        sort_order: Option<&str>,
    ) -> Result<RowCursor, ProviderError> {
        self.record(Call::Select {
            table: table.into(),
            columns: columns.to_vec(),
            selection: selection.clone(),
            sort_order: sort_order.map(str::to_string),
        });
        Ok(RowCursor::from_rows(self.rows.clone()))
    }

    async fn insert(
        &self,
        table: &str,
        null_column_hack: Option<&str>,
        values: &ValueSet,
    ) -> Result<i64, ProviderError> {
        self.record(Call::Insert {
            table: table.into(),
            null_column_hack: null_column_hack.map(str::to_string),
            values: values.clone(),
        });
        Ok(self.row_id)
    }

    async fn update(&self, table: &str, values: &ValueSet, selection: &Selection) -> Result<u64, ProviderError> {
        self.record(Call::Update {
            table: table.into(),
            values: values.clone(),
            selection: selection.clone(),
        });
        Ok(self.affected)
    }

    async fn delete(&self, table: &str, selection: &Selection) -> Result<u64, ProviderError> {
        self.record(Call::Delete {
            table: table.into(),
            selection: selection.clone(),
        });
        Ok(self.affected)
    }
}

#[derive(Default)]
struct Notifications(Mutex<Vec<ResourceUri>>);

impl Notifications {
    fn seen(&self) -> Vec<String> {
        self.0.lock().unwrap().iter().map(ToString::to_string).collect()
    }
}

impl ChangeNotifier for Notifications {
    fn notify(&self, uri: &ResourceUri) {
        self.0.lock().unwrap().push(uri.clone());
    }
}

const AUTHORITY: &str = "com.example.books";

fn config() -> ProviderConfig {
    let mut books = TableConfig::new("books").with_columns(["title", "author"]);
    books.default_sort_order = Some("title ASC".into());
    ProviderConfig::new(AUTHORITY)
        .with_table(books)
        .with_table(TableConfig::new("authors").with_columns(["name"]))
}

fn uri(path: &str) -> ResourceUri {
    ResourceUri::parse(&format!("content://{}/{}", AUTHORITY, path)).unwrap()
}

fn setup(recorder: Recorder) -> (Dispatcher<Recorder>, Arc<Notifications>) {
    let registry = Arc::new(resolve(&config()).unwrap());
    let notes = Arc::new(Notifications::default());
    (Dispatcher::new(registry, recorder, notes.clone()), notes)
}

fn select_call(calls: &[Call]) -> (String, Vec<String>, Selection, Option<String>) {
    calls
        .iter()
        .find_map(|c| match c {
            Call::Select {
                table,
                columns,
                selection,
                sort_order,
            } => Some((table.clone(), columns.clone(), selection.clone(), sort_order.clone())),
            _ => None,
        })
        .expect("select call")
}

// ── query ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn query_unknown_uri_makes_no_provider_call() {
    let recorder = Recorder::new();
    let (dispatcher, _) = setup(recorder.clone());

    let err = dispatcher
        .query(&uri("unknown_table"), None, Selection::all(), None)
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::UnknownResource(u) if u.ends_with("/unknown_table")));
    assert!(recorder.calls().is_empty());
}

#[tokio::test]
async fn query_singleton_scopes_selection() {
    let recorder = Recorder::new();
    let (dispatcher, _) = setup(recorder.clone());

    dispatcher
        .query(&uri("books/7"), None, Selection::new("name = ?", vec!["x".into()]), None)
        .await
        .unwrap();

    let calls = recorder.calls();
    assert_eq!(calls[0], Call::ReadHandle);
    let (table, columns, selection, sort_order) = select_call(&calls);
    assert_eq!(table, "books");
    assert_eq!(columns, vec!["_id", "title", "author", "version"]);
    assert_eq!(selection.clause.as_deref(), Some("name = ? AND _id = 7"));
    assert_eq!(selection.args, vec!["x".to_string()]);
    assert_eq!(sort_order.as_deref(), Some("title ASC"));
}

#[tokio::test]
async fn query_singleton_without_selection() {
    let recorder = Recorder::new();
    let (dispatcher, _) = setup(recorder.clone());

    dispatcher.query(&uri("authors/3"), None, Selection::all(), None).await.unwrap();

    let (table, _, selection, sort_order) = select_call(&recorder.calls());
    assert_eq!(table, "authors");
    assert_eq!(selection, Selection::new("_id = 3", vec![]));
    assert_eq!(sort_order, None);
}

#[tokio::test]
async fn query_collection_passes_selection_and_projection() {
    let recorder = Recorder::new();
    let (dispatcher, _) = setup(recorder.clone());
    let selection = Selection::new("author = ?", vec!["Orwell".into()]);

    dispatcher
        .query(
            &uri("books"),
            Some(&["title".to_string()]),
            selection.clone(),
            Some("_id DESC"),
        )
        .await
        .unwrap();

    let (_, columns, got, sort_order) = select_call(&recorder.calls());
    assert_eq!(columns, vec!["title"]);
    assert_eq!(got, selection);
    assert_eq!(sort_order.as_deref(), Some("_id DESC"));
}

#[tokio::test]
async fn query_unknown_column_makes_no_provider_call() {
    let recorder = Recorder::new();
    let (dispatcher, _) = setup(recorder.clone());

    let err = dispatcher
        .query(&uri("books"), Some(&["isbn".to_string()]), Selection::all(), None)
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::InvalidColumn(c) if c == "isbn"));
    assert!(recorder.calls().is_empty());
}

#[tokio::test]
async fn query_cursor_is_bound_to_uri_and_emits_no_notification() {
    let mut recorder = Recorder::new();
    let mut row = Row::new();
    row.insert("_id".into(), json!(1));
    recorder.rows = vec![row];
    let (dispatcher, notes) = setup(recorder);

    let cursor = dispatcher.query(&uri("books"), None, Selection::all(), None).await.unwrap();

    assert_eq!(cursor.notification_uri(), Some(&uri("books")));
    let rows = cursor.collect_rows().await.unwrap();
    assert_eq!(rows.len(), 1);
    assert!(notes.seen().is_empty());
}

// ── insert ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn insert_empty_values_uses_null_column_hack() {
    let recorder = Recorder::new();
    let (dispatcher, notes) = setup(recorder.clone());

    let created = dispatcher.insert(&uri("books"), ValueSet::new()).await.unwrap();

    assert_eq!(created, uri("books/12"));
    assert_eq!(notes.seen(), vec![uri("books/12").to_string()]);
    assert_eq!(
        recorder.calls(),
        vec![
            Call::WriteHandle,
            Call::Insert {
                table: "books".into(),
                null_column_hack: Some("_id".into()),
                values: ValueSet::new(),
            },
        ]
    );
}

#[tokio::test]
async fn insert_with_values_has_no_hack() {
    let recorder = Recorder::new();
    let (dispatcher, _) = setup(recorder.clone());
    let mut values = ValueSet::new();
    values.insert("title".into(), json!("Dune"));

    dispatcher.insert(&uri("books"), values.clone()).await.unwrap();

    assert!(recorder.calls().contains(&Call::Insert {
        table: "books".into(),
        null_column_hack: None,
        values,
    }));
}

#[tokio::test]
async fn insert_on_object_uri_appends_to_collection() {
    let recorder = Recorder::new();
    let (dispatcher, _) = setup(recorder);

    let created = dispatcher.insert(&uri("books/3"), ValueSet::new()).await.unwrap();

    assert_eq!(created, uri("books/12"));
}

#[tokio::test]
async fn insert_non_positive_row_id_fails_without_notification() {
    let mut recorder = Recorder::new();
    recorder.row_id = 0;
    let (dispatcher, notes) = setup(recorder);

    let err = dispatcher.insert(&uri("books"), ValueSet::new()).await.unwrap_err();

    assert!(matches!(err, ProviderError::InsertFailed(u) if u == uri("books").to_string()));
    assert!(notes.seen().is_empty());
}

// ── update ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn update_applies_selection_literally_on_singleton_uri() {
    let mut recorder = Recorder::new();
    recorder.affected = 5;
    let (dispatcher, notes) = setup(recorder.clone());
    let mut values = ValueSet::new();
    values.insert("title".into(), json!("Untitled"));

    let count = dispatcher
        .update(&uri("books/1"), &values, Selection::all())
        .await
        .unwrap();

    assert_eq!(count, 5);
    assert!(recorder.calls().contains(&Call::Update {
        table: "books".into(),
        values,
        selection: Selection::all(),
    }));
    assert_eq!(notes.seen(), vec![uri("books/1").to_string()]);
}

#[tokio::test]
async fn update_zero_rows_still_notifies() {
    let mut recorder = Recorder::new();
    recorder.affected = 0;
    let (dispatcher, notes) = setup(recorder);
    let mut values = ValueSet::new();
    values.insert("title".into(), json!("x"));

    let count = dispatcher
        .update(&uri("books"), &values, Selection::new("_id = ?", vec!["404".into()]))
        .await
        .unwrap();

    assert_eq!(count, 0);
    assert_eq!(notes.seen().len(), 1);
}

#[tokio::test]
async fn update_empty_values_is_rejected_before_write_handle() {
    let recorder = Recorder::new();
    let (dispatcher, notes) = setup(recorder.clone());

    let err = dispatcher
        .update(&uri("books"), &ValueSet::new(), Selection::all())
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::BadRequest(_)));
    assert!(recorder.calls().is_empty());
    assert!(notes.seen().is_empty());
}

// ── delete ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn delete_scopes_singleton_uri() {
    let recorder = Recorder::new();
    let (dispatcher, notes) = setup(recorder.clone());

    dispatcher.delete(&uri("books/5"), Selection::all()).await.unwrap();

    assert!(recorder.calls().contains(&Call::Delete {
        table: "books".into(),
        selection: Selection::new("_id = 5", vec![]),
    }));
    assert_eq!(notes.seen(), vec![uri("books/5").to_string()]);
}

#[tokio::test]
async fn delete_collection_passes_selection_through() {
    let recorder = Recorder::new();
    let (dispatcher, _) = setup(recorder.clone());
    let selection = Selection::new("author = ?", vec!["Orwell".into()]);

    dispatcher.delete(&uri("books"), selection.clone()).await.unwrap();

    assert!(recorder.calls().contains(&Call::Delete {
        table: "books".into(),
        selection,
    }));
}

#[tokio::test]
async fn mutations_on_unknown_uri_fail_without_provider_call() {
    let recorder = Recorder::new();
    let (dispatcher, notes) = setup(recorder.clone());
    let mut values = ValueSet::new();
    values.insert("title".into(), json!("x"));
    let unknown = uri("shelves");

    assert!(matches!(
        dispatcher.insert(&unknown, ValueSet::new()).await,
        Err(ProviderError::UnknownResource(_))
    ));
    assert!(matches!(
        dispatcher.update(&unknown, &values, Selection::all()).await,
        Err(ProviderError::UnknownResource(_))
    ));
    assert!(matches!(
        dispatcher.delete(&unknown, Selection::all()).await,
        Err(ProviderError::UnknownResource(_))
    ));
    assert!(recorder.calls().is_empty());
    assert!(notes.seen().is_empty());
}

// ── describe_type ──────────────────────────────────────────────────────────

#[tokio::test]
async fn describe_type_is_idempotent_for_object_uris() {
    let (dispatcher, _) = setup(Recorder::new());

    let first = dispatcher.describe_type(&uri("books/42")).unwrap();
    let second = dispatcher.describe_type(&uri("books/42")).unwrap();

    assert_eq!(first, "vnd.android.cursor.dir/vnd.wit.books");
    assert_eq!(first, second);
}

#[tokio::test]
async fn describe_type_requires_object_uri() {
    let (dispatcher, _) = setup(Recorder::new());

    assert!(matches!(
        dispatcher.describe_type(&uri("books")),
        Err(ProviderError::UnknownResource(_))
    ));
    assert!(matches!(
        dispatcher.describe_type(&uri("books/abc")),
        Err(ProviderError::UnknownResource(_))
    ));
}

// ── registration order ─────────────────────────────────────────────────────

#[tokio::test]
async fn first_registered_table_wins_on_overlap() {
    let mut first = TableConfig::new("books_archive");
    first.path = Some("books".into());
    let config = ProviderConfig::new(AUTHORITY)
        .with_table(first)
        .with_table(TableConfig::new("books"));
    let registry = Arc::new(resolve(&config).unwrap());
    let dispatcher = Dispatcher::new(registry, Recorder::new(), Arc::new(NoopNotifier));

    dispatcher.query(&uri("books"), None, Selection::all(), None).await.unwrap();
    dispatcher.delete(&uri("books/2"), Selection::all()).await.unwrap();

    let tables: Vec<_> = dispatcher
        .connections()
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            Call::Select { table, .. } | Call::Delete { table, .. } => Some(table),
            _ => None,
        })
        .collect();
    assert_eq!(tables, vec!["books_archive", "books_archive"]);
}
