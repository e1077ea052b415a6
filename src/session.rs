//! Storage boundary: connection provider, session primitives and row cursors.

use crate::error::ProviderError;
use crate::notify::{ChangeBus, ChangeSubscription};
use crate::sql::Selection;
use crate::uri::ResourceUri;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, VecDeque};
use tokio::sync::mpsc;

/// One result row keyed by output column name.
pub type Row = serde_json::Map<String, Value>;

/// Column -> value payload for insert and update.
pub type ValueSet = BTreeMap<String, Value>;

/// Hands out sessions: a read handle for queries, a write handle for mutations.
#[async_trait]
pub trait ConnectionProvider: Send + Sync {
    type Session: Session;

    async fn read_handle(&self) -> Result<Self::Session, ProviderError>;

    async fn write_handle(&self) -> Result<Self::Session, ProviderError>;
}

/// Primitive table operations. Each call is one statement.
#[async_trait]
pub trait Session: Send + Sync {
    async fn select(
        &self,
        table: &str,
        columns: &[String],
        selection: &Selection,
        sort_order: Option<&str>,
    ) -> Result<RowCursor, ProviderError>;

    /// Returns the new row id; `null_column_hack` names a column to insert as NULL when `values` is empty.
    async fn insert(
        &self,
        table: &str,
        null_column_hack: Option<&str>,
        values: &ValueSet,
    ) -> Result<i64, ProviderError>;

    async fn update(&self, table: &str, values: &ValueSet, selection: &Selection) -> Result<u64, ProviderError>;

    async fn delete(&self, table: &str, selection: &Selection) -> Result<u64, ProviderError>;
}

/// Forward-only, finite sequence of rows. Not restartable.
/// Rows come from an in-memory buffer first, then from the producer channel if there is one.
pub struct RowCursor {
    buffered: VecDeque<Result<Row, ProviderError>>,
    rows: Option<mpsc::Receiver<Result<Row, ProviderError>>>,
    notification_uri: Option<ResourceUri>,
}

impl RowCursor {
    /// Producer/cursor pair; the producer side feeds rows until it is dropped.
    pub fn channel(capacity: usize) -> (mpsc::Sender<Result<Row, ProviderError>>, RowCursor) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (
            tx,
            RowCursor {
                buffered: VecDeque::new(),
                rows: Some(rx),
                notification_uri: None,
            },
        )
    }

    /// Cursor over rows already in memory.
    pub fn from_rows(rows: Vec<Row>) -> RowCursor {
        RowCursor {
            buffered: rows.into_iter().map(Ok).collect(),
            rows: None,
            notification_uri: None,
        }
    }

    /// Cursor whose only item is `err`.
    pub fn failed(err: ProviderError) -> RowCursor {
        RowCursor {
            buffered: VecDeque::from([Err(err)]),
            rows: None,
            notification_uri: None,
        }
    }

    pub async fn next(&mut self) -> Option<Result<Row, ProviderError>> {
        if let Some(item) = self.buffered.pop_front() {
            return Some(item);
        }
        self.rows.as_mut()?.recv().await
    }

    /// Drains the cursor, stopping at the first error.
    pub async fn collect_rows(mut self) -> Result<Vec<Row>, ProviderError> {
        let mut out = Vec::new();
        while let Some(row) = self.next().await {
            out.push(row?);
        }
        Ok(out)
    }

    /// Identifier the rows were queried from.
    pub fn notification_uri(&self) -> Option<&ResourceUri> {
        self.notification_uri.as_ref()
    }

    pub fn set_notification_uri(&mut self, uri: ResourceUri) {
        self.notification_uri = Some(uri);
    }

    /// Subscribe to changes at or beneath the cursor's notification uri.
    pub fn watch(&self, bus: &ChangeBus) -> Option<ChangeSubscription> {
        self.notification_uri.as_ref().map(|uri| bus.subscribe(uri.clone()))
    }
}

impl std::fmt::Debug for RowCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowCursor")
            .field("notification_uri", &self.notification_uri)
            .finish_non_exhaustive()
    }
}
