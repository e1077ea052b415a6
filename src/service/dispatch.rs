//! Request dispatch: identifier -> descriptor -> table operation -> change notification.

use crate::config::{DescriptorRegistry, MatchKind, ResourceDescriptor, ID_COLUMN};
use crate::error::ProviderError;
use crate::notify::ChangeNotifier;
use crate::session::{ConnectionProvider, RowCursor, Session, ValueSet};
use crate::sql::Selection;
use crate::uri::ResourceUri;
use std::sync::Arc;

/// Routes CRUD requests on resource identifiers to the registered tables.
pub struct Dispatcher<P> {
    registry: Arc<DescriptorRegistry>,
    connections: P,
    notifier: Arc<dyn ChangeNotifier>,
}

impl<P: ConnectionProvider> Dispatcher<P> {
    pub fn new(registry: Arc<DescriptorRegistry>, connections: P, notifier: Arc<dyn ChangeNotifier>) -> Self {
        Dispatcher {
            registry,
            connections,
            notifier,
        }
    }

    pub fn registry(&self) -> &DescriptorRegistry {
        &self.registry
    }

    pub fn connections(&self) -> &P {
        &self.connections
    }

    /// Rows of the addressed table. An object uri narrows `selection` to that row.
    /// `projection` of `None` selects the descriptor's default columns.
    pub async fn query(
        &self,
        uri: &ResourceUri,
        projection: Option<&[String]>,
        selection: Selection,
        sort_order: Option<&str>,
    ) -> Result<RowCursor, ProviderError> {
        let descriptor = self.registry.resolve(uri, MatchKind::Either)?;
        let selection = scoped(descriptor, uri, selection);
        let columns = descriptor.project(projection)?;
        let sort_order = sort_order.or_else(|| descriptor.default_sort_order());
        tracing::debug!(uri = %uri, table = %descriptor.table_name(), "query");

        let session = self.connections.read_handle().await?;
        let mut cursor = session
            .select(descriptor.table_name(), &columns, &selection, sort_order)
            .await?;
        cursor.set_notification_uri(uri.clone());
        Ok(cursor)
    }

    /// Inserts one row and returns its identifier (collection uri + new id).
    pub async fn insert(&self, uri: &ResourceUri, values: ValueSet) -> Result<ResourceUri, ProviderError> {
        let descriptor = self.registry.resolve(uri, MatchKind::Either)?;
        let collection_uri = if descriptor.matches_object(uri) {
            uri.parent().unwrap_or_else(|| uri.clone())
        } else {
            uri.clone()
        };
        let null_column_hack = values.is_empty().then_some(ID_COLUMN);
        tracing::debug!(uri = %uri, table = %descriptor.table_name(), "insert");

        let session = self.connections.write_handle().await?;
        let row_id = session
            .insert(descriptor.table_name(), null_column_hack, &values)
            .await?;
        if row_id <= 0 {
            return Err(ProviderError::InsertFailed(uri.to_string()));
        }
        let item_uri = collection_uri.with_appended_id(row_id as u64);
        self.notifier.notify(&item_uri);
        Ok(item_uri)
    }

    /// Updates rows matching `selection` and returns the count.
    /// The selection is applied as given: an object uri does not narrow it to that row.
    pub async fn update(
        &self,
        uri: &ResourceUri,
        values: &ValueSet,
        selection: Selection,
    ) -> Result<u64, ProviderError> {
        let descriptor = self.registry.resolve(uri, MatchKind::Either)?;
        if values.is_empty() {
            return Err(ProviderError::BadRequest(format!("empty values for update of {}", uri)));
        }
        tracing::debug!(uri = %uri, table = %descriptor.table_name(), "update");

        let session = self.connections.write_handle().await?;
        let count = session
            .update(descriptor.table_name(), values, &selection)
            .await?;
        self.notifier.notify(uri);
        Ok(count)
    }

    /// Deletes rows matching `selection` (narrowed to the row for an object uri) and returns the count.
    pub async fn delete(&self, uri: &ResourceUri, selection: Selection) -> Result<u64, ProviderError> {
        let descriptor = self.registry.resolve(uri, MatchKind::Either)?;
        let selection = scoped(descriptor, uri, selection);
        tracing::debug!(uri = %uri, table = %descriptor.table_name(), "delete");

        let session = self.connections.write_handle().await?;
        let count = session.delete(descriptor.table_name(), &selection).await?;
        self.notifier.notify(uri);
        Ok(count)
    }

    /// Content type of the table addressed by an object uri.
    pub fn describe_type(&self, uri: &ResourceUri) -> Result<String, ProviderError> {
        let descriptor = self.registry.resolve(uri, MatchKind::Object)?;
        Ok(descriptor.content_type().to_string())
    }
}

fn scoped(descriptor: &ResourceDescriptor, uri: &ResourceUri, selection: Selection) -> Selection {
    descriptor.id_scoped_selection(uri, &selection).unwrap_or(selection)
}
