//! Raw config types matching the JSON provider document.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Reserved primary key column present on every table.
pub const ID_COLUMN: &str = "_id";
/// Reserved column holding the record version.
pub const VERSION_COLUMN: &str = "version";

pub const DEFAULT_SCHEME: &str = "content";
pub const DEFAULT_VENDOR: &str = "wit";
pub const DEFAULT_COLLECTION_MARKER: &str = "vnd.android.cursor.dir";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TableConfig {
    pub name: String,
    /// Addressing path; defaults to the table name.
    #[serde(default)]
    pub path: Option<String>,
    /// Declared columns. `_id` and `version` are added when missing.
    #[serde(default)]
    pub columns: Vec<String>,
    /// Alias -> column expression. Empty means every column maps to itself.
    #[serde(default)]
    pub projection: BTreeMap<String, String>,
    #[serde(default)]
    pub default_projection: Option<Vec<String>>,
    #[serde(default)]
    pub default_sort_order: Option<String>,
}

impl TableConfig {
    pub fn new(name: impl Into<String>) -> Self {
        TableConfig {
            name: name.into(),
            path: None,
            columns: Vec::new(),
            projection: BTreeMap::new(),
            default_projection: None,
            default_sort_order: None,
        }
    }

    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn path(&self) -> &str {
        self.path.as_deref().unwrap_or(&self.name)
    }
}

/// Everything registered at startup, in registration order.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_scheme")]
    pub scheme: String,
    pub authority: String,
    #[serde(default = "default_vendor")]
    pub vendor: String,
    #[serde(default = "default_collection_marker")]
    pub collection_marker: String,
    #[serde(default)]
    pub tables: Vec<TableConfig>,
}

impl ProviderConfig {
    pub fn new(authority: impl Into<String>) -> Self {
        ProviderConfig {
            scheme: default_scheme(),
            authority: authority.into(),
            vendor: default_vendor(),
            collection_marker: default_collection_marker(),
            tables: Vec::new(),
        }
    }

    pub fn with_table(mut self, table: TableConfig) -> Self {
        self.tables.push(table);
        self
    }
}

fn default_scheme() -> String {
    DEFAULT_SCHEME.into()
}

fn default_vendor() -> String {
    DEFAULT_VENDOR.into()
}

fn default_collection_marker() -> String {
    DEFAULT_COLLECTION_MARKER.into()
}
