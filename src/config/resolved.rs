//! Resolved descriptors: config validated and flattened for runtime routing.

use crate::config::ID_COLUMN;
use crate::error::ProviderError;
use crate::matcher::UriMatcher;
use crate::sql::Selection;
use crate::uri::ResourceUri;
use std::collections::BTreeMap;

/// Which matcher a lookup consults.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchKind {
    Collection,
    Object,
    Either,
}

/// One table's addressability: name, columns, projection and uri matchers.
#[derive(Clone, Debug)]
pub struct ResourceDescriptor {
    pub(crate) table_name: String,
    pub(crate) path: String,
    pub(crate) scheme: String,
    pub(crate) authority: String,
    pub(crate) columns: Vec<String>,
    pub(crate) projection_map: BTreeMap<String, String>,
    pub(crate) default_projection: Vec<String>,
    pub(crate) default_sort_order: Option<String>,
    pub(crate) content_type: String,
    pub(crate) matcher: UriMatcher,
}

impl ResourceDescriptor {
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Full column set, reserved columns included.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn projection_map(&self) -> &BTreeMap<String, String> {
        &self.projection_map
    }

    pub fn default_projection(&self) -> &[String] {
        &self.default_projection
    }

    pub fn default_sort_order(&self) -> Option<&str> {
        self.default_sort_order.as_deref()
    }

    /// MIME-like type string, e.g. `vnd.android.cursor.dir/vnd.wit.books`.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Canonical collection identifier, e.g. `content://com.example.books/books`.
    pub fn content_uri(&self) -> ResourceUri {
        ResourceUri::from_parts(&self.scheme, &self.authority, &self.path)
    }

    pub fn matches_collection(&self, uri: &ResourceUri) -> bool {
        self.matcher.matches_collection(uri)
    }

    pub fn matches_object(&self, uri: &ResourceUri) -> bool {
        self.matcher.matches_object(uri)
    }

    pub fn object_id(&self, uri: &ResourceUri) -> Option<u64> {
        self.matcher.object_id(uri)
    }

    /// `existing AND _id = <id>` for an object uri of this table; `None` otherwise.
    pub fn id_scoped_selection(&self, uri: &ResourceUri, existing: &Selection) -> Option<Selection> {
        self.object_id(uri).map(|id| existing.and_id(ID_COLUMN, id))
    }

    /// Maps requested aliases through the projection map. `None` or empty selects the defaults.
    pub fn project(&self, requested: Option<&[String]>) -> Result<Vec<String>, ProviderError> {
        let aliases = match requested {
            Some(r) if !r.is_empty() => r,
            _ => &self.default_projection[..],
        };
        aliases
            .iter()
            .map(|alias| {
                if let Some(expr) = self.projection_map.get(alias) {
                    Ok(expr.clone())
                } else if is_aliased_expression(alias) {
                    Ok(alias.clone())
                } else {
                    Err(ProviderError::InvalidColumn(alias.clone()))
                }
            })
            .collect()
    }

    fn matches(&self, uri: &ResourceUri, kind: MatchKind) -> bool {
        match kind {
            MatchKind::Collection => self.matches_collection(uri),
            MatchKind::Object => self.matches_object(uri),
            MatchKind::Either => self.matches_collection(uri) || self.matches_object(uri),
        }
    }
}

/// `expr AS alias` is passed through even when the alias is not in the map.
fn is_aliased_expression(column: &str) -> bool {
    column.contains(" AS ") || column.contains(" as ")
}

/// Ordered descriptors. Registration order decides ties: first match wins.
#[derive(Clone, Debug, Default)]
pub struct DescriptorRegistry {
    descriptors: Vec<ResourceDescriptor>,
}

impl DescriptorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends without checking for duplicates.
    pub fn register(&mut self, descriptor: ResourceDescriptor) {
        self.descriptors.push(descriptor);
    }

    pub fn resolve(&self, uri: &ResourceUri, kind: MatchKind) -> Result<&ResourceDescriptor, ProviderError> {
        self.descriptors
            .iter()
            .find(|d| d.matches(uri, kind))
            .ok_or_else(|| ProviderError::UnknownResource(uri.to_string()))
    }

    pub fn find_table(&self, table_name: &str) -> Option<&ResourceDescriptor> {
        self.descriptors.iter().find(|d| d.table_name == table_name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceDescriptor> {
        self.descriptors.iter()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}
