//! Load provider config from JSON and resolve it into a descriptor registry.

use crate::config::resolved::{DescriptorRegistry, ResourceDescriptor};
use crate::config::types::*;
use crate::config::validate;
use crate::error::ConfigError;
use crate::matcher::UriMatcher;
use std::collections::BTreeMap;
use std::path::Path;

/// Build the registry from config (validates first). Tables register in document order.
pub fn resolve(config: &ProviderConfig) -> Result<DescriptorRegistry, ConfigError> {
    validate(config)?;
    let mut registry = DescriptorRegistry::new();
    for table in &config.tables {
        registry.register(resolve_table(config, table)?);
    }
    tracing::debug!(tables = registry.len(), authority = %config.authority, "descriptor registry resolved");
    Ok(registry)
}

/// Resolve a single table against its provider settings.
pub fn resolve_table(provider: &ProviderConfig, table: &TableConfig) -> Result<ResourceDescriptor, ConfigError> {
    let path = table.path().trim_matches('/').to_string();
    let matcher = UriMatcher::new(&path)?;

    let mut columns = table.columns.clone();
    if !columns.iter().any(|c| c == ID_COLUMN) {
        columns.insert(0, ID_COLUMN.to_string());
    }
    if !columns.iter().any(|c| c == VERSION_COLUMN) {
        columns.push(VERSION_COLUMN.to_string());
    }

    let projection_map: BTreeMap<String, String> = if table.projection.is_empty() {
        columns.iter().map(|c| (c.clone(), c.clone())).collect()
    } else {
        let mut map = table.projection.clone();
        for reserved in [ID_COLUMN, VERSION_COLUMN] {
            map.entry(reserved.to_string()).or_insert_with(|| reserved.to_string());
        }
        map
    };

    let default_projection = match &table.default_projection {
        Some(defaults) => defaults.clone(),
        None => columns
            .iter()
            .filter(|c| projection_map.contains_key(c.as_str()))
            .cloned()
            .chain(projection_map.keys().filter(|k| !columns.contains(*k)).cloned())
            .collect(),
    };

    let content_type = format!(
        "{}/vnd.{}.{}",
        provider.collection_marker, provider.vendor, table.name
    );

    Ok(ResourceDescriptor {
        table_name: table.name.clone(),
        path,
        scheme: provider.scheme.clone(),
        authority: provider.authority.clone(),
        columns,
        projection_map,
        default_projection,
        default_sort_order: table.default_sort_order.clone(),
        content_type,
        matcher,
    })
}

pub fn load_from_str(json: &str) -> Result<ProviderConfig, ConfigError> {
    serde_json::from_str(json).map_err(|e| ConfigError::Load(e.to_string()))
}

/// Read a JSON provider document from disk.
pub async fn load_from_path(path: impl AsRef<Path>) -> Result<ProviderConfig, ConfigError> {
    let path = path.as_ref();
    tracing::debug!(path = %path.display(), "loading provider config");
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    load_from_str(&text)
}
