//! Config validation: identifiers, paths and projection consistency.

use crate::config::{ProviderConfig, TableConfig, ID_COLUMN, VERSION_COLUMN};
use crate::error::ConfigError;
use regex::Regex;
use std::collections::HashSet;

fn identifier_pattern() -> Result<Regex, ConfigError> {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").map_err(|e| ConfigError::Validation(e.to_string()))
}

pub fn validate(config: &ProviderConfig) -> Result<(), ConfigError> {
    let ident = identifier_pattern()?;

    if config.authority.trim().is_empty() || config.authority.contains('/') {
        return Err(ConfigError::Validation(format!(
            "authority must be non-empty and contain no '/': '{}'",
            config.authority
        )));
    }
    if config.scheme.is_empty() || config.scheme.contains(':') || config.scheme.contains('/') {
        return Err(ConfigError::Validation(format!("invalid scheme '{}'", config.scheme)));
    }

    let mut names = HashSet::new();
    let mut paths = HashSet::new();
    for table in &config.tables {
        validate_table(table, &ident)?;
        // Overlapping registrations are legal; the first one registered wins.
        if !names.insert(table.name.as_str()) {
            tracing::warn!(table = %table.name, "table registered more than once");
        }
        let path = table.path().trim_matches('/');
        if !paths.insert(path) {
            tracing::warn!(path = %path, "path registered more than once; first registration wins");
        }
    }

    Ok(())
}

fn validate_table(table: &TableConfig, ident: &Regex) -> Result<(), ConfigError> {
    if !ident.is_match(&table.name) {
        return Err(ConfigError::InvalidIdentifier {
            kind: "table",
            name: table.name.clone(),
        });
    }
    for c in &table.columns {
        if !ident.is_match(c) {
            return Err(ConfigError::InvalidIdentifier {
                kind: "column",
                name: c.clone(),
            });
        }
    }

    let path = table.path().trim_matches('/');
    if path.is_empty() || path.split('/').any(str::is_empty) {
        return Err(ConfigError::InvalidPath(table.path().to_string()));
    }
    if path
        .rsplit('/')
        .next()
        .is_some_and(|last| last.bytes().all(|b| b.is_ascii_digit()))
    {
        return Err(ConfigError::InvalidPath(table.path().to_string()));
    }

    for (alias, expr) in &table.projection {
        if alias.trim().is_empty() || expr.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "table {}: projection entries must be non-empty ('{}' -> '{}')",
                table.name, alias, expr
            )));
        }
    }

    if let Some(defaults) = &table.default_projection {
        for alias in defaults {
            let known = if table.projection.is_empty() {
                table.columns.iter().any(|c| c == alias)
            } else {
                table.projection.contains_key(alias)
            };
            if !known && alias != ID_COLUMN && alias != VERSION_COLUMN {
                return Err(ConfigError::Validation(format!(
                    "table {}: default projection references unknown column '{}'",
                    table.name, alias
                )));
            }
        }
    }

    Ok(())
}
