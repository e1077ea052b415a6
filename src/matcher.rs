//! Identifier matching: does a uri address a whole table or one row of it.

use crate::error::ConfigError;
use crate::uri::ResourceUri;
use regex::Regex;

/// Collection and object patterns for one descriptor path.
#[derive(Clone, Debug)]
pub struct UriMatcher {
    collection: Regex,
    object: Regex,
}

impl UriMatcher {
    /// `path` is the descriptor's addressing path, e.g. `books` or `shelves/books`.
    pub fn new(path: &str) -> Result<Self, ConfigError> {
        let trimmed = path.trim_matches('/');
        if trimmed.is_empty() || trimmed.split('/').any(str::is_empty) {
            return Err(ConfigError::InvalidPath(path.to_string()));
        }
        let escaped = regex::escape(trimmed);
        let collection = Regex::new(&format!(r"(?:^|/){}$", escaped))
            .map_err(|e| ConfigError::Validation(e.to_string()))?;
        let object = Regex::new(&format!(r"(?:^|/){}/([0-9]+)$", escaped))
            .map_err(|e| ConfigError::Validation(e.to_string()))?;
        Ok(UriMatcher { collection, object })
    }

    pub fn matches_collection(&self, uri: &ResourceUri) -> bool {
        self.collection.is_match(&uri.path())
    }

    pub fn matches_object(&self, uri: &ResourceUri) -> bool {
        self.object_id(uri).is_some()
    }

    /// Trailing id of an object uri. Ids that do not fit in u64 do not match.
    pub fn object_id(&self, uri: &ResourceUri) -> Option<u64> {
        let path = uri.path();
        let caps = self.object.captures(&path)?;
        caps.get(1)?.as_str().parse().ok()
    }
}
