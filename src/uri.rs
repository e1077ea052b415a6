//! Hierarchical resource identifiers: `scheme://authority/segment[/segment...]`.

use crate::error::ProviderError;
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ResourceUri {
    scheme: String,
    authority: String,
    segments: Vec<String>,
}

impl ResourceUri {
    pub fn parse(s: &str) -> Result<Self, ProviderError> {
        let (scheme, rest) = s
            .split_once("://")
            .ok_or_else(|| ProviderError::InvalidUri(s.to_string()))?;
        if scheme.is_empty() || rest.contains(&['?', '#'][..]) {
            return Err(ProviderError::InvalidUri(s.to_string()));
        }
        let (authority, path) = rest.split_once('/').unwrap_or((rest, ""));
        if authority.is_empty() {
            return Err(ProviderError::InvalidUri(s.to_string()));
        }
        let segments = path
            .split('/')
            .filter(|seg| !seg.is_empty())
            .map(str::to_string)
            .collect();
        Ok(ResourceUri {
            scheme: scheme.to_string(),
            authority: authority.to_string(),
            segments,
        })
    }

    /// Builds an identifier from parts; `path` may contain several `/`-separated segments.
    pub fn from_parts(scheme: &str, authority: &str, path: &str) -> Self {
        ResourceUri {
            scheme: scheme.to_string(),
            authority: authority.to_string(),
            segments: path
                .split('/')
                .filter(|seg| !seg.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    pub fn path_segments(&self) -> &[String] {
        &self.segments
    }

    /// Path part with a leading slash, e.g. `/books/7`.
    pub fn path(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }

    /// Last segment as an unsigned integer, if it is one.
    pub fn last_segment_id(&self) -> Option<u64> {
        let last = self.segments.last()?;
        if last.is_empty() || !last.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        last.parse().ok()
    }

    pub fn with_appended_id(&self, id: u64) -> Self {
        self.with_appended_segment(&id.to_string())
    }

    pub fn with_appended_segment(&self, segment: &str) -> Self {
        let mut out = self.clone();
        out.segments.push(segment.to_string());
        out
    }

    /// Identifier with the last segment removed; `None` at the root.
    pub fn parent(&self) -> Option<Self> {
        if self.segments.is_empty() {
            return None;
        }
        let mut out = self.clone();
        out.segments.pop();
        Some(out)
    }

    /// True when `self` equals `other` or lies beneath it.
    pub fn is_same_or_descendant_of(&self, other: &ResourceUri) -> bool {
        self.scheme == other.scheme
            && self.authority == other.authority
            && self.segments.len() >= other.segments.len()
            && self.segments.iter().zip(&other.segments).all(|(a, b)| a == b)
    }
}

impl FromStr for ResourceUri {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceUri::parse(s)
    }
}

impl fmt::Display for ResourceUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.authority)?;
        for seg in &self.segments {
            write!(f, "/{}", seg)?;
        }
        Ok(())
    }
}
