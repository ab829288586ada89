//! HTTP mappings: method and header matchers refine the host + prefix route.

use routeplan_core::Mapping;

use crate::registry::{GroupKeyPart, RouteWeightPart};

/// Capabilities of the HTTP family.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpMapping;

impl GroupKeyPart for HttpMapping {
    fn key_parts(&self, mapping: &Mapping) -> Vec<String> {
        let method = mapping
            .method
            .as_deref()
            .map(|m| m.trim().to_ascii_uppercase())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| "*".to_string());

        let mut parts = vec![format!("method={method}")];
        // Header names are case-insensitive; sort after lowercasing.
        let mut headers: Vec<String> = mapping
            .headers
            .iter()
            .map(|(name, value)| format!("header:{}={}", name.to_ascii_lowercase(), value))
            .collect();
        headers.sort();
        parts.extend(headers);
        parts
    }
}

impl RouteWeightPart for HttpMapping {
    fn discriminants(&self, mapping: &Mapping) -> Vec<i64> {
        let has_method = mapping
            .method
            .as_deref()
            .is_some_and(|m| !m.trim().is_empty());
        vec![mapping.headers.len() as i64, i64::from(has_method)]
    }
}
