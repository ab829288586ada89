//! TCP mappings: keyed by listener port.

use routeplan_core::Mapping;

use crate::registry::{GroupKeyPart, RouteWeightPart};

/// Capabilities of the TCP family.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpMapping;

impl GroupKeyPart for TcpMapping {
    fn key_parts(&self, mapping: &Mapping) -> Vec<String> {
        let port = mapping
            .port
            .map(|p| p.to_string())
            .unwrap_or_else(|| "*".to_string());
        vec![format!("port={port}")]
    }
}

impl RouteWeightPart for TcpMapping {
    fn discriminants(&self, mapping: &Mapping) -> Vec<i64> {
        // A listener restricted to an SNI host is matched before a catch-all.
        vec![i64::from(mapping.exact_host().is_some())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use routeplan_core::TCP_MAPPING_KIND;

    #[test]
    fn port_is_part_of_key() {
        let mut m = Mapping::new("db.default", "db", "default", TCP_MAPPING_KIND);
        assert_eq!(TcpMapping.key_parts(&m), vec!["port=*"]);
        m.port = Some(5432);
        assert_eq!(TcpMapping.key_parts(&m), vec!["port=5432"]);
    }

    #[test]
    fn host_restricted_sorts_first() {
        let mut m = Mapping::new("db.default", "db", "default", TCP_MAPPING_KIND);
        assert_eq!(TcpMapping.discriminants(&m), vec![0]);
        m.host = Some("db.example.com".to_string());
        assert_eq!(TcpMapping.discriminants(&m), vec![1]);
    }
}
