//! Group keys — which mappings describe the same logical route.
//!
//! Two mappings land in the same group when their kind, host and
//! normalized path agree, plus whatever the kind adds through its
//! [`GroupKeyPart`](crate::registry::GroupKeyPart). The namespace and
//! resource that declared them do not matter. A `group` override on the
//! resource replaces the host and path component.

use routeplan_core::Mapping;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::CompileResult;
use crate::registry::KindRegistry;

/// Canonical components of a group key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupKey {
    pub kind: String,
    /// Host and path, or the `group` override.
    pub route: RouteComponent,
    /// Kind-specific components.
    pub parts: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RouteComponent {
    HostPath { host: String, path: String },
    Override { group: String },
}

impl GroupKey {
    /// Stable group id: hex SHA-256 over the length-prefixed components.
    pub fn id(&self) -> String {
        let mut hasher = Sha256::new();
        let mut feed = |s: &str| {
            hasher.update((s.len() as u64).to_be_bytes());
            hasher.update(s.as_bytes());
        };

        feed(&self.kind);
        match &self.route {
            RouteComponent::HostPath { host, path } => {
                feed("host-path");
                feed(host);
                feed(path);
            }
            RouteComponent::Override { group } => {
                feed("override");
                feed(group);
            }
        }
        for part in &self.parts {
            feed(part);
        }

        hex::encode(hasher.finalize())
    }

    /// Human-readable form for logs, e.g. `Mapping *:/qotm/ method=*`.
    pub fn label(&self) -> String {
        let route = match &self.route {
            RouteComponent::HostPath { host, path } => format!("{host}:{path}"),
            RouteComponent::Override { group } => format!("group={group}"),
        };
        let mut label = format!("{} {}", self.kind, route);
        for part in &self.parts {
            label.push(' ');
            label.push_str(part);
        }
        label
    }
}

/// Derive the group key of a mapping. Fails only when the mapping's kind
/// has no registered group key capability.
pub fn resolve_group_key(mapping: &Mapping, registry: &KindRegistry) -> CompileResult<GroupKey> {
    let part = registry.group_key_part(mapping)?;

    let group_override = mapping
        .group
        .as_deref()
        .map(str::trim)
        .filter(|g| !g.is_empty());

    let (route, parts) = match group_override {
        Some(group) => (
            RouteComponent::Override {
                group: group.to_string(),
            },
            Vec::new(),
        ),
        None => (
            RouteComponent::HostPath {
                host: mapping.host_or_any().to_string(),
                path: mapping.normalized_prefix(),
            },
            part.key_parts(mapping),
        ),
    };

    Ok(GroupKey {
        kind: mapping.kind.clone(),
        route,
        parts,
    })
}
