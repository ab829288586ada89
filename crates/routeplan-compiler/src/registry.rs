//! Capability registry — which code derives group keys and route weights
//! for each mapping kind.
//!
//! Every kind that may appear in a snapshot must be registered with both a
//! [`GroupKeyPart`] and a [`RouteWeightPart`]. A kind missing either one is
//! rejected when the registry is built; a kind that was never registered is
//! rejected by the compiler the moment a mapping of that kind shows up.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use routeplan_core::{HTTP_MAPPING_KIND, KindFamily, Mapping, RouteplanConfig, TCP_MAPPING_KIND};
use tracing::debug;

use crate::error::{Capability, CompileError, CompileResult, RegistryError};
use crate::kinds;

/// Kind-specific components of a group key.
pub trait GroupKeyPart: Send + Sync {
    /// Extra key components, appended after host and path.
    fn key_parts(&self, mapping: &Mapping) -> Vec<String>;
}

/// Kind-specific components of a route weight.
pub trait RouteWeightPart: Send + Sync {
    /// Discriminants compared between precedence and path specificity.
    /// Higher values sort first.
    fn discriminants(&self, mapping: &Mapping) -> Vec<i64>;
}

/// Capabilities registered for one kind. Parts may be missing until
/// [`KindRegistryBuilder::build`] validates them.
#[derive(Clone, Default)]
pub struct KindCapabilities {
    pub group_key: Option<Arc<dyn GroupKeyPart>>,
    pub route_weight: Option<Arc<dyn RouteWeightPart>>,
    /// Whether groups of this kind are canary-balanced.
    pub canary: bool,
}

impl KindCapabilities {
    /// Both parts taken from a built-in family.
    pub fn from_family(family: KindFamily, canary: bool) -> Self {
        let (group_key, route_weight) = kinds::family_parts(family);
        Self {
            group_key: Some(group_key),
            route_weight: Some(route_weight),
            canary,
        }
    }
}

impl fmt::Debug for KindCapabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KindCapabilities")
            .field("group_key", &self.group_key.is_some())
            .field("route_weight", &self.route_weight.is_some())
            .field("canary", &self.canary)
            .finish()
    }
}

struct RegisteredKind {
    group_key: Arc<dyn GroupKeyPart>,
    route_weight: Arc<dyn RouteWeightPart>,
    canary: bool,
}

/// Validated, immutable kind → capability table.
pub struct KindRegistry {
    kinds: BTreeMap<String, RegisteredKind>,
}

impl KindRegistry {
    pub fn builder() -> KindRegistryBuilder {
        KindRegistryBuilder::default()
    }

    /// Registry with the default `Mapping` and `TCPMapping` kinds.
    pub fn builtin() -> Self {
        let mut kinds = BTreeMap::new();
        for (name, family, canary) in [
            (HTTP_MAPPING_KIND, KindFamily::Http, true),
            (TCP_MAPPING_KIND, KindFamily::Tcp, false),
        ] {
            let (group_key, route_weight) = kinds::family_parts(family);
            kinds.insert(
                name.to_string(),
                RegisteredKind {
                    group_key,
                    route_weight,
                    canary,
                },
            );
        }
        Self { kinds }
    }

    /// Build a registry from the `[kinds]` table of a config file.
    pub fn from_config(config: &RouteplanConfig) -> Result<Self, RegistryError> {
        let mut builder = Self::builder();
        for (name, cfg) in &config.kinds {
            let caps = match cfg.family {
                Some(family) => KindCapabilities::from_family(family, cfg.canary),
                None => KindCapabilities {
                    canary: cfg.canary,
                    ..Default::default()
                },
            };
            builder = builder.register(name, caps);
        }
        builder.build()
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.kinds.contains_key(kind)
    }

    pub fn kind_names(&self) -> Vec<&str> {
        self.kinds.keys().map(String::as_str).collect()
    }

    pub fn is_canary(&self, kind: &str) -> bool {
        self.kinds.get(kind).is_some_and(|k| k.canary)
    }

    pub fn group_key_part(&self, mapping: &Mapping) -> CompileResult<&dyn GroupKeyPart> {
        self.kinds
            .get(&mapping.kind)
            .map(|k| k.group_key.as_ref())
            .ok_or_else(|| missing(mapping, Capability::GroupKey))
    }

    pub fn route_weight_part(&self, mapping: &Mapping) -> CompileResult<&dyn RouteWeightPart> {
        self.kinds
            .get(&mapping.kind)
            .map(|k| k.route_weight.as_ref())
            .ok_or_else(|| missing(mapping, Capability::RouteWeight))
    }
}

impl Default for KindRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

fn missing(mapping: &Mapping, capability: Capability) -> CompileError {
    CompileError::MissingCapability {
        kind: mapping.kind.clone(),
        capability,
        resource_key: mapping.resource_key.clone(),
    }
}

/// Collects kind registrations; [`build`](Self::build) validates them.
#[derive(Default)]
pub struct KindRegistryBuilder {
    kinds: BTreeMap<String, KindCapabilities>,
}

impl KindRegistryBuilder {
    /// Register (or replace) a kind.
    pub fn register(mut self, kind: &str, caps: KindCapabilities) -> Self {
        self.kinds.insert(kind.to_string(), caps);
        self
    }

    /// Register a kind backed by a built-in family.
    pub fn family(self, kind: &str, family: KindFamily, canary: bool) -> Self {
        self.register(kind, KindCapabilities::from_family(family, canary))
    }

    pub fn build(self) -> Result<KindRegistry, RegistryError> {
        let mut kinds = BTreeMap::new();
        for (name, caps) in self.kinds {
            if name.trim().is_empty() {
                return Err(RegistryError::EmptyKind);
            }
            let group_key = caps.group_key.ok_or_else(|| RegistryError::MissingCapability {
                kind: name.clone(),
                capability: Capability::GroupKey,
            })?;
            let route_weight =
                caps.route_weight
                    .ok_or_else(|| RegistryError::MissingCapability {
                        kind: name.clone(),
                        capability: Capability::RouteWeight,
                    })?;
            debug!(kind = %name, canary = caps.canary, "registered mapping kind");
            kinds.insert(
                name,
                RegisteredKind {
                    group_key,
                    route_weight,
                    canary: caps.canary,
                },
            );
        }
        Ok(KindRegistry { kinds })
    }
}
