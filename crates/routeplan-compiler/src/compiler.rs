//! Group compiler — one reconciliation pass from snapshot to route table.
//!
//! The pass runs in a fixed sequence:
//! 1. **Collect** the snapshot's mappings, rejecting duplicate resource keys
//! 2. **Group** them by group key
//! 3. **Order** each group by route weight
//! 4. **Balance** canary weights of eligible groups
//! 5. **Bind** each distinct host to a TLS context
//! 6. **Emit** the groups, ordered by their leading route
//!
//! Steps 1–3 fail the whole pass; nothing is emitted, so the caller keeps
//! its previous table. Steps 4–5 only add warnings.

use std::collections::{BTreeMap, HashSet};

use routeplan_core::{CompilerSettings, Mapping, RouteplanConfig, Snapshot};
use tracing::{debug, info, warn};

use crate::canary;
use crate::error::{CompileError, CompileResult, RegistryError};
use crate::group_key::resolve_group_key;
use crate::registry::KindRegistry;
use crate::route_weight::{RouteWeight, route_weight};
use crate::table::{Compilation, CompileWarning, CompiledMapping, RouteGroup, RouteTable};
use crate::tls::TlsBinder;

/// Mirrored percentage of a shadow that declares no weight.
const DEFAULT_SHADOW_WEIGHT: u32 = 100;

/// Compiles snapshots into route tables. Immutable and `Send + Sync`;
/// independent snapshots may be compiled concurrently.
pub struct GroupCompiler {
    registry: KindRegistry,
    settings: CompilerSettings,
}

/// A mapping with its group id and route weight, before balancing.
struct Derived<'a> {
    mapping: &'a Mapping,
    group_id: String,
    route_weight: RouteWeight,
}

struct PendingGroup<'a> {
    kind: String,
    label: String,
    entries: Vec<Derived<'a>>,
}

impl GroupCompiler {
    pub fn new(registry: KindRegistry) -> Self {
        Self {
            registry,
            settings: CompilerSettings::default(),
        }
    }

    pub fn from_config(config: &RouteplanConfig) -> Result<Self, RegistryError> {
        Ok(Self::new(KindRegistry::from_config(config)?).with_settings(config.compiler.clone()))
    }

    pub fn with_settings(mut self, settings: CompilerSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn registry(&self) -> &KindRegistry {
        &self.registry
    }

    /// Run one pass over `snapshot`.
    pub fn compile(&self, snapshot: &Snapshot) -> CompileResult<Compilation> {
        // Collect.
        let mut seen = HashSet::with_capacity(snapshot.mappings.len());
        for mapping in &snapshot.mappings {
            if !seen.insert(mapping.resource_key.as_str()) {
                return Err(CompileError::DuplicateResourceKey(
                    mapping.resource_key.clone(),
                ));
            }
        }

        // Group.
        let mut pending: BTreeMap<String, PendingGroup<'_>> = BTreeMap::new();
        for mapping in &snapshot.mappings {
            let key = resolve_group_key(mapping, &self.registry)?;
            let weight = route_weight(mapping, &self.registry)?;
            let group_id = key.id();

            debug!(
                mapping = %mapping.resource_key,
                group_id = %group_id,
                route_weight = %weight,
                "derived mapping"
            );

            pending
                .entry(group_id.clone())
                .or_insert_with(|| PendingGroup {
                    kind: mapping.kind.clone(),
                    label: key.label(),
                    entries: Vec::new(),
                })
                .entries
                .push(Derived {
                    mapping,
                    group_id,
                    route_weight: weight,
                });
        }

        // Order, then balance.
        let mut warnings = Vec::new();
        let mut groups: Vec<RouteGroup> = Vec::with_capacity(pending.len());
        for (group_id, mut group) in pending {
            group.entries.sort_by(|a, b| a.route_weight.cmp(&b.route_weight));
            groups.push(self.assemble(group_id, group, &mut warnings));
        }

        // Bind.
        let mut binder = TlsBinder::new(&snapshot.tls_contexts);
        for group in &mut groups {
            for compiled in group
                .members
                .iter_mut()
                .chain(group.shadow.iter_mut())
                .chain(group.rejected_shadows.iter_mut())
            {
                let Some(host) = compiled.mapping.exact_host() else {
                    continue;
                };
                if let Some(binding) = binder.resolve(host) {
                    compiled.tls_context = Some(binding.context.clone());
                    compiled.sni_bound = true;
                }
            }
        }
        if self.settings.warn_ambiguous_tls {
            for (host, binding) in binder.resolved() {
                let Some(binding) = binding.filter(|b| b.is_ambiguous()) else {
                    continue;
                };
                warnings.push(CompileWarning::AmbiguousTlsHost {
                    host: host.to_string(),
                    chosen: binding.context.clone(),
                    also_claimed_by: binding.also_claimed_by.clone(),
                });
            }
        }

        // Emit.
        groups.sort_by(|a, b| {
            let head_a = a.head().map(|m| &m.route_weight);
            let head_b = b.head().map(|m| &m.route_weight);
            head_a
                .cmp(&head_b)
                .then_with(|| a.group_id.cmp(&b.group_id))
        });

        for warning in &warnings {
            warn!(%warning, "route compilation warning");
        }

        let compilation = Compilation {
            table: RouteTable { groups },
            warnings,
        };
        let stats = compilation.stats();
        info!(
            mappings = stats.mappings,
            groups = stats.groups,
            balanced = stats.balanced_groups,
            tls_bound = stats.tls_bound,
            hosts = binder.lookups(),
            warnings = stats.warnings,
            "route compilation complete"
        );

        Ok(compilation)
    }

    /// Split shadows from serving members and balance the members.
    fn assemble(
        &self,
        group_id: String,
        group: PendingGroup<'_>,
        warnings: &mut Vec<CompileWarning>,
    ) -> RouteGroup {
        let canary = self.registry.is_canary(&group.kind);

        let mut members = Vec::new();
        let mut shadow: Option<CompiledMapping> = None;
        let mut rejected_shadows = Vec::new();
        for entry in group.entries {
            let is_shadow = entry.mapping.shadow;
            let mut compiled = CompiledMapping {
                mapping: entry.mapping.clone(),
                group_id: entry.group_id,
                route_weight: entry.route_weight,
                canary_weight: None,
                tls_context: None,
                sni_bound: false,
            };
            if !is_shadow {
                members.push(compiled);
                continue;
            }
            compiled.canary_weight = Some(
                compiled
                    .mapping
                    .clamped_weight()
                    .unwrap_or(DEFAULT_SHADOW_WEIGHT),
            );
            match &shadow {
                None => shadow = Some(compiled),
                Some(kept) => {
                    warnings.push(CompileWarning::ExtraShadow {
                        group_id: group_id.clone(),
                        resource_key: compiled.mapping.resource_key.clone(),
                        kept: kept.mapping.resource_key.clone(),
                    });
                    rejected_shadows.push(compiled);
                }
            }
        }

        let mut total_weight = None;
        if canary && !members.is_empty() {
            let declared: Vec<Option<u32>> =
                members.iter().map(|m| m.mapping.clamped_weight()).collect();
            let balanced = canary::balance(&declared);
            for (member, weight) in members.iter_mut().zip(&balanced.weights) {
                member.canary_weight = Some(*weight);
            }
            total_weight = Some(balanced.total());
            if let Some(issue) = balanced.issue {
                warnings.push(CompileWarning::Canary {
                    group_id: group_id.clone(),
                    issue,
                });
            }
        }

        RouteGroup {
            group_id,
            kind: group.kind,
            label: group.label,
            members,
            total_weight,
            shadow,
            rejected_shadows,
        }
    }
}

impl Default for GroupCompiler {
    fn default() -> Self {
        Self::new(KindRegistry::builtin())
    }
}
