//! Compiled output: the route table handed to the renderer, and the
//! warnings collected while building it.

use std::fmt;

use routeplan_core::Mapping;
use serde::{Deserialize, Serialize};

use crate::canary::CanaryIssue;
use crate::route_weight::RouteWeight;

// ── Route table ───────────────────────────────────────────────────

/// A mapping plus everything derived for it during the pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledMapping {
    pub mapping: Mapping,
    pub group_id: String,
    pub route_weight: RouteWeight,
    /// Balanced canary percentage (members of canary groups) or mirrored
    /// percentage (shadows). `None` for kinds without canary routing.
    pub canary_weight: Option<u32>,
    /// Name of the bound TLS context.
    pub tls_context: Option<String>,
    pub sni_bound: bool,
}

impl CompiledMapping {
    pub fn resource_key(&self) -> &str {
        &self.mapping.resource_key
    }
}

/// Mappings that compete for the same logical route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteGroup {
    pub group_id: String,
    pub kind: String,
    /// Readable form of the group key.
    pub label: String,
    /// Serving members in route-weight order.
    pub members: Vec<CompiledMapping>,
    /// Sum of member canary weights: 100 once balanced, `None` when the
    /// kind has no canary routing or the group has no serving members.
    pub total_weight: Option<u32>,
    /// Traffic mirror for this route.
    pub shadow: Option<CompiledMapping>,
    /// Additional shadows that lost to `shadow`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rejected_shadows: Vec<CompiledMapping>,
}

impl RouteGroup {
    /// The entry that decides where the group sorts in the table.
    pub fn head(&self) -> Option<&CompiledMapping> {
        self.members
            .first()
            .or(self.shadow.as_ref())
            .or(self.rejected_shadows.first())
    }

    /// Every mapping in the group: members, shadow, rejected shadows.
    pub fn all_mappings(&self) -> impl Iterator<Item = &CompiledMapping> {
        self.members
            .iter()
            .chain(self.shadow.iter())
            .chain(self.rejected_shadows.iter())
    }
}

/// Final, ordered output of a pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteTable {
    pub groups: Vec<RouteGroup>,
}

impl RouteTable {
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn group(&self, group_id: &str) -> Option<&RouteGroup> {
        self.groups.iter().find(|g| g.group_id == group_id)
    }

    /// The group containing the mapping with `resource_key`.
    pub fn group_of(&self, resource_key: &str) -> Option<&RouteGroup> {
        self.groups
            .iter()
            .find(|g| g.all_mappings().any(|m| m.resource_key() == resource_key))
    }

    pub fn mappings(&self) -> impl Iterator<Item = &CompiledMapping> {
        self.groups.iter().flat_map(RouteGroup::all_mappings)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

// ── Warnings ──────────────────────────────────────────────────────

/// A recoverable problem found during a pass. The table is still emitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CompileWarning {
    Canary {
        group_id: String,
        issue: CanaryIssue,
    },
    AmbiguousTlsHost {
        host: String,
        chosen: String,
        also_claimed_by: Vec<String>,
    },
    ExtraShadow {
        group_id: String,
        resource_key: String,
        kept: String,
    },
}

impl CompileWarning {
    /// Group this warning is attached to, if it is group-scoped.
    pub fn group_id(&self) -> Option<&str> {
        match self {
            CompileWarning::Canary { group_id, .. } | CompileWarning::ExtraShadow { group_id, .. } => {
                Some(group_id)
            }
            CompileWarning::AmbiguousTlsHost { .. } => None,
        }
    }
}

impl fmt::Display for CompileWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileWarning::Canary { group_id, issue } => write!(f, "group {group_id}: {issue}"),
            CompileWarning::AmbiguousTlsHost {
                host,
                chosen,
                also_claimed_by,
            } => write!(
                f,
                "host {host} claimed by several TLS contexts; using {chosen}, ignoring {}",
                also_claimed_by.join(", ")
            ),
            CompileWarning::ExtraShadow {
                group_id,
                resource_key,
                kept,
            } => write!(
                f,
                "group {group_id}: shadow {resource_key} ignored, {kept} already shadows this route"
            ),
        }
    }
}

// ── Pass result ───────────────────────────────────────────────────

/// Successful pass: the table plus its warnings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Compilation {
    pub table: RouteTable,
    pub warnings: Vec<CompileWarning>,
}

impl Compilation {
    pub fn warnings_for<'a>(&'a self, group_id: &'a str) -> impl Iterator<Item = &'a CompileWarning> {
        self.warnings
            .iter()
            .filter(move |w| w.group_id() == Some(group_id))
    }

    pub fn stats(&self) -> CompileStats {
        let mut stats = CompileStats {
            groups: self.table.len() as u32,
            warnings: self.warnings.len() as u32,
            ..Default::default()
        };
        for group in &self.table.groups {
            if group.total_weight.is_some() {
                stats.balanced_groups += 1;
            }
            for m in group.all_mappings() {
                stats.mappings += 1;
                if m.sni_bound {
                    stats.tls_bound += 1;
                }
            }
        }
        stats
    }
}

/// Compilation statistics.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CompileStats {
    pub mappings: u32,
    pub groups: u32,
    pub balanced_groups: u32,
    pub tls_bound: u32,
    pub warnings: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use routeplan_core::HTTP_MAPPING_KIND;

    fn make_compiled(rkey: &str, group_id: &str, sni_bound: bool) -> CompiledMapping {
        CompiledMapping {
            mapping: Mapping::new(rkey, rkey, "default", HTTP_MAPPING_KIND),
            group_id: group_id.to_string(),
            route_weight: RouteWeight {
                precedence: 0,
                discriminants: vec![0, 0],
                specificity: 1,
                resource_key: rkey.to_string(),
            },
            canary_weight: Some(100),
            tls_context: sni_bound.then(|| "ctx".to_string()),
            sni_bound,
        }
    }

    fn make_group(group_id: &str, members: Vec<CompiledMapping>) -> RouteGroup {
        RouteGroup {
            group_id: group_id.to_string(),
            kind: HTTP_MAPPING_KIND.to_string(),
            label: format!("{HTTP_MAPPING_KIND} *:/"),
            members,
            total_weight: Some(100),
            shadow: None,
            rejected_shadows: Vec::new(),
        }
    }

    #[test]
    fn head_falls_back_to_shadow() {
        let mut group = make_group("g1", vec![]);
        assert!(group.head().is_none());
        group.shadow = Some(make_compiled("s", "g1", false));
        assert_eq!(group.head().unwrap().resource_key(), "s");
    }

    #[test]
    fn lookup_by_resource_key() {
        let mut g2 = make_group("g2", vec![make_compiled("b", "g2", false)]);
        g2.shadow = Some(make_compiled("s", "g2", false));
        let table = RouteTable {
            groups: vec![make_group("g1", vec![make_compiled("a", "g1", true)]), g2],
        };

        assert_eq!(table.group_of("s").unwrap().group_id, "g2");
        assert_eq!(table.group_of("a").unwrap().group_id, "g1");
        assert!(table.group_of("zzz").is_none());
        assert_eq!(table.mappings().count(), 3);
        assert!(table.group("g2").is_some());
    }

    #[test]
    fn stats_count_everything() {
        let compilation = Compilation {
            table: RouteTable {
                groups: vec![make_group(
                    "g1",
                    vec![make_compiled("a", "g1", true), make_compiled("b", "g1", false)],
                )],
            },
            warnings: vec![CompileWarning::Canary {
                group_id: "g1".to_string(),
                issue: CanaryIssue::ZeroTotal,
            }],
        };

        let stats = compilation.stats();
        assert_eq!(stats.mappings, 2);
        assert_eq!(stats.groups, 1);
        assert_eq!(stats.balanced_groups, 1);
        assert_eq!(stats.tls_bound, 1);
        assert_eq!(stats.warnings, 1);
        assert_eq!(compilation.warnings_for("g1").count(), 1);
        assert_eq!(compilation.warnings_for("g2").count(), 0);
    }

    #[test]
    fn warning_serializes_with_type_tag() {
        let warning = CompileWarning::AmbiguousTlsHost {
            host: "x.com".to_string(),
            chosen: "A".to_string(),
            also_claimed_by: vec!["B".to_string()],
        };
        let json = serde_json::to_value(&warning).unwrap();
        assert_eq!(json["type"], "ambiguous_tls_host");
        assert_eq!(json["chosen"], "A");
        assert_eq!(
            warning.to_string(),
            "host x.com claimed by several TLS contexts; using A, ignoring B"
        );
        assert_eq!(warning.group_id(), None);
    }
}
