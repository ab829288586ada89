//! Route weights — the total order among mappings.
//!
//! Compared in priority order:
//! 1. **precedence** — higher first; the operator's explicit override
//! 2. **discriminants** — kind-specific, higher first
//! 3. **specificity** — longer normalized prefix first, so `/foo/bar`
//!    matches before `/foo`
//! 4. **resource key** — ascending, so otherwise identical mappings
//!    still sort the same way on every pass

use std::cmp::Ordering;
use std::fmt;

use routeplan_core::Mapping;
use serde::{Deserialize, Serialize};

use crate::error::CompileResult;
use crate::registry::KindRegistry;

/// Sort key of a mapping. `Ord` puts the route that must be matched first
/// at the front.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteWeight {
    pub precedence: i32,
    pub discriminants: Vec<i64>,
    pub specificity: usize,
    pub resource_key: String,
}

impl Ord for RouteWeight {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .precedence
            .cmp(&self.precedence)
            .then_with(|| other.discriminants.cmp(&self.discriminants))
            .then_with(|| other.specificity.cmp(&self.specificity))
            .then_with(|| self.resource_key.cmp(&other.resource_key))
    }
}

impl PartialOrd for RouteWeight {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for RouteWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {:?}, {}, {}]",
            self.precedence, self.discriminants, self.specificity, self.resource_key
        )
    }
}

/// Compute the route weight of a mapping. Fails only when the mapping's
/// kind has no registered route weight capability.
pub fn route_weight(mapping: &Mapping, registry: &KindRegistry) -> CompileResult<RouteWeight> {
    let part = registry.route_weight_part(mapping)?;

    Ok(RouteWeight {
        precedence: mapping.precedence,
        discriminants: part.discriminants(mapping),
        specificity: mapping.normalized_prefix().chars().count(),
        resource_key: mapping.resource_key.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Capability, CompileError};
    use routeplan_core::HTTP_MAPPING_KIND;

    fn make_mapping(rkey: &str, prefix: &str, precedence: i32) -> Mapping {
        let mut m = Mapping::new(rkey, rkey, "default", HTTP_MAPPING_KIND);
        m.prefix = Some(prefix.to_string());
        m.precedence = precedence;
        m
    }

    fn weight_of(m: &Mapping) -> RouteWeight {
        route_weight(m, &KindRegistry::builtin()).unwrap()
    }

    fn sorted_keys(mappings: &[Mapping]) -> Vec<String> {
        let mut weights: Vec<RouteWeight> = mappings.iter().map(weight_of).collect();
        weights.sort();
        weights.into_iter().map(|w| w.resource_key).collect()
    }

    #[test]
    fn higher_precedence_first() {
        let low = make_mapping("a", "/foo/bar/", 0);
        let high = make_mapping("b", "/", 10);
        assert_eq!(sorted_keys(&[low, high]), vec!["b", "a"]);
    }

    #[test]
    fn negative_precedence_sorts_last() {
        let neg = make_mapping("a", "/foo/", -1);
        let zero = make_mapping("b", "/", 0);
        assert_eq!(sorted_keys(&[neg, zero]), vec!["b", "a"]);
    }

    #[test]
    fn longer_prefix_first() {
        let short = make_mapping("a", "/foo", 0);
        let long = make_mapping("b", "/foo/bar", 0);
        assert_eq!(sorted_keys(&[short, long]), vec!["b", "a"]);
    }

    #[test]
    fn specificity_uses_normalized_prefix() {
        let m = make_mapping("a", "//foo//", 0);
        assert_eq!(weight_of(&m).specificity, "/foo/".len());
    }

    #[test]
    fn header_matchers_beat_prefix_length() {
        let long = make_mapping("a", "/foo/bar/baz", 0);
        let mut with_header = make_mapping("b", "/", 0);
        with_header
            .headers
            .insert("x-canary".to_string(), "true".to_string());
        assert_eq!(sorted_keys(&[long, with_header]), vec!["b", "a"]);
    }

    #[test]
    fn ties_break_on_resource_key() {
        let b = make_mapping("qotm-b.default", "/qotm/", 0);
        let a = make_mapping("qotm-a.default", "/qotm/", 0);
        let c = make_mapping("qotm-c.canary", "/qotm/", 0);
        assert_eq!(
            sorted_keys(&[b, c, a]),
            vec!["qotm-a.default", "qotm-b.default", "qotm-c.canary"]
        );
    }

    #[test]
    fn ordering_is_total() {
        let a = weight_of(&make_mapping("a", "/x/", 0));
        let b = weight_of(&make_mapping("b", "/x/", 0));
        assert_eq!(a.cmp(&b), Ordering::Less);
        assert_eq!(b.cmp(&a), Ordering::Greater);
        assert_eq!(a.cmp(&a.clone()), Ordering::Equal);
    }

    #[test]
    fn display_lists_fields() {
        let w = weight_of(&make_mapping("a", "/x/", 3));
        assert_eq!(w.to_string(), "[3, [0, 0], 3, a]");
    }

    #[test]
    fn unknown_kind_is_fatal() {
        let mut m = make_mapping("a", "/", 0);
        m.kind = "GRPCMapping".to_string();
        let err = route_weight(&m, &KindRegistry::builtin()).unwrap_err();
        assert!(matches!(
            err,
            CompileError::MissingCapability {
                capability: Capability::RouteWeight,
                ..
            }
        ));
    }
}
