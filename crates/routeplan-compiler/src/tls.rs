//! SNI binding of route hosts to TLS contexts.
//!
//! Matching is exact and first-match: contexts are scanned in the order
//! they were supplied and the first one whose `hosts` contains the route's
//! host wins. A later context claiming the same host never overrides an
//! earlier one; the binder reports it so the conflict can be surfaced.

use std::collections::BTreeMap;

use routeplan_core::TlsContext;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// First context, in input order, that claims `host` exactly.
pub fn bind<'a>(host: &str, contexts: &'a [TlsContext]) -> Option<&'a TlsContext> {
    contexts.iter().find(|ctx| ctx.serves(host))
}

/// Result of binding one host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsBinding {
    /// Name of the authoritative (first matching) context.
    pub context: String,
    /// Later contexts that also claim the host, in input order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub also_claimed_by: Vec<String>,
}

impl TlsBinding {
    pub fn is_ambiguous(&self) -> bool {
        !self.also_claimed_by.is_empty()
    }
}

/// Binds hosts for one pass, scanning the contexts at most once per host.
pub struct TlsBinder<'a> {
    contexts: &'a [TlsContext],
    cache: BTreeMap<String, Option<TlsBinding>>,
}

impl<'a> TlsBinder<'a> {
    pub fn new(contexts: &'a [TlsContext]) -> Self {
        Self {
            contexts,
            cache: BTreeMap::new(),
        }
    }

    /// Binding for `host`, or `None` when no context claims it.
    pub fn resolve(&mut self, host: &str) -> Option<&TlsBinding> {
        if !self.cache.contains_key(host) {
            let binding = self.scan(host);
            self.cache.insert(host.to_string(), binding);
        }
        self.cache.get(host).and_then(Option::as_ref)
    }

    /// Hosts resolved so far, sorted, with their binding.
    pub fn resolved(&self) -> impl Iterator<Item = (&str, Option<&TlsBinding>)> {
        self.cache
            .iter()
            .map(|(host, binding)| (host.as_str(), binding.as_ref()))
    }

    /// Number of distinct hosts looked up.
    pub fn lookups(&self) -> usize {
        self.cache.len()
    }

    fn scan(&self, host: &str) -> Option<TlsBinding> {
        let mut claims = self.contexts.iter().filter(|ctx| ctx.serves(host));
        let Some(first) = claims.next() else {
            debug!(host, "no TLS context for host");
            return None;
        };
        info!(host, context = %first.name, "matched host with TLS context");

        Some(TlsBinding {
            context: first.name.clone(),
            also_claimed_by: claims.map(|ctx| ctx.name.clone()).collect(),
        })
    }
}
