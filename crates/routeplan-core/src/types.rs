//! Input types for a reconciliation pass.
//!
//! A `Snapshot` is everything one pass sees: the mappings discovered in the
//! cluster and the TLS contexts available for SNI binding. All of it is
//! read-only once loaded; derived routing state lives in the compiler's
//! output types.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Host value meaning "any host".
pub const ANY_HOST: &str = "*";

/// Kind name of the default HTTP mapping.
pub const HTTP_MAPPING_KIND: &str = "Mapping";

/// Kind name of the default TCP mapping.
pub const TCP_MAPPING_KIND: &str = "TCPMapping";

// ── Mapping ───────────────────────────────────────────────────────

/// A single routing declaration, as authored in some namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mapping {
    /// Unique key of the source resource within the cluster.
    pub resource_key: String,
    pub name: String,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Registered kind name, e.g. `Mapping` or `TCPMapping`.
    pub kind: String,
    /// Exact host to match. `None`, empty, or `*` match any host.
    #[serde(default)]
    pub host: Option<String>,
    /// Path prefix (HTTP kinds).
    #[serde(default)]
    pub prefix: Option<String>,
    /// Listener port (TCP kinds).
    #[serde(default)]
    pub port: Option<u16>,
    /// HTTP method restriction.
    #[serde(default)]
    pub method: Option<String>,
    /// Exact-value header matchers.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Upstream service, e.g. `quote.default:80`.
    #[serde(default)]
    pub service: String,
    #[serde(default)]
    pub rewrite: Option<String>,
    /// Explicit ordering override. Higher sorts first.
    #[serde(default)]
    pub precedence: i32,
    /// Declared canary percentage. Clamped to 0..=100 when balanced.
    #[serde(default)]
    pub weight: Option<i64>,
    /// Mirror traffic instead of serving it.
    #[serde(default)]
    pub shadow: bool,
    /// Resource-level grouping override.
    #[serde(default)]
    pub group: Option<String>,
}

fn default_namespace() -> String {
    "default".to_string()
}

impl Mapping {
    /// A mapping with only identity and kind set.
    pub fn new(resource_key: &str, name: &str, namespace: &str, kind: &str) -> Self {
        Self {
            resource_key: resource_key.to_string(),
            name: name.to_string(),
            namespace: namespace.to_string(),
            kind: kind.to_string(),
            host: None,
            prefix: None,
            port: None,
            method: None,
            headers: BTreeMap::new(),
            service: String::new(),
            rewrite: None,
            precedence: 0,
            weight: None,
            shadow: false,
            group: None,
        }
    }

    /// The concrete host this mapping is restricted to, if any.
    pub fn exact_host(&self) -> Option<&str> {
        match self.host.as_deref().map(str::trim) {
            None | Some("") | Some(ANY_HOST) => None,
            Some(host) => Some(host),
        }
    }

    /// Host component used in group keys (`*` for any host).
    pub fn host_or_any(&self) -> &str {
        self.exact_host().unwrap_or(ANY_HOST)
    }

    /// The declared prefix in canonical form, `/` when absent.
    pub fn normalized_prefix(&self) -> String {
        normalize_prefix(self.prefix.as_deref().unwrap_or("/"))
    }

    /// The declared weight clamped to a percentage.
    pub fn clamped_weight(&self) -> Option<u32> {
        self.weight.map(|w| w.clamp(0, 100) as u32)
    }
}

/// Canonicalize a path prefix: trim, force a leading `/`, and collapse
/// runs of `/`. A trailing slash is kept since it changes what matches.
pub fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim();
    let mut out = String::with_capacity(trimmed.len() + 1);
    out.push('/');
    for ch in trimmed.chars() {
        if ch == '/' && out.ends_with('/') {
            continue;
        }
        out.push(ch);
    }
    out
}

// ── TLS ───────────────────────────────────────────────────────────

/// A pre-validated TLS context serving a set of SNI hosts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsContext {
    pub name: String,
    /// Exact SNI host names, in declaration order.
    #[serde(default)]
    pub hosts: Vec<String>,
    /// Opaque reference to the certificate secret.
    #[serde(default)]
    pub secret: Option<String>,
}

impl TlsContext {
    pub fn new(name: &str, hosts: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            hosts: hosts.iter().map(|h| h.to_string()).collect(),
            secret: None,
        }
    }

    /// Whether this context claims `host` exactly.
    pub fn serves(&self, host: &str) -> bool {
        self.hosts.iter().any(|h| h == host)
    }
}

// ── Snapshot ──────────────────────────────────────────────────────

/// Input of one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub mappings: Vec<Mapping>,
    #[serde(default)]
    pub tls_contexts: Vec<TlsContext>,
}

impl Snapshot {
    pub fn new(mappings: Vec<Mapping>, tls_contexts: Vec<TlsContext>) -> Self {
        Self {
            mappings,
            tls_contexts,
        }
    }

    /// Load a snapshot from a TOML file with `[[mappings]]` and
    /// `[[tls_contexts]]` arrays.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }
}
