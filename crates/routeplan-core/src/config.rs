//! routeplan.toml configuration parser.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::types::{HTTP_MAPPING_KIND, TCP_MAPPING_KIND};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteplanConfig {
    #[serde(default)]
    pub compiler: CompilerSettings,
    /// Kind name → capability family. Replaces the built-in table when present.
    #[serde(default = "default_kinds")]
    pub kinds: BTreeMap<String, KindConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompilerSettings {
    /// Report hosts claimed by more than one TLS context.
    #[serde(default = "default_true")]
    pub warn_ambiguous_tls: bool,
}

impl Default for CompilerSettings {
    fn default() -> Self {
        Self {
            warn_ambiguous_tls: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KindConfig {
    /// Which built-in capability family implements this kind.
    pub family: Option<KindFamily>,
    /// Whether groups of this kind get canary weights.
    #[serde(default)]
    pub canary: bool,
}

/// Built-in capability families a kind can be registered against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KindFamily {
    Http,
    Tcp,
}

impl KindFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            KindFamily::Http => "http",
            KindFamily::Tcp => "tcp",
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_kinds() -> BTreeMap<String, KindConfig> {
    let mut kinds = BTreeMap::new();
    kinds.insert(
        HTTP_MAPPING_KIND.to_string(),
        KindConfig {
            family: Some(KindFamily::Http),
            canary: true,
        },
    );
    kinds.insert(
        TCP_MAPPING_KIND.to_string(),
        KindConfig {
            family: Some(KindFamily::Tcp),
            canary: false,
        },
    );
    kinds
}

impl Default for RouteplanConfig {
    fn default() -> Self {
        Self {
            compiler: CompilerSettings::default(),
            kinds: default_kinds(),
        }
    }
}

impl RouteplanConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: RouteplanConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registers_builtin_kinds() {
        let config = RouteplanConfig::default();
        assert_eq!(config.kinds.len(), 2);
        assert!(config.kinds["Mapping"].canary);
        assert_eq!(config.kinds["TCPMapping"].family, Some(KindFamily::Tcp));
        assert!(config.compiler.warn_ambiguous_tls);
    }

    #[test]
    fn test_parse_empty() {
        let config: RouteplanConfig = toml::from_str("").unwrap();
        assert_eq!(config, RouteplanConfig::default());
    }

    #[test]
    fn test_parse_kind_aliases() {
        let toml_str = r#"
[compiler]
warn_ambiguous_tls = false

[kinds.AmbassadorMapping]
family = "http"
canary = true

[kinds.Unfinished]
"#;
        let config: RouteplanConfig = toml::from_str(toml_str).unwrap();
        assert!(!config.compiler.warn_ambiguous_tls);
        assert_eq!(config.kinds.len(), 2);
        assert_eq!(config.kinds["AmbassadorMapping"].family, Some(KindFamily::Http));
        assert_eq!(config.kinds["Unfinished"].family, None);
        assert!(!config.kinds["Unfinished"].canary);
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = RouteplanConfig::default();
        let toml_str = config.to_toml_string().unwrap();
        assert!(toml_str.contains("TCPMapping"));
        let back: RouteplanConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("routeplan.toml");
        std::fs::write(&path, "[compiler]\nwarn_ambiguous_tls = false\n").unwrap();

        let config = RouteplanConfig::from_file(&path).unwrap();
        assert!(!config.compiler.warn_ambiguous_tls);
        assert_eq!(config.kinds.len(), 2);
    }
}
