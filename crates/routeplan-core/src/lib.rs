//! routeplan-core — data model shared by the routeplan crates.
//!
//! Mappings and TLS contexts arrive here already parsed and validated.
//! Nothing in this crate derives routing state; see `routeplan-compiler`
//! for grouping, ordering, canary balancing and SNI binding.

pub mod config;
pub mod types;

pub use config::{CompilerSettings, KindConfig, KindFamily, RouteplanConfig};
pub use types::*;
