//! Built-in mapping kind families.
//!
//! - **`http`** — host + path prefix routes, refined by method and headers
//! - **`tcp`** — port-based routes, optionally restricted to an SNI host

use std::sync::Arc;

use routeplan_core::KindFamily;

use crate::registry::{GroupKeyPart, RouteWeightPart};

pub mod http;
pub mod tcp;

pub use http::HttpMapping;
pub use tcp::TcpMapping;

/// Capability implementations for a built-in family.
pub fn family_parts(family: KindFamily) -> (Arc<dyn GroupKeyPart>, Arc<dyn RouteWeightPart>) {
    match family {
        KindFamily::Http => (Arc::new(HttpMapping), Arc::new(HttpMapping)),
        KindFamily::Tcp => (Arc::new(TcpMapping), Arc::new(TcpMapping)),
    }
}
