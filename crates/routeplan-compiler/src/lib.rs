//! routeplan-compiler — turns a snapshot of Mapping resources into an
//! ordered, canary-balanced, SNI-bound route table.
//!
//! # Components
//!
//! - **`registry`** — per-kind capabilities (group key, route weight, canary)
//! - **`kinds`** — built-in HTTP and TCP kind families
//! - **`group_key`** — which mappings describe the same logical route
//! - **`route_weight`** — total order within and across groups
//! - **`canary`** — traffic weights normalized to 100
//! - **`tls`** — first-match SNI binding
//! - **`compiler`** — the reconciliation pass tying them together
//!
//! Compilation is pure and synchronous: no I/O, no shared mutable state.

pub mod canary;
pub mod compiler;
pub mod error;
pub mod group_key;
pub mod kinds;
pub mod registry;
pub mod route_weight;
pub mod table;
pub mod tls;

pub use canary::{Balanced, CanaryIssue, TOTAL_WEIGHT, balance};
pub use compiler::GroupCompiler;
pub use error::{Capability, CompileError, CompileResult, RegistryError};
pub use group_key::{GroupKey, resolve_group_key};
pub use registry::{GroupKeyPart, KindCapabilities, KindRegistry, RouteWeightPart};
pub use route_weight::{RouteWeight, route_weight};
pub use table::{Compilation, CompileStats, CompileWarning, CompiledMapping, RouteGroup, RouteTable};
pub use tls::{TlsBinder, TlsBinding, bind};
