//! Workspace placeholder crate.
//!
//! Enabling `desktop-shims` (the default) pulls in `core-service` with its
//! reqwest-backed transport and re-exports the façade.

#[cfg(feature = "desktop-shims")]
pub use core_service::{CoreError, CoreService};
