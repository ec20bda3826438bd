//! Resource gateway for the load-balancer control plane
//!
//! The test engine only talks to the control plane through the
//! [`ResourceGateway`] trait. Implementations are shared between
//! concurrently running test cases and must tolerate simultaneous
//! in-flight calls.

pub mod client;
pub mod memory;
pub mod types;

use async_trait::async_trait;
use serde_json::Value;

pub use client::HttpGateway;
pub use memory::{GatewayCall, InMemoryGateway};
pub use types::ObjectRecord;

/// Read/update operations on the control plane's object collections
///
/// Calls never fail: an unreachable backend or an error status is
/// reported as an empty list or `None`, which callers treat as
/// "nothing found".
#[async_trait]
pub trait ResourceGateway: Send + Sync {
    /// List all tenants
    async fn list_tenants(&self) -> Vec<ObjectRecord>;

    /// List all virtual services
    async fn list_virtual_services(&self) -> Vec<ObjectRecord>;

    /// List all service engines
    async fn list_service_engines(&self) -> Vec<ObjectRecord>;

    /// Look up a virtual service by its `name`
    async fn find_virtual_service_by_name(&self, name: &str) -> Option<ObjectRecord>;

    /// Apply `payload` to the virtual service with the given uuid,
    /// returning the updated object
    async fn update_virtual_service(&self, uuid: &str, payload: &Value) -> Option<ObjectRecord>;
}
