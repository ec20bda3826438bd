//! In-memory resource gateway
//!
//! Holds object collections in process and records every call, so test
//! cases can run without a control plane and tests can assert on exactly
//! which operations were issued.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::{ObjectRecord, ResourceGateway};

/// A recorded gateway call
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayCall {
    ListTenants,
    ListVirtualServices,
    ListServiceEngines,
    FindVirtualService(String),
    UpdateVirtualService { uuid: String, payload: Value },
}

/// Gateway backed by in-process collections
#[derive(Debug, Default)]
pub struct InMemoryGateway {
    tenants: Vec<ObjectRecord>,
    service_engines: Vec<ObjectRecord>,
    virtual_services: Mutex<Vec<ObjectRecord>>,
    calls: Mutex<Vec<GatewayCall>>,
    reject_updates: bool,
    latency: Option<Duration>,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tenant; non-object values are ignored
    pub fn with_tenant(mut self, tenant: Value) -> Self {
        self.tenants.extend(ObjectRecord::from_value(tenant));
        self
    }

    /// Add a service engine; non-object values are ignored
    pub fn with_service_engine(mut self, engine: Value) -> Self {
        self.service_engines.extend(ObjectRecord::from_value(engine));
        self
    }

    /// Add a virtual service; non-object values are ignored
    pub fn with_virtual_service(self, vs: Value) -> Self {
        if let Some(record) = ObjectRecord::from_value(vs) {
            self.lock_virtual_services().push(record);
        }
        self
    }

    /// Make every update return no result
    pub fn rejecting_updates(mut self) -> Self {
        self.reject_updates = true;
        self
    }

    /// Delay every call by `latency` to simulate a network round-trip
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// All calls received so far, in arrival order
    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Number of update calls received so far
    pub fn update_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, GatewayCall::UpdateVirtualService { .. }))
            .count()
    }

    /// Current state of a virtual service
    pub fn virtual_service(&self, name: &str) -> Option<ObjectRecord> {
        self.lock_virtual_services()
            .iter()
            .find(|vs| vs.name() == Some(name))
            .cloned()
    }

    fn lock_virtual_services(&self) -> std::sync::MutexGuard<'_, Vec<ObjectRecord>> {
        self.virtual_services
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn record(&self, call: GatewayCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl ResourceGateway for InMemoryGateway {
    async fn list_tenants(&self) -> Vec<ObjectRecord> {
        self.record(GatewayCall::ListTenants).await;
        self.tenants.clone()
    }

    async fn list_virtual_services(&self) -> Vec<ObjectRecord> {
        self.record(GatewayCall::ListVirtualServices).await;
        self.lock_virtual_services().clone()
    }

    async fn list_service_engines(&self) -> Vec<ObjectRecord> {
        self.record(GatewayCall::ListServiceEngines).await;
        self.service_engines.clone()
    }

    async fn find_virtual_service_by_name(&self, name: &str) -> Option<ObjectRecord> {
        self.record(GatewayCall::FindVirtualService(name.to_string()))
            .await;
        self.virtual_service(name)
    }

    async fn update_virtual_service(&self, uuid: &str, payload: &Value) -> Option<ObjectRecord> {
        self.record(GatewayCall::UpdateVirtualService {
            uuid: uuid.to_string(),
            payload: payload.clone(),
        })
        .await;

        if self.reject_updates {
            return None;
        }

        let mut services = self.lock_virtual_services();
        let record = services.iter_mut().find(|vs| vs.uuid() == Some(uuid))?;
        if let Value::Object(fields) = payload {
            for (key, value) in fields {
                record.fields_mut().insert(key.clone(), value.clone());
            }
        }
        Some(record.clone())
    }
}
