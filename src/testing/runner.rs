//! Test case execution
//!
//! A test case walks four stages in order against one target object:
//! pre-fetch, pre-validate, trigger, post-validate. A failure in any of
//! the first three aborts the rest and fails the test case. The
//! post-validation check only ever warns.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::Value;
use tracing::Instrument;

use crate::common::{Error, Result};
use crate::gateway::types::sample_names;
use crate::gateway::{ObjectRecord, ResourceGateway};
use crate::hooks::SimulatedHooks;

use super::config::{
    Component, MockKind, MockOperation, TestCaseConfig, TriggerAction, ValidationStage,
};

/// Number of object names shown after each pre-fetch listing
const SAMPLE_SIZE: usize = 3;

/// Placeholder passed to hooks when an entry omits its host or command
const UNSPECIFIED: &str = "<unspecified>";

/// The four stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    PreFetch,
    PreValidate,
    Trigger,
    PostValidate,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::PreFetch => write!(f, "pre-fetch"),
            Stage::PreValidate => write!(f, "pre-validation"),
            Stage::Trigger => write!(f, "trigger"),
            Stage::PostValidate => write!(f, "post-validation"),
        }
    }
}

/// Outcome of a test case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TestStatus {
    Pass,
    Fail,
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestStatus::Pass => write!(f, "PASS"),
            TestStatus::Fail => write!(f, "FAIL"),
        }
    }
}

/// Result of one test case execution
#[derive(Debug, Clone, Serialize)]
pub struct TestCaseResult {
    pub name: String,
    pub status: TestStatus,
    /// Wall time from just before pre-fetch to completion
    #[serde(rename = "duration_secs", serialize_with = "serialize_secs")]
    pub duration: Duration,
    /// When execution started
    pub timestamp: DateTime<Utc>,
    /// Stage that failed, on FAIL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_stage: Option<Stage>,
    /// Failure message, on FAIL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TestCaseResult {
    pub fn passed(&self) -> bool {
        self.status == TestStatus::Pass
    }

    /// Result for a test case whose worker never reported back
    pub(crate) fn aborted(name: String, timestamp: DateTime<Utc>, reason: String) -> Self {
        Self {
            name,
            status: TestStatus::Fail,
            duration: Duration::ZERO,
            timestamp,
            failed_stage: None,
            error: Some(reason),
        }
    }
}

pub(crate) fn serialize_secs<S: Serializer>(
    duration: &Duration,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}

/// One staged scenario bound to a gateway
///
/// Created fresh for every execution and consumed by [`TestCase::execute`].
pub struct TestCase {
    config: Arc<TestCaseConfig>,
    gateway: Arc<dyn ResourceGateway>,
    hooks: Arc<dyn SimulatedHooks>,
    /// Resolved during pre-validation
    target_uuid: Option<String>,
}

impl TestCase {
    /// Build a test case, rejecting configurations with missing stages or
    /// unknown component tags
    pub fn new(
        config: Arc<TestCaseConfig>,
        gateway: Arc<dyn ResourceGateway>,
        hooks: Arc<dyn SimulatedHooks>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            gateway,
            hooks,
            target_uuid: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Run all reachable stages and produce the result
    ///
    /// Never returns an error: failures are captured in the result.
    pub async fn execute(mut self) -> TestCaseResult {
        let span = tracing::info_span!("test_case", name = %self.config.name);
        async move {
            tracing::info!("Executing test case");
            if let Some(desc) = &self.config.description {
                tracing::debug!(description = %desc);
            }

            let timestamp = Utc::now();
            let start = Instant::now();
            let outcome = self.run_stages().await;
            let duration = start.elapsed();

            match outcome {
                Ok(()) => {
                    tracing::info!(duration_secs = duration.as_secs_f64(), "Test case PASS");
                    TestCaseResult {
                        name: self.config.name.clone(),
                        status: TestStatus::Pass,
                        duration,
                        timestamp,
                        failed_stage: None,
                        error: None,
                    }
                }
                Err((stage, e)) => {
                    tracing::error!(%stage, error = %e, "Test case FAIL");
                    TestCaseResult {
                        name: self.config.name.clone(),
                        status: TestStatus::Fail,
                        duration,
                        timestamp,
                        failed_stage: Some(stage),
                        error: Some(e.report()),
                    }
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn run_stages(&mut self) -> std::result::Result<(), (Stage, Error)> {
        self.pre_fetch()
            .await
            .map_err(|e| (Stage::PreFetch, e))?;
        self.pre_validate()
            .await
            .map_err(|e| (Stage::PreValidate, e))?;
        self.trigger().await.map_err(|e| (Stage::Trigger, e))?;
        self.post_validate().await;
        Ok(())
    }

    /// List each configured component and report counts
    async fn pre_fetch(&self) -> Result<()> {
        tracing::info!(stage = %Stage::PreFetch, "Entering stage");

        for component in self.config.components()? {
            let records = fetch_component(self.gateway.as_ref(), component).await;
            tracing::info!("Fetched {} {}", records.len(), component);
            if !records.is_empty() {
                tracing::info!("Sample: {:?}", sample_names(&records, SAMPLE_SIZE));
            }
        }
        Ok(())
    }

    /// Resolve the target and check its pre-condition field
    async fn pre_validate(&mut self) -> Result<()> {
        tracing::info!(stage = %Stage::PreValidate, "Entering stage");

        let config = Arc::clone(&self.config);
        let stage = validation_stage(&config, Stage::PreValidate)?;
        let name = target_name(&config)?;

        let object = self
            .gateway
            .find_virtual_service_by_name(name)
            .await
            .ok_or_else(|| Error::not_found(name))?;

        self.target_uuid = object
            .uuid()
            .filter(|uuid| !uuid.is_empty())
            .map(str::to_string);
        tracing::info!(
            object = name,
            uuid = self.target_uuid.as_deref().unwrap_or("<none>"),
            "Found target object"
        );

        let actual = field_value(&object, &stage.validate);
        if actual != stage.expected_value {
            return Err(Error::validation(
                &stage.validate,
                &actual,
                &stage.expected_value,
            ));
        }
        tracing::info!("Validation passed: {} = {}", stage.validate, actual);
        Ok(())
    }

    /// Perform the configured action, then the mock operations
    async fn trigger(&self) -> Result<()> {
        tracing::info!(stage = %Stage::Trigger, "Entering stage");

        let uuid = self
            .target_uuid
            .as_deref()
            .ok_or_else(|| Error::State("No target object uuid available".to_string()))?;

        let stage = self.config.stages.trigger.as_ref().ok_or_else(|| {
            Error::Configuration(format!("Test case '{}' has no trigger stage", self.config.name))
        })?;

        let action = stage.action();
        tracing::info!(%action, payload = %stage.payload, "Executing action");

        match action {
            TriggerAction::Disable => {
                let updated = self
                    .gateway
                    .update_virtual_service(uuid, &stage.payload)
                    .await
                    .filter(|record| !record.is_empty())
                    .ok_or_else(|| {
                        Error::TriggerFailed(format!(
                            "Update of virtual service '{}' returned no result",
                            uuid
                        ))
                    })?;
                tracing::info!(response = ?updated, "Virtual service updated");
            }
            TriggerAction::Other(name) => {
                tracing::warn!(action = %name, "Action performs no API call");
            }
        }

        for op in &self.config.mock_operations {
            dispatch_mock_operation(self.hooks.as_ref(), op);
        }
        Ok(())
    }

    /// Re-read the target and compare its post-condition field
    ///
    /// Mismatches and lookup misses are logged as warnings only.
    async fn post_validate(&self) {
        tracing::info!(stage = %Stage::PostValidate, "Entering stage");

        if self.target_uuid.is_none() {
            tracing::debug!("No resolved target, skipping post-validation");
            return;
        }

        let stage = match validation_stage(&self.config, Stage::PostValidate) {
            Ok(stage) => stage,
            Err(e) => {
                tracing::warn!(error = %e, "Post-validation skipped");
                return;
            }
        };
        let Ok(name) = target_name(&self.config) else {
            return;
        };

        let Some(object) = self.gateway.find_virtual_service_by_name(name).await else {
            tracing::warn!(object = name, "Post-validation warning: target object no longer found");
            return;
        };

        let actual = field_value(&object, &stage.validate);
        if actual == stage.expected_value {
            tracing::info!("Post-validation passed: {} = {}", stage.validate, actual);
        } else {
            tracing::warn!(
                "Post-validation warning: {} = {} (expected {})",
                stage.validate,
                actual,
                stage.expected_value
            );
        }
    }
}

fn target_name(config: &TestCaseConfig) -> Result<&str> {
    config
        .target_object_name
        .as_deref()
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| Error::Configuration("No target object specified".to_string()))
}

fn validation_stage(config: &TestCaseConfig, stage: Stage) -> Result<&ValidationStage> {
    let found = match stage {
        Stage::PreValidate => config.stages.pre_validation.as_ref(),
        Stage::PostValidate => config.stages.post_validation.as_ref(),
        Stage::PreFetch | Stage::Trigger => None,
    };
    found.ok_or_else(|| {
        Error::Configuration(format!(
            "Test case '{}' has no {} stage",
            config.name, stage
        ))
    })
}

/// List the collection a component tag stands for
async fn fetch_component(
    gateway: &dyn ResourceGateway,
    component: Component,
) -> Vec<ObjectRecord> {
    match component {
        Component::Tenants => gateway.list_tenants().await,
        Component::VirtualServices => gateway.list_virtual_services().await,
        Component::ServiceEngines => gateway.list_service_engines().await,
    }
}

/// Invoke exactly one hook for a mock operation entry
fn dispatch_mock_operation(hooks: &dyn SimulatedHooks, op: &MockOperation) {
    let host = op.host.as_deref().unwrap_or(UNSPECIFIED);
    match op.kind {
        MockKind::Ssh => match op.operation.as_deref() {
            Some("execute_command") | Some("execute") => {
                hooks.remote_shell_execute(op.command.as_deref().unwrap_or(UNSPECIFIED))
            }
            _ => hooks.remote_shell_connect(host),
        },
        MockKind::Rdp => hooks.remote_desktop_validate(host),
    }
}

/// A field's value, null when absent
fn field_value(object: &ObjectRecord, field: &str) -> Value {
    object.field(field).cloned().unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{GatewayCall, InMemoryGateway};
    use crate::hooks::{HookCall, RecordingHooks};
    use crate::testing::config::TestSuite;
    use serde_json::json;

    fn disable_config(target: &str) -> TestCaseConfig {
        let yaml = format!(
            r#"
test_cases:
  - name: "t1"
    target_object_name: "{}"
    stages:
      pre_fetcher:
        components: ["tenants", "virtual_services", "service_engines"]
      pre_validation:
        validate: "enabled"
        expected_value: true
      trigger:
        action: "disable"
        payload:
          enabled: false
      post_validation:
        validate: "enabled"
        expected_value: false
    mock_operations:
      - type: "ssh"
        operation: "connect"
        host: "mock_host_1"
      - type: "ssh"
        operation: "execute_command"
        command: "show service status"
      - type: "rdp"
        operation: "validate_connection"
        host: "mock_host_2"
"#,
            target
        );
        TestSuite::parse(&yaml).unwrap().test_cases.remove(0)
    }

    fn seeded_gateway() -> InMemoryGateway {
        InMemoryGateway::new()
            .with_tenant(json!({"name": "admin", "uuid": "tenant-1"}))
            .with_service_engine(json!({"name": "se-1", "uuid": "se-1"}))
            .with_virtual_service(json!({"name": "vs-A", "uuid": "vs-1", "enabled": true}))
    }

    async fn run(
        config: TestCaseConfig,
        gateway: Arc<InMemoryGateway>,
        hooks: Arc<RecordingHooks>,
    ) -> TestCaseResult {
        TestCase::new(Arc::new(config), gateway, hooks)
            .unwrap()
            .execute()
            .await
    }

    #[tokio::test]
    async fn test_disable_passes() {
        let gateway = Arc::new(seeded_gateway());
        let hooks = Arc::new(RecordingHooks::new());

        let result = run(disable_config("vs-A"), gateway.clone(), hooks.clone()).await;

        assert_eq!(result.status, TestStatus::Pass);
        assert!(result.error.is_none());
        assert_eq!(gateway.update_count(), 1);
        assert_eq!(
            gateway.virtual_service("vs-A").unwrap().field("enabled"),
            Some(&json!(false))
        );
    }

    #[tokio::test]
    async fn test_stages_call_gateway_in_order() {
        let gateway = Arc::new(seeded_gateway());
        let hooks = Arc::new(RecordingHooks::new());

        run(disable_config("vs-A"), gateway.clone(), hooks).await;

        assert_eq!(
            gateway.calls(),
            vec![
                GatewayCall::ListTenants,
                GatewayCall::ListVirtualServices,
                GatewayCall::ListServiceEngines,
                GatewayCall::FindVirtualService("vs-A".to_string()),
                GatewayCall::UpdateVirtualService {
                    uuid: "vs-1".to_string(),
                    payload: json!({"enabled": false}),
                },
                GatewayCall::FindVirtualService("vs-A".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_target_fails_without_update() {
        let gateway = Arc::new(seeded_gateway());
        let hooks = Arc::new(RecordingHooks::new());

        let result = run(disable_config("vs-missing"), gateway.clone(), hooks.clone()).await;

        assert_eq!(result.status, TestStatus::Fail);
        assert_eq!(result.failed_stage, Some(Stage::PreValidate));
        assert!(result.error.as_deref().unwrap().contains("NOT_FOUND"));
        assert_eq!(gateway.update_count(), 0);
        assert!(hooks.calls().is_empty());
    }

    #[tokio::test]
    async fn test_precondition_mismatch_fails_without_update() {
        let gateway = Arc::new(
            InMemoryGateway::new()
                .with_virtual_service(json!({"name": "vs-A", "uuid": "vs-1", "enabled": false})),
        );
        let hooks = Arc::new(RecordingHooks::new());

        let result = run(disable_config("vs-A"), gateway.clone(), hooks).await;

        assert_eq!(result.status, TestStatus::Fail);
        assert!(result.error.as_deref().unwrap().contains("VALIDATION_ERROR"));
        assert_eq!(gateway.update_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_field_compares_as_null() {
        let gateway = Arc::new(
            InMemoryGateway::new().with_virtual_service(json!({"name": "vs-A", "uuid": "vs-1"})),
        );
        let result = run(
            disable_config("vs-A"),
            gateway,
            Arc::new(RecordingHooks::new()),
        )
        .await;
        assert_eq!(result.status, TestStatus::Fail);
        assert!(result
            .error
            .as_deref()
            .unwrap()
            .contains("enabled = null (expected true)"));
    }

    #[tokio::test]
    async fn test_missing_target_name_is_configuration_error() {
        let gateway = Arc::new(seeded_gateway());
        let mut config = disable_config("vs-A");
        config.target_object_name = None;

        let result = run(config, gateway.clone(), Arc::new(RecordingHooks::new())).await;

        assert_eq!(result.status, TestStatus::Fail);
        assert!(result
            .error
            .as_deref()
            .unwrap()
            .contains("CONFIGURATION_ERROR"));
        assert!(!gateway
            .calls()
            .iter()
            .any(|c| matches!(c, GatewayCall::FindVirtualService(_))));
    }

    #[tokio::test]
    async fn test_target_without_uuid_is_state_error() {
        for target in [
            json!({"name": "vs-A", "enabled": true}),
            json!({"name": "vs-A", "uuid": "", "enabled": true}),
        ] {
            let gateway = Arc::new(InMemoryGateway::new().with_virtual_service(target.clone()));
            let result = run(
                disable_config("vs-A"),
                gateway.clone(),
                Arc::new(RecordingHooks::new()),
            )
            .await;
            assert_eq!(result.status, TestStatus::Fail, "target {}", target);
            assert_eq!(result.failed_stage, Some(Stage::Trigger));
            assert!(result.error.as_deref().unwrap().contains("STATE_ERROR"));
            assert_eq!(gateway.update_count(), 0);
        }
    }

    /// Gateway whose updates succeed with an empty body
    struct EmptyUpdateGateway(InMemoryGateway);

    #[async_trait::async_trait]
    impl ResourceGateway for EmptyUpdateGateway {
        async fn list_tenants(&self) -> Vec<ObjectRecord> {
            self.0.list_tenants().await
        }

        async fn list_virtual_services(&self) -> Vec<ObjectRecord> {
            self.0.list_virtual_services().await
        }

        async fn list_service_engines(&self) -> Vec<ObjectRecord> {
            self.0.list_service_engines().await
        }

        async fn find_virtual_service_by_name(&self, name: &str) -> Option<ObjectRecord> {
            self.0.find_virtual_service_by_name(name).await
        }

        async fn update_virtual_service(
            &self,
            _uuid: &str,
            _payload: &Value,
        ) -> Option<ObjectRecord> {
            ObjectRecord::from_value(json!({}))
        }
    }

    #[tokio::test]
    async fn test_empty_update_response_is_trigger_failure() {
        let hooks = Arc::new(RecordingHooks::new());
        let result = TestCase::new(
            Arc::new(disable_config("vs-A")),
            Arc::new(EmptyUpdateGateway(seeded_gateway())),
            hooks.clone(),
        )
        .unwrap()
        .execute()
        .await;

        assert_eq!(result.status, TestStatus::Fail);
        assert_eq!(result.failed_stage, Some(Stage::Trigger));
        assert!(result.error.as_deref().unwrap().contains("TRIGGER_FAILED"));
        assert!(hooks.calls().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_update_is_trigger_failure() {
        let gateway = Arc::new(seeded_gateway().rejecting_updates());
        let hooks = Arc::new(RecordingHooks::new());

        let result = run(disable_config("vs-A"), gateway.clone(), hooks.clone()).await;

        assert_eq!(result.status, TestStatus::Fail);
        assert_eq!(result.failed_stage, Some(Stage::Trigger));
        assert!(result.error.as_deref().unwrap().contains("TRIGGER_FAILED"));
        assert!(hooks.calls().is_empty());
        // No post-validation lookup after a failed trigger
        let finds = gateway
            .calls()
            .iter()
            .filter(|c| matches!(c, GatewayCall::FindVirtualService(_)))
            .count();
        assert_eq!(finds, 1);
    }

    #[tokio::test]
    async fn test_mock_operations_invoked_once_in_order() {
        let gateway = Arc::new(seeded_gateway());
        let hooks = Arc::new(RecordingHooks::new());

        run(disable_config("vs-A"), gateway, hooks.clone()).await;

        assert_eq!(
            hooks.calls(),
            vec![
                HookCall::RemoteShellConnect("mock_host_1".to_string()),
                HookCall::RemoteShellExecute("show service status".to_string()),
                HookCall::RemoteDesktopValidate("mock_host_2".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_other_action_is_noop_but_runs_mocks() {
        let gateway = Arc::new(seeded_gateway());
        let hooks = Arc::new(RecordingHooks::new());
        let mut config = disable_config("vs-A");
        if let Some(trigger) = config.stages.trigger.as_mut() {
            trigger.action = "enable".to_string();
        }

        let result = run(config, gateway.clone(), hooks.clone()).await;

        // Post-condition (enabled = false) no longer holds, but only warns
        assert_eq!(result.status, TestStatus::Pass);
        assert_eq!(gateway.update_count(), 0);
        assert_eq!(hooks.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_postcondition_mismatch_still_passes() {
        let gateway = Arc::new(seeded_gateway());
        let mut config = disable_config("vs-A");
        if let Some(post) = config.stages.post_validation.as_mut() {
            post.expected_value = json!("something else");
        }

        let result = run(config, gateway, Arc::new(RecordingHooks::new())).await;
        assert_eq!(result.status, TestStatus::Pass);
    }

    #[test]
    fn test_new_rejects_missing_stage() {
        let mut config = disable_config("vs-A");
        config.stages.post_validation = None;
        let err = TestCase::new(
            Arc::new(config),
            Arc::new(InMemoryGateway::new()),
            Arc::new(RecordingHooks::new()),
        )
        .err()
        .unwrap();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_dispatch_defaults() {
        let hooks = RecordingHooks::new();
        let ops = TestSuite::parse(
            r#"
test_cases:
  - name: "t"
    mock_operations:
      - type: "ssh"
      - type: "ssh"
        operation: "execute"
      - type: "rdp"
"#,
        )
        .unwrap()
        .test_cases
        .remove(0)
        .mock_operations;
        for op in &ops {
            dispatch_mock_operation(&hooks, op);
        }
        assert_eq!(
            hooks.calls(),
            vec![
                HookCall::RemoteShellConnect(UNSPECIFIED.to_string()),
                HookCall::RemoteShellExecute(UNSPECIFIED.to_string()),
                HookCall::RemoteDesktopValidate(UNSPECIFIED.to_string()),
            ]
        );
    }

    #[test]
    fn test_result_serializes_status_and_seconds() {
        let result = TestCaseResult {
            name: "t1".to_string(),
            status: TestStatus::Fail,
            duration: Duration::from_millis(1500),
            timestamp: Utc::now(),
            failed_stage: Some(Stage::PreValidate),
            error: Some("[NOT_FOUND] Object 'vs-A' not found".to_string()),
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["status"], json!("FAIL"));
        assert_eq!(value["duration_secs"], json!(1.5));
        assert_eq!(value["failed_stage"], json!("pre_validate"));
    }
}
