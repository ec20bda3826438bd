//! Batch execution of test cases
//!
//! Sequential mode runs one test case at a time in input order with a
//! fixed pause between them. Concurrent mode fans out over a bounded set
//! of tasks and collects results in completion order. Either way every
//! test case yields exactly one result and a failing test case never
//! stops the batch.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures_util::stream::{self, StreamExt};
use serde::Serialize;

use crate::common::config::FrameworkConfig;
use crate::common::Result;
use crate::gateway::ResourceGateway;
use crate::hooks::SimulatedHooks;

use super::config::{validate_all, TestCaseConfig};
use super::runner::{serialize_secs, TestCase, TestCaseResult};

/// Default pause between sequential test cases
pub const DEFAULT_PACING: Duration = Duration::from_secs(1);

/// Default bound on concurrently running test cases
pub const DEFAULT_MAX_WORKERS: usize = 3;

/// How a batch is executed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// One at a time, in input order; results in input order
    Sequential,
    /// Bounded fan-out; results in completion order
    Concurrent,
}

/// Runs batches of test cases against a shared gateway
pub struct Scheduler {
    gateway: Arc<dyn ResourceGateway>,
    hooks: Arc<dyn SimulatedHooks>,
    max_workers: usize,
    pacing: Duration,
}

impl Scheduler {
    pub fn new(gateway: Arc<dyn ResourceGateway>, hooks: Arc<dyn SimulatedHooks>) -> Self {
        Self {
            gateway,
            hooks,
            max_workers: DEFAULT_MAX_WORKERS,
            pacing: DEFAULT_PACING,
        }
    }

    /// Build a scheduler using the worker bound and pacing from config
    pub fn from_config(
        gateway: Arc<dyn ResourceGateway>,
        hooks: Arc<dyn SimulatedHooks>,
        framework: &FrameworkConfig,
    ) -> Self {
        Self::new(gateway, hooks)
            .with_max_workers(framework.max_workers)
            .with_pacing(Duration::from_secs(framework.pacing_secs))
    }

    /// Bound the number of concurrently running test cases (minimum 1)
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    /// Set the pause between sequential test cases
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    /// Run every configuration and return one result per configuration
    ///
    /// All configurations are validated first; if any is invalid nothing
    /// runs and a configuration error is returned. A batch of one always
    /// runs sequentially.
    pub async fn run_all(
        &self,
        configs: &[TestCaseConfig],
        mode: ExecutionMode,
    ) -> Result<Vec<TestCaseResult>> {
        validate_all(configs)?;

        let cases = configs
            .iter()
            .cloned()
            .map(|config| {
                TestCase::new(
                    Arc::new(config),
                    Arc::clone(&self.gateway),
                    Arc::clone(&self.hooks),
                )
            })
            .collect::<Result<Vec<_>>>()?;

        let mode = if cases.len() <= 1 {
            ExecutionMode::Sequential
        } else {
            mode
        };

        let results = match mode {
            ExecutionMode::Sequential => self.run_sequential(cases).await,
            ExecutionMode::Concurrent => self.run_concurrent(cases).await,
        };
        Ok(results)
    }

    async fn run_sequential(&self, cases: Vec<TestCase>) -> Vec<TestCaseResult> {
        let mut results = Vec::with_capacity(cases.len());
        for (i, case) in cases.into_iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.pacing).await;
            }
            results.push(case.execute().await);
        }
        results
    }

    async fn run_concurrent(&self, cases: Vec<TestCase>) -> Vec<TestCaseResult> {
        tracing::info!(
            count = cases.len(),
            max_workers = self.max_workers,
            "Running test cases concurrently"
        );

        let results: Vec<TestCaseResult> = stream::iter(cases)
            .map(|case| {
                let name = case.name().to_string();
                let timestamp = Utc::now();
                let handle = tokio::spawn(case.execute());
                async move {
                    handle.await.unwrap_or_else(|e| {
                        tracing::error!(test_case = %name, error = %e, "Worker did not complete");
                        TestCaseResult::aborted(
                            name,
                            timestamp,
                            format!("[WORKER_ABORTED] {}", e),
                        )
                    })
                }
            })
            .buffer_unordered(self.max_workers)
            .collect()
            .await;

        tracing::info!("All concurrent test cases completed");
        results
    }
}

/// Aggregate counts over a batch of results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    #[serde(rename = "elapsed_secs", serialize_with = "serialize_secs")]
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn from_results(results: &[TestCaseResult], elapsed: Duration) -> Self {
        let passed = results.iter().filter(|r| r.passed()).count();
        Self {
            total: results.len(),
            passed,
            failed: results.len() - passed,
            elapsed,
        }
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Error;
    use crate::gateway::InMemoryGateway;
    use crate::hooks::RecordingHooks;
    use crate::testing::config::TestSuite;
    use crate::testing::runner::TestStatus;
    use serde_json::json;
    use std::collections::HashSet;

    fn suite(cases: &[(&str, &str)]) -> Vec<TestCaseConfig> {
        let mut yaml = String::from("test_cases:\n");
        for (name, target) in cases {
            yaml.push_str(&format!(
                r#"
  - name: "{name}"
    target_object_name: "{target}"
    stages:
      pre_fetcher:
        components: ["tenants"]
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
"#
            ));
        }
        TestSuite::parse(&yaml).unwrap().test_cases
    }

    fn gateway_with(targets: &[&str]) -> InMemoryGateway {
        targets.iter().enumerate().fold(
            InMemoryGateway::new().with_tenant(json!({"name": "admin"})),
            |gw, (i, name)| {
                gw.with_virtual_service(json!({
                    "name": name,
                    "uuid": format!("vs-{}", i),
                    "enabled": true
                }))
            },
        )
    }

    fn scheduler(gateway: Arc<InMemoryGateway>) -> Scheduler {
        Scheduler::new(gateway, Arc::new(RecordingHooks::new()))
    }

    #[tokio::test(start_paused = true)]
    async fn test_sequential_preserves_order_and_paces() {
        let configs = suite(&[("a", "vs-a"), ("b", "vs-b"), ("c", "vs-c")]);
        let gateway = Arc::new(gateway_with(&["vs-a", "vs-b", "vs-c"]));

        let start = tokio::time::Instant::now();
        let results = scheduler(gateway)
            .run_all(&configs, ExecutionMode::Sequential)
            .await
            .unwrap();
        let elapsed = start.elapsed();

        let names: Vec<_> = results.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert!(results.iter().all(|r| r.status == TestStatus::Pass));
        assert!(elapsed >= Duration::from_secs(2));
        assert!(elapsed < Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sequential_time_includes_every_case() {
        let configs = suite(&[("a", "vs-a"), ("b", "vs-b"), ("c", "vs-c")]);
        let gateway = Arc::new(
            gateway_with(&["vs-a", "vs-b", "vs-c"]).with_latency(Duration::from_secs(1)),
        );

        let start = tokio::time::Instant::now();
        let results = scheduler(gateway)
            .run_all(&configs, ExecutionMode::Sequential)
            .await
            .unwrap();
        let elapsed = start.elapsed();

        assert!(results.iter().all(|r| r.passed()));
        // Four 1s calls per case, no overlap, plus two pauses
        assert!(elapsed >= Duration::from_secs(3 * 4 + 2), "took {:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_does_not_stop_batch() {
        let configs = suite(&[("a", "vs-a"), ("missing", "vs-x"), ("c", "vs-c")]);
        let gateway = Arc::new(gateway_with(&["vs-a", "vs-c"]));

        let results = scheduler(gateway)
            .run_all(&configs, ExecutionMode::Sequential)
            .await
            .unwrap();

        let statuses: Vec<_> = results.iter().map(|r| r.status).collect();
        assert_eq!(
            statuses,
            vec![TestStatus::Pass, TestStatus::Fail, TestStatus::Pass]
        );
        let summary = RunSummary::from_results(&results, Duration::ZERO);
        assert_eq!((summary.total, summary.passed, summary.failed), (3, 2, 1));
        assert!(!summary.all_passed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_returns_every_result() {
        let targets: Vec<String> = (0..6).map(|i| format!("vs-{}", i)).collect();
        let pairs: Vec<(String, String)> = targets
            .iter()
            .enumerate()
            .map(|(i, t)| (format!("case-{}", i), t.clone()))
            .collect();
        let pair_refs: Vec<(&str, &str)> = pairs
            .iter()
            .map(|(n, t)| (n.as_str(), t.as_str()))
            .collect();
        let target_refs: Vec<&str> = targets.iter().map(String::as_str).collect();

        let configs = suite(&pair_refs);
        let gateway =
            Arc::new(gateway_with(&target_refs).with_latency(Duration::from_secs(1)));

        let start = tokio::time::Instant::now();
        let results = scheduler(gateway)
            .with_max_workers(6)
            .run_all(&configs, ExecutionMode::Concurrent)
            .await
            .unwrap();
        let elapsed = start.elapsed();

        assert_eq!(results.len(), 6);
        let names: HashSet<_> = results.iter().map(|r| r.name.clone()).collect();
        let expected: HashSet<_> = pairs.iter().map(|(n, _)| n.clone()).collect();
        assert_eq!(names, expected);
        assert!(results.iter().all(|r| r.passed()));

        // Each case makes 4 calls of 1s; run serially this would be 24s + pacing
        assert!(elapsed < Duration::from_secs(10), "took {:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_respects_worker_bound() {
        let configs = suite(&[("a", "vs-a"), ("b", "vs-b"), ("c", "vs-c"), ("d", "vs-d")]);
        let gateway = Arc::new(
            gateway_with(&["vs-a", "vs-b", "vs-c", "vs-d"]).with_latency(Duration::from_secs(1)),
        );

        let start = tokio::time::Instant::now();
        let results = scheduler(gateway)
            .with_max_workers(2)
            .run_all(&configs, ExecutionMode::Concurrent)
            .await
            .unwrap();

        assert_eq!(results.len(), 4);
        // Two waves of 4s each
        assert!(start.elapsed() >= Duration::from_secs(8));
    }

    #[tokio::test]
    async fn test_invalid_config_runs_nothing() {
        let mut configs = suite(&[("a", "vs-a"), ("b", "vs-b")]);
        configs[1].stages.trigger = None;
        let gateway = Arc::new(gateway_with(&["vs-a", "vs-b"]));

        let err = scheduler(gateway.clone())
            .run_all(&configs, ExecutionMode::Concurrent)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Configuration(_)));
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let results = scheduler(Arc::new(InMemoryGateway::new()))
            .run_all(&[], ExecutionMode::Concurrent)
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_worker_bound_minimum() {
        let s = scheduler(Arc::new(InMemoryGateway::new())).with_max_workers(0);
        assert_eq!(s.max_workers, 1);
    }

    #[test]
    fn test_from_config() {
        let framework = FrameworkConfig {
            max_workers: 5,
            pacing_secs: 0,
            ..FrameworkConfig::default()
        };
        let s = Scheduler::from_config(
            Arc::new(InMemoryGateway::new()),
            Arc::new(RecordingHooks::new()),
            &framework,
        );
        assert_eq!(s.max_workers, 5);
        assert_eq!(s.pacing, Duration::ZERO);
    }
}
