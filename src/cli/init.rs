//! Default file generation for `lbprobe init`

use std::path::{Path, PathBuf};

use crate::common::paths::{self, CONFIG_FILE, CREDENTIALS_FILE, TEST_CASES_FILE};
use crate::common::Result;

const CONFIG_TEMPLATE: &str = r#"# Load balancer functional test runner configuration
[api]
base_url = "http://127.0.0.1:8080"
timeout_secs = 10

[api.endpoints]
register = "/register"
login = "/login1"
tenants = "/api/tenant"
virtual_services = "/api/virtualservice"
service_engines = "/api/serviceengine"

[framework]
parallel = false
max_workers = 3
pacing_secs = 1
log_dir = "logs"
"#;

const CREDENTIALS_TEMPLATE: &str = r#"[credentials]
username = "change-me"
password = "change-me"
"#;

const TEST_CASES_TEMPLATE: &str = r#"# Test case definitions
test_cases:
  - name: "disable_virtual_service"
    description: "Disable the virtual service named backend-vs-1"
    target_virtual_service: "backend-vs-1"

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
"#;

/// What happened to one template file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitOutcome {
    Created(PathBuf),
    Skipped(PathBuf),
}

/// Write the default files into `dir`, leaving existing files alone
/// unless `force` is set
pub fn write_defaults(dir: &Path, force: bool) -> Result<Vec<InitOutcome>> {
    paths::ensure_dir(dir)?;

    let mut outcomes = Vec::new();
    for (name, content) in [
        (CONFIG_FILE, CONFIG_TEMPLATE),
        (CREDENTIALS_FILE, CREDENTIALS_TEMPLATE),
        (TEST_CASES_FILE, TEST_CASES_TEMPLATE),
    ] {
        let path = dir.join(name);
        if path.exists() && !force {
            outcomes.push(InitOutcome::Skipped(path));
            continue;
        }
        std::fs::write(&path, content)?;
        outcomes.push(InitOutcome::Created(path));
    }
    Ok(outcomes)
}
