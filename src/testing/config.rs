//! Test case configuration types
//!
//! Defines the data structures for deserializing YAML test case
//! definitions, plus the validation pass run before anything executes.

use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::common::{Error, Result};

/// A test case definitions file
#[derive(Deserialize, Debug, Clone)]
pub struct TestSuite {
    /// Test cases in the order they should run
    pub test_cases: Vec<TestCaseConfig>,
}

/// One staged scenario against a single target object
#[derive(Deserialize, Debug, Clone)]
pub struct TestCaseConfig {
    /// Unique name of the test case
    pub name: String,
    /// Optional description of what the test verifies
    pub description: Option<String>,
    /// Name of the object the scenario operates on
    #[serde(alias = "target_virtual_service")]
    pub target_object_name: Option<String>,
    /// Stage parameters
    #[serde(default)]
    pub stages: Stages,
    /// Simulated side effects run after the trigger action
    #[serde(default)]
    pub mock_operations: Vec<MockOperation>,
}

/// The four fixed stages
///
/// Every key must be present; see [`TestCaseConfig::validate`].
#[derive(Deserialize, Debug, Clone, Default)]
pub struct Stages {
    pub pre_fetcher: Option<PreFetcherStage>,
    pub pre_validation: Option<ValidationStage>,
    pub trigger: Option<TriggerStage>,
    pub post_validation: Option<ValidationStage>,
}

/// Inventory fetch before validation
#[derive(Deserialize, Debug, Clone, Default)]
pub struct PreFetcherStage {
    /// Component tags to list, e.g. "tenants"
    #[serde(default)]
    pub components: Vec<String>,
}

/// Field check against the target object
#[derive(Deserialize, Debug, Clone)]
pub struct ValidationStage {
    /// Field to read from the target object
    pub validate: String,
    /// Value the field must equal (null when omitted)
    #[serde(default)]
    pub expected_value: Value,
}

/// Mutating action on the target object
#[derive(Deserialize, Debug, Clone)]
pub struct TriggerStage {
    /// Action name; only "disable" performs an update
    pub action: String,
    /// Body sent with the update
    #[serde(default = "default_payload")]
    pub payload: Value,
}

fn default_payload() -> Value {
    Value::Object(Default::default())
}

impl TriggerStage {
    pub fn action(&self) -> TriggerAction {
        TriggerAction::from(self.action.as_str())
    }
}

/// Trigger actions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerAction {
    /// Update the target with the configured payload
    Disable,
    /// Any other action name; accepted but performs no gateway call
    Other(String),
}

impl From<&str> for TriggerAction {
    fn from(action: &str) -> Self {
        match action {
            "disable" => TriggerAction::Disable,
            other => TriggerAction::Other(other.to_string()),
        }
    }
}

impl fmt::Display for TriggerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerAction::Disable => write!(f, "disable"),
            TriggerAction::Other(name) => write!(f, "{}", name),
        }
    }
}

/// Object collections the pre-fetch stage can list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Tenants,
    VirtualServices,
    ServiceEngines,
}

/// Recognized component tags
const COMPONENT_TAGS: &[(&str, Component)] = &[
    ("tenants", Component::Tenants),
    ("tenant-objects", Component::Tenants),
    ("virtual_services", Component::VirtualServices),
    ("virtual-service-objects", Component::VirtualServices),
    ("service_engines", Component::ServiceEngines),
    ("service-engine-objects", Component::ServiceEngines),
];

impl FromStr for Component {
    type Err = Error;

    fn from_str(tag: &str) -> Result<Self> {
        COMPONENT_TAGS
            .iter()
            .find(|(name, _)| *name == tag)
            .map(|(_, component)| *component)
            .ok_or_else(|| {
                Error::Configuration(format!("Unknown pre-fetch component '{}'", tag))
            })
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Tenants => write!(f, "tenants"),
            Component::VirtualServices => write!(f, "virtual services"),
            Component::ServiceEngines => write!(f, "service engines"),
        }
    }
}

/// A simulated side-effect entry
#[derive(Deserialize, Debug, Clone)]
pub struct MockOperation {
    /// Which hook family handles the entry
    #[serde(rename = "type")]
    pub kind: MockKind,
    /// Operation name, e.g. "connect" or "execute_command"
    pub operation: Option<String>,
    /// Host for connect/validate operations
    pub host: Option<String>,
    /// Command for execute operations
    pub command: Option<String>,
    /// Any other parameters, kept for logging
    #[serde(flatten)]
    pub params: BTreeMap<String, Value>,
}

/// Mock operation kinds
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MockKind {
    Ssh,
    Rdp,
}

impl TestSuite {
    /// Load test case definitions from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::file_read(path, e))?;
        Self::parse(&content).map_err(|e| match e {
            Error::Yaml(e) => Error::ConfigParse(format!("{}: {}", path.display(), e)),
            other => other,
        })
    }

    /// Parse test case definitions from YAML text
    pub fn parse(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Validate every test case and check names are unique
    pub fn validate(&self) -> Result<()> {
        validate_all(&self.test_cases)
    }

    /// Keep only the test case with the given name, or all when `None`
    pub fn select(self, name: Option<&str>) -> Result<Vec<TestCaseConfig>> {
        let Some(name) = name else {
            return Ok(self.test_cases);
        };
        let selected: Vec<_> = self
            .test_cases
            .into_iter()
            .filter(|tc| tc.name == name)
            .collect();
        if selected.is_empty() {
            return Err(Error::Configuration(format!(
                "No test case named '{}'",
                name
            )));
        }
        Ok(selected)
    }
}

/// Validate a batch of test cases and check names are unique
pub fn validate_all(configs: &[TestCaseConfig]) -> Result<()> {
    let mut seen = HashSet::new();
    for config in configs {
        config.validate()?;
        if !seen.insert(config.name.as_str()) {
            return Err(Error::Configuration(format!(
                "Duplicate test case name '{}'",
                config.name
            )));
        }
    }
    Ok(())
}

impl TestCaseConfig {
    /// Check that all four stages are present and every component tag
    /// is recognized
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Configuration(
                "Test case name must not be empty".to_string(),
            ));
        }

        let missing: Vec<&str> = [
            ("pre_fetcher", self.stages.pre_fetcher.is_none()),
            ("pre_validation", self.stages.pre_validation.is_none()),
            ("trigger", self.stages.trigger.is_none()),
            ("post_validation", self.stages.post_validation.is_none()),
        ]
        .into_iter()
        .filter_map(|(key, absent)| absent.then_some(key))
        .collect();

        if !missing.is_empty() {
            return Err(Error::Configuration(format!(
                "Test case '{}' is missing stage(s): {}",
                self.name,
                missing.join(", ")
            )));
        }

        self.components()?;
        Ok(())
    }

    /// Parsed pre-fetch components, in configured order
    pub fn components(&self) -> Result<Vec<Component>> {
        self.stages
            .pre_fetcher
            .as_ref()
            .map(|stage| stage.components.iter().map(|c| c.parse()).collect())
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}
