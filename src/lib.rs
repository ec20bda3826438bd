//! Load balancer functional test runner
//!
//! Drives configuration-defined test cases against a load-balancer
//! control-plane API: fetch inventories, validate a target object, trigger
//! a change, and re-check the result.

pub mod cli;
pub mod commands;
pub mod common;
pub mod gateway;
pub mod hooks;
pub mod testing;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use gateway::{ObjectRecord, ResourceGateway};
pub use testing::{ExecutionMode, Scheduler, TestCaseConfig, TestCaseResult, TestStatus};
