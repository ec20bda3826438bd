//! Functional test engine
//!
//! Reads YAML test case definitions and runs each one as a staged
//! scenario (pre-fetch, pre-validate, trigger, post-validate) against
//! the control plane, either one at a time or concurrently.

mod config;
mod runner;
mod scheduler;

pub use config::*;
pub use runner::{Stage, TestCase, TestCaseResult, TestStatus};
pub use scheduler::{ExecutionMode, RunSummary, Scheduler, DEFAULT_MAX_WORKERS, DEFAULT_PACING};
