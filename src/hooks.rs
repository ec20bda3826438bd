//! Simulated out-of-band operations
//!
//! Remote-shell and remote-desktop checks are stubbed: each hook only
//! records that it was called. Hooks cannot fail.

/// Hooks invoked for `mock_operations` entries during the trigger stage
pub trait SimulatedHooks: Send + Sync {
    /// `ssh` entry asking for a connection
    fn remote_shell_connect(&self, host: &str);

    /// `ssh` entry asking for a command to be run
    fn remote_shell_execute(&self, command: &str);

    /// `rdp` entry asking for a connection check
    fn remote_desktop_validate(&self, host: &str);
}

/// Default hooks: one log record per call
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingHooks;

impl SimulatedHooks for TracingHooks {
    fn remote_shell_connect(&self, host: &str) {
        tracing::info!(host, "MOCK_SSH: connecting");
    }

    fn remote_shell_execute(&self, command: &str) {
        tracing::info!(command, "MOCK_SSH: executing command");
    }

    fn remote_desktop_validate(&self, host: &str) {
        tracing::info!(host, "MOCK_RDP: validating connection");
    }
}

/// A recorded hook invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookCall {
    RemoteShellConnect(String),
    RemoteShellExecute(String),
    RemoteDesktopValidate(String),
}

/// Hooks that remember every invocation, in order
#[derive(Debug, Default)]
pub struct RecordingHooks {
    calls: std::sync::Mutex<Vec<HookCall>>,
}

impl RecordingHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// All invocations so far
    pub fn calls(&self) -> Vec<HookCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn push(&self, call: HookCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

impl SimulatedHooks for RecordingHooks {
    fn remote_shell_connect(&self, host: &str) {
        self.push(HookCall::RemoteShellConnect(host.to_string()));
    }

    fn remote_shell_execute(&self, command: &str) {
        self.push(HookCall::RemoteShellExecute(command.to_string()));
    }

    fn remote_desktop_validate(&self, host: &str) {
        self.push(HookCall::RemoteDesktopValidate(host.to_string()));
    }
}
