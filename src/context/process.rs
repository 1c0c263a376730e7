//! Per-segment execution process state machine.
//!
//! `start()` → (`exit()` | `output()`)* → `end()`, once per segment.

use serde_json::Value;

use crate::error::CommandError;

/// Exit code and output payload of the current segment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionProcess {
    exited: bool,
    exit_code: Option<i32>,
    data: Option<Value>,
    running: bool,
}

impl ExecutionProcess {
    /// Creates an idle process.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets all state and marks the process running.
    pub fn start(&mut self) {
        self.exited = false;
        self.exit_code = None;
        self.data = None;
        self.running = true;
    }

    /// Records an exit and returns the "process exited" signal.
    ///
    /// The returned error must be propagated out of the handler; the executor
    /// catches it at the segment boundary.
    pub fn exit(&mut self, code: i32) -> CommandError {
        self.record_exit(code);
        CommandError::Exited { code }
    }

    /// Records an exit without raising the signal.
    pub fn exit_silently(&mut self, code: i32) {
        self.record_exit(code);
    }

    fn record_exit(&mut self, code: i32) {
        self.exited = true;
        self.exit_code = Some(code);
    }

    /// Stores the payload handed to the next chained segment.
    pub fn output(&mut self, data: Value) {
        self.data = Some(data);
    }

    /// Marks the process finished, defaulting the exit code to 0.
    pub fn end(&mut self) {
        self.running = false;
        if self.exit_code.is_none() {
            self.exit_code = Some(0);
        }
    }

    /// Whether `exit()` was called during this segment.
    pub fn exited(&self) -> bool {
        self.exited
    }

    /// The exit code, if one has been set.
    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    /// The output payload, if any.
    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    /// Takes the output payload, leaving none behind.
    pub fn take_data(&mut self) -> Option<Value> {
        self.data.take()
    }

    /// Whether the segment is still running.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// True when the exit code is 0 or unset.
    pub fn succeeded(&self) -> bool {
        self.exit_code.map_or(true, |code| code == 0)
    }
}
