//! Execution context handed to every handler invocation.
//!
//! Aggregates the output writer, busy indicators, the abort channel, the
//! per-segment `ExecutionProcess` and the state bucket bound to the
//! invoking processor.

pub mod indicators;
pub mod process;
pub mod writer;

use std::sync::{Arc, Mutex};

use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{CommandError, CommandResult};
use crate::fs::FileSystem;
use crate::state::{StateManager, StateStore};

pub use indicators::{BusyIndicator, BusyIndicators, IndicatorKind, ProgressBar, Spinner, TextAnimator};
pub use process::ExecutionProcess;
pub use writer::{BufferWriter, LineKind, TerminalWriter, TextColor, WrittenLine, Writer};

/// Abort notification channel.
///
/// Clones share the same channel, so a host can keep one to abort from
/// another task (e.g. a Ctrl-C listener). Each `abort()` fires the current
/// token and installs a fresh one for the next command.
#[derive(Debug, Clone, Default)]
pub struct AbortController {
    token: Arc<Mutex<CancellationToken>>,
}

impl AbortController {
    /// Creates a controller with an unfired token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the token a running handler should observe.
    pub fn signal(&self) -> CancellationToken {
        self.token
            .lock()
            .map(|token| token.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    /// Fires the current token and arms a fresh one.
    pub fn abort(&self) {
        let mut token = self
            .token
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        token.cancel();
        *token = CancellationToken::new();
    }
}

/// Everything a handler can reach while it runs.
pub struct ExecutionContext {
    writer: Arc<dyn Writer>,
    indicators: BusyIndicators,
    abort: AbortController,
    process: ExecutionProcess,
    states: StateManager,
    state: Option<StateStore>,
    filesystem: Option<Arc<dyn FileSystem>>,
}

impl ExecutionContext {
    /// Creates a context writing to `writer` with buckets from `states`.
    pub fn new(writer: Arc<dyn Writer>, states: StateManager) -> Self {
        Self {
            writer,
            indicators: BusyIndicators::default(),
            abort: AbortController::new(),
            process: ExecutionProcess::new(),
            states,
            state: None,
            filesystem: None,
        }
    }

    /// Installs the filesystem plugin.
    pub fn with_filesystem(mut self, filesystem: Arc<dyn FileSystem>) -> Self {
        self.filesystem = Some(filesystem);
        self
    }

    /// Shares an abort controller with the host.
    pub fn with_abort_controller(mut self, abort: AbortController) -> Self {
        self.abort = abort;
        self
    }

    pub fn writer(&self) -> &dyn Writer {
        self.writer.as_ref()
    }

    pub fn process(&self) -> &ExecutionProcess {
        &self.process
    }

    pub fn process_mut(&mut self) -> &mut ExecutionProcess {
        &mut self.process
    }

    /// Records `code` and returns the "process exited" signal.
    ///
    /// Handlers write `return ctx.exit(1);` or `ctx.exit(0)?`.
    pub fn exit(&mut self, code: i32) -> CommandResult {
        Err(self.process.exit(code))
    }

    /// Records `code` without unwinding the handler.
    pub fn exit_silently(&mut self, code: i32) {
        self.process.exit_silently(code);
    }

    /// Hands `data` to the next chained segment.
    pub fn output(&mut self, data: Value) {
        self.process.output(data);
    }

    /// The state bucket of the processor being invoked.
    pub fn state(&self) -> Option<&StateStore> {
        self.state.as_ref()
    }

    /// The bound bucket, or an error for processors invoked without one.
    pub fn require_state(&self) -> Result<&StateStore, CommandError> {
        self.state
            .as_ref()
            .ok_or_else(|| CommandError::failed("no state bucket is bound to this command"))
    }

    pub(crate) fn bind_state(&mut self, state: Option<StateStore>) {
        self.state = state;
    }

    pub fn states(&self) -> &StateManager {
        &self.states
    }

    pub fn states_mut(&mut self) -> &mut StateManager {
        &mut self.states
    }

    pub fn indicators(&self) -> &BusyIndicators {
        &self.indicators
    }

    pub fn indicators_mut(&mut self) -> &mut BusyIndicators {
        &mut self.indicators
    }

    /// Whether any busy indicator is visible.
    pub fn is_progress_running(&self) -> bool {
        self.indicators.is_progress_running()
    }

    pub fn abort_controller(&self) -> &AbortController {
        &self.abort
    }

    /// The current abort token.
    pub fn signal(&self) -> CancellationToken {
        self.abort.signal()
    }

    /// Clears busy indicators and notifies the abort channel.
    pub fn abort(&mut self) {
        debug!("Aborting execution context");
        self.indicators.hide_all();
        self.abort.abort();
    }

    pub fn filesystem(&self) -> Option<Arc<dyn FileSystem>> {
        self.filesystem.clone()
    }
}
