//! Command executor: runs whole input lines.
//!
//! A line is split into segments and operators. Each segment goes through
//! parse → resolve → validate → invoke → hooks, with its own
//! `ExecutionProcess` lifecycle. Operators decide what runs next and carry
//! the output payload between segments.

use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;
use tracing::{debug, error, info};

use super::alias::{AliasTable, MAX_ALIAS_DEPTH};
use super::chain::{self, ChainOperator, ChainPart};
use super::parser::{parse, skip_words, ParsedCommand};
use super::processor::{value_to_text, Invocation, Processor};
use super::registry::{resolve_in_collection, ProcessorRegistry, Resolved};
use crate::context::ExecutionContext;
use crate::error::{CommandError, CommandResult, Result};
use crate::fs::append_to_file;

/// Result of running a line: the last executed segment's code and the
/// payload still carried at the end.
#[derive(Debug, Clone, Default, PartialEq)]
struct LineOutcome {
    exit_code: i32,
    data: Option<Value>,
}

/// A processor pinned with `--context`, and the path that reached it.
#[derive(Debug, Clone)]
struct ContextScope {
    processor: Arc<Processor>,
    path: Vec<String>,
}

/// Runs input lines against a processor registry.
pub struct CommandExecutor {
    registry: ProcessorRegistry,
    version: String,
    context: Option<ContextScope>,
}

impl CommandExecutor {
    pub fn new(registry: ProcessorRegistry) -> Self {
        Self {
            registry,
            version: env!("CARGO_PKG_VERSION").to_string(),
            context: None,
        }
    }

    /// Sets the version reported for processors that declare none.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn registry(&self) -> &ProcessorRegistry {
        &self.registry
    }

    /// Mutable access for runtime registration. Never called mid-lookup.
    pub fn registry_mut(&mut self) -> &mut ProcessorRegistry {
        &mut self.registry
    }

    /// Path of the pinned context processor, for prompts.
    pub fn context_path(&self) -> Option<String> {
        self.context.as_ref().map(|scope| scope.path.join(" "))
    }

    /// Hydrates every processor's state bucket, then runs each processor's
    /// `initialize` hook, parents before children.
    pub async fn boot(&self, ctx: &mut ExecutionContext) -> Result<()> {
        for processor in self.registry.processors() {
            boot_processor(processor, ctx).await?;
        }
        ctx.bind_state(None);
        info!("Booted {} processors", self.registry.len());
        Ok(())
    }

    /// Runs one input line. Returns the exit code of the last executed
    /// segment.
    ///
    /// Never fails: every error is reported through the context's writer and
    /// recorded as an exit code.
    pub async fn execute_command(&mut self, raw_line: &str, ctx: &mut ExecutionContext) -> i32 {
        self.run_line(raw_line.to_string(), None, ctx, 0)
            .await
            .exit_code
    }

    /// Shows help for `command` by running `help <command>`.
    pub async fn show_help(&mut self, command: &str, ctx: &mut ExecutionContext) -> i32 {
        self.execute_command(&format!("help {command}"), ctx).await
    }

    /// `input` seeds the first segment, so an alias receives what was piped
    /// into it.
    fn run_line<'a>(
        &'a mut self,
        line: String,
        input: Option<Value>,
        ctx: &'a mut ExecutionContext,
        depth: usize,
    ) -> BoxFuture<'a, LineOutcome> {
        async move {
            let mut should_run = true;
            let mut last_success = true;
            let mut last_code = 0;
            let mut pipeline_data: Option<Value> = None;
            let mut pipe_input = input;
            let mut append_pending = false;

            for part in chain::split(&line) {
                let command = match part {
                    ChainPart::Command(segment) => Some(segment),
                    ChainPart::Operator(operator) => {
                        // `>>` directly followed by another operator has no path.
                        if append_pending {
                            append_pending = false;
                            ctx.writer()
                                .write_error("Missing file path after '>>'");
                            last_success = false;
                            last_code = -1;
                        }
                        match operator {
                            ChainOperator::And => should_run = last_success,
                            ChainOperator::Or => should_run = !last_success,
                            ChainOperator::Pipe => {
                                should_run = true;
                                pipe_input = pipeline_data.clone();
                            }
                            ChainOperator::Append => append_pending = true,
                        }
                        None
                    }
                };
                let Some(segment) = command else {
                    continue;
                };

                if append_pending {
                    append_pending = false;
                    if !append_payload(&segment, pipeline_data.as_ref(), ctx).await {
                        last_success = false;
                        last_code = -1;
                    }
                    continue;
                }

                // Skipped segments leave the last result and payload intact.
                if !should_run {
                    debug!("Skipping '{segment}'");
                    pipe_input = None;
                    continue;
                }

                let input = pipe_input.take();
                self.run_segment(&segment, input, ctx, depth).await;

                last_code = ctx.process().exit_code().unwrap_or(0);
                last_success = ctx.process().succeeded();
                pipeline_data = ctx.process_mut().take_data();
            }

            if append_pending {
                ctx.writer()
                    .write_error("Missing file path after '>>'");
                last_code = -1;
            }

            LineOutcome {
                exit_code: last_code,
                data: pipeline_data,
            }
        }
        .boxed()
    }

    async fn run_segment(
        &mut self,
        segment: &str,
        input: Option<Value>,
        ctx: &mut ExecutionContext,
        depth: usize,
    ) {
        ctx.process_mut().start();
        self.dispatch(segment.trim(), input, ctx, depth).await;
        ctx.bind_state(None);
        ctx.indicators_mut().hide_all();
        ctx.process_mut().end();
    }

    async fn dispatch(
        &mut self,
        segment: &str,
        input: Option<Value>,
        ctx: &mut ExecutionContext,
        depth: usize,
    ) {
        if segment == ".." {
            if let Some(scope) = self.context.take() {
                ctx.writer()
                    .write_info(&format!("Left context '{}'", scope.path.join(" ")));
                return;
            }
        }

        let parsed = parse(segment);
        let Some((resolved, path)) = self.resolve(&parsed) else {
            self.handle_unresolved(segment, &parsed, input, ctx, depth).await;
            return;
        };
        let processor = resolved.processor;
        debug!("Resolved '{segment}' to '{}'", path.join(" "));

        if wants_shortcut(&processor, &parsed, "v", "version") {
            let version = processor.version_text().unwrap_or(&self.version);
            ctx.writer()
                .writeln(&format!("{} v{version}", path.join(" ")));
            return;
        }

        if wants_shortcut(&processor, &parsed, "h", "help") {
            let outcome = self
                .run_line(format!("help {}", path.join(" ")), None, ctx, depth + 1)
                .await;
            apply_outcome(ctx, outcome);
            return;
        }

        if parsed.args.flag("context") && !processor.declares("context") {
            ctx.writer().write_info(&format!(
                "Entered context '{}'. Type '..' to leave.",
                path.join(" ")
            ));
            self.context = Some(ContextScope { processor, path });
            return;
        }

        let failures = processor.validate(&parsed.args);
        if !failures.is_empty() {
            let writer = ctx.writer();
            writer.write_error(&format!("Invalid arguments for '{}':", path.join(" ")));
            for failure in &failures {
                writer.write_error(&format!("  - {failure}"));
            }
            ctx.exit_silently(-1);
            return;
        }

        let value = processor
            .takes_value()
            .then(|| skip_words(segment, resolved.depth))
            .filter(|value| !value.is_empty());
        if processor.requires_value() && value.is_none() {
            let usage = processor
                .usage_text()
                .map_or_else(|| format!("{} <value>", path.join(" ")), str::to_string);
            ctx.writer().write_error(&format!("Usage: {usage}"));
            ctx.exit_silently(-1);
            return;
        }

        let store = ctx.states_mut().get_processor_state_store(&processor);
        ctx.bind_state(Some(store));

        let invocation = Invocation {
            processor: &processor,
            path: &path,
            args: &parsed.args,
            value,
            input: input.as_ref(),
            raw: segment,
            registry: &self.registry,
        };

        let signal = ctx.signal();
        let result = tokio::select! {
            biased;

            _ = signal.cancelled() => Err(CommandError::Cancelled),
            result = invoke(&processor, &invocation, ctx) => result,
        };

        match result {
            Ok(()) => {}
            Err(CommandError::Exited { code }) => {
                ctx.exit_silently(code);
                ctx.abort();
                if code == 0 {
                    ctx.writer().write_info("Process exited cleanly");
                } else {
                    ctx.writer()
                        .write_error(&format!("Process exited with code {code}"));
                }
            }
            Err(CommandError::Cancelled) => {
                info!("'{}' cancelled", path.join(" "));
                ctx.writer().write_error("Command cancelled");
                ctx.exit_silently(-1);
            }
            Err(e) => {
                error!("'{}' failed: {e}", path.join(" "));
                ctx.writer()
                    .write_error(&format!("Error running '{}': {e}", path.join(" ")));
                ctx.exit_silently(-1);
            }
        }
    }

    /// Resolves a parsed segment, returning the processor and its full path.
    ///
    /// While a context is pinned only its children are searched, except for
    /// `help` which always resolves from the top.
    fn resolve(&self, parsed: &ParsedCommand) -> Option<(Resolved, Vec<String>)> {
        let (main, chain) = parsed.words.split_first()?;

        if let Some(scope) = &self.context {
            if !main.eq_ignore_ascii_case("help") {
                let resolved = resolve_in_collection(main, chain, scope.processor.children())?;
                let mut path = scope.path.clone();
                path.extend(parsed.words[..resolved.depth].iter().cloned());
                return Some((resolved, path));
            }
        }

        let resolved = self.registry.resolve(&parsed.words)?;
        let path = parsed.words[..resolved.depth].to_vec();
        Some((resolved, path))
    }

    async fn handle_unresolved(
        &mut self,
        segment: &str,
        parsed: &ParsedCommand,
        input: Option<Value>,
        ctx: &mut ExecutionContext,
        depth: usize,
    ) {
        let expansion = AliasTable::from_context(ctx).expand(segment);
        if let Some(expanded) = expansion {
            if depth >= MAX_ALIAS_DEPTH {
                ctx.writer().write_error(&format!(
                    "Alias expansion for '{segment}' exceeded {MAX_ALIAS_DEPTH} levels"
                ));
                ctx.exit_silently(-1);
                return;
            }
            debug!("Alias '{segment}' expands to '{expanded}'");
            let outcome = self.run_line(expanded, input, ctx, depth + 1).await;
            apply_outcome(ctx, outcome);
            return;
        }

        let name = if parsed.command_name.is_empty() {
            segment
        } else {
            parsed.command_name.as_str()
        };
        ctx.writer()
            .write_error(&format!("Command not found: {name}"));
        ctx.exit_silently(-1);
    }
}

/// Before hooks, handler, then after hooks. The first error stops the run.
async fn invoke(
    processor: &Processor,
    invocation: &Invocation<'_>,
    ctx: &mut ExecutionContext,
) -> CommandResult {
    for hook in processor.before_hooks() {
        hook.call(invocation, ctx).await?;
    }
    processor.handler().run(invocation, ctx).await?;
    for hook in processor.after_hooks() {
        hook.call(invocation, ctx).await?;
    }
    Ok(())
}

fn boot_processor<'a>(
    processor: &'a Arc<Processor>,
    ctx: &'a mut ExecutionContext,
) -> BoxFuture<'a, Result<()>> {
    async move {
        let store = ctx.states_mut().get_processor_state_store(processor);
        store.initialize().await?;
        ctx.bind_state(Some(store));
        processor.handler().initialize(ctx).await?;
        for child in processor.children() {
            boot_processor(child, ctx).await?;
        }
        Ok(())
    }
    .boxed()
}

/// Whether a `-short`/`--long` shortcut flag was given and not claimed by a
/// declared parameter.
fn wants_shortcut(processor: &Processor, parsed: &ParsedCommand, short: &str, long: &str) -> bool {
    [short, long]
        .into_iter()
        .any(|flag| parsed.args.flag(flag) && !processor.declares(flag))
}

/// Records a nested line's result as the current segment's result.
fn apply_outcome(ctx: &mut ExecutionContext, outcome: LineOutcome) {
    ctx.process_mut().start();
    if outcome.exit_code != 0 {
        ctx.exit_silently(outcome.exit_code);
    }
    if let Some(data) = outcome.data {
        ctx.output(data);
    }
}

/// Appends the carried payload to the file named by `target`.
///
/// Returns false when the append could not happen.
async fn append_payload(target: &str, payload: Option<&Value>, ctx: &mut ExecutionContext) -> bool {
    let parsed = parse(target);
    let path = parsed.root().unwrap_or_else(|| target.trim());

    let Some(filesystem) = ctx.filesystem() else {
        ctx.writer().write_error(
            "The '>>' operator requires the filesystem plugin, which is not installed",
        );
        return false;
    };

    let Some(payload) = payload else {
        ctx.writer()
            .write_info(&format!("Nothing to append to {path}"));
        return true;
    };

    match append_to_file(filesystem.as_ref(), path, &value_to_text(payload)).await {
        Ok(resolved) => {
            debug!("Appended output to {resolved}");
            true
        }
        Err(e) => {
            ctx.writer()
                .write_error(&format!("Failed to append to {path}: {e}"));
            false
        }
    }
}
