//! Shared harness and test processors.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use termshell::commands::handlers::register_builtins;
use termshell::commands::{
    CommandExecutor, CommandHandler, CommandHook, Invocation, Processor, ProcessorRegistry,
};
use termshell::context::{BufferWriter, ExecutionContext, LineKind};
use termshell::error::{CommandError, CommandResult};
use termshell::fs::MemoryFileSystem;
use termshell::state::{KeyValueStore, MemoryKeyValueStore, StateManager};

/// Shared, ordered record of what ran.
pub type Journal = Arc<Mutex<Vec<String>>>;

pub fn journal() -> Journal {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn entries(journal: &Journal) -> Vec<String> {
    journal.lock().unwrap().clone()
}

/// An executor with built-ins plus extra processors, wired to buffers.
pub struct Harness {
    pub executor: CommandExecutor,
    pub ctx: ExecutionContext,
    pub out: BufferWriter,
    pub fs: Arc<MemoryFileSystem>,
    pub kv: Arc<MemoryKeyValueStore>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_processors(Vec::new())
    }

    pub fn with_processors(processors: Vec<Processor>) -> Self {
        Self::build(processors, Arc::new(MemoryKeyValueStore::new()), true)
    }

    pub fn without_filesystem(processors: Vec<Processor>) -> Self {
        Self::build(processors, Arc::new(MemoryKeyValueStore::new()), false)
    }

    pub fn with_storage(processors: Vec<Processor>, kv: Arc<MemoryKeyValueStore>) -> Self {
        Self::build(processors, kv, true)
    }

    fn build(processors: Vec<Processor>, kv: Arc<MemoryKeyValueStore>, with_fs: bool) -> Self {
        let mut registry = ProcessorRegistry::new();
        register_builtins(&mut registry).unwrap();
        for processor in processors {
            registry.register_processor(processor).unwrap();
        }

        let out = BufferWriter::new();
        let fs = Arc::new(MemoryFileSystem::new());
        let shared: Arc<dyn KeyValueStore> = kv.clone();
        let mut ctx = ExecutionContext::new(Arc::new(out.clone()), StateManager::new(shared));
        if with_fs {
            ctx = ctx.with_filesystem(fs.clone());
        }

        Self {
            executor: CommandExecutor::new(registry),
            ctx,
            out,
            fs,
            kv,
        }
    }

    pub async fn run(&mut self, line: &str) -> i32 {
        self.executor.execute_command(line, &mut self.ctx).await
    }

    pub fn plain(&self) -> Vec<String> {
        self.out.lines_of(LineKind::Plain)
    }

    pub fn errors(&self) -> Vec<String> {
        self.out.errors()
    }

    pub fn infos(&self) -> Vec<String> {
        self.out.lines_of(LineKind::Info)
    }
}

/// Records its name and piped input, then succeeds.
pub struct Record {
    pub name: &'static str,
    pub journal: Journal,
}

#[async_trait]
impl CommandHandler for Record {
    async fn run(&self, invocation: &Invocation<'_>, _ctx: &mut ExecutionContext) -> CommandResult {
        let input = match invocation.input {
            Some(Value::String(text)) => text.clone(),
            Some(other) => other.to_string(),
            None => "-".to_string(),
        };
        self.journal
            .lock()
            .unwrap()
            .push(format!("{}:{input}", self.name));
        Ok(())
    }
}

pub fn record(name: &'static str, journal: &Journal) -> Processor {
    Processor::new(
        name,
        Record {
            name,
            journal: Arc::clone(journal),
        },
    )
}

/// Sets exit code 1 without unwinding.
pub struct Fail;

#[async_trait]
impl CommandHandler for Fail {
    async fn run(&self, _invocation: &Invocation<'_>, ctx: &mut ExecutionContext) -> CommandResult {
        ctx.exit_silently(1);
        Ok(())
    }
}

pub fn fail() -> Processor {
    Processor::new("fail", Fail).description("Always fails")
}

/// Returns a plain error.
pub struct Boom;

#[async_trait]
impl CommandHandler for Boom {
    async fn run(&self, _invocation: &Invocation<'_>, _ctx: &mut ExecutionContext) -> CommandResult {
        Err(CommandError::failed("kaboom"))
    }
}

/// Sleeps far longer than any test, yielding to the runtime.
pub struct Sleepy;

#[async_trait]
impl CommandHandler for Sleepy {
    async fn run(&self, _invocation: &Invocation<'_>, ctx: &mut ExecutionContext) -> CommandResult {
        ctx.writer().writeln("started");
        tokio::time::sleep(Duration::from_secs(60)).await;
        ctx.writer().writeln("finished");
        Ok(())
    }
}

/// Hook that appends a label to a journal.
pub struct Mark {
    pub label: &'static str,
    pub journal: Journal,
}

#[async_trait]
impl CommandHook for Mark {
    async fn call(&self, _invocation: &Invocation<'_>, _ctx: &mut ExecutionContext) -> CommandResult {
        self.journal.lock().unwrap().push(self.label.to_string());
        Ok(())
    }
}

pub fn mark(label: &'static str, journal: &Journal) -> Mark {
    Mark {
        label,
        journal: Arc::clone(journal),
    }
}
