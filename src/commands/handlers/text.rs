//! Text built-ins: `echo`, `upper`, `lower`.

use async_trait::async_trait;
use serde_json::Value;

use crate::commands::processor::{CommandHandler, Invocation, Processor};
use crate::context::ExecutionContext;
use crate::error::{CommandError, CommandResult};

/// Writes its value and passes it on to the next segment.
pub struct EchoHandler;

#[async_trait]
impl CommandHandler for EchoHandler {
    async fn run(&self, invocation: &Invocation<'_>, ctx: &mut ExecutionContext) -> CommandResult {
        let text = invocation.value_or_input().unwrap_or_default();
        ctx.writer().writeln(&text);
        ctx.output(Value::String(text));
        Ok(())
    }
}

/// Case transformation of the value or the piped input.
pub struct CaseHandler {
    upper: bool,
}

impl CaseHandler {
    pub fn upper() -> Self {
        Self { upper: true }
    }

    pub fn lower() -> Self {
        Self { upper: false }
    }
}

#[async_trait]
impl CommandHandler for CaseHandler {
    async fn run(&self, invocation: &Invocation<'_>, ctx: &mut ExecutionContext) -> CommandResult {
        let text = invocation.value_or_input().ok_or_else(|| {
            CommandError::failed(format!(
                "nothing to convert: pass text or pipe input into '{}'",
                invocation.processor.command()
            ))
        })?;

        let converted = if self.upper {
            text.to_uppercase()
        } else {
            text.to_lowercase()
        };
        ctx.writer().writeln(&converted);
        ctx.output(Value::String(converted));
        Ok(())
    }
}

pub fn echo_processor() -> Processor {
    Processor::new("echo", EchoHandler)
        .description("Print text and pass it to the next command")
        .usage("echo <text>")
        .allow_unlisted_commands()
        .sealed()
}

pub fn upper_processor() -> Processor {
    Processor::new("upper", CaseHandler::upper())
        .description("Convert text or piped input to upper case")
        .usage("upper [text]")
        .allow_unlisted_commands()
}

pub fn lower_processor() -> Processor {
    Processor::new("lower", CaseHandler::lower())
        .description("Convert text or piped input to lower case")
        .usage("lower [text]")
        .allow_unlisted_commands()
}
