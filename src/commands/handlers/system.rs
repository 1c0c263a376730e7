//! System built-ins: `help` and `exit`.

use async_trait::async_trait;

use crate::commands::help::{render_overview, render_processor};
use crate::commands::processor::{CommandHandler, Invocation, Processor};
use crate::context::ExecutionContext;
use crate::error::CommandResult;

/// Lists processors, or describes the one named by the value.
pub struct HelpHandler;

#[async_trait]
impl CommandHandler for HelpHandler {
    async fn run(&self, invocation: &Invocation<'_>, ctx: &mut ExecutionContext) -> CommandResult {
        let Some(topic) = invocation.value else {
            ctx.writer().writeln(&render_overview(invocation.registry));
            return Ok(());
        };

        let words: Vec<String> = topic.split_whitespace().map(str::to_string).collect();
        match invocation.registry.find(&words) {
            Some(processor) => {
                ctx.writer()
                    .writeln(&render_processor(&processor, &words.join(" ")));
            }
            None => {
                ctx.writer()
                    .write_error(&format!("No help available for '{topic}'"));
                ctx.exit_silently(-1);
            }
        }
        Ok(())
    }
}

/// Ends the current process with an explicit code (default 0).
pub struct ExitHandler;

#[async_trait]
impl CommandHandler for ExitHandler {
    async fn run(&self, invocation: &Invocation<'_>, ctx: &mut ExecutionContext) -> CommandResult {
        let code = match invocation.value {
            None => 0,
            Some(text) => match text.trim().parse::<i32>() {
                Ok(code) => code,
                Err(_) => {
                    ctx.writer()
                        .write_error(&format!("exit: numeric argument required, got '{text}'"));
                    2
                }
            },
        };
        ctx.exit(code)
    }
}

pub fn help_processor() -> Processor {
    Processor::new("help", HelpHandler)
        .alias("?")
        .description("Show available commands or help for one command")
        .usage("help [command...]")
        .allow_unlisted_commands()
        .sealed()
}

pub fn exit_processor() -> Processor {
    Processor::new("exit", ExitHandler)
        .description("End the current command with an exit code")
        .usage("exit [code]")
        .allow_unlisted_commands()
}
