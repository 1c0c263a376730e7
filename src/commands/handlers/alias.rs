//! The `alias` built-in and its `set`, `remove` and `list` children.
//!
//! All four share the `alias` bucket through their store name.

use async_trait::async_trait;

use crate::commands::alias::{default_alias_state, AliasTable, ALIAS_STORE};
use crate::commands::processor::{CommandHandler, Invocation, Processor};
use crate::context::ExecutionContext;
use crate::error::{CommandError, CommandResult};

fn bound_table(ctx: &ExecutionContext) -> Result<AliasTable, CommandError> {
    Ok(AliasTable::new(ctx.require_state()?.clone()))
}

/// Strips one pair of matching outer quotes, so chained bodies can be
/// written as `alias set x "a | b"`.
fn unquote(text: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = text
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    text
}

fn write_table(table: &AliasTable, ctx: &ExecutionContext) {
    let aliases = table.list();
    if aliases.is_empty() {
        ctx.writer().write_info("No aliases defined");
        return;
    }
    let width = aliases.keys().map(String::len).max().unwrap_or(0);
    for (name, command) in aliases {
        ctx.writer().writeln(&format!("{name:<width$} = {command}"));
    }
}

pub struct AliasListHandler;

#[async_trait]
impl CommandHandler for AliasListHandler {
    async fn run(&self, _invocation: &Invocation<'_>, ctx: &mut ExecutionContext) -> CommandResult {
        let table = bound_table(ctx)?;
        write_table(&table, ctx);
        Ok(())
    }
}

pub struct AliasSetHandler;

#[async_trait]
impl CommandHandler for AliasSetHandler {
    async fn run(&self, invocation: &Invocation<'_>, ctx: &mut ExecutionContext) -> CommandResult {
        let value = invocation.value.unwrap_or_default();
        let Some((name, command)) = value
            .split_once(char::is_whitespace)
            .map(|(name, command)| (name, unquote(command.trim())))
            .filter(|(_, command)| !command.is_empty())
        else {
            ctx.writer().write_error("Usage: alias set <name> <command...>");
            return ctx.exit(2);
        };

        if invocation.registry.find(&[name.to_string()]).is_some() {
            ctx.writer().write_error(&format!(
                "'{name}' is already a command; aliases only apply to unknown names"
            ));
            return ctx.exit(1);
        }

        let table = bound_table(ctx)?;
        table.set(name, command);
        table.persist().await?;
        ctx.writer()
            .write_success(&format!("Alias '{name}' set to '{command}'"));
        Ok(())
    }
}

pub struct AliasRemoveHandler;

#[async_trait]
impl CommandHandler for AliasRemoveHandler {
    async fn run(&self, invocation: &Invocation<'_>, ctx: &mut ExecutionContext) -> CommandResult {
        let name = invocation.value.unwrap_or_default().trim();
        let table = bound_table(ctx)?;
        if !table.remove(name) {
            ctx.writer()
                .write_error(&format!("No alias named '{name}'"));
            return ctx.exit(1);
        }
        table.persist().await?;
        ctx.writer()
            .write_success(&format!("Alias '{name}' removed"));
        Ok(())
    }
}

pub fn alias_processor() -> Processor {
    Processor::new("alias", AliasListHandler)
        .description("Manage command shortcuts")
        .usage("alias [set <name> <command...> | remove <name> | list]")
        .store_name(ALIAS_STORE)
        .default_state(default_alias_state())
        .child(
            Processor::new("set", AliasSetHandler)
                .description("Define a shortcut for a command line")
                .usage("alias set <name> <command...>")
                .store_name(ALIAS_STORE)
                .default_state(default_alias_state())
                .value_required(),
        )
        .child(
            Processor::new("remove", AliasRemoveHandler)
                .alias("rm")
                .description("Delete a shortcut")
                .usage("alias remove <name>")
                .store_name(ALIAS_STORE)
                .default_state(default_alias_state())
                .value_required(),
        )
        .child(
            Processor::new("list", AliasListHandler)
                .alias("ls")
                .description("List shortcuts")
                .store_name(ALIAS_STORE)
                .default_state(default_alias_state()),
        )
}
