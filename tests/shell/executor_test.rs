//! Segment pipeline: resolution, shortcuts, validation, hooks, exit and
//! cancellation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use termshell::commands::{CommandExecutor, CommandHandler, Invocation, ParameterDef, Processor};
use termshell::context::{ExecutionContext, IndicatorKind};
use termshell::error::{CommandResult, ShellError};

use super::common::{entries, journal, mark, record, Boom, Harness, Journal, Sleepy};
use pretty_assertions::assert_eq;

struct ExitEarly {
    code: i32,
    journal: Journal,
}

#[async_trait]
impl CommandHandler for ExitEarly {
    async fn run(&self, _invocation: &Invocation<'_>, ctx: &mut ExecutionContext) -> CommandResult {
        ctx.indicators_mut().show(IndicatorKind::Spinner);
        ctx.exit(self.code)?;
        self.journal.lock().unwrap().push("unreachable".to_string());
        Ok(())
    }
}

struct Count;

#[async_trait]
impl CommandHandler for Count {
    async fn run(&self, _invocation: &Invocation<'_>, ctx: &mut ExecutionContext) -> CommandResult {
        let state = ctx.require_state()?;
        let count = state.get("count").and_then(|v| v.as_i64()).unwrap_or(0) + 1;
        state.update_state(json!({ "count": count }));
        ctx.writer().writeln(&count.to_string());
        Ok(())
    }
}

struct Greeter {
    journal: Journal,
}

#[async_trait]
impl CommandHandler for Greeter {
    async fn run(&self, invocation: &Invocation<'_>, _ctx: &mut ExecutionContext) -> CommandResult {
        let name = invocation
            .args
            .get_any(["name", "n"])
            .map(|v| v.to_string())
            .unwrap_or_default();
        self.journal.lock().unwrap().push(format!("hello {name}"));
        Ok(())
    }

    async fn initialize(&self, ctx: &mut ExecutionContext) -> Result<(), ShellError> {
        let greeted = ctx
            .state()
            .and_then(|s| s.get("greeted"))
            .map(|v| v.to_string())
            .unwrap_or_else(|| "none".to_string());
        self.journal.lock().unwrap().push(format!("init:{greeted}"));
        Ok(())
    }
}

fn greeter(journal: &Journal) -> Processor {
    Processor::new(
        "greet",
        Greeter {
            journal: Arc::clone(journal),
        },
    )
    .parameter(ParameterDef::new("name").alias("n").required())
    .parameter(ParameterDef::new("times").validator(|v| match v.as_f64() {
        Some(n) if n >= 1.0 => Ok(()),
        _ => Err("must be at least 1".to_string()),
    }))
    .parameter(ParameterDef::new("lang").required())
}

#[tokio::test]
async fn test_unknown_command_exits_silently() {
    let mut h = Harness::new();

    let code = h.run("definitely-not-a-command --x=1").await;
    assert_eq!(code, -1);
    assert_eq!(h.errors(), vec!["Command not found: definitely-not-a-command"]);
    assert_eq!(h.ctx.process().exit_code(), Some(-1));
    assert!(!h.ctx.process().is_running());
}

#[tokio::test]
async fn test_malformed_segment_is_not_found() {
    let mut h = Harness::new();

    let code = h.run("echo \"unterminated").await;
    assert_eq!(code, -1);
    assert_eq!(h.errors(), vec!["Command not found: echo \"unterminated"]);
}

#[tokio::test]
async fn test_missing_required_parameters_are_itemized() {
    let log = journal();
    let mut h = Harness::with_processors(vec![greeter(&log)]);

    let code = h.run("greet").await;
    assert_eq!(code, -1);
    assert!(entries(&log).is_empty());
    assert_eq!(
        h.errors(),
        vec![
            "Invalid arguments for 'greet':",
            "  - Missing required parameter: --name",
            "  - Missing required parameter: --lang",
        ]
    );
}

#[tokio::test]
async fn test_validator_failure_blocks_handler() {
    let log = journal();
    let mut h = Harness::with_processors(vec![greeter(&log)]);

    let code = h.run("greet -n=ada --lang=en --times=0").await;
    assert_eq!(code, -1);
    assert!(entries(&log).is_empty());
    assert_eq!(
        h.errors()[1],
        "  - Invalid value for --times: must be at least 1"
    );
}

#[tokio::test]
async fn test_valid_parameters_reach_handler() {
    let log = journal();
    let mut h = Harness::with_processors(vec![greeter(&log)]);

    let code = h.run("greet -n=\"Ada Lovelace\" --lang=en --times=2").await;
    assert_eq!(code, 0);
    assert_eq!(entries(&log), vec!["hello Ada Lovelace"]);
}

#[tokio::test]
async fn test_handler_error_is_reported_generically() {
    let mut h = Harness::with_processors(vec![Processor::new("boom", Boom)]);

    let code = h.run("boom").await;
    assert_eq!(code, -1);
    assert_eq!(h.errors(), vec!["Error running 'boom': kaboom"]);
}

#[tokio::test]
async fn test_exit_zero_is_informational_and_aborts() {
    let log = journal();
    let mut h = Harness::with_processors(vec![Processor::new(
        "stop",
        ExitEarly {
            code: 0,
            journal: Arc::clone(&log),
        },
    )]);
    let token = h.ctx.signal();

    let code = h.run("stop").await;
    assert_eq!(code, 0);
    assert!(entries(&log).is_empty());
    assert!(token.is_cancelled());
    assert!(!h.ctx.is_progress_running());
    assert_eq!(h.infos(), vec!["Process exited cleanly"]);
    assert!(h.errors().is_empty());
}

#[tokio::test]
async fn test_exit_nonzero_is_an_error() {
    let log = journal();
    let mut h = Harness::with_processors(vec![Processor::new(
        "stop",
        ExitEarly {
            code: 3,
            journal: Arc::clone(&log),
        },
    )
    .after(mark("after", &log))]);

    let code = h.run("stop || echo recovered").await;
    assert_eq!(code, 0);
    assert!(entries(&log).is_empty());
    assert_eq!(h.errors(), vec!["Process exited with code 3"]);
    assert_eq!(h.plain(), vec!["recovered"]);
}

#[tokio::test]
async fn test_exit_builtin() {
    let mut h = Harness::new();

    assert_eq!(h.run("exit 4").await, 4);
    assert_eq!(h.run("exit").await, 0);
    assert_eq!(h.run("exit soon").await, 2);
}

#[tokio::test]
async fn test_hooks_run_in_order() {
    let log = journal();
    let mut h = Harness::with_processors(vec![record("job", &log)
        .before(mark("before-1", &log))
        .before(mark("before-2", &log))
        .after(mark("after", &log))]);

    h.run("job").await;
    assert_eq!(
        entries(&log),
        vec!["before-1", "before-2", "job:-", "after"]
    );
}

#[tokio::test]
async fn test_after_hooks_skipped_when_handler_fails() {
    let log = journal();
    let mut h = Harness::with_processors(vec![Processor::new("boom", Boom)
        .before(mark("before", &log))
        .after(mark("after", &log))]);

    h.run("boom").await;
    assert_eq!(entries(&log), vec!["before"]);
}

#[tokio::test]
async fn test_value_required_without_value() {
    let log = journal();
    let mut h = Harness::with_processors(vec![record("say", &log)
        .value_required()
        .usage("say <text>")]);

    let code = h.run("say").await;
    assert_eq!(code, -1);
    assert!(entries(&log).is_empty());
    assert_eq!(h.errors(), vec!["Usage: say <text>"]);
}

#[tokio::test]
async fn test_value_keeps_flags_and_quotes() {
    let mut h = Harness::new();

    h.run("echo hello --loud 'two words'").await;
    assert_eq!(h.plain(), vec!["hello --loud 'two words'"]);
}

#[tokio::test]
async fn test_version_shortcut() {
    let log = journal();
    let mut h = Harness::with_processors(vec![record("tool", &log).version("2.1.0")]);
    h.executor = CommandExecutor::new(h.executor.registry().clone()).with_version("9.9.9");

    h.run("tool -v").await;
    h.run("echo --version").await;
    assert!(entries(&log).is_empty());
    assert_eq!(h.plain(), vec!["tool v2.1.0", "echo v9.9.9"]);
}

#[tokio::test]
async fn test_help_shortcut_reenters_help() {
    let mut h = Harness::new();

    let code = h.run("alias -h").await;
    assert_eq!(code, 0);
    let text = h.plain().join("\n");
    assert!(text.starts_with("alias\n"));
    assert!(text.contains("Subcommands:"));
    assert!(text.contains("alias set"));
}

#[tokio::test]
async fn test_show_help_for_nested_command() {
    let mut h = Harness::new();

    let code = h.executor.show_help("alias set", &mut h.ctx).await;
    assert_eq!(code, 0);
    assert!(h.plain()[0].contains("Usage:\n  alias set <name> <command...>"));
}

#[tokio::test]
async fn test_help_overview_and_unknown_topic() {
    let mut h = Harness::new();

    h.run("help").await;
    assert!(h.plain()[0].starts_with("Available commands:"));

    let code = h.run("help nothing-here").await;
    assert_eq!(code, -1);
    assert_eq!(h.errors(), vec!["No help available for 'nothing-here'"]);
}

#[tokio::test]
async fn test_context_pins_and_unpins() {
    let mut h = Harness::new();

    h.run("alias --context").await;
    assert_eq!(h.executor.context_path().as_deref(), Some("alias"));

    assert_eq!(h.run("list").await, 0);
    assert_eq!(h.infos().last().unwrap(), "No aliases defined");

    // `help` still resolves from the top while pinned.
    assert_eq!(h.run("help").await, 0);
    // Top-level commands are out of scope.
    assert_eq!(h.run("echo hi").await, -1);

    h.run("..").await;
    assert_eq!(h.executor.context_path(), None);
    assert_eq!(h.run("list").await, -1);
    assert_eq!(h.run("echo hi").await, 0);
}

#[tokio::test]
async fn test_external_abort_unwinds_handler() {
    let mut h = Harness::with_processors(vec![Processor::new("sleepy", Sleepy)]);
    let controller = h.ctx.abort_controller().clone();

    let aborter = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        controller.abort();
    });

    let code = tokio::time::timeout(Duration::from_secs(5), h.run("sleepy && echo next"))
        .await
        .expect("abort should unwind the handler");
    aborter.await.unwrap();

    assert_eq!(code, -1);
    assert_eq!(h.plain(), vec!["started"]);
    assert_eq!(h.errors(), vec!["Command cancelled"]);
}

#[tokio::test]
async fn test_state_is_bound_per_processor() {
    let mut h = Harness::with_processors(vec![
        Processor::new("count", Count),
        Processor::new("tally", Count).store_name("count"),
        Processor::new("other", Count),
    ]);

    h.run("count").await;
    h.run("tally").await;
    h.run("other").await;
    assert_eq!(h.plain(), vec!["1", "2", "1"]);
    assert!(h.ctx.state().is_none());
}

#[tokio::test]
async fn test_boot_hydrates_state_before_initialize() {
    use termshell::state::{state_key, KeyValueStore, MemoryKeyValueStore};

    let log = journal();
    let kv = Arc::new(MemoryKeyValueStore::new());
    kv.set(&state_key("greet"), json!({ "greeted": 7 }))
        .await
        .unwrap();

    let mut h = Harness::with_storage(vec![greeter(&log)], kv);
    h.executor.boot(&mut h.ctx).await.unwrap();

    assert_eq!(entries(&log), vec!["init:7"]);
    let store = h.ctx.states().existing("greet").unwrap();
    assert_eq!(store.get_state(), json!({ "greeted": 7 }));
}

#[tokio::test]
async fn test_flag_before_sub_path_stays_out_of_value() {
    let mut h = Harness::new();

    assert_eq!(h.run("alias --quiet set ll echo hi").await, 0);
    h.out.clear();

    h.run("alias list").await;
    assert_eq!(h.plain(), vec!["ll = echo hi"]);
    h.run("ll").await;
    assert_eq!(h.plain(), vec!["ll = echo hi", "hi"]);
}
