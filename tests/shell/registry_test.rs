//! Runtime registration: sealing, extension and unregistering.

use async_trait::async_trait;
use termshell::commands::{CommandHandler, Invocation, Processor};
use termshell::context::ExecutionContext;
use termshell::error::{CommandResult, ShellError};
use tokio_test::assert_ok;

use super::common::{entries, journal, record, Harness};
use pretty_assertions::assert_eq;

/// Announces itself, then hands over to the processor it extends.
struct Announce;

#[async_trait]
impl CommandHandler for Announce {
    async fn run(&self, invocation: &Invocation<'_>, ctx: &mut ExecutionContext) -> CommandResult {
        ctx.writer().writeln("[extended]");
        match invocation.processor.wrapped() {
            Some(original) => original.handler().run(invocation, ctx).await,
            None => Ok(()),
        }
    }
}

fn echo_extension() -> Processor {
    Processor::new("echo", Announce)
        .extends_processor()
        .allow_unlisted_commands()
}

#[tokio::test]
async fn test_sealed_builtin_cannot_be_replaced() {
    let log = journal();
    let mut h = Harness::new();

    let err = h
        .executor
        .registry_mut()
        .register_processor(record("echo", &log))
        .unwrap_err();
    assert!(matches!(err, ShellError::Registry(_)));
    assert!(err.to_string().contains("sealed"));

    h.run("echo still here").await;
    assert!(entries(&log).is_empty());
    assert_eq!(h.plain(), vec!["still here"]);
}

#[tokio::test]
async fn test_extension_wraps_and_unregister_restores() {
    let mut h = Harness::new();

    let installed = assert_ok!(h.executor.registry_mut().register_processor(echo_extension()));
    assert!(installed.wrapped().is_some());
    assert!(installed.original().is_sealed());

    h.run("echo hi").await;
    assert_eq!(h.plain(), vec!["[extended]", "hi"]);

    let removed = assert_ok!(h.executor.registry_mut().unregister_processor("echo"));
    assert!(removed.is_extension());

    h.out.clear();
    h.run("echo hi").await;
    assert_eq!(h.plain(), vec!["hi"]);
}

#[tokio::test]
async fn test_sealed_builtin_cannot_be_unregistered() {
    let mut h = Harness::new();

    assert!(h.executor.registry_mut().unregister_processor("help").is_err());
    assert_eq!(h.run("help").await, 0);
}

#[tokio::test]
async fn test_unsealed_processor_is_replaced_in_place() {
    let first = journal();
    let second = journal();
    let mut h = Harness::with_processors(vec![record("job", &first)]);
    let before = h.executor.registry().len();

    assert_ok!(h
        .executor
        .registry_mut()
        .register_processor(record("job", &second)));
    assert_eq!(h.executor.registry().len(), before);

    h.run("job").await;
    assert!(entries(&first).is_empty());
    assert_eq!(entries(&second), vec!["job:-"]);
}

#[tokio::test]
async fn test_unregistered_command_is_not_found() {
    let log = journal();
    let mut h = Harness::with_processors(vec![record("job", &log).alias("j")]);

    assert_ok!(h.executor.registry_mut().unregister_processor("J"));
    assert_eq!(h.run("job").await, -1);
    assert_eq!(h.errors(), vec!["Command not found: job"]);
}

#[tokio::test]
async fn test_runtime_registration_is_case_insensitive() {
    let log = journal();
    let mut h = Harness::new();

    assert_ok!(h
        .executor
        .registry_mut()
        .register_processor(record("deploy", &log).alias("ship")));

    h.run("SHIP").await;
    h.run("Deploy").await;
    assert_eq!(entries(&log), vec!["deploy:-", "deploy:-"]);
}
