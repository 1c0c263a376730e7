//! The `alias` built-in and alias expansion of unknown commands.

use serde_json::json;
use termshell::state::{state_key, KeyValueStore};

use super::common::Harness;
use pretty_assertions::assert_eq;

#[tokio::test]
async fn test_alias_expands_unknown_command() {
    let mut h = Harness::new();

    assert_eq!(h.run("alias set greet echo hello").await, 0);
    assert_eq!(h.run("greet").await, 0);
    h.run("greet there").await;

    assert_eq!(h.plain(), vec!["hello", "hello there"]);
}

#[tokio::test]
async fn test_alias_is_persisted() {
    let mut h = Harness::new();

    h.run("alias set ll alias list").await;

    let stored = h.kv.get(&state_key("alias")).await.unwrap();
    assert_eq!(stored, Some(json!({ "aliases": { "ll": "alias list" } })));
}

#[tokio::test]
async fn test_alias_list_and_remove() {
    let mut h = Harness::new();

    h.run("alias").await;
    assert_eq!(h.infos(), vec!["No aliases defined"]);

    h.run("alias set hi echo hi").await;
    h.run("alias set bye echo bye").await;
    h.out.clear();

    h.run("alias ls").await;
    assert_eq!(h.plain(), vec!["bye = echo bye", "hi  = echo hi"]);

    assert_eq!(h.run("alias rm hi").await, 0);
    assert_eq!(h.run("hi").await, -1);
    assert_eq!(h.errors(), vec!["Command not found: hi"]);

    let stored = h.kv.get(&state_key("alias")).await.unwrap();
    assert_eq!(stored, Some(json!({ "aliases": { "bye": "echo bye" } })));
}

#[tokio::test]
async fn test_remove_unknown_alias() {
    let mut h = Harness::new();

    assert_eq!(h.run("alias remove ghost").await, 1);
    assert_eq!(h.errors()[0], "No alias named 'ghost'");
}

#[tokio::test]
async fn test_alias_cannot_shadow_a_command() {
    let mut h = Harness::new();

    assert_eq!(h.run("alias set echo upper").await, 1);
    assert!(h.errors()[0].starts_with("'echo' is already a command"));

    h.run("echo unchanged").await;
    assert_eq!(h.plain(), vec!["unchanged"]);
}

#[tokio::test]
async fn test_alias_set_without_command() {
    let mut h = Harness::new();

    assert_eq!(h.run("alias set lonely").await, 2);
    assert_eq!(h.errors()[0], "Usage: alias set <name> <command...>");
}

#[tokio::test]
async fn test_quoted_alias_body_may_chain() {
    let mut h = Harness::new();

    h.run("alias set shout \"echo hey | upper\"").await;
    h.out.clear();

    assert_eq!(h.run("shout >> /log.txt").await, 0);
    assert_eq!(h.plain(), vec!["hey", "HEY"]);
    assert_eq!(h.fs.contents("/log.txt").unwrap(), "HEY\n");
}

#[tokio::test]
async fn test_alias_receives_piped_input() {
    let mut h = Harness::new();

    h.run("alias set up upper").await;
    h.out.clear();

    h.run("echo quiet | up").await;
    assert_eq!(h.plain(), vec!["quiet", "QUIET"]);
}

#[tokio::test]
async fn test_alias_failure_gates_chain() {
    let mut h = Harness::new();

    h.run("alias set broken nothing-here").await;
    h.out.clear();

    assert_eq!(h.run("broken && echo no || echo yes").await, 0);
    assert_eq!(h.plain(), vec!["yes"]);
    assert_eq!(h.errors(), vec!["Command not found: nothing-here"]);
}

#[tokio::test]
async fn test_self_referencing_alias_stops() {
    let mut h = Harness::new();

    h.run("alias set again again").await;

    let code = h.run("again").await;
    assert_eq!(code, -1);
    assert_eq!(
        h.errors(),
        vec!["Alias expansion for 'again' exceeded 8 levels"]
    );
}
