//! termshell - a small shell-like command interpreter.

use std::process::ExitCode;
use std::sync::Arc;

use termshell::cli::{exit_status, Cli};
use termshell::commands::handlers::builtin_registry;
use termshell::commands::CommandExecutor;
use termshell::config::ShellConfig;
use termshell::context::{ExecutionContext, TerminalWriter, Writer};
use termshell::error::Result;
use termshell::fs::LocalFileSystem;
use termshell::logging::{self, LogTarget};
use termshell::state::{JsonFileStore, KeyValueStore, MemoryKeyValueStore, StateManager};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse_args();

    let config_path = cli.config_path();
    let mut config = match ShellConfig::load_from_file(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {e}", e.category());
            return ExitCode::FAILURE;
        }
    };
    cli.apply_to(&mut config);

    logging::init(LogTarget::for_session(cli.is_one_shot()), &config.log);
    info!("Loaded config from: {}", config_path.display());

    match run(&cli, &config).await {
        Ok(code) => ExitCode::from(exit_status(code)),
        Err(e) => {
            error!("{}: {}", e.category(), e);
            eprintln!("{}: {e}", e.category());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli, config: &ShellConfig) -> Result<i32> {
    let kv: Arc<dyn KeyValueStore> = if config.state.persist {
        Arc::new(JsonFileStore::open(&config.state_path()?).await?)
    } else {
        info!("State persistence disabled");
        Arc::new(MemoryKeyValueStore::new())
    };

    let writer: Arc<dyn Writer> = Arc::new(TerminalWriter::new());
    let mut ctx = ExecutionContext::new(writer, StateManager::new(kv));
    if config.filesystem.enabled {
        let root = config.filesystem_root();
        info!("Filesystem plugin rooted at {}", root.display());
        ctx = ctx.with_filesystem(Arc::new(LocalFileSystem::new(root)));
    }

    let mut executor = CommandExecutor::new(builtin_registry()?);
    executor.boot(&mut ctx).await?;

    if let Some(line) = &cli.command {
        return Ok(executor.execute_command(line, &mut ctx).await);
    }

    repl(&mut executor, &mut ctx, &config.prompt).await
}

/// Reads lines from stdin until `quit` or end of input.
///
/// Ctrl-C aborts the running line instead of the process.
async fn repl(
    executor: &mut CommandExecutor,
    ctx: &mut ExecutionContext,
    prompt: &str,
) -> Result<i32> {
    let abort = ctx.abort_controller().clone();
    let ctrl_c = tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            abort.abort();
        }
    });

    ctx.writer()
        .write_info("termshell - type 'help' for commands, 'quit' to leave");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let mut last_code = 0;

    loop {
        let prompt_text = match executor.context_path() {
            Some(path) => format!("{path} {prompt}"),
            None => prompt.to_string(),
        };
        if let Err(e) = stdout.write_all(prompt_text.as_bytes()).await {
            warn!("Failed to write prompt: {e}");
        }
        if let Err(e) = stdout.flush().await {
            warn!("Failed to flush prompt: {e}");
        }

        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!("Failed to read input: {e}");
                break;
            }
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "quit" {
            break;
        }

        last_code = executor.execute_command(line, ctx).await;
    }

    ctrl_c.abort();
    info!("Session ended");
    Ok(last_code)
}
