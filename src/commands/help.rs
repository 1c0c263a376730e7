//! Help text rendering.

use super::processor::Processor;
use super::registry::ProcessorRegistry;

/// Chaining and shortcut reference appended to the command overview.
pub const OPERATOR_HELP: &str = r#"Chaining:
  a && b           - Run b only if a succeeded
  a || b           - Run b only if a failed
  a | b            - Pass a's output to b
  a >> file        - Append a's output to file

Shortcuts:
  <command> -h     - Show help for a command
  <command> -v     - Show a command's version
  <command> --context - Scope following input to a command ('..' leaves)"#;

/// Renders the list of top-level commands.
pub fn render_overview(registry: &ProcessorRegistry) -> String {
    let rows: Vec<(String, &str)> = registry
        .processors()
        .iter()
        .map(|p| (signature(p), p.description_text()))
        .collect();
    let width = rows.iter().map(|(sig, _)| sig.len()).max().unwrap_or(0);

    let mut out = String::from("Available commands:\n");
    for (sig, description) in rows {
        if description.is_empty() {
            out.push_str(&format!("  {sig}\n"));
        } else {
            out.push_str(&format!("  {sig:<width$}  - {description}\n"));
        }
    }
    out.push('\n');
    out.push_str(OPERATOR_HELP);
    out
}

/// Renders the detailed help of one processor reached through `path`.
pub fn render_processor(processor: &Processor, path: &str) -> String {
    let mut out = path.to_string();
    if let Some(version) = processor.version_text() {
        out.push_str(&format!(" (v{version})"));
    }
    out.push('\n');

    if !processor.description_text().is_empty() {
        out.push_str(&format!("  {}\n", processor.description_text()));
    }

    out.push_str(&format!(
        "\nUsage:\n  {}\n",
        processor.usage_text().map_or_else(|| default_usage(processor, path), str::to_string)
    ));

    if !processor.aliases().is_empty() {
        out.push_str(&format!("\nAliases: {}\n", processor.aliases().join(", ")));
    }

    if !processor.parameters().is_empty() {
        out.push_str("\nParameters:\n");
        for parameter in processor.parameters() {
            let names = parameter
                .names()
                .map(|name| {
                    if name.chars().count() == 1 {
                        format!("-{name}")
                    } else {
                        format!("--{name}")
                    }
                })
                .collect::<Vec<_>>()
                .join(", ");
            let required = if parameter.required { " (required)" } else { "" };
            out.push_str(&format!("  {names}{required}"));
            if !parameter.description.is_empty() {
                out.push_str(&format!("  - {}", parameter.description));
            }
            out.push('\n');
        }
    }

    if processor.has_children() {
        out.push_str("\nSubcommands:\n");
        for child in processor.children() {
            out.push_str(&format!("  {path} {}", child.command()));
            if !child.description_text().is_empty() {
                out.push_str(&format!("  - {}", child.description_text()));
            }
            out.push('\n');
        }
    }

    out.trim_end().to_string()
}

fn signature(processor: &Processor) -> String {
    if processor.aliases().is_empty() {
        processor.command().to_string()
    } else {
        format!("{}, {}", processor.command(), processor.aliases().join(", "))
    }
}

fn default_usage(processor: &Processor, path: &str) -> String {
    let mut usage = path.to_string();
    if processor.has_children() {
        usage.push_str(" <subcommand>");
    }
    if processor.requires_value() {
        usage.push_str(" <value>");
    } else if processor.allows_unlisted_commands() {
        usage.push_str(" [value]");
    }
    for parameter in processor.parameters() {
        if parameter.required {
            usage.push_str(&format!(" --{}=<value>", parameter.name));
        }
    }
    usage
}
