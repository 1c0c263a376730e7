//! Processor definitions.
//!
//! A `Processor` is one node of the command tree: a name, metadata flags,
//! declared parameters, optional hooks and children, and the handler that
//! does the work. Capabilities are checked at dispatch time
//! (`has_children`, `parameters`, `before_hooks`, ...).

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::parser::{ArgValue, CommandArgs};
use super::registry::ProcessorRegistry;
use crate::context::ExecutionContext;
use crate::error::{CommandResult, Result};

/// Checks one parameter value, returning a human-readable reason on failure.
pub type Validator = Arc<dyn Fn(&ArgValue) -> std::result::Result<(), String> + Send + Sync>;

/// The body of a command.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Runs the command.
    async fn run(&self, invocation: &Invocation<'_>, ctx: &mut ExecutionContext) -> CommandResult;

    /// Lifecycle hook called once at boot, after the processor's state bucket
    /// has been hydrated.
    async fn initialize(&self, _ctx: &mut ExecutionContext) -> Result<()> {
        Ok(())
    }
}

/// A before/after hook around a handler.
#[async_trait]
pub trait CommandHook: Send + Sync {
    async fn call(&self, invocation: &Invocation<'_>, ctx: &mut ExecutionContext) -> CommandResult;
}

/// Everything a handler receives about the segment being run.
pub struct Invocation<'a> {
    /// The resolved processor.
    pub processor: &'a Processor,
    /// Path words the resolution consumed (`["alias", "set"]`).
    pub path: &'a [String],
    /// Coerced flags of the segment.
    pub args: &'a CommandArgs,
    /// Free text after the command path, for processors that take one.
    pub value: Option<&'a str>,
    /// Payload piped in from the previous segment.
    pub input: Option<&'a Value>,
    /// The raw segment text.
    pub raw: &'a str,
    /// The registry the processor was resolved from.
    pub registry: &'a ProcessorRegistry,
}

impl Invocation<'_> {
    /// The free-text value, falling back to the piped input rendered as text.
    pub fn value_or_input(&self) -> Option<String> {
        self.value
            .map(str::to_string)
            .or_else(|| self.input.map(value_to_text))
    }
}

/// Renders a payload as text: strings verbatim, everything else as JSON.
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

/// A declared parameter.
#[derive(Clone)]
pub struct ParameterDef {
    pub name: String,
    pub aliases: Vec<String>,
    pub required: bool,
    pub description: String,
    pub validator: Option<Validator>,
}

impl ParameterDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            required: false,
            description: String::new(),
            validator: None,
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&ArgValue) -> std::result::Result<(), String> + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(validator));
        self
    }

    /// The parameter name followed by its aliases.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    /// Returns true if `flag` is this parameter's name or one of its aliases.
    pub fn answers_to(&self, flag: &str) -> bool {
        self.names().any(|name| name == flag)
    }
}

impl fmt::Debug for ParameterDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterDef")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("required", &self.required)
            .field("has_validator", &self.validator.is_some())
            .finish()
    }
}

/// One node of the command tree.
#[derive(Clone)]
pub struct Processor {
    command: String,
    aliases: Vec<String>,
    description: String,
    usage: Option<String>,
    version: Option<String>,
    sealed: bool,
    extends_processor: bool,
    allow_unlisted_commands: bool,
    value_required: bool,
    parameters: Vec<ParameterDef>,
    store_name: Option<String>,
    default_state: Value,
    processors: Vec<Arc<Processor>>,
    before_hooks: Vec<Arc<dyn CommandHook>>,
    after_hooks: Vec<Arc<dyn CommandHook>>,
    handler: Arc<dyn CommandHandler>,
    wrapped: Option<Arc<Processor>>,
}

impl Processor {
    /// Creates a processor for `command` run by `handler`.
    pub fn new(command: impl Into<String>, handler: impl CommandHandler + 'static) -> Self {
        Self {
            command: command.into(),
            aliases: Vec::new(),
            description: String::new(),
            usage: None,
            version: None,
            sealed: false,
            extends_processor: false,
            allow_unlisted_commands: false,
            value_required: false,
            parameters: Vec::new(),
            store_name: None,
            default_state: Value::Object(Default::default()),
            processors: Vec::new(),
            before_hooks: Vec::new(),
            after_hooks: Vec::new(),
            handler: Arc::new(handler),
            wrapped: None,
        }
    }

    // ========== Builder ==========

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = Some(usage.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Marks the processor as only replaceable through extension.
    pub fn sealed(mut self) -> Self {
        self.sealed = true;
        self
    }

    /// Registers on top of an existing processor instead of replacing it.
    pub fn extends_processor(mut self) -> Self {
        self.extends_processor = true;
        self
    }

    /// Accepts unknown sub-paths as free text.
    pub fn allow_unlisted_commands(mut self) -> Self {
        self.allow_unlisted_commands = true;
        self
    }

    /// Requires a non-empty free-text value.
    pub fn value_required(mut self) -> Self {
        self.value_required = true;
        self
    }

    pub fn parameter(mut self, parameter: ParameterDef) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Names the state bucket; processors sharing a name share the bucket.
    pub fn store_name(mut self, name: impl Into<String>) -> Self {
        self.store_name = Some(name.into());
        self
    }

    pub fn default_state(mut self, state: Value) -> Self {
        self.default_state = state;
        self
    }

    pub fn child(mut self, child: Processor) -> Self {
        self.processors.push(Arc::new(child));
        self
    }

    pub fn before(mut self, hook: impl CommandHook + 'static) -> Self {
        self.before_hooks.push(Arc::new(hook));
        self
    }

    pub fn after(mut self, hook: impl CommandHook + 'static) -> Self {
        self.after_hooks.push(Arc::new(hook));
        self
    }

    pub(crate) fn wrapping(mut self, original: Arc<Processor>) -> Self {
        self.wrapped = Some(original);
        self
    }

    // ========== Accessors ==========

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn description_text(&self) -> &str {
        &self.description
    }

    pub fn usage_text(&self) -> Option<&str> {
        self.usage.as_deref()
    }

    pub fn version_text(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn is_extension(&self) -> bool {
        self.extends_processor
    }

    pub fn allows_unlisted_commands(&self) -> bool {
        self.allow_unlisted_commands
    }

    pub fn requires_value(&self) -> bool {
        self.value_required
    }

    /// Whether the processor computes a free-text value.
    pub fn takes_value(&self) -> bool {
        self.allow_unlisted_commands || self.value_required
    }

    pub fn parameters(&self) -> &[ParameterDef] {
        &self.parameters
    }

    /// The bucket name: declared store name, else the command name.
    pub fn bucket_name(&self) -> &str {
        self.store_name.as_deref().unwrap_or(&self.command)
    }

    pub fn default_state_value(&self) -> &Value {
        &self.default_state
    }

    pub fn children(&self) -> &[Arc<Processor>] {
        &self.processors
    }

    pub fn has_children(&self) -> bool {
        !self.processors.is_empty()
    }

    pub fn before_hooks(&self) -> &[Arc<dyn CommandHook>] {
        &self.before_hooks
    }

    pub fn after_hooks(&self) -> &[Arc<dyn CommandHook>] {
        &self.after_hooks
    }

    pub fn handler(&self) -> &Arc<dyn CommandHandler> {
        &self.handler
    }

    /// The processor this one extends, if any.
    pub fn wrapped(&self) -> Option<&Arc<Processor>> {
        self.wrapped.as_ref()
    }

    /// Follows the extension chain down to the first registered processor.
    pub fn original(&self) -> &Processor {
        let mut current = self;
        while let Some(previous) = current.wrapped.as_deref() {
            current = previous;
        }
        current
    }

    // ========== Matching & validation ==========

    /// The command name followed by its aliases.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.command.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    /// Case-insensitive match on the command name or any alias.
    pub fn matches(&self, name: &str) -> bool {
        self.names().any(|own| own.eq_ignore_ascii_case(name))
    }

    /// Whether the two processors would occupy the same sibling slot.
    pub fn conflicts_with(&self, other: &Processor) -> bool {
        other.names().any(|name| self.matches(name))
    }

    /// Whether a flag is claimed by a declared parameter.
    pub fn declares(&self, flag: &str) -> bool {
        self.parameters.iter().any(|p| p.answers_to(flag))
    }

    /// Checks required parameters and validators.
    ///
    /// Returns one message per failure; empty means valid.
    pub fn validate(&self, args: &CommandArgs) -> Vec<String> {
        let mut failures = Vec::new();
        for parameter in &self.parameters {
            match args.get_any(parameter.names()) {
                None if parameter.required => {
                    failures.push(format!("Missing required parameter: --{}", parameter.name));
                }
                None => {}
                Some(value) => {
                    if let Some(validator) = &parameter.validator {
                        if let Err(reason) = validator(value) {
                            failures.push(format!(
                                "Invalid value for --{}: {reason}",
                                parameter.name
                            ));
                        }
                    }
                }
            }
        }
        failures
    }
}

impl fmt::Debug for Processor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Processor")
            .field("command", &self.command)
            .field("aliases", &self.aliases)
            .field("sealed", &self.sealed)
            .field("extends_processor", &self.extends_processor)
            .field("children", &self.processors.len())
            .field("wraps", &self.wrapped.as_ref().map(|w| w.command()))
            .finish()
    }
}
