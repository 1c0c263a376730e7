//! Command line interpretation.
//!
//! Parsing and chain splitting are pure functions; the registry holds the
//! processor tree and the executor ties everything together.

pub mod alias;
pub mod chain;
pub mod executor;
pub mod handlers;
pub mod help;
pub mod parser;
pub mod processor;
pub mod registry;
pub mod tokenizer;

pub use alias::AliasTable;
pub use chain::{split, ChainOperator, ChainPart};
pub use executor::CommandExecutor;
pub use parser::{parse, ArgValue, CommandArgs, ParsedCommand};
pub use processor::{CommandHandler, CommandHook, Invocation, ParameterDef, Processor};
pub use registry::{find_processor_in_collection, ProcessorRegistry, Resolved};
pub use tokenizer::{ParseError, Token};
