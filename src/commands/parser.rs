//! Segment parser: turns one command segment into a command path and flags.
//!
//! Parsing never fails outward. Malformed input degrades to an empty
//! command, which the executor reports as "not found".

use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;

use super::tokenizer::{is_flag_token, tokenize, Token};

/// A coerced flag value.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    /// Numeric-looking values (`--n=3`).
    Number(f64),
    /// `true`/`false` values and bare flags (`--force`).
    Bool(bool),
    /// Anything else, including every quoted value.
    Str(String),
}

impl ArgValue {
    /// Coerces raw flag text into a typed value.
    ///
    /// Quoted text is never coerced.
    pub fn coerce(text: &str, quoted: bool) -> Self {
        if quoted {
            return Self::Str(text.to_string());
        }
        match text {
            "true" => Self::Bool(true),
            "false" => Self::Bool(false),
            _ if looks_numeric(text) => text
                .parse::<f64>()
                .map(Self::Number)
                .unwrap_or_else(|_| Self::Str(text.to_string())),
            _ => Self::Str(text.to_string()),
        }
    }

    /// Returns the value as a string slice if it is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value as a number if it is one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Self::Number(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

/// Digits, sign, decimal point and exponent only; rejects `inf`/`NaN`.
fn looks_numeric(text: &str) -> bool {
    !text.is_empty()
        && text.chars().any(|c| c.is_ascii_digit())
        && text
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'))
}

/// Flag map for one segment, keyed by flag name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandArgs(BTreeMap<String, ArgValue>);

impl CommandArgs {
    /// Creates an empty flag map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a flag, replacing any earlier value.
    pub fn insert(&mut self, name: impl Into<String>, value: ArgValue) {
        self.0.insert(name.into(), value);
    }

    /// Returns the value of a flag.
    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.0.get(name)
    }

    /// Returns the value of the first flag present among `names`.
    pub fn get_any<'a>(&'a self, names: impl IntoIterator<Item = &'a str>) -> Option<&'a ArgValue> {
        names.into_iter().find_map(|name| self.0.get(name))
    }

    /// Returns whether a flag is present.
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Returns true if the flag is present and not explicitly `false`.
    pub fn flag(&self, name: &str) -> bool {
        self.0
            .get(name)
            .is_some_and(|value| value != &ArgValue::Bool(false))
    }

    /// Returns true if there are no flags.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of flags.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates flags in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ArgValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// One parsed command segment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedCommand {
    /// Bare words joined by single spaces (`"pkg add"`).
    pub command_name: String,
    /// The bare words in order.
    pub words: Vec<String>,
    /// Coerced flags.
    pub args: CommandArgs,
}

impl ParsedCommand {
    /// The root command word.
    pub fn root(&self) -> Option<&str> {
        self.words.first().map(String::as_str)
    }

    /// Sub-path words following the root.
    pub fn chain(&self) -> &[String] {
        self.words.get(1..).unwrap_or(&[])
    }

    /// Returns true if the segment named no command.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Parses one command segment.
///
/// Bare words form the command path; `--name` / `-name` become flags,
/// `true` when no `=value` is given.
pub fn parse(segment: &str) -> ParsedCommand {
    let tokens = match tokenize(segment) {
        Ok(tokens) => tokens,
        Err(e) => {
            debug!("Parse failure, treating as empty command: {e}");
            return ParsedCommand::default();
        }
    };

    let mut words = Vec::new();
    let mut args = CommandArgs::new();
    for token in tokens {
        match token {
            Token::Word(word) => words.push(word),
            Token::Flag { name, value: None } => args.insert(name, ArgValue::Bool(true)),
            Token::Flag {
                name,
                value: Some(value),
            } => args.insert(name, ArgValue::coerce(&value.text, value.quoted)),
        }
    }

    ParsedCommand {
        command_name: words.join(" "),
        words,
        args,
    }
}

/// Returns `raw` with everything up to and including its `count`-th bare
/// word removed.
///
/// Flag tokens met on the way are skipped without counting, so
/// `pkg --dry add x` minus two words is `x`. Quoted regions count as part
/// of the token they appear in. The remainder is returned verbatim, only
/// trimmed.
pub fn skip_words(raw: &str, count: usize) -> &str {
    let mut rest = raw.trim_start();
    let mut skipped = 0;
    while skipped < count && !rest.is_empty() {
        let end = token_end(rest);
        if !is_flag_token(&rest[..end]) {
            skipped += 1;
        }
        rest = rest[end..].trim_start();
    }
    rest.trim_end()
}

/// Byte length of the leading token of `text`, honouring quotes.
fn token_end(text: &str) -> usize {
    let mut quote: Option<char> = None;
    for (i, c) in text.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' || c == '\'' => quote = Some(c),
            None if c.is_whitespace() => return i,
            None => {}
        }
    }
    text.len()
}
