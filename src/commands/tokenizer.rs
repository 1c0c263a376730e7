//! Tokenizer for a single command segment.
//!
//! Provides robust splitting of a segment into tokens with support for:
//! - Quoted strings (single and double quotes)
//! - Escape sequences within quotes
//! - Long and short flags (`--flag`, `-flag`), optionally with `=value`

/// The value attached to a flag with `=`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagValue {
    /// The value text with surrounding quotes removed.
    pub text: String,
    /// Whether the value was written in quotes.
    pub quoted: bool,
}

/// A token parsed from a command segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A bare word (quotes removed).
    Word(String),
    /// A flag written as `--name` or `-name`, optionally with `=value`.
    Flag {
        name: String,
        value: Option<FlagValue>,
    },
}

/// Whether a raw, whitespace-delimited token is read as a flag by
/// [`tokenize`]: one or two dashes followed by a letter or `_`.
pub fn is_flag_token(raw: &str) -> bool {
    raw.strip_prefix("--")
        .or_else(|| raw.strip_prefix('-'))
        .and_then(|name| name.chars().next())
        .is_some_and(|c| c.is_alphabetic() || c == '_')
}

type Chars<'a> = std::iter::Peekable<std::str::Chars<'a>>;

/// Tokenizes a command segment.
///
/// Handles:
/// - Whitespace-separated words: `pkg add` → `Word("pkg")`, `Word("add")`
/// - Quoted words: `"hello world"` → `Word("hello world")`
/// - Escape sequences in quotes: `"say \"hi\""` → `say "hi"`
/// - Flags: `--force`, `-v` → `Flag { name, value: None }`
/// - Flag values: `--name="a b"` → `Flag { name: "name", value: "a b" (quoted) }`
/// - A dash followed by a non-letter (`-5`, `-`) is a plain word.
pub fn tokenize(input: &str) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        if c == '-' {
            let mut lookahead = chars.clone();
            lookahead.next();
            let long = lookahead.peek() == Some(&'-');
            if long {
                lookahead.next();
            }
            let starts_name = lookahead
                .peek()
                .is_some_and(|next| next.is_alphabetic() || *next == '_');

            if starts_name {
                chars = lookahead;
                tokens.push(collect_flag(&mut chars, input)?);
                continue;
            }
            if long
                && lookahead
                    .peek()
                    .map_or(true, |next| next.is_whitespace() || *next == '=')
            {
                return Err(ParseError::new(input, "flag is missing a name"));
            }
        }

        let word = collect_word(&mut chars, input)?;
        tokens.push(Token::Word(word));
    }

    Ok(tokens)
}

/// Collects a flag name and optional `=value`; the leading dashes are consumed.
fn collect_flag(chars: &mut Chars<'_>, input: &str) -> Result<Token, ParseError> {
    let mut name = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_whitespace() || c == '=' {
            break;
        }
        if c == '"' || c == '\'' {
            return Err(ParseError::new(input, "unexpected quote in flag name"));
        }
        chars.next();
        name.push(c);
    }

    if chars.peek() != Some(&'=') {
        return Ok(Token::Flag { name, value: None });
    }
    chars.next();

    let value = match chars.peek() {
        Some(&quote @ ('"' | '\'')) => {
            chars.next();
            let text = collect_quoted(chars, quote, input)?;
            FlagValue { text, quoted: true }
        }
        _ => FlagValue {
            text: collect_word(chars, input)?,
            quoted: false,
        },
    };

    Ok(Token::Flag {
        name,
        value: Some(value),
    })
}

/// Collects a word, handling quoted regions inside it.
fn collect_word(chars: &mut Chars<'_>, input: &str) -> Result<String, ParseError> {
    let mut result = String::new();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            break;
        }

        chars.next();
        if c == '"' || c == '\'' {
            result.push_str(&collect_quoted(chars, c, input)?);
            continue;
        }
        result.push(c);
    }

    Ok(result)
}

/// Collects characters inside quotes, handling escape sequences.
///
/// The opening quote must already be consumed.
fn collect_quoted(chars: &mut Chars<'_>, quote: char, input: &str) -> Result<String, ParseError> {
    let mut result = String::new();
    let mut escaped = false;

    for c in chars.by_ref() {
        if escaped {
            match c {
                'n' => result.push('\n'),
                't' => result.push('\t'),
                'r' => result.push('\r'),
                '\\' => result.push('\\'),
                '"' => result.push('"'),
                '\'' => result.push('\''),
                _ => {
                    // Unknown escape, keep as-is
                    result.push('\\');
                    result.push(c);
                }
            }
            escaped = false;
            continue;
        }

        if c == '\\' {
            escaped = true;
            continue;
        }

        if c == quote {
            return Ok(result);
        }

        result.push(c);
    }

    Err(ParseError::new(input, "unterminated quoted string"))
}

/// Parse error with context for helpful error messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// The segment that failed to parse.
    pub command: String,
    /// Error message describing what went wrong.
    pub message: String,
}

impl ParseError {
    /// Creates a new parse error.
    pub fn new(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.command, self.message)
    }
}

impl std::error::Error for ParseError {}
