//! Chain splitting: `&&`, `||`, `|`, `>>`.
//!
//! The splitter only tags parts. Gating, data flow and redirection are the
//! executor's job.

use std::fmt;

/// An operator between two chain parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainOperator {
    /// `&&`: run the next part only if the last executed part succeeded.
    And,
    /// `||`: run the next part only if the last executed part failed.
    Or,
    /// `|`: always run the next part, feeding it the carried payload.
    Pipe,
    /// `>>`: the next part is a file path that receives the payload.
    Append,
}

impl ChainOperator {
    /// Returns the operator as written.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::And => "&&",
            Self::Or => "||",
            Self::Pipe => "|",
            Self::Append => ">>",
        }
    }
}

impl fmt::Display for ChainOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One element of a split line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainPart {
    /// Command text (trimmed, quotes preserved).
    Command(String),
    /// An operator.
    Operator(ChainOperator),
}

/// Splits a line into ordered command and operator parts (respecting quotes).
///
/// A lone `&` or `>` is ordinary command text. Empty command text between
/// operators is dropped.
pub fn split(line: &str) -> Vec<ChainPart> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars().peekable();
    let mut in_single = false;
    let mut in_double = false;

    let flush = |current: &mut String, parts: &mut Vec<ChainPart>| {
        let cmd = current.trim();
        if !cmd.is_empty() {
            parts.push(ChainPart::Command(cmd.to_string()));
        }
        current.clear();
    };

    while let Some(ch) = chars.next() {
        if in_single {
            current.push(ch);
            if ch == '\'' {
                in_single = false;
            }
            continue;
        }
        if in_double {
            current.push(ch);
            if ch == '"' {
                in_double = false;
            } else if ch == '\\' {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            continue;
        }

        let operator = match ch {
            '\'' => {
                in_single = true;
                None
            }
            '"' => {
                in_double = true;
                None
            }
            '&' if chars.peek() == Some(&'&') => Some(ChainOperator::And),
            '|' if chars.peek() == Some(&'|') => Some(ChainOperator::Or),
            '|' => Some(ChainOperator::Pipe),
            '>' if chars.peek() == Some(&'>') => Some(ChainOperator::Append),
            _ => None,
        };

        match operator {
            Some(op) => {
                if op != ChainOperator::Pipe {
                    chars.next(); // consume the second character
                }
                flush(&mut current, &mut parts);
                parts.push(ChainPart::Operator(op));
            }
            None => current.push(ch),
        }
    }

    flush(&mut current, &mut parts);
    parts
}
