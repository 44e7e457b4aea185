//! Cache Key Module
//!
//! Deterministic string keys for caches shared by several kinds of lookup.
//!
//! A key is a kind discriminator followed by normalized (trimmed, lower-cased)
//! arguments, joined with `|`. Any `|` or `\` inside a part is escaped with
//! `\`, so arguments can never be confused with the delimiter.

use std::fmt;

use crate::error::{CacheError, Result};

/// Maximum number of arguments a key may carry.
pub const MAX_KEY_ARGS: usize = 4;

const DELIMITER: char = '|';
const ESCAPE: char = '\\';

// == Cache Key ==
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub kind: String,
    pub args: Vec<String>,
}

impl CacheKey {
    // == Constructor ==
    /// Builds a key, normalizing every argument.
    ///
    /// Fails with [`CacheError::InvalidKey`] on an empty kind or more than
    /// [`MAX_KEY_ARGS`] arguments.
    pub fn new<S: AsRef<str>>(kind: &str, args: &[S]) -> Result<Self> {
        if kind.is_empty() {
            return Err(CacheError::InvalidKey("key kind is empty".to_string()));
        }
        if args.len() > MAX_KEY_ARGS {
            return Err(CacheError::InvalidKey(format!(
                "{} arguments given for '{kind}', at most {MAX_KEY_ARGS} allowed",
                args.len()
            )));
        }

        Ok(Self {
            kind: kind.to_string(),
            args: args
                .iter()
                .map(|arg| arg.as_ref().trim().to_lowercase())
                .collect(),
        })
    }

    /// Shorthand for `CacheKey::new(kind, args)?.encode()`.
    pub fn encode_parts<S: AsRef<str>>(kind: &str, args: &[S]) -> Result<String> {
        Ok(Self::new(kind, args)?.encode())
    }

    // == Encode ==
    pub fn encode(&self) -> String {
        let mut out = String::with_capacity(
            self.kind.len() + self.args.iter().map(|a| a.len() + 1).sum::<usize>(),
        );
        push_escaped(&mut out, &self.kind);
        for arg in &self.args {
            out.push(DELIMITER);
            push_escaped(&mut out, arg);
        }
        out
    }

    // == Decode ==
    /// Parses a key produced by [`encode`](Self::encode).
    pub fn decode(encoded: &str) -> Result<Self> {
        let mut parts = vec![String::new()];
        let mut chars = encoded.chars();

        while let Some(c) = chars.next() {
            match c {
                ESCAPE => match chars.next() {
                    Some(escaped) => push_char(&mut parts, escaped),
                    None => {
                        return Err(CacheError::InvalidKey(format!(
                            "dangling escape at end of '{encoded}'"
                        )))
                    }
                },
                DELIMITER => parts.push(String::new()),
                other => push_char(&mut parts, other),
            }
        }

        let kind = parts.remove(0);
        if kind.is_empty() {
            return Err(CacheError::InvalidKey(format!("no kind in '{encoded}'")));
        }
        if parts.len() > MAX_KEY_ARGS {
            return Err(CacheError::InvalidKey(format!(
                "too many arguments in '{encoded}'"
            )));
        }
        Ok(Self { kind, args: parts })
    }

    /// Argument at `idx`, or an InvalidKey error naming what was expected.
    pub fn arg(&self, idx: usize, what: &str) -> Result<&str> {
        self.args.get(idx).map(String::as_str).ok_or_else(|| {
            CacheError::InvalidKey(format!("'{}' key is missing its {what}", self.kind))
        })
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

fn push_escaped(out: &mut String, part: &str) {
    for c in part.chars() {
        if c == DELIMITER || c == ESCAPE {
            out.push(ESCAPE);
        }
        out.push(c);
    }
}

fn push_char(parts: &mut [String], c: char) {
    if let Some(last) = parts.last_mut() {
        last.push(c);
    }
}
