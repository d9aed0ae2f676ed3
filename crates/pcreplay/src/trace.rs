//! Access trace parser using nom
//!
//! Trace format, one access per line:
//! ```text
//! # comment
//! a.com AAA
//! b.com
//! c.com   contents with spaces
//! ```
//!
//! The key is the first run of non-whitespace characters. Everything after
//! the separating whitespace is the page contents, trailing whitespace
//! trimmed. Whitespace means Unicode whitespace, both here and when
//! deciding which lines to skip. Blank lines and lines starting with `#`
//! are skipped.

use std::fmt;

use nom::{
    bytes::complete::{take_while, take_while1},
    combinator::{all_consuming, opt, rest},
    sequence::{preceded, tuple},
    IResult,
};

/// One page access read from a trace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEntry {
    /// Page key, usually a URL
    pub key: String,
    /// Page contents, possibly empty
    pub contents: String,
}

/// Malformed trace line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// 1-based line number
    pub line: usize,
    /// What was wrong with the line
    pub message: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Parse error on line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for ParseError {}

fn is_key_char(c: char) -> bool {
    !c.is_whitespace() && !c.is_control()
}

/// Parse `key [contents]` from a single line with no trailing newline
pub fn parse_access(input: &str) -> IResult<&str, (&str, &str)> {
    let (remaining, (_, key, contents)) = all_consuming(tuple((
        take_while(char::is_whitespace),
        take_while1(is_key_char),
        opt(preceded(take_while1(char::is_whitespace), rest)),
    )))(input)?;

    Ok((remaining, (key, contents.unwrap_or("").trim_end())))
}

/// Parse a whole trace into entries, in file order
pub fn parse_trace(input: &str) -> Result<Vec<TraceEntry>, ParseError> {
    let mut entries = Vec::new();

    for (idx, raw) in input.lines().enumerate() {
        let line = raw.trim_end();
        let body = line.trim_start();
        if body.is_empty() || body.starts_with('#') {
            continue;
        }

        let (_, (key, contents)) = parse_access(line).map_err(|e| ParseError {
            line: idx + 1,
            message: format!("invalid access line {:?}: {}", line, e),
        })?;

        entries.push(TraceEntry {
            key: key.to_string(),
            contents: contents.to_string(),
        });
    }

    Ok(entries)
}
