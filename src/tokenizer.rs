// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Line tokenizer for the transcript markup.
//!
//! A transcript is a sequence of lines. Each non-blank line is either a
//! speaker line of the form `NAME「TEXT」` (where `NAME` may also be a
//! `$`-prefixed directive such as `$URL` or `$DATE`), or one of the fenced
//! block directives `$source` and `$blockquote`, which are followed by a
//! fenced body:
//!
//! ````text
//! Alice「look at this」
//! $source
//! ```python
//! print(1)
//! ```
//! ````
//!
//! # Example
//!
//! ```
//! use pseudoroku::tokenizer::tokenize_str;
//!
//! let elements = tokenize_str("Alice「hello」\n\nBob「hi」").unwrap();
//! assert_eq!(elements.len(), 2);
//! assert_eq!(elements[0].name, "Alice");
//! assert_eq!(elements[1].content, "hi");
//! ```

use snafu::prelude::*;

/// Marker opening and closing a fenced block.
pub const FENCE: &str = "```";

/// Bracket separating a speaker name from the utterance.
const OPEN_BRACKET: char = '「';

/// Bracket that must terminate every speaker line.
const CLOSE_BRACKET: char = '」';

/// Byte order mark, treated as whitespace when trimming.
const BOM: char = '\u{FEFF}';

/// Error type for tokenizer failures.
///
/// Line numbers are 1-based and count every input line, blank ones included.
#[derive(Debug, Snafu, PartialEq, Eq)]
pub enum TokenizeError {
    /// A fenced directive was not immediately followed by an opening fence.
    #[snafu(display("line {line}: expected ``` after {directive}"))]
    MalformedFence {
        /// The line that should have opened the fence.
        line: usize,
        /// The directive that requires the fence.
        directive: String,
    },

    /// A fenced block ran to the end of the input without a closing fence.
    #[snafu(display("line {line}: {directive} block is never closed with ```"))]
    UnterminatedFence {
        /// The line holding the directive.
        line: usize,
        /// The directive that opened the block.
        directive: String,
    },

    /// A speaker line lacks the `「` separator or does not end with `」`.
    #[snafu(display("line {line}: expected NAME「TEXT」 ending with a closing bracket"))]
    MalformedLine {
        /// The offending line.
        line: usize,
    },
}

/// One tokenized transcript entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// The speaker name or directive marker (e.g. `Alice`, `$URL`, `$JOIN{a}{b}`).
    pub name: String,

    /// The utterance or directive payload.
    ///
    /// For fenced blocks this is the whole body, each line followed by `\n`.
    pub content: String,

    /// The info string after the opening fence. Only set for fenced blocks.
    pub lang: Option<String>,

    /// The 1-based line the element starts on.
    pub line: usize,
}

/// Directives whose payload is a fenced block rather than bracketed text.
fn fenced_directive(line: &str) -> Option<&'static str> {
    ["$source", "$blockquote"]
        .into_iter()
        .find(|directive| *directive == line)
}

fn is_blank(c: char) -> bool {
    c.is_whitespace() || c == BOM
}

/// Splits text into lines and tokenizes them.
///
/// Both `\n` and `\r\n` line endings are accepted, as is a leading byte
/// order mark.
///
/// # Errors
///
/// See [`tokenize`].
pub fn tokenize_str(text: &str) -> Result<Vec<Element>, TokenizeError> {
    let text = text.strip_prefix(BOM).unwrap_or(text);
    let lines: Vec<&str> = text.lines().collect();
    tokenize(&lines)
}

/// Tokenizes a sequence of raw lines into [`Element`]s, preserving order.
///
/// Blank lines are skipped outside fenced blocks and kept verbatim inside
/// them.
///
/// # Errors
///
/// Returns an error if a fenced directive is not followed by a fence, if a
/// fence is never closed, or if a speaker line is not of the form
/// `NAME「TEXT」`.
pub fn tokenize<S: AsRef<str>>(lines: &[S]) -> Result<Vec<Element>, TokenizeError> {
    let mut numbered = lines.iter().map(S::as_ref).zip(1..);
    let mut elements = Vec::new();

    while let Some((raw, line_no)) = numbered.next() {
        let line = raw.trim_matches(is_blank);
        if line.is_empty() {
            continue;
        }

        let element = match fenced_directive(line) {
            Some(directive) => read_fenced_block(&mut numbered, directive, line_no)?,
            None => parse_speaker_line(line, line_no)?,
        };
        elements.push(element);
    }

    tracing::debug!(elements = elements.len(), "tokenized transcript");
    Ok(elements)
}

/// Consumes the fence lines following a `$source`/`$blockquote` directive.
fn read_fenced_block<'a>(
    lines: &mut impl Iterator<Item = (&'a str, usize)>,
    directive: &str,
    line_no: usize,
) -> Result<Element, TokenizeError> {
    let lang = match lines.next() {
        Some((opener, _)) if opener.starts_with(FENCE) => opener[FENCE.len()..].trim().to_owned(),
        _ => {
            return MalformedFenceSnafu {
                line: line_no + 1,
                directive,
            }
            .fail();
        }
    };

    let mut content = String::new();
    loop {
        let (body, _) = lines
            .next()
            .context(UnterminatedFenceSnafu { line: line_no, directive })?;
        if body.trim_start_matches(is_blank).starts_with(FENCE) {
            break;
        }
        content.push_str(body);
        content.push('\n');
    }

    Ok(Element {
        name: directive.to_owned(),
        content,
        lang: Some(lang),
        line: line_no,
    })
}

/// Splits a trimmed `NAME「TEXT」` line at the first opening bracket.
fn parse_speaker_line(line: &str, line_no: usize) -> Result<Element, TokenizeError> {
    let body = line
        .strip_suffix(CLOSE_BRACKET)
        .context(MalformedLineSnafu { line: line_no })?;
    let (name, content) = body
        .split_once(OPEN_BRACKET)
        .context(MalformedLineSnafu { line: line_no })?;

    Ok(Element {
        name: name.trim_matches(is_blank).to_owned(),
        content: content.to_owned(),
        lang: None,
        line: line_no,
    })
}
