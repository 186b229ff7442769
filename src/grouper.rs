// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Folds tokenized elements into speaker turns.
//!
//! Consecutive lines by the same speaker merge into one [`Turn`], and content
//! directives (`$URL`, `$IMAGE`, `$source`, ...) attach typed
//! [`ContentItem`]s to whichever turn is current. Everything else, including
//! `$DATE` headers and `$JOIN{...}` markers, opens a new turn.
//!
//! # Example
//!
//! ```
//! use pseudoroku::grouper::{group_turns, ContentItem};
//! use pseudoroku::tokenizer::tokenize_str;
//!
//! let elements = tokenize_str("Alice「hi」\nAlice「again」\n$URL「https://example.com」").unwrap();
//! let turns = group_turns(elements).unwrap();
//!
//! assert_eq!(turns.len(), 1);
//! assert_eq!(turns[0].content[2], ContentItem::Url("https://example.com".into()));
//! ```

use crate::tokenizer::Element;
use snafu::prelude::*;
use std::fmt;
use std::str::FromStr;

/// Prefix shared by every reserved marker name.
pub const DIRECTIVE_PREFIX: char = '$';

/// Error type for grouping failures.
#[derive(Debug, Snafu, PartialEq, Eq)]
pub enum GroupError {
    /// A content directive appeared before any turn it could attach to.
    #[snafu(display("line {line}: {directive} has no preceding speaker to attach to"))]
    DanglingDirective {
        /// The line holding the directive.
        line: usize,
        /// The directive marker.
        directive: String,
    },

    /// A marker string does not name any content directive.
    #[snafu(display("unknown content type `{marker}`"))]
    UnknownContentType {
        /// The unrecognized marker.
        marker: String,
    },
}

/// A typed piece of content inside a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentItem {
    /// Spoken text, autolinked when rendered.
    Plaintext(String),
    /// An explicit hyperlink.
    Url(String),
    /// A fenced quotation.
    Blockquote(String),
    /// A media file shown as an image.
    Image(String),
    /// Trusted markup emitted without escaping.
    Html(String),
    /// A media file shown as a video player.
    Video(String),
    /// A fenced code block.
    Source {
        /// The code, one `\n`-terminated line per source line.
        text: String,
        /// The fence's info string, used as the highlighting language.
        lang: String,
    },
}

impl ContentItem {
    /// Returns the raw text payload, whatever the item's type.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Plaintext(text)
            | Self::Url(text)
            | Self::Blockquote(text)
            | Self::Image(text)
            | Self::Html(text)
            | Self::Video(text)
            | Self::Source { text, .. } => text,
        }
    }
}

/// A content directive: a marker that attaches a [`ContentItem`] to the
/// current turn instead of opening a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    /// `$URL`
    Url,
    /// `$HTML`
    Html,
    /// `$IMAGE`
    Image,
    /// `$VIDEO`
    Video,
    /// `$blockquote`
    Blockquote,
    /// `$source`
    Source,
}

/// Marker strings for each content directive.
const DIRECTIVES: [(&str, Directive); 6] = [
    ("$URL", Directive::Url),
    ("$HTML", Directive::Html),
    ("$IMAGE", Directive::Image),
    ("$VIDEO", Directive::Video),
    ("$blockquote", Directive::Blockquote),
    ("$source", Directive::Source),
];

impl Directive {
    /// Returns the marker string for this directive.
    #[must_use]
    pub fn marker(self) -> &'static str {
        DIRECTIVES
            .iter()
            .find_map(|&(marker, directive)| (directive == self).then_some(marker))
            .unwrap_or_default()
    }

    /// Builds the content item this directive produces for `text`.
    ///
    /// `lang` is only meaningful for [`Directive::Source`]; a missing value is
    /// treated as an empty language.
    #[must_use]
    pub fn into_item(self, text: String, lang: Option<String>) -> ContentItem {
        match self {
            Self::Url => ContentItem::Url(text),
            Self::Html => ContentItem::Html(text),
            Self::Image => ContentItem::Image(text),
            Self::Video => ContentItem::Video(text),
            Self::Blockquote => ContentItem::Blockquote(text),
            Self::Source => ContentItem::Source {
                text,
                lang: lang.unwrap_or_default(),
            },
        }
    }
}

impl FromStr for Directive {
    type Err = GroupError;

    fn from_str(marker: &str) -> Result<Self, Self::Err> {
        DIRECTIVES
            .iter()
            .find_map(|&(candidate, directive)| (candidate == marker).then_some(directive))
            .context(UnknownContentTypeSnafu { marker })
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.marker())
    }
}

/// A block of content attributed to one speaker, one joint-speaker marker,
/// or a `$DATE` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    /// The speaker name or marker that opened the turn.
    pub name: String,

    /// The 1-based line of the element that opened the turn.
    pub line: usize,

    /// Content items in transcript order. Never empty.
    pub content: Vec<ContentItem>,
}

impl Turn {
    fn open(element: Element) -> Self {
        Self {
            name: element.name,
            line: element.line,
            content: vec![ContentItem::Plaintext(element.content)],
        }
    }

    /// Returns `true` if a line by `name` continues this turn.
    ///
    /// Only literal speaker names continue a turn; markers never do.
    fn is_continued_by(&self, name: &str) -> bool {
        !name.is_empty() && !name.starts_with(DIRECTIVE_PREFIX) && self.name == name
    }
}

/// Groups elements into turns.
///
/// # Errors
///
/// Returns [`GroupError::DanglingDirective`] if a content directive comes
/// before the first turn.
pub fn group_turns(elements: Vec<Element>) -> Result<Vec<Turn>, GroupError> {
    let turns = elements
        .into_iter()
        .try_fold(Vec::<Turn>::new(), |mut turns, element| {
            if let Ok(directive) = element.name.parse::<Directive>() {
                let turn = turns.last_mut().context(DanglingDirectiveSnafu {
                    line: element.line,
                    directive: directive.marker(),
                })?;
                tracing::trace!(line = element.line, %directive, speaker = %turn.name, "attached directive");
                turn.content
                    .push(directive.into_item(element.content, element.lang));
            } else {
                match turns.last_mut() {
                    Some(turn) if turn.is_continued_by(&element.name) => {
                        turn.content.push(ContentItem::Plaintext(element.content));
                    }
                    _ => turns.push(Turn::open(element)),
                }
            }
            Ok::<_, GroupError>(turns)
        })?;

    tracing::debug!(turns = turns.len(), "grouped elements into turns");
    Ok(turns)
}
