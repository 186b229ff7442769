// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Convert line-oriented chat transcripts to static HTML.
//!
//! A transcript is plain text, one utterance per line:
//!
//! ```text
//! $DATE「2024-01-01」
//! Alice「Happy new year! https://example.com」
//! Alice「Did you see this?」
//! $IMAGE「fireworks.jpg」
//! $JOIN{Bob}{Carol}「Happy new year!」
//! ```
//!
//! # Overview
//!
//! Conversion is a three-stage pipeline:
//!
//! 1. [`tokenizer`] splits lines into elements (speaker + text, or a
//!    directive and its payload)
//! 2. [`grouper`] folds elements into speaker turns holding typed content
//! 3. [`renderer`] emits HTML, applying censorship, escaping, autolinking
//!    and icon/profile resolution
//!
//! [`convert`] runs all three. The result is a fragment meant to be placed
//! into a page with [`page::fill_template`].
//!
//! # Example
//!
//! ```
//! use pseudoroku::renderer::{DirectoryAssets, RenderContext};
//! use pseudoroku::tables::{CensorTable, ProfileTable};
//!
//! let censor = CensorTable::new([("Alice", "A.")]).unwrap();
//! let profiles = ProfileTable::default();
//! let assets = DirectoryAssets::default();
//! let ctx = RenderContext {
//!     censor: &censor,
//!     profiles: &profiles,
//!     assets: &assets,
//! };
//!
//! let html = pseudoroku::convert("Alice「hello」", &ctx).unwrap();
//! assert!(html.contains(r#"<span class="name">A.</span>"#));
//! ```
//!
//! # Modules
//!
//! - [`tokenizer`]: line tokenizer and [`tokenizer::Element`]
//! - [`grouper`]: [`grouper::Turn`] and [`grouper::ContentItem`] construction
//! - [`renderer`]: HTML generation
//! - [`tables`]: censorship and profile tables
//! - [`page`]: outer template substitution
//! - [`config`]: JSON configuration file

#![deny(missing_docs)]

pub mod config;
pub mod grouper;
pub mod page;
pub mod renderer;
pub mod tables;
pub mod tokenizer;

use snafu::prelude::*;

/// Error type for a failed conversion.
///
/// Any error aborts the whole conversion; there is no partial output.
#[derive(Debug, Snafu, PartialEq, Eq)]
pub enum Error {
    /// The transcript could not be tokenized.
    #[snafu(context(false), display("{source}"))]
    Tokenize {
        /// The underlying tokenizer error.
        source: tokenizer::TokenizeError,
    },

    /// The elements could not be grouped into turns.
    #[snafu(context(false), display("{source}"))]
    Group {
        /// The underlying grouping error.
        source: grouper::GroupError,
    },

    /// The turns could not be rendered.
    #[snafu(context(false), display("{source}"))]
    Render {
        /// The underlying rendering error.
        source: renderer::RenderError,
    },
}

/// Converts transcript text to an HTML fragment.
///
/// # Errors
///
/// Returns an error if any pipeline stage rejects the transcript.
pub fn convert(text: &str, ctx: &renderer::RenderContext<'_>) -> Result<String, Error> {
    let elements = tokenizer::tokenize_str(text)?;
    let turns = grouper::group_turns(elements)?;
    Ok(renderer::render_turns(&turns, ctx)?)
}
