// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! HTML rendering for grouped transcript turns.
//!
//! This module turns a sequence of [`Turn`]s into an HTML fragment. Every
//! piece of transcript text passes through the same stages, in order:
//!
//! 1. the [`CensorTable`] substitutions
//! 2. HTML escaping ([`escape_html`])
//! 3. URL autolinking ([`autolink`]), for plain text and blockquotes only
//!
//! Speaker names are resolved to icons through an [`AssetResolver`] and
//! linked to profiles found in a [`ProfileTable`].
//!
//! # Example
//!
//! ```
//! use pseudoroku::grouper::group_turns;
//! use pseudoroku::renderer::{render_turns, DirectoryAssets, RenderContext};
//! use pseudoroku::tables::{CensorTable, ProfileTable};
//! use pseudoroku::tokenizer::tokenize_str;
//!
//! let turns = group_turns(tokenize_str("Alice「see www.example.com」").unwrap()).unwrap();
//!
//! let censor = CensorTable::default();
//! let profiles = ProfileTable::default();
//! let assets = DirectoryAssets::default();
//! let ctx = RenderContext {
//!     censor: &censor,
//!     profiles: &profiles,
//!     assets: &assets,
//! };
//!
//! let html = render_turns(&turns, &ctx).unwrap();
//! assert!(html.contains(r#"<img alt="Alice" class="icon" src="icons/Alice.png" height="48px">"#));
//! assert!(html.contains(r#"<a href="http://www.example.com""#));
//! ```

use crate::grouper::{ContentItem, Turn};
use crate::tables::{CensorTable, ProfileTable};
use md5::{Digest, Md5};
use regex::{Captures, Regex};
use snafu::prelude::*;
use std::borrow::Cow;
use std::fmt::Write;
use std::sync::LazyLock;

/// Turn name rendered as a section header instead of a speaker turn.
pub const DATE_MARKER: &str = "$DATE";

/// Prefix of a joint-speaker marker, `$JOIN{a}{b}...`.
pub const JOIN_MARKER: &str = "$JOIN";

/// Total icon height for a turn, in pixels.
const BASE_ICON_SIZE: f64 = 48.0;

/// Joint turns with more speakers than this show [`GROUP_LABEL`].
const MAX_LISTED_SPEAKERS: usize = 5;

/// Label shown for large joint turns ("everyone").
const GROUP_LABEL: &str = "一同";

/// Separator between speaker names in a joint turn.
const NAME_SEPARATOR: &str = "・";

/// Separator between rendered content items within a turn.
const ITEM_SEPARATOR: &str = "\n\t\t";

/// Attributes for links that leave the page.
const EXTERNAL_LINK_ATTRS: &str = r#"target="_blank" rel="noopener noreferrer""#;

static URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:https?://|www\.)\S+").expect("valid URL regex"));

/// Error type for rendering failures.
#[derive(Debug, Snafu, PartialEq, Eq)]
pub enum RenderError {
    /// A `$JOIN` marker is not of the form `$JOIN{a}{b}...` with non-empty names.
    #[snafu(display("line {line}: malformed joint-speaker marker `{name}`"))]
    MalformedLine {
        /// The line that opened the turn.
        line: usize,
        /// The marker as written.
        name: String,
    },
}

/// Resolves speaker icons and media files to URLs or paths.
pub trait AssetResolver {
    /// Returns the icon location for a censored (unescaped) display name.
    fn icon_path(&self, censored_name: &str) -> String;

    /// Returns the location of a media file, given its censored and escaped
    /// name.
    fn media_path(&self, media: &str) -> String {
        format!("media/{media}")
    }
}

/// Resolves assets relative to fixed directories.
///
/// Icons are looked up as `<icon_dir>/<name>.<icon_extension>`, media as
/// `<media_dir>/<file>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryAssets {
    /// Directory holding one icon per censored display name.
    pub icon_dir: String,

    /// File extension of the icon images, without the dot.
    pub icon_extension: String,

    /// Directory holding images and videos.
    pub media_dir: String,
}

impl Default for DirectoryAssets {
    fn default() -> Self {
        Self {
            icon_dir: "icons".into(),
            icon_extension: "png".into(),
            media_dir: "media".into(),
        }
    }
}

impl AssetResolver for DirectoryAssets {
    fn icon_path(&self, censored_name: &str) -> String {
        let file = format!("{}.{}", escape_html(censored_name), self.icon_extension);
        join_path(&self.icon_dir, &file)
    }

    fn media_path(&self, media: &str) -> String {
        join_path(&self.media_dir, media)
    }
}

fn join_path(dir: &str, file: &str) -> String {
    let dir = dir.trim_end_matches('/');
    if dir.is_empty() {
        file.to_owned()
    } else {
        format!("{dir}/{file}")
    }
}

/// Read-only inputs shared by every turn of one render.
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
    /// Substitutions applied to all transcript text before escaping.
    pub censor: &'a CensorTable,

    /// Profile URLs, keyed by censored and escaped display name.
    pub profiles: &'a ProfileTable,

    /// Icon and media location policy.
    pub assets: &'a dyn AssetResolver,
}

/// How a turn's name is displayed.
enum Speaker<'t> {
    Date,
    Single(&'t str),
    Joint(Vec<&'t str>),
}

impl<'t> Speaker<'t> {
    fn of(turn: &'t Turn) -> Result<Self, RenderError> {
        if turn.name == DATE_MARKER {
            return Ok(Self::Date);
        }
        if !turn.name.starts_with(JOIN_MARKER) {
            return Ok(Self::Single(&turn.name));
        }

        let names: Vec<&str> = turn.name[JOIN_MARKER.len()..]
            .strip_prefix('{')
            .and_then(|rest| rest.strip_suffix('}'))
            .map(|inner| inner.split("}{").collect())
            .unwrap_or_default();
        ensure!(
            !names.is_empty()
                && names
                    .iter()
                    .all(|name| !name.is_empty() && !name.contains(['{', '}'])),
            MalformedLineSnafu {
                line: turn.line,
                name: &turn.name,
            }
        );
        Ok(Self::Joint(names))
    }
}

/// Renders turns as an HTML fragment, in order.
///
/// # Errors
///
/// Returns [`RenderError::MalformedLine`] if a turn's `$JOIN` marker cannot
/// be parsed. No partial output is produced.
pub fn render_turns(turns: &[Turn], ctx: &RenderContext<'_>) -> Result<String, RenderError> {
    let mut out = String::new();
    for turn in turns {
        ctx.render_turn(&mut out, turn)?;
    }
    tracing::debug!(turns = turns.len(), bytes = out.len(), "rendered turns");
    Ok(out)
}

impl RenderContext<'_> {
    fn render_turn(&self, out: &mut String, turn: &Turn) -> Result<(), RenderError> {
        let speaker = Speaker::of(turn)?;
        tracing::trace!(line = turn.line, name = %turn.name, items = turn.content.len(), "rendering turn");

        let (icons, label) = match speaker {
            Speaker::Date => {
                let heading = turn.content.first().map_or("", ContentItem::text);
                writeln!(out, r#"<h3 class="date">{}</h3>"#, self.clean(heading)).unwrap();
                return Ok(());
            }
            Speaker::Single(name) => (
                self.linked_icon(name, BASE_ICON_SIZE),
                self.linked_name(name),
            ),
            Speaker::Joint(names) => {
                #[allow(clippy::cast_precision_loss)]
                let size = BASE_ICON_SIZE / names.len() as f64;
                let icons: String = names.iter().map(|n| self.linked_icon(n, size)).collect();
                let label = if names.len() > MAX_LISTED_SPEAKERS {
                    GROUP_LABEL.to_owned()
                } else {
                    names
                        .iter()
                        .map(|n| self.linked_name(n))
                        .collect::<Vec<_>>()
                        .join(NAME_SEPARATOR)
                };
                (icons, label)
            }
        };

        let rendered = turn
            .content
            .iter()
            .map(|item| self.render_item(item))
            .collect::<Vec<_>>()
            .join(ITEM_SEPARATOR);
        let id = permalink_id(&rendered);

        write!(
            out,
            "<div class=\"one_person\">\n\
             \t<div>{icons}</div>\n\
             \t<div class=\"name_and_content\" \
             onmouseover=\"document.getElementById('permalink_{id}').style.visibility = 'visible'\" \
             onmouseout=\"document.getElementById('permalink_{id}').style.visibility = 'hidden'\">\n\
             \t\t<span class=\"name\">{label}</span>\
             <a id=\"permalink_{id}\" href=\"#permalink_{id}\" class=\"permalink\">¶</a>\n\
             \t\t{rendered}\n\
             \t</div>\n\
             </div>\n"
        )
        .unwrap();
        Ok(())
    }

    fn render_item(&self, item: &ContentItem) -> String {
        match item {
            ContentItem::Plaintext(text) => {
                format!(r#"<div class="content">{}</div>"#, autolink(&self.clean(text)))
            }
            ContentItem::Url(text) => {
                let url = self.clean(text);
                format!(r#"<div class="content"><a href="{url}" {EXTERNAL_LINK_ATTRS}>{url}</a></div>"#)
            }
            // Trusted markup: censored, never escaped.
            ContentItem::Html(text) => {
                format!(r#"<div class="content">{}</div>"#, self.censor.apply(text))
            }
            ContentItem::Blockquote(text) => {
                format!("<blockquote>{}</blockquote>", autolink(&self.clean(text)))
            }
            ContentItem::Image(text) => format!(
                r#"<div class="content"><img width="500" src="{}"></div>"#,
                self.assets.media_path(&self.clean(text))
            ),
            ContentItem::Video(text) => format!(
                r#"<div class="content"><video controls width="500" src="{}"></video></div>"#,
                self.assets.media_path(&self.clean(text))
            ),
            // The class follows the highlight.js `language-*` convention.
            ContentItem::Source { text, lang } => format!(
                r#"<pre><code class="language-{}">{}</code></pre>"#,
                escape_html(lang),
                self.clean(text)
            ),
        }
    }

    /// Censors, then escapes.
    fn clean(&self, text: &str) -> String {
        escape_html(&self.censor.apply(text))
    }

    fn linked_name(&self, name: &str) -> String {
        let shown = self.clean(name);
        match self.profiles.lookup(&shown) {
            Some(url) => format!(r#"<a href="{url}" {EXTERNAL_LINK_ATTRS}>{shown}</a>"#),
            None => shown,
        }
    }

    fn linked_icon(&self, name: &str, size: f64) -> String {
        let censored = self.censor.apply(name);
        let shown = escape_html(&censored);
        let img = format!(
            r#"<img alt="{shown}" class="icon" src="{}" height="{size}px">"#,
            self.assets.icon_path(&censored)
        );
        match self.profiles.lookup(&shown) {
            Some(url) => format!(r#"<a href="{url}" {EXTERNAL_LINK_ATTRS}>{img}</a>"#),
            None => img,
        }
    }
}

/// Derives a turn's anchor id from its rendered content.
fn permalink_id(rendered: &str) -> String {
    hex::encode(Md5::digest(rendered.as_bytes()))
}

/// Escapes the characters `& ' ` " < >` for use in HTML text and attributes.
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '\'' => result.push_str("&#x27;"),
            '`' => result.push_str("&#x60;"),
            '"' => result.push_str("&quot;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            _ => result.push(c),
        }
    }
    result
}

/// Wraps every `http(s)://...` or `www....` run in a hyperlink.
///
/// `escaped` must already be HTML-escaped: matched runs are copied into the
/// markup as-is. Runs without a scheme get `http://` in the `href` only.
#[must_use]
pub fn autolink(escaped: &str) -> Cow<'_, str> {
    URL_PATTERN.replace_all(escaped, |caps: &Captures<'_>| {
        let url = &caps[0];
        let href = if url.starts_with("www.") {
            Cow::Owned(format!("http://{url}"))
        } else {
            Cow::Borrowed(url)
        };
        format!(r#"<a href="{href}" {EXTERNAL_LINK_ATTRS}>{url}</a>"#)
    })
}
