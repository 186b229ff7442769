// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Outer page template substitution.
//!
//! A template is any text containing the placeholders `$css` and
//! `$content`. All occurrences of `$css` are replaced first, then all
//! occurrences of `$content`, so rendered transcript text can never be
//! mistaken for a placeholder.

/// Placeholder for the stylesheet.
pub const CSS_PLACEHOLDER: &str = "$css";

/// Placeholder for the rendered transcript.
pub const CONTENT_PLACEHOLDER: &str = "$content";

/// Viewport meta tag and stylesheet substituted for `$css`.
pub const PAGE_STYLE: &str = r#"<meta name="viewport" content="width=device-width">
<style>
		img.icon {
			border-radius: 50%;
		}
		div.one_person {
			display: flex;
			padding-bottom: 10px;
		}
		blockquote {
			position: relative;
			border-left: 3px solid #005242;
			padding-left: 10px;
			margin-inline-start: 10px;
			white-space: pre-wrap;
		}
		a {
			overflow-wrap: anywhere;
		}
		h3 {
			margin-top: 15px;
		}
		.name a {
			text-decoration: none;
			color: inherit;
		}
		.name a:hover {
			text-decoration: underline;
		}
		div.name_and_content {
			padding-left: 10px;
		}
		pre {
			white-space: pre-wrap;
		}
		body {
			text-size-adjust: 100%;
			-webkit-text-size-adjust: 100%;
		}
		.permalink {
			margin-left: 15px;
			padding: .2em .6em .3em;
			font-size: 75%;
			font-weight: 700;
			line-height: 1;
			color: #fff;
			text-align: center;
			white-space: nowrap;
			vertical-align: center;
			border-radius: .25em;
			background-color: #666666;
			text-decoration: none;
			visibility: hidden;
		}
	</style>"#;

/// Attribution footer appended after the transcript unless hidden.
pub const POWERED_BY: &str = r#"
<div style="font-size: 70%; display: flex; justify-content: center;">
	<div>
		Powered by <a href="https://github.com/sozysozbot/PseudoRoku">PseudoRoku</a>, which is designed by <a href="https://twitter.com/hsjoihs">hsjoihs</a>. <a href="https://github.com/sozysozbot/PseudoRoku/issues">Feel free to report any issues</a>.
	</div>
</div>"#;

/// Options for filling a page template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageOptions {
    /// Whether to append the [`POWERED_BY`] footer after the transcript.
    pub show_powered_by: bool,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            show_powered_by: true,
        }
    }
}

/// Substitutes the stylesheet and rendered transcript into `template`.
///
/// # Example
///
/// ```
/// use pseudoroku::page::{fill_template, PageOptions};
///
/// let opts = PageOptions { show_powered_by: false };
/// let page = fill_template("<body>$content</body>", "<p>hi</p>", &opts);
/// assert_eq!(page, "<body><p>hi</p></body>");
/// ```
#[must_use]
pub fn fill_template(template: &str, content_html: &str, opts: &PageOptions) -> String {
    let mut content = content_html.to_owned();
    if opts.show_powered_by {
        content.push_str(POWERED_BY);
    }

    template
        .replace(CSS_PLACEHOLDER, PAGE_STYLE)
        .replace(CONTENT_PLACEHOLDER, &content)
}
