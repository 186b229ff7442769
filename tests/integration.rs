// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Integration tests for pseudoroku conversion and page generation.

use pseudoroku::config::Config;
use pseudoroku::page::{self, PageOptions};
use pseudoroku::renderer::{AssetResolver, DirectoryAssets, RenderContext};
use pseudoroku::tables::{CensorTable, ProfileTable};
use pseudoroku::{Error, convert, grouper, tokenizer};
use std::fs;

const TRANSCRIPT: &str = "\
$DATE「2024-01-01」
Alice「Happy new year! See https://example.com/Alice」
Alice「<b>not bold</b>」
$IMAGE「fireworks.jpg」

$source
```python
print(\"Alice\")
```
$JOIN{Bob}{Carol}「Happy new year!」
$blockquote
```
Alice wrote:
www.example.com
```
Bob「bye」
";

fn ctx<'a>(
    censor: &'a CensorTable,
    profiles: &'a ProfileTable,
    assets: &'a DirectoryAssets,
) -> RenderContext<'a> {
    RenderContext {
        censor,
        profiles,
        assets,
    }
}

/// Runs the full pipeline on a realistic transcript.
#[test]
fn converts_full_transcript() {
    let censor = CensorTable::parse("Alice\tXXX\n").unwrap();
    let profiles = ProfileTable::parse("XXX\thttps://social.example/xxx\nBob\t\n");
    let assets = DirectoryAssets::default();

    let html = convert(TRANSCRIPT, &ctx(&censor, &profiles, &assets)).unwrap();

    assert!(
        html.starts_with("<h3 class=\"date\">2024-01-01</h3>\n<div class=\"one_person\">"),
        "date header should come first"
    );
    assert!(!html.contains("Alice"), "censored name leaked: {html}");
    assert_eq!(html.matches("<div class=\"one_person\">").count(), 3);
    assert!(html.contains(
        r#"<span class="name"><a href="https://social.example/xxx" target="_blank" rel="noopener noreferrer">XXX</a></span>"#
    ));
    assert!(html.contains(r#"src="icons/XXX.png" height="48px""#));
    assert!(html.contains(
        r#"<a href="https://example.com/XXX" target="_blank" rel="noopener noreferrer">https://example.com/XXX</a>"#
    ));
    assert!(html.contains("&lt;b&gt;not bold&lt;/b&gt;"));
    assert!(html.contains(r#"<img width="500" src="media/fireworks.jpg">"#));
    assert!(html.contains("<pre><code class=\"language-python\">print(&quot;XXX&quot;)\n</code></pre>"));
    assert!(html.contains(r#"<span class="name">Bob・Carol</span>"#));
    assert!(html.contains(r#"height="24px""#));
    assert!(html.contains("<blockquote>XXX wrote:\n<a href=\"http://www.example.com\""));
    assert!(html.contains(r#"<span class="name">Bob</span>"#));
}

/// The blockquote after a joint turn attaches to that joint turn.
#[test]
fn directives_attach_to_preceding_turn() {
    let elements = tokenizer::tokenize_str(TRANSCRIPT).unwrap();
    let turns = grouper::group_turns(elements).unwrap();

    let names: Vec<_> = turns.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, ["$DATE", "Alice", "$JOIN{Bob}{Carol}", "Bob"]);
    assert_eq!(turns[1].content.len(), 4);
    assert!(matches!(
        turns[2].content[1],
        grouper::ContentItem::Blockquote(_)
    ));
}

#[test]
fn same_speaker_lines_share_one_turn() {
    let censor = CensorTable::default();
    let profiles = ProfileTable::default();
    let assets = DirectoryAssets::default();

    let html = convert("Alice「one」\nAlice「two」", &ctx(&censor, &profiles, &assets)).unwrap();

    assert_eq!(html.matches("<div class=\"one_person\">").count(), 1);
    assert_eq!(html.matches("class=\"icon\"").count(), 1);
    assert!(html.contains("<div class=\"content\">one</div>\n\t\t<div class=\"content\">two</div>"));
}

#[test]
fn date_breaks_same_speaker_run() {
    let censor = CensorTable::default();
    let profiles = ProfileTable::default();
    let assets = DirectoryAssets::default();

    let html = convert(
        "Alice「one」\n$DATE「next day」\nAlice「two」",
        &ctx(&censor, &profiles, &assets),
    )
    .unwrap();

    assert_eq!(html.matches("<div class=\"one_person\">").count(), 2);
    assert_eq!(html.matches("<h3 class=\"date\">").count(), 1);
}

/// Transcripts saved with a byte order mark still open with a date header.
#[test]
fn byte_order_mark_is_ignored() {
    let censor = CensorTable::default();
    let profiles = ProfileTable::default();
    let assets = DirectoryAssets::default();

    let html = convert(
        "\u{FEFF}$DATE「2024-01-01」\nAlice「one」",
        &ctx(&censor, &profiles, &assets),
    )
    .unwrap();

    assert!(html.starts_with("<h3 class=\"date\">2024-01-01</h3>\n"));
    assert!(!html.contains('\u{FEFF}'));
}

#[test]
fn leading_directive_is_rejected() {
    let censor = CensorTable::default();
    let profiles = ProfileTable::default();
    let assets = DirectoryAssets::default();

    let err = convert("$URL「https://example.com」", &ctx(&censor, &profiles, &assets)).unwrap_err();

    assert_eq!(
        err,
        Error::Group {
            source: grouper::GroupError::DanglingDirective {
                line: 1,
                directive: "$URL".into()
            }
        }
    );
}

#[test]
fn malformed_fence_is_rejected() {
    let censor = CensorTable::default();
    let profiles = ProfileTable::default();
    let assets = DirectoryAssets::default();

    let err = convert("Alice「a」\n$source\nprint(1)", &ctx(&censor, &profiles, &assets))
        .unwrap_err();

    assert_eq!(err.to_string(), "line 3: expected ``` after $source");
}

/// Custom resolvers receive the censored name, unescaped.
#[test]
fn custom_asset_resolver() {
    struct CdnAssets;

    impl AssetResolver for CdnAssets {
        fn icon_path(&self, censored_name: &str) -> String {
            format!("https://cdn.example/icons/{}.webp", censored_name.len())
        }

        fn media_path(&self, media: &str) -> String {
            format!("https://cdn.example/media/{media}")
        }
    }

    let censor = CensorTable::default();
    let profiles = ProfileTable::default();
    let ctx = RenderContext {
        censor: &censor,
        profiles: &profiles,
        assets: &CdnAssets,
    };

    let html = convert("O&B「hi」\n$VIDEO「clip.mp4」", &ctx).unwrap();

    assert!(html.contains(r#"src="https://cdn.example/icons/3.webp""#));
    assert!(html.contains(r#"<video controls width="500" src="https://cdn.example/media/clip.mp4"></video>"#));
    assert!(html.contains(r#"alt="O&amp;B""#));
}

/// Builds a full page from files on disk, the way the CLI does.
#[test]
fn builds_page_from_config_directory() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("template.html"),
        "<html><head>$css</head><body>$content</body></html>",
    )
    .unwrap();
    fs::write(dir.path().join("censor.tsv"), "Alice\tXXX\n").unwrap();
    fs::write(dir.path().join("profiles.tsv"), "XXX\thttps://x.example\n").unwrap();
    fs::write(
        dir.path().join("site.json"),
        r#"{
            "template": "template.html",
            "censorList": "censor.tsv",
            "profileLookup": "profiles.tsv",
            "hidePoweredBy": true
        }"#,
    )
    .unwrap();

    let config = Config::load(&dir.path().join("site.json")).unwrap();
    let template = fs::read_to_string(config.template.unwrap()).unwrap();
    let censor = CensorTable::parse(&fs::read_to_string(config.censor_list.unwrap()).unwrap()).unwrap();
    let profiles = ProfileTable::parse(&fs::read_to_string(config.profile_lookup.unwrap()).unwrap());
    let assets = DirectoryAssets::default();
    let opts = PageOptions {
        show_powered_by: !config.hide_powered_by.unwrap_or(false),
    };

    let fragment = convert("Alice「hello」", &ctx(&censor, &profiles, &assets)).unwrap();
    let html = page::fill_template(&template, &fragment, &opts);

    assert!(html.starts_with("<html><head><meta name=\"viewport\""));
    assert!(html.contains("<style>"));
    assert!(html.contains(r#"<a href="https://x.example" target="_blank" rel="noopener noreferrer">XXX</a>"#));
    assert!(html.ends_with("</div>\n</body></html>"));
    assert!(!html.contains("Powered by"));
}
