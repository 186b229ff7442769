// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Censorship and profile lookup tables.
//!
//! Both tables are loaded from tab-separated text, one entry per line:
//!
//! ```text
//! Real Name<TAB>Pseudonym
//! https://private\.example\.com/\S*<TAB>[redacted]
//! ```
//!
//! ```text
//! Pseudonym<TAB>https://example.com/~pseudonym
//! ```

use regex::{Captures, Regex};
use snafu::prelude::*;

/// Error type for table parsing failures.
#[derive(Debug, Snafu)]
pub enum TableError {
    /// A censorship rule has no tab-separated replacement.
    #[snafu(display("censor table line {line}: expected PATTERN<TAB>REPLACEMENT"))]
    MissingReplacement {
        /// The offending line (1-based).
        line: usize,
    },

    /// A censorship pattern is not a valid regular expression.
    #[snafu(display("censor table line {line}: invalid pattern: {source}"))]
    InvalidPattern {
        /// The offending line (1-based).
        line: usize,
        /// The underlying regex compilation error.
        source: regex::Error,
    },
}

/// A single censorship substitution.
#[derive(Debug, Clone)]
struct CensorRule {
    pattern: Regex,
    replacement: String,
}

impl CensorRule {
    fn apply(&self, text: &str) -> String {
        self.pattern
            .replace_all(text, |caps: &Captures<'_>| {
                let mut out = String::new();
                self.expand(text, caps, &mut out);
                out
            })
            .into_owned()
    }

    /// Expands the replacement template for one match.
    ///
    /// References that name no group in the pattern are kept literally.
    fn expand(&self, haystack: &str, caps: &Captures<'_>, out: &mut String) {
        let whole = caps.get(0).map_or(0..0, |m| m.range());
        let mut rest = self.replacement.as_str();

        while let Some(pos) = rest.find('$') {
            out.push_str(&rest[..pos]);
            rest = &rest[pos + 1..];
            let consumed = match rest.as_bytes().first().copied() {
                Some(b'$') => {
                    out.push('$');
                    1
                }
                Some(b'&') => {
                    out.push_str(&haystack[whole.clone()]);
                    1
                }
                Some(b'`') => {
                    out.push_str(&haystack[..whole.start]);
                    1
                }
                Some(b'\'') => {
                    out.push_str(&haystack[whole.end..]);
                    1
                }
                Some(b'<') => self.expand_named(rest, caps, out),
                Some(b'0'..=b'9') => expand_numbered(rest, caps, out),
                _ => 0,
            };
            if consumed == 0 {
                out.push('$');
            }
            rest = &rest[consumed..];
        }
        out.push_str(rest);
    }

    /// Expands `<name>` at the start of `rest`, returning the bytes consumed.
    fn expand_named(&self, rest: &str, caps: &Captures<'_>, out: &mut String) -> usize {
        let Some(end) = rest.find('>') else {
            return 0;
        };
        let name = &rest[1..end];
        if !self.pattern.capture_names().flatten().any(|n| n == name) {
            return 0;
        }
        out.push_str(caps.name(name).map_or("", |m| m.as_str()));
        end + 1
    }
}

/// Expands a one- or two-digit group number at the start of `rest`,
/// returning the bytes consumed.
///
/// Two digits are taken only if they name an existing group, so `$1x` and
/// `$15` with one group both mean group 1 followed by the rest.
fn expand_numbered(rest: &str, caps: &Captures<'_>, out: &mut String) -> usize {
    let digits: Vec<usize> = rest
        .bytes()
        .take(2)
        .map_while(|b| b.is_ascii_digit().then(|| usize::from(b - b'0')))
        .collect();
    let candidates = [
        (digits.len() == 2).then(|| digits[0] * 10 + digits[1]).map(|n| (n, 2)),
        digits.first().map(|&n| (n, 1)),
    ];

    for (group, width) in candidates.into_iter().flatten() {
        if (1..caps.len()).contains(&group) {
            out.push_str(caps.get(group).map_or("", |m| m.as_str()));
            return width;
        }
    }
    0
}

/// An ordered list of global regex substitutions.
///
/// Rules apply in order, each to the output of the previous one. An empty
/// table leaves text untouched.
#[derive(Debug, Clone, Default)]
pub struct CensorTable {
    rules: Vec<CensorRule>,
}

impl CensorTable {
    /// Compiles a table from `(pattern, replacement)` pairs.
    ///
    /// Replacements may use `$1` to `$99` and `$<name>` for capture groups,
    /// `$&` for the whole match, `` $` `` and `$'` for the text before and
    /// after it, and `$$` for a literal `$`. A reference to a group the
    /// pattern does not have is kept as written.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::InvalidPattern`] for the first pattern that fails
    /// to compile, numbering rules from 1.
    pub fn new<P, R>(rules: impl IntoIterator<Item = (P, R)>) -> Result<Self, TableError>
    where
        P: AsRef<str>,
        R: Into<String>,
    {
        let rules = rules
            .into_iter()
            .zip(1usize..)
            .map(|((pattern, replacement), line)| {
                Ok(CensorRule {
                    pattern: Regex::new(pattern.as_ref()).context(InvalidPatternSnafu { line })?,
                    replacement: replacement.into(),
                })
            })
            .collect::<Result<Vec<_>, TableError>>()?;
        Ok(Self { rules })
    }

    /// Parses the tab-separated censor file format.
    ///
    /// Blank lines are skipped. The replacement is the second tab-separated
    /// field, trimmed; the pattern is used as written. Further fields are
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if a non-blank line has no tab or its pattern does
    /// not compile.
    pub fn parse(text: &str) -> Result<Self, TableError> {
        let rules = text
            .lines()
            .zip(1usize..)
            .filter(|(row, _)| !row.trim().is_empty())
            .map(|(row, line)| {
                let mut fields = row.split('\t');
                let pattern = fields.next().unwrap_or_default();
                let replacement = fields.next().context(MissingReplacementSnafu { line })?;
                Ok(CensorRule {
                    pattern: Regex::new(pattern).context(InvalidPatternSnafu { line })?,
                    replacement: replacement.trim().to_owned(),
                })
            })
            .collect::<Result<Vec<_>, TableError>>()?;

        tracing::debug!(rules = rules.len(), "loaded censor table");
        Ok(Self { rules })
    }

    /// Returns the number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` if the table has no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Applies every rule to `text`, in order.
    #[must_use]
    pub fn apply(&self, text: &str) -> String {
        self.rules
            .iter()
            .fold(text.to_owned(), |acc, rule| rule.apply(&acc))
    }
}

/// Maps censored display names to profile URLs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileTable {
    entries: Vec<(String, String)>,
}

impl ProfileTable {
    /// Builds a table from `(name, url)` pairs. Earlier entries win.
    pub fn new<N, U>(entries: impl IntoIterator<Item = (N, U)>) -> Self
    where
        N: Into<String>,
        U: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(name, url)| (name.into(), url.into()))
                .collect(),
        }
    }

    /// Parses the tab-separated profile file format.
    ///
    /// A line without a tab names a speaker with no profile. Fields after
    /// the URL are ignored.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let table = Self::new(text.lines().map(|row| {
            let mut fields = row.split('\t');
            let name = fields.next().unwrap_or_default();
            (name, fields.next().unwrap_or_default())
        }));
        tracing::debug!(entries = table.entries.len(), "loaded profile table");
        table
    }

    /// Returns the profile URL for `name`, if it has a non-blank one.
    ///
    /// Only the first entry for `name` is consulted.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(candidate, _)| candidate == name)
            .map(|(_, url)| url.trim())
            .filter(|url| !url.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_censor_table_is_identity() {
        let table = CensorTable::default();

        assert!(table.is_empty());
        assert_eq!(table.apply("Alice <b>"), "Alice <b>");
    }

    #[test]
    fn applies_rules_globally_and_in_order() {
        let table = CensorTable::new([("Alice", "Carol"), ("Carol", "XXX")]).unwrap();

        assert_eq!(table.apply("Alice and Alice"), "XXX and XXX");
    }

    #[test]
    fn supports_regex_patterns_and_groups() {
        let table = CensorTable::new([(r"(\d{3})-\d{4}", "$1-****")]).unwrap();

        assert_eq!(table.apply("call 555-1234 now"), "call 555-**** now");
    }

    #[test]
    fn unknown_group_reference_is_literal() {
        let table = CensorTable::new([("price", "US$5")]).unwrap();

        assert_eq!(table.apply("the price"), "the US$5");
    }

    #[test]
    fn group_reference_followed_by_text() {
        let table = CensorTable::new([("(Al)ice", "$1x")]).unwrap();

        assert_eq!(table.apply("Alice"), "Alx");
    }

    #[test]
    fn two_digit_reference_falls_back_to_one_digit() {
        let table = CensorTable::new([("(a)(b)", "[$15]")]).unwrap();

        assert_eq!(table.apply("ab"), "[a5]");
    }

    #[test]
    fn expands_whole_match_context_and_dollar() {
        let table = CensorTable::new([("b", "<$&|$`|$'|$$>")]).unwrap();

        assert_eq!(table.apply("abc"), "a<b|a|c|$>c");
    }

    #[test]
    fn expands_named_groups() {
        let table = CensorTable::new([(r"(?<first>\w+) (?<last>\w+)", "$<last>, $<first> $<middle>")])
            .unwrap();

        assert_eq!(table.apply("Ada Lovelace"), "Lovelace, Ada $<middle>");
    }

    #[test]
    fn unmatched_optional_group_expands_to_nothing() {
        let table = CensorTable::new([("A(x)?lice", "[$1]")]).unwrap();

        assert_eq!(table.apply("Alice"), "[]");
    }

    #[test]
    fn censor_file_ignores_extra_fields() {
        let table = CensorTable::parse("Alice	XXX	note to self
").unwrap();

        assert_eq!(table.apply("Alice"), "XXX");
    }

    #[test]
    fn parses_censor_file() {
        let table = CensorTable::parse("Alice\tXXX  \n\nBob\tYYY\n").unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.apply("Alice met Bob"), "XXX met YYY");
    }

    #[test]
    fn censor_file_line_without_tab_is_an_error() {
        let err = CensorTable::parse("Alice\tXXX\nBob YYY").unwrap_err();

        assert!(matches!(err, TableError::MissingReplacement { line: 2 }));
    }

    #[test]
    fn censor_file_invalid_pattern_is_an_error() {
        let err = CensorTable::parse("\n(unclosed\tXXX").unwrap_err();

        assert!(matches!(err, TableError::InvalidPattern { line: 2, .. }));
        assert!(err.to_string().starts_with("censor table line 2: invalid pattern"));
    }

    #[test]
    fn profile_lookup_first_match_wins() {
        let table = ProfileTable::new([
            ("Alice", "https://a.example"),
            ("Alice", "https://b.example"),
        ]);

        assert_eq!(table.lookup("Alice"), Some("https://a.example"));
        assert_eq!(table.lookup("Bob"), None);
    }

    #[test]
    fn profile_lookup_treats_blank_url_as_absent() {
        let table = ProfileTable::parse("Alice\t   \nAlice\thttps://ignored.example\nBob");

        assert_eq!(table.lookup("Alice"), None);
        assert_eq!(table.lookup("Bob"), None);
    }

    #[test]
    fn profile_file_ignores_extra_fields() {
        let table = ProfileTable::parse("Alice\thttps://a.example\tcomment\n");

        assert_eq!(table.lookup("Alice"), Some("https://a.example"));
    }

    #[test]
    fn parses_profile_file_and_trims_urls() {
        let table = ProfileTable::parse("Alice\t https://a.example \nBob\thttps://b.example\n");

        assert_eq!(table.lookup("Alice"), Some("https://a.example"));
        assert_eq!(table.lookup("Bob"), Some("https://b.example"));
    }
}
