// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! JSON configuration file for page generation.
//!
//! Every key is optional; command-line flags take precedence over the file.
//!
//! ```json
//! {
//!     "template": "template.html",
//!     "censorList": "censor.tsv",
//!     "profileLookup": "profiles.tsv",
//!     "iconDir": "icons",
//!     "iconExtension": "png",
//!     "mediaDir": "media",
//!     "hidePoweredBy": false
//! }
//! ```
//!
//! Relative paths are resolved against the configuration file's directory.

use serde::Deserialize;
use snafu::prelude::*;
use std::path::{Path, PathBuf};

/// Error type for configuration loading failures.
#[derive(Debug, Snafu)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[snafu(display("failed to read config {}: {source}", path.display()))]
    Read {
        /// The configuration file.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON or has unknown keys.
    #[snafu(display("failed to parse config {}: {source}", path.display()))]
    Json {
        /// The configuration file.
        path: PathBuf,
        /// The underlying JSON error.
        source: serde_json::Error,
    },
}

/// Settings read from a configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Config {
    /// Page template containing `$css` and `$content`.
    pub template: Option<PathBuf>,

    /// Tab-separated censorship rules.
    pub censor_list: Option<PathBuf>,

    /// Tab-separated profile URLs.
    pub profile_lookup: Option<PathBuf>,

    /// Directory of speaker icons.
    pub icon_dir: Option<String>,

    /// Icon file extension, without the dot.
    pub icon_extension: Option<String>,

    /// Directory of images and videos.
    pub media_dir: Option<String>,

    /// Omit the "Powered by" footer.
    pub hide_powered_by: Option<bool>,
}

impl Config {
    /// Parses configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if `json` is malformed or contains unknown keys.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Loads a configuration file, resolving its relative file paths against
    /// the file's directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).context(ReadSnafu { path })?;
        let config = Self::from_json(&json).context(JsonSnafu { path })?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));

        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config.relative_to(base))
    }

    fn relative_to(self, base: &Path) -> Self {
        let resolve = |p: Option<PathBuf>| p.map(|p| base.join(p));
        Self {
            template: resolve(self.template),
            censor_list: resolve(self.censor_list),
            profile_lookup: resolve(self.profile_lookup),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_keys() {
        let config = Config::from_json(
            r#"{
                "template": "t.html",
                "censorList": "c.tsv",
                "profileLookup": "p.tsv",
                "iconDir": "img",
                "iconExtension": "jpg",
                "mediaDir": "files",
                "hidePoweredBy": true
            }"#,
        )
        .unwrap();

        assert_eq!(
            config,
            Config {
                template: Some("t.html".into()),
                censor_list: Some("c.tsv".into()),
                profile_lookup: Some("p.tsv".into()),
                icon_dir: Some("img".into()),
                icon_extension: Some("jpg".into()),
                media_dir: Some("files".into()),
                hide_powered_by: Some(true),
            }
        );
    }

    #[test]
    fn empty_object_is_default() {
        assert_eq!(Config::from_json("{}").unwrap(), Config::default());
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(Config::from_json(r#"{"censor_list": "c.tsv"}"#).is_err());
    }

    #[test]
    fn load_resolves_paths_against_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("site.json");
        std::fs::write(
            &path,
            r#"{"template": "t.html", "profileLookup": "/abs/p.tsv", "mediaDir": "m"}"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();

        assert_eq!(config.template, Some(dir.path().join("t.html")));
        assert_eq!(config.profile_lookup, Some(PathBuf::from("/abs/p.tsv")));
        assert_eq!(config.censor_list, None);
        assert_eq!(config.media_dir.as_deref(), Some("m"));
    }

    #[test]
    fn load_reports_missing_file() {
        let err = Config::load(Path::new("/nonexistent/site.json")).unwrap_err();

        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
