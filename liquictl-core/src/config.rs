//! Global configuration for the liquibase invoker.
//!
//! Every field except `liquibase` becomes a `--key=value` global flag on the
//! rendered command line; `liquibase` is the executable path and is consumed
//! positionally. Optional fields that are absent render no flag at all.
//!
//! Merge semantics are override-over-default, key by key: struct-update
//! syntax in code (`..Default::default()`), `#[serde(default)]` when loading
//! a TOML defaults file. The configuration is read-only once the invoker is
//! constructed.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LiquibaseConfig {
    /// Path to the liquibase executable. Never rendered as a flag.
    pub liquibase: String,

    /// Changelog file the tool operates on.
    pub change_log_file: String,

    /// JDBC connection URL.
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,

    /// Driver classpath handed through to the tool.
    pub classpath: Option<String>,

    pub contexts: Option<String>,
    pub labels: Option<String>,
    pub log_level: Option<String>,
    pub log_file: Option<String>,
    pub overwrite_output_file: Option<bool>,

    /// Residual pass-through flags not modeled above, rendered in insertion
    /// order after the named fields.
    pub extra: Vec<(String, String)>,
}

impl Default for LiquibaseConfig {
    fn default() -> Self {
        Self {
            liquibase: "liquibase".to_string(),
            change_log_file: "changelog.xml".to_string(),
            url: None,
            username: None,
            password: None,
            classpath: None,
            contexts: None,
            labels: None,
            log_level: None,
            log_file: None,
            overwrite_output_file: None,
            extra: Vec::new(),
        }
    }
}

impl LiquibaseConfig {
    /// Load a configuration from TOML text. Keys present in the document
    /// override the built-in defaults; absent keys fall back.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Render every configuration key except the tool path as a
    /// `--key=value` token, in field order, then `extra` in insertion order.
    ///
    /// Flag order is not contractual; only the leading tool-path token and
    /// the command-name token are positional.
    pub fn global_flags(&self) -> Vec<String> {
        let mut flags = vec![format!("--changeLogFile={}", self.change_log_file)];

        let named = [
            ("url", &self.url),
            ("username", &self.username),
            ("password", &self.password),
            ("classpath", &self.classpath),
            ("contexts", &self.contexts),
            ("labels", &self.labels),
            ("logLevel", &self.log_level),
            ("logFile", &self.log_file),
        ];
        for (key, value) in named {
            if let Some(value) = value {
                flags.push(format!("--{key}={value}"));
            }
        }
        if let Some(overwrite) = self.overwrite_output_file {
            flags.push(format!("--overwriteOutputFile={overwrite}"));
        }
        for (key, value) in &self.extra {
            flags.push(format!("--{key}={value}"));
        }
        flags
    }
}
