//! Parser configuration and JSON option declarations.

use crate::parser::ArgumentParser;
use crate::registry::OptionRegistry;
use crate::value::TypedValue;
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

/// The help key used when none is configured.
pub const DEFAULT_HELP_KEY: &str = "-h";

/// Errors that can occur while declaring options.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse JSON config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("duplicate option key: {0}")]
    DuplicateKey(TypedValue),

    #[error("duplicate option title: {0}")]
    DuplicateTitle(TypedValue),

    #[error("option titled '{0}' has an empty key")]
    EmptyKey(TypedValue),
}

/// What the registry does when a key or title is registered twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Replace the earlier registration and emit a warning.
    #[default]
    Overwrite,
    /// Fail with [`ConfigError::DuplicateKey`] or [`ConfigError::DuplicateTitle`].
    Reject,
}

/// Produces the introductory help text.
pub type IntroCallback = Box<dyn Fn() -> String>;

/// Settings shared by the registry and the parser.
pub struct ParserConfig {
    /// Render help automatically after a successful parse that saw `help_key`.
    pub show_help: bool,
    /// Token recognised as a help request.
    pub help_key: TypedValue,
    /// Introductory help text, printed before the option listing.
    pub intro: Option<IntroCallback>,
    pub duplicate_policy: DuplicatePolicy,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            show_help: false,
            help_key: TypedValue::text(DEFAULT_HELP_KEY),
            intro: None,
            duplicate_policy: DuplicatePolicy::Overwrite,
        }
    }
}

impl fmt::Debug for ParserConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParserConfig")
            .field("show_help", &self.show_help)
            .field("help_key", &self.help_key)
            .field("intro", &self.intro.as_ref().map(|_| "<callback>"))
            .field("duplicate_policy", &self.duplicate_policy)
            .finish()
    }
}

impl ParserConfig {
    pub fn show_help(mut self, show_help: bool) -> Self {
        self.show_help = show_help;
        self
    }

    pub fn help_key(mut self, key: impl Into<TypedValue>) -> Self {
        self.help_key = key.into();
        self
    }

    pub fn intro<F>(mut self, intro: F) -> Self
    where
        F: Fn() -> String + 'static,
    {
        self.intro = Some(Box::new(intro));
        self
    }

    pub fn duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    /// Run the intro callback, if any.
    pub fn intro_text(&self) -> Option<String> {
        self.intro.as_ref().map(|f| f())
    }
}

/// A single option declared in JSON.
#[derive(Debug, Clone, Deserialize)]
pub struct OptionSpec {
    /// Raw key token (e.g. "-i"); inferred the same way as command-line tokens
    pub key: String,
    /// Title used as an alternate lookup handle
    pub title: TypedValue,
    /// Help text for this option
    #[serde(default)]
    pub description: String,
    /// Whether the following token is consumed as this option's value
    #[serde(default)]
    pub expects_value: bool,
}

impl OptionSpec {
    /// The key as it will be matched against inferred tokens.
    pub fn inferred_key(&self) -> TypedValue {
        TypedValue::infer(&self.key)
    }
}

/// Top-level JSON declaration of a program's options.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OptionsFile {
    /// Render help after a successful parse that saw the help key
    #[serde(default)]
    pub show_help: bool,
    /// Help key token (default: "-h")
    pub help_key: Option<String>,
    /// Introductory help text
    pub intro: Option<String>,
    /// Duplicate registration policy (default: "overwrite")
    #[serde(default)]
    pub duplicates: DuplicatePolicy,
    /// Declared options, in listing order
    #[serde(default)]
    pub options: Vec<OptionSpec>,
}

impl OptionsFile {
    /// Parse a JSON string into an OptionsFile.
    pub fn from_json(json: &str) -> Result<OptionsFile, ConfigError> {
        let file: OptionsFile = serde_json::from_str(json)?;
        Ok(file)
    }

    /// Validate the declarations.
    ///
    /// Duplicates are only an error under [`DuplicatePolicy::Reject`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut keys = HashSet::new();
        let mut titles = HashSet::new();

        for spec in &self.options {
            if spec.key.is_empty() {
                return Err(ConfigError::EmptyKey(spec.title.clone()));
            }
            if self.duplicates == DuplicatePolicy::Reject {
                let key = spec.inferred_key();
                if !keys.insert(key.clone()) {
                    return Err(ConfigError::DuplicateKey(key));
                }
                if !titles.insert(spec.title.clone()) {
                    return Err(ConfigError::DuplicateTitle(spec.title.clone()));
                }
            }
        }

        Ok(())
    }

    /// Build the parser configuration described by this file.
    pub fn parser_config(&self) -> ParserConfig {
        let mut config = ParserConfig::default()
            .show_help(self.show_help)
            .duplicate_policy(self.duplicates);
        if let Some(ref key) = self.help_key {
            config = config.help_key(TypedValue::infer(key));
        }
        if let Some(ref intro) = self.intro {
            let intro = intro.clone();
            config = config.intro(move || intro.clone());
        }
        config
    }

    /// Validate, register every option and return a ready parser.
    pub fn into_parser(self) -> Result<ArgumentParser, ConfigError> {
        self.validate()?;
        let config = self.parser_config();
        let mut registry = OptionRegistry::with_policy(config.duplicate_policy);
        for spec in self.options {
            let key = spec.inferred_key();
            registry.register(key, spec.title, spec.description, spec.expects_value)?;
        }
        Ok(ArgumentParser::with_config(registry, config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_file() {
        let file = OptionsFile::from_json("{}").unwrap();
        assert!(!file.show_help);
        assert!(file.help_key.is_none());
        assert!(file.options.is_empty());
        assert_eq!(file.duplicates, DuplicatePolicy::Overwrite);
    }

    #[test]
    fn test_parse_full_file() {
        let json = r#"{
            "show_help": true,
            "help_key": "--help",
            "intro": "Welcome!",
            "duplicates": "reject",
            "options": [
                {"key": "-i", "title": "Input", "description": "Path to input", "expects_value": true},
                {"key": "-v", "title": "Verbose", "description": "Enable verbose"}
            ]
        }"#;
        let file = OptionsFile::from_json(json).unwrap();

        assert!(file.show_help);
        assert_eq!(file.help_key.as_deref(), Some("--help"));
        assert_eq!(file.intro.as_deref(), Some("Welcome!"));
        assert_eq!(file.duplicates, DuplicatePolicy::Reject);
        assert_eq!(file.options.len(), 2);
        assert!(file.options[0].expects_value);
        assert!(!file.options[1].expects_value);
        assert_eq!(file.options[1].title, TypedValue::text("Verbose"));
    }

    #[test]
    fn test_non_text_title() {
        let json = r#"{"options":[{"key":"-n","title":7}]}"#;
        let file = OptionsFile::from_json(json).unwrap();
        assert_eq!(file.options[0].title, TypedValue::Int(7));
        assert_eq!(file.options[0].description, "");
    }

    #[test]
    fn test_numeric_key_is_inferred() {
        let json = r#"{"options":[{"key":"3","title":"Three"}]}"#;
        let file = OptionsFile::from_json(json).unwrap();
        assert_eq!(file.options[0].inferred_key(), TypedValue::Int(3));
    }

    #[test]
    fn test_error_invalid_json() {
        let result = OptionsFile::from_json("{not json");
        assert!(matches!(result, Err(ConfigError::Json(_))));
    }

    #[test]
    fn test_error_empty_key() {
        let json = r#"{"options":[{"key":"","title":"Nothing"}]}"#;
        let file = OptionsFile::from_json(json).unwrap();
        assert!(matches!(file.validate(), Err(ConfigError::EmptyKey(_))));
    }

    #[test]
    fn test_duplicates_allowed_by_default() {
        let json = r#"{"options":[
            {"key":"-i","title":"Input"},
            {"key":"-i","title":"Input"}
        ]}"#;
        let file = OptionsFile::from_json(json).unwrap();
        assert!(file.validate().is_ok());
    }

    #[test]
    fn test_error_duplicate_key_when_rejecting() {
        let json = r#"{"duplicates":"reject","options":[
            {"key":"-i","title":"Input"},
            {"key":"-i","title":"Other"}
        ]}"#;
        let file = OptionsFile::from_json(json).unwrap();
        assert!(matches!(file.validate(), Err(ConfigError::DuplicateKey(_))));
    }

    #[test]
    fn test_error_duplicate_title_when_rejecting() {
        let json = r#"{"duplicates":"reject","options":[
            {"key":"-i","title":"Input"},
            {"key":"-j","title":"Input"}
        ]}"#;
        let file = OptionsFile::from_json(json).unwrap();
        assert!(matches!(
            file.validate(),
            Err(ConfigError::DuplicateTitle(_))
        ));
    }

    #[test]
    fn test_parser_config_from_file() {
        let json = r#"{"show_help":true,"help_key":"--help","intro":"Hi"}"#;
        let config = OptionsFile::from_json(json).unwrap().parser_config();
        assert!(config.show_help);
        assert_eq!(config.help_key, TypedValue::text("--help"));
        assert_eq!(config.intro_text().as_deref(), Some("Hi"));
    }

    #[test]
    fn test_default_parser_config() {
        let config = ParserConfig::default();
        assert!(!config.show_help);
        assert_eq!(config.help_key, TypedValue::text(DEFAULT_HELP_KEY));
        assert!(config.intro_text().is_none());
        assert_eq!(config.duplicate_policy, DuplicatePolicy::Overwrite);
    }

    #[test]
    fn test_into_parser_registers_options() {
        let json = r#"{"options":[
            {"key":"-i","title":"Input","expects_value":true},
            {"key":"-v","title":"Verbose"}
        ]}"#;
        let parser = OptionsFile::from_json(json).unwrap().into_parser().unwrap();
        assert!(parser.has_option("Input"));
        assert!(parser.has_option("-v"));
        assert!(!parser.has_option("-z"));
    }
}
