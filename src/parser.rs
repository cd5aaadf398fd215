//! Single-pass argument parsing and typed retrieval.

use crate::config::{ConfigError, ParserConfig};
use crate::help;
use crate::registry::{NotFound, OptionRegistry};
use crate::value::{FromTypedValue, TypedValue, ValueKind};
use std::io::{self, Write};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// A value token the parser could not pair with an option.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SequencingError {
    #[error("value '{0}' has no preceding option")]
    Orphan(TypedValue),

    #[error("option '{flag}' does not take a value, got '{token}'")]
    Unexpected { flag: TypedValue, token: TypedValue },
}

/// Errors detected by the parse pass. Cached and replayed on later calls.
#[derive(Debug, Clone, Error)]
pub enum ParseError {
    #[error(transparent)]
    Sequencing(#[from] SequencingError),

    #[error("missing value for option: {0}")]
    MissingValue(TypedValue),

    #[error("expected arguments, but got none")]
    NoArguments,

    #[error("failed to write help text: {0}")]
    HelpOutput(Arc<io::Error>),
}

impl ParseError {
    /// Short name of the error kind, for user-facing messages.
    pub fn kind(&self) -> &'static str {
        match self {
            ParseError::Sequencing(_) => "sequencing error",
            ParseError::MissingValue(_) => "missing value",
            ParseError::NoArguments => "no arguments",
            ParseError::HelpOutput(_) => "help output",
        }
    }

    /// True for conditions a CLI may answer with help instead of failing.
    pub fn is_soft(&self) -> bool {
        matches!(self, ParseError::NoArguments)
    }
}

/// Errors from typed value retrieval.
#[derive(Debug, Clone, Error)]
pub enum ValueError {
    #[error("option not found: {0}")]
    NotFound(TypedValue),

    #[error("option '{0}' does not take a value")]
    NoValueExpected(TypedValue),

    #[error("no value was supplied for option '{0}'")]
    NotSupplied(TypedValue),

    #[error("option '{key}' holds a {found} value, not {expected}")]
    TypeMismatch {
        key: TypedValue,
        expected: ValueKind,
        found: ValueKind,
    },

    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl From<NotFound> for ValueError {
    fn from(err: NotFound) -> Self {
        ValueError::NotFound(err.0)
    }
}

/// Parse progress. A parse runs at most once per parser.
#[derive(Debug, Clone)]
pub enum ParseState {
    Unparsed,
    Parsed(Result<(), ParseError>),
}

/// The option a value token would be paired with.
enum Cursor {
    Empty,
    Flag(TypedValue),
    Open(TypedValue),
}

/// Parses raw arguments against an [`OptionRegistry`].
pub struct ArgumentParser {
    registry: OptionRegistry,
    config: ParserConfig,
    args: Option<Vec<String>>,
    state: ParseState,
    passes: usize,
    help_requested: bool,
    help_sink: Box<dyn Write>,
}

impl std::fmt::Debug for ArgumentParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArgumentParser")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .field("state", &self.state)
            .field("help_requested", &self.help_requested)
            .finish()
    }
}

impl ArgumentParser {
    /// A parser with default settings, keeping the registry's duplicate policy.
    pub fn new(registry: OptionRegistry) -> Self {
        let config = ParserConfig::default().duplicate_policy(registry.policy());
        Self::with_config(registry, config)
    }

    /// A parser using `config`. Its duplicate policy replaces the registry's.
    pub fn with_config(mut registry: OptionRegistry, config: ParserConfig) -> Self {
        registry.set_policy(config.duplicate_policy);
        Self {
            registry,
            config,
            args: None,
            state: ParseState::Unparsed,
            passes: 0,
            help_requested: false,
            help_sink: Box::new(io::stdout()),
        }
    }

    /// Store the argument vector used when retrieval triggers the parse.
    ///
    /// Without stored arguments a lazy parse reads `std::env::args()`.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = Some(args.into_iter().map(Into::into).collect());
        self
    }

    /// Where automatic help output is written (stdout by default).
    pub fn set_help_sink(&mut self, sink: impl Write + 'static) {
        self.help_sink = Box::new(sink);
    }

    /// Declare an option. Options added after parsing never receive values.
    pub fn add_option(
        &mut self,
        key: impl Into<TypedValue>,
        title: impl Into<TypedValue>,
        description: impl Into<TypedValue>,
        expects_value: bool,
    ) -> Result<(), ConfigError> {
        self.registry.register(key, title, description, expects_value)
    }

    pub fn registry(&self) -> &OptionRegistry {
        &self.registry
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    pub fn state(&self) -> &ParseState {
        &self.state
    }

    pub fn is_parsed(&self) -> bool {
        matches!(self.state, ParseState::Parsed(_))
    }

    /// Number of classification passes performed (never more than one).
    pub fn passes(&self) -> usize {
        self.passes
    }

    /// True if help is enabled and the help key appeared among the parsed tokens.
    pub fn help_requested(&self) -> bool {
        self.help_requested
    }

    /// Parse the argument vector. The first token is the program name.
    ///
    /// Only the first call does any work; later calls return the cached
    /// outcome and ignore their tokens.
    pub fn parse<I, S>(&mut self, args: I) -> Result<(), ParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if let ParseState::Parsed(ref result) = self.state {
            debug!("arguments already parsed, replaying outcome");
            return result.clone();
        }

        let tokens: Vec<TypedValue> = args
            .into_iter()
            .skip(1)
            .map(|arg| TypedValue::infer(arg.as_ref()))
            .collect();

        let result = self.classify(&tokens).and_then(|()| self.auto_help());
        if let Err(ref err) = result {
            debug!(error = %err, "parse failed");
        }
        self.state = ParseState::Parsed(result.clone());
        self.args = None;
        result
    }

    fn classify(&mut self, tokens: &[TypedValue]) -> Result<(), ParseError> {
        self.passes += 1;

        if tokens.is_empty() {
            return if self.registry.is_empty() {
                Ok(())
            } else {
                Err(ParseError::NoArguments)
            };
        }

        let help_key = self.config.help_key.clone();
        self.help_requested = tokens
            .iter()
            .any(|token| self.is_help_token(token, &help_key));

        let mut cursor = Cursor::Empty;
        let mut pending: Vec<TypedValue> = Vec::new();

        for token in tokens {
            if self.is_help_token(token, &help_key) {
                debug!(token = %token, "help requested");
                continue;
            }

            if let Some(option) = self.registry.lookup_mut_by_key(token) {
                if option.expects_value() {
                    debug!(key = %token, "option awaiting value");
                    if !pending.contains(token) {
                        pending.push(token.clone());
                    }
                    cursor = Cursor::Open(token.clone());
                } else {
                    debug!(key = %token, "flag set");
                    option.set_value(TypedValue::Bool(true));
                    cursor = Cursor::Flag(token.clone());
                }
                continue;
            }

            match std::mem::replace(&mut cursor, Cursor::Empty) {
                Cursor::Open(key) => {
                    debug!(key = %key, value = %token, "value assigned");
                    if let Some(option) = self.registry.lookup_mut_by_key(&key) {
                        option.set_value(token.clone());
                    }
                    pending.retain(|k| k != &key);
                }
                Cursor::Flag(flag) => {
                    return Err(SequencingError::Unexpected {
                        flag,
                        token: token.clone(),
                    }
                    .into());
                }
                Cursor::Empty => {
                    return Err(SequencingError::Orphan(token.clone()).into());
                }
            }
        }

        match pending.into_iter().next() {
            Some(key) => Err(ParseError::MissingValue(key)),
            None => Ok(()),
        }
    }

    fn is_help_token(&self, token: &TypedValue, help_key: &TypedValue) -> bool {
        self.config.show_help && token == help_key && !self.registry.contains_key(token)
    }

    fn auto_help(&mut self) -> Result<(), ParseError> {
        if !(self.config.show_help && self.help_requested) {
            return Ok(());
        }
        let intro = self.config.intro_text();
        help::render_help(&self.registry, intro.as_deref(), &mut *self.help_sink)
            .map_err(|err| ParseError::HelpOutput(Arc::new(err)))
    }

    fn ensure_parsed(&mut self) -> Result<(), ParseError> {
        match self.state {
            ParseState::Parsed(ref result) => result.clone(),
            ParseState::Unparsed => {
                let args = self
                    .args
                    .take()
                    .unwrap_or_else(|| std::env::args().collect());
                self.parse(args)
            }
        }
    }

    /// True if `title_or_key` names a declared option. Does not parse.
    pub fn has_option(&self, title_or_key: impl Into<TypedValue>) -> bool {
        self.registry.has(&title_or_key.into())
    }

    /// True if the option appeared on the command line with its value.
    ///
    /// Parses first if needed. Works for flags and value options alike.
    pub fn is_set(&mut self, title_or_key: impl Into<TypedValue>) -> Result<bool, ValueError> {
        let key = self.registry.lookup(&title_or_key.into())?.key().clone();
        self.ensure_parsed()?;
        Ok(self.registry.lookup_by_key(&key)?.value().is_some())
    }

    /// Retrieve the parsed value of an option.
    ///
    /// Checks, in order: the option exists, it takes a value, the parse
    /// succeeded, a value was supplied, and the value has type `T`.
    pub fn get_value<T: FromTypedValue>(
        &mut self,
        title_or_key: impl Into<TypedValue>,
    ) -> Result<T, ValueError> {
        let (key, value) = self.resolve(title_or_key.into())?;
        match value {
            Some(value) => extract(key, &value),
            None => Err(ValueError::NotSupplied(key)),
        }
    }

    /// Like [`get_value`](Self::get_value), but `Ok(None)` when the option
    /// was declared and simply not given.
    pub fn get_optional<T: FromTypedValue>(
        &mut self,
        title_or_key: impl Into<TypedValue>,
    ) -> Result<Option<T>, ValueError> {
        let (key, value) = self.resolve(title_or_key.into())?;
        value.map(|value| extract(key, &value)).transpose()
    }

    fn resolve(
        &mut self,
        title_or_key: TypedValue,
    ) -> Result<(TypedValue, Option<TypedValue>), ValueError> {
        let option = self.registry.lookup(&title_or_key)?;
        let key = option.key().clone();
        if !option.expects_value() {
            return Err(ValueError::NoValueExpected(key));
        }
        self.ensure_parsed()?;
        let value = self.registry.lookup_by_key(&key)?.value().cloned();
        Ok((key, value))
    }

    /// Write the help listing to `out`. Has no parsing side effects.
    pub fn render_help(&self, out: &mut dyn Write) -> io::Result<()> {
        let intro = self.config.intro_text();
        help::render_help(&self.registry, intro.as_deref(), out)
    }

    pub fn help_text(&self) -> String {
        let intro = self.config.intro_text();
        help::help_text(&self.registry, intro.as_deref())
    }
}

fn extract<T: FromTypedValue>(key: TypedValue, value: &TypedValue) -> Result<T, ValueError> {
    T::from_typed(value).ok_or_else(|| ValueError::TypeMismatch {
        key,
        expected: T::KIND,
        found: value.kind(),
    })
}
