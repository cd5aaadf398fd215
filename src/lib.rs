//! optreg - a typed command-line option registry and parser.
//!
//! Options are declared on an [`OptionRegistry`] with a key, a title and a
//! description. An [`ArgumentParser`] classifies raw arguments in a single
//! pass, infers a [`TypedValue`] for every token, pairs value tokens with the
//! option before them, and hands values back as concrete Rust types.

pub mod config;
pub mod help;
pub mod parser;
pub mod registry;
pub mod value;

pub use config::{ConfigError, DuplicatePolicy, OptionSpec, OptionsFile, ParserConfig};
pub use help::{help_text, render_help};
pub use parser::{ArgumentParser, ParseError, ParseState, SequencingError, ValueError};
pub use registry::{CliOption, NotFound, OptionRegistry, RegistrationWarning};
pub use value::{FromTypedValue, TypedValue, ValueKind};
