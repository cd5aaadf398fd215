//! optreg - parse arguments against a JSON option declaration.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use optreg::{OptionRegistry, OptionsFile};
use serde_json::{Map, Value};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Typed command-line option registry and parser.
#[derive(Parser, Debug)]
#[command(name = "optreg", version, about, disable_help_subcommand = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Where the option declarations come from.
#[derive(Args, Debug)]
struct Source {
    /// JSON option declarations
    #[arg(long, required_unless_present = "config_file", conflicts_with = "config_file")]
    config: Option<String>,

    /// File containing JSON option declarations
    #[arg(long)]
    config_file: Option<PathBuf>,
}

impl Source {
    fn load(&self) -> Result<OptionsFile> {
        let json = match (&self.config, &self.config_file) {
            (Some(json), _) => json.clone(),
            (None, Some(path)) => std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?,
            (None, None) => bail!("no option declarations given"),
        };
        OptionsFile::from_json(&json).context("failed to parse config JSON")
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse arguments and print their typed values as JSON
    Parse {
        #[command(flatten)]
        source: Source,

        /// Program name reported as the first argument
        #[arg(long, default_value = "prog")]
        program: String,

        /// Arguments to parse
        #[arg(last = true)]
        args: Vec<String>,
    },

    /// Print the help listing for the declared options
    Help {
        #[command(flatten)]
        source: Source,
    },
}

/// Parsed values keyed by option title.
///
/// Flags map to `true`/`false`; value options that were not given map to null.
/// Titles that render to the same text (e.g. `3` and `"3"`) are an error.
fn values_json(registry: &OptionRegistry) -> Result<Value> {
    let mut map = Map::new();
    for option in registry.iter() {
        let value = match option.value() {
            Some(value) => serde_json::to_value(value)?,
            None if option.expects_value() => Value::Null,
            None => Value::Bool(false),
        };
        let name = option.title().to_string();
        if map.contains_key(&name) {
            bail!("options share the title '{}' in JSON output", name);
        }
        map.insert(name, value);
    }
    Ok(Value::Object(map))
}

fn run_parse(source: &Source, program: String, args: Vec<String>) -> Result<()> {
    let file = source.load()?;
    let show_help = file.show_help;
    let mut parser = file.into_parser().context("invalid option declarations")?;

    let argv: Vec<String> = std::iter::once(program).chain(args).collect();
    debug!(?argv, "parsing arguments");

    match parser.parse(&argv) {
        Ok(()) if show_help && parser.help_requested() => Ok(()),
        Ok(()) => {
            println!("{}", values_json(parser.registry())?);
            Ok(())
        }
        Err(err) if err.is_soft() && show_help => {
            print!("{}", parser.help_text());
            Ok(())
        }
        Err(err) => bail!("{}: {}", err.kind(), err),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Parse {
            source,
            program,
            args,
        } => run_parse(&source, program, args)?,
        Commands::Help { source } => {
            let parser = source
                .load()?
                .into_parser()
                .context("invalid option declarations")?;
            print!("{}", parser.help_text());
        }
    }

    Ok(())
}
