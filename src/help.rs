//! Help listing for declared options.

use crate::registry::OptionRegistry;
use std::io::{self, Write};

/// Write the help listing to `out`.
pub fn render_help(
    registry: &OptionRegistry,
    intro: Option<&str>,
    out: &mut dyn Write,
) -> io::Result<()> {
    out.write_all(help_text(registry, intro).as_bytes())?;
    out.flush()
}

/// Generate the help listing as a string.
///
/// The intro text, when present, comes first on its own line, followed by
/// one `key : description` line per option in registration order.
pub fn help_text(registry: &OptionRegistry, intro: Option<&str>) -> String {
    let mut output = String::new();

    if let Some(intro) = intro {
        output.push_str(intro);
        output.push('\n');
    }
    for option in registry.iter() {
        output.push_str(&format!("{} : {}\n", option.key(), option.description()));
    }

    output
}
