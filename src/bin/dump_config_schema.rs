use std::{env, fs};

use anyhow::{Context, Result};

/// Prints the config JSON schema, or writes it to the path given as first argument.
fn main() -> Result<()> {
    let schema = serde_json::to_string_pretty(&sharescribe::Config::json_schema())?;

    match env::args().nth(1) {
        Some(path) => fs::write(&path, format!("{}\n", schema))
            .with_context(|| format!("Failed to write schema to {}", path))?,
        None => println!("{}", schema),
    }
    Ok(())
}
