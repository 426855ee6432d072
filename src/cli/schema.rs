use crate::config::Config;
use schemars::schema_for;
use std::path::PathBuf;

/// Print the config JSON Schema, or write it next to the config for editors
pub fn execute(out: Option<PathBuf>) -> anyhow::Result<()> {
    let schema = schema_for!(Config);
    let json = serde_json::to_string_pretty(&schema)?;
    match out {
        Some(path) => {
            std::fs::write(&path, json)?;
            println!("Schema written to {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}
