//! Tags command implementation.

use cadlink_protocol::registry;
use serde::Serialize;

/// One registered record type.
#[derive(Debug, Serialize)]
pub struct TagEntry {
    /// Wire tag.
    pub tag: &'static str,
    /// Rust type name.
    pub type_name: &'static str,
}

/// Runs the tags command.
pub fn run(format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let registry = registry()?;
    let entries: Vec<TagEntry> = registry
        .tags()
        .into_iter()
        .filter_map(|tag| registry.resolve(tag))
        .map(|r| TagEntry {
            tag: r.tag(),
            type_name: r.type_name(),
        })
        .collect();

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&entries)?),
        "text" => {
            for entry in &entries {
                println!("{:<40} {}", entry.tag, entry.type_name);
            }
            println!();
            println!("{} registered types", entries.len());
        }
        other => return Err(format!("Unknown format: {}", other).into()),
    }
    Ok(())
}
