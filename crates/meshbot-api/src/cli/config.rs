//! `meshbot config`: print the effective configuration.

use std::path::Path;

use anyhow::Result;
use console::style;
use meshbot_types::config::GlobalConfig;

pub fn show(config: &GlobalConfig, source: &Path, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(config)?);
        return Ok(());
    }

    let exists = source.exists();
    println!(
        "{}",
        style(format!(
            "# {} ({})",
            source.display(),
            if exists { "loaded" } else { "not found, defaults" }
        ))
        .dim()
    );
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}
