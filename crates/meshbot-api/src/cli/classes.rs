//! `meshbot classes`: list the built-in bot classes.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use meshbot_core::bots::register_builtin_classes;
use meshbot_core::supervisor::BotClassRegistry;
use meshbot_types::config::GlobalConfig;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ClassRow {
    class: String,
    configured: Vec<String>,
}

fn rows(config: &GlobalConfig) -> Result<Vec<ClassRow>> {
    let registry = BotClassRegistry::new();
    register_builtin_classes(&registry)?;

    Ok(registry
        .names()
        .into_iter()
        .map(|class| {
            let configured = config
                .bots
                .iter()
                .filter(|bot| bot.class == class)
                .map(|bot| format!("{} @ {}", bot.name, bot.channel))
                .collect();
            ClassRow { class, configured }
        })
        .collect())
}

pub fn list(config: &GlobalConfig, json: bool) -> Result<()> {
    let rows = rows(config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Class").fg(Color::White),
        Cell::new("Configured bots").fg(Color::White),
    ]);

    for row in &rows {
        let configured = if row.configured.is_empty() {
            Cell::new("none").fg(Color::DarkGrey)
        } else {
            Cell::new(row.configured.join(", "))
        };
        table.add_row(vec![Cell::new(&row.class).fg(Color::Cyan), configured]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} class{}",
        style(rows.len()).bold(),
        if rows.len() == 1 { "" } else { "es" }
    );
    println!();
    Ok(())
}
