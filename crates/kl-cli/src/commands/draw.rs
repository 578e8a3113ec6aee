use std::path::Path;

use comfy_table::{ContentArrangement, Table};
use kl_core::SpreadSource;
use kl_reading::DrawConfig;

use super::OutputFormat;

pub fn run(
    dir: &Path,
    system: Option<&str>,
    spread_id: &str,
    seed: Option<u64>,
    reversals: bool,
    format: OutputFormat,
) -> Result<(), String> {
    let library = super::load_library(dir)?;
    let bundle = super::select_system(&library, system)?;
    let spread = bundle.spreads.spread(spread_id).map_err(|e| e.to_string())?;

    let config = DrawConfig {
        seed,
        allow_reversals: reversals,
    };
    let drawn = kl_reading::draw(&bundle.deck, spread, &config).map_err(|e| e.to_string())?;

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&drawn).map_err(|e| e.to_string())?;
            println!("{json}");
        }
        OutputFormat::Text | OutputFormat::Markdown => {
            let mut table = Table::new();
            table.set_content_arrangement(ContentArrangement::Dynamic);
            table.set_header(vec!["Position", "Card", "Orientation"]);
            for d in &drawn {
                let name = bundle
                    .deck
                    .card(&d.card)
                    .map_or_else(|| d.card.to_string(), |c| c.name.clone());
                table.add_row(vec![d.position.clone(), name, d.orientation.to_string()]);
            }
            println!("  {}", spread.name);
            println!("{table}");
        }
    }
    Ok(())
}
