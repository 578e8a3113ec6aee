use std::path::Path;

use colored::Colorize;
use comfy_table::{ContentArrangement, Table};
use kl_core::{Library, SystemBundle};

use super::truncate;

pub fn run(dir: &Path, system: Option<&str>, what: Option<&str>) -> Result<(), String> {
    let library = super::load_library(dir)?;

    if system.is_none() && library.system_ids().len() > 1 {
        print_systems(&library)?;
        return Ok(());
    }

    let bundle = super::select_system(&library, system)?;
    match what {
        None => {
            print_cards(bundle);
            println!();
            print_spreads(bundle);
        }
        Some("cards") => print_cards(bundle),
        Some("spreads") => print_spreads(bundle),
        Some(other) => return Err(format!("cannot list \"{other}\" (expected cards or spreads)")),
    }
    Ok(())
}

fn print_systems(library: &Library) -> Result<(), String> {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["System", "Name", "Cards", "Spreads", "Reversals"]);
    for id in library.system_ids() {
        let bundle = library.system(id).map_err(|e| e.to_string())?;
        let system = bundle.deck.system();
        table.add_row(vec![
            id.to_string(),
            system.name.clone(),
            bundle.deck.len().to_string(),
            bundle.spreads.len().to_string(),
            if system.reversals { "yes" } else { "no" }.to_string(),
        ]);
    }
    println!("{table}");
    Ok(())
}

fn print_cards(bundle: &SystemBundle) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["#", "Id", "Name", "Category", "Charge", "Keywords"]);
    for card in bundle.deck.cards() {
        table.add_row(vec![
            card.number.to_string(),
            card.id.to_string(),
            card.name.clone(),
            card.category().to_string(),
            card.core.charge.to_string(),
            truncate(&card.core.keywords.join(", "), 40),
        ]);
    }
    println!("  {}", bundle.deck.system().name.bold());
    println!("{table}");
    println!("  {} cards", bundle.deck.len());
}

fn print_spreads(bundle: &SystemBundle) {
    if bundle.spreads.is_empty() {
        println!("  No spreads defined.");
        return;
    }
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Id", "Name", "Cards", "Description"]);
    for spread in bundle.spreads.iter() {
        table.add_row(vec![
            spread.id.clone(),
            spread.name.clone(),
            spread.card_count().to_string(),
            truncate(&spread.description, 50),
        ]);
    }
    println!("{table}");
    println!("  {} spreads", bundle.spreads.len());
}
