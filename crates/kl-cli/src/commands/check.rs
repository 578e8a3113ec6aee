use std::path::Path;

use colored::Colorize;
use kl_core::coverage::{combination_coverage, coverage_gaps};

pub fn run(dir: &Path, strict: bool) -> Result<(), String> {
    let library = super::load_library(dir)?;

    let mut total_gaps = 0;
    for id in library.system_ids() {
        let bundle = library.system(id).map_err(|e| e.to_string())?;
        let gaps = coverage_gaps(&bundle.deck, &bundle.spreads);
        let pairs = combination_coverage(&bundle.deck);

        println!(
            "  {} ({}): {} cards, {} spreads",
            bundle.deck.system().name.bold(),
            id,
            bundle.deck.len(),
            bundle.spreads.len()
        );
        println!(
            "  combinations: {}/{} ordered pairs curated, {} cards with directional rules",
            pairs.curated_pairs, pairs.ordered_pairs, pairs.directional_cards
        );
        for gap in &gaps {
            println!("  {}", gap.to_string().yellow());
        }
        total_gaps += gaps.len();
        println!();
    }

    if total_gaps == 0 {
        println!("  All checks passed.");
        return Ok(());
    }

    println!(
        "  {} coverage gap{} (readings fall back for these)",
        total_gaps,
        if total_gaps == 1 { "" } else { "s" }
    );
    if strict {
        Err(format!("{total_gaps} coverage gaps"))
    } else {
        Ok(())
    }
}
