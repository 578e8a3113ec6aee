use std::path::Path;

use colored::Colorize;
use kl_reading::combination::{Direction, resolve_pair};
use kl_reading::{Fragment, Provenance};

pub fn run(dir: &Path, system: Option<&str>, first: &str, second: &str) -> Result<(), String> {
    let library = super::load_library(dir)?;
    let bundle = super::select_system(&library, system)?;
    let find = |query: &str| {
        bundle
            .deck
            .find(query)
            .ok_or_else(|| format!("card not found: \"{query}\""))
    };
    let a = find(first)?;
    let b = find(second)?;

    for (label, direction) in [
        (format!("{} -> {}", a.name, b.name), Direction::AFirst),
        (format!("{} -> {}", b.name, a.name), Direction::BFirst),
    ] {
        let reading = resolve_pair(a, b, direction);
        println!(
            "  {} ({}, {})",
            label.bold(),
            reading.relation,
            source(&reading.fragment).dimmed()
        );
        println!("    {}", reading.fragment.text);
        if !reading.fragment.keywords.is_empty() {
            println!("    keywords: {}", reading.fragment.keywords.join(", "));
        }
        println!();
    }
    Ok(())
}

fn source(fragment: &Fragment) -> String {
    match &fragment.provenance {
        Provenance::Curated { owner } => format!("curated on {owner}"),
        Provenance::Mirrored { owner } => format!("mirrored from {owner}"),
        Provenance::Composed { .. } => "composed".to_string(),
        other => format!("{other:?}"),
    }
}
