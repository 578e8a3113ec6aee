use std::path::Path;

use colored::Colorize;
use kl_core::Orientation;

pub fn run(dir: &Path, system: Option<&str>, query: &str) -> Result<(), String> {
    let library = super::load_library(dir)?;
    let bundle = super::select_system(&library, system)?;
    let card = bundle
        .deck
        .find(query)
        .ok_or_else(|| format!("card not found: \"{query}\""))?;

    println!(
        "  {} [{} #{}]",
        card.name.bold(),
        card.id.to_string().dimmed(),
        card.number
    );
    println!();
    println!("  category:   {}", card.category());
    println!("  charge:     {}", card.core.charge);
    if !card.core.keywords.is_empty() {
        println!("  keywords:   {}", card.core.keywords.join(", "));
    }
    if !card.core.topics.is_empty() {
        println!("  topics:     {}", card.core.topics.join(", "));
    }
    if let Some(upright) = card.essence(Orientation::Upright) {
        println!("  upright:    {upright}");
    }
    if let Some(reversed) = card.essence(Orientation::Reversed) {
        println!("  reversed:   {reversed}");
    }

    let paths = bundle.deck.system().meanings.leaf_paths();
    let covered: Vec<&String> = paths
        .iter()
        .filter(|p| {
            kl_core::Locator::parse(p, &bundle.deck.system().meanings)
                .is_ok_and(|loc| matches!(loc.walk(&card.meanings), kl_core::locator::Walk::Found(_)))
        })
        .collect();
    println!();
    println!(
        "  {} {}/{} locators covered",
        "Meanings".bold().underline(),
        covered.len(),
        paths.len()
    );
    for path in &paths {
        let mark = if covered.contains(&path) {
            "+".green()
        } else {
            "-".red()
        };
        println!("    {mark} {path}");
    }

    if !card.topic_contexts.is_empty() {
        println!();
        println!("  {}", "Topic contexts".bold().underline());
        for (category, leaf) in &card.topic_contexts {
            println!("    {category}: {}", leaf.text(Orientation::Upright));
        }
    }

    if let Some(rule) = &card.directional {
        println!();
        println!("  {}", "Directional".bold().underline());
        println!("    as left:  {}", rule.as_left);
        println!("    as right: {}", rule.as_right);
        if !rule.summary.is_empty() {
            println!("    summary:  {}", rule.summary);
        }
    }

    if card.curated_count() > 0 {
        println!();
        println!(
            "  {} ({})",
            "Curated combinations".bold().underline(),
            card.curated_count()
        );
        for (partition, entries) in &card.combinations {
            for partner in entries.keys() {
                println!("    {partition}: {partner}");
            }
        }
    }

    for (title, items) in [
        ("Affirmations", &card.affirmations),
        ("Journaling prompts", &card.journaling_prompts),
    ] {
        if items.is_empty() {
            continue;
        }
        println!();
        println!("  {}", title.bold().underline());
        for item in items {
            println!("    - {item}");
        }
    }

    Ok(())
}
