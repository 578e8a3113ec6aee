pub mod check;
pub mod combine;
pub mod draw;
pub mod list;
pub mod read;
pub mod show;
pub mod synthesize;

use std::path::{Path, PathBuf};

use clap::ValueEnum;
use kl_core::{Deck, Library, Orientation, SpreadSource, SystemBundle};
use kl_narrative::KeywordClassifier;
use kl_reading::{AssembleOptions, AssembledContext, DrawConfig, DrawnCard};
use tracing::info;

/// Output format for commands that print a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable transcript.
    Text,
    /// Pretty-printed JSON.
    Json,
    /// Markdown.
    Markdown,
}

/// Everything needed to lay out and assemble one reading.
pub struct ReadingRequest {
    pub data: PathBuf,
    pub system: Option<String>,
    pub spread: String,
    pub question: Option<String>,
    pub question_type: Option<String>,
    pub classify: bool,
    pub cards: Vec<String>,
    pub seed: Option<u64>,
    pub reversals: bool,
    pub combinations: bool,
}

/// Load every system under `dir`.
fn load_library(dir: &Path) -> Result<Library, String> {
    let library = Library::load(dir).map_err(|e| e.to_string())?;
    if library.system_ids().is_empty() {
        return Err(format!(
            "no oracle systems found in '{}' (expected <system>/system.json)",
            dir.display()
        ));
    }
    Ok(library)
}

/// Pick a system: the named one, or the only one.
fn select_system<'l>(library: &'l Library, id: Option<&str>) -> Result<&'l SystemBundle, String> {
    match id {
        Some(id) => library.system(id).map_err(|e| e.to_string()),
        None => match library.system_ids().as_slice() {
            [only] => library.system(only).map_err(|e| e.to_string()),
            ids => Err(format!(
                "several systems found, choose one with --system ({})",
                ids.join(", ")
            )),
        },
    }
}

/// Parse `card[:orientation]` entries against the deck, in position order.
fn parse_cards(deck: &Deck, entries: &[String], positions: &[String]) -> Result<Vec<DrawnCard>, String> {
    if entries.len() != positions.len() {
        return Err(format!(
            "spread takes {} cards but {} were given",
            positions.len(),
            entries.len()
        ));
    }
    entries
        .iter()
        .zip(positions)
        .enumerate()
        .map(|(sequence, (entry, position))| {
            let (query, orientation) = match entry.split_once(':') {
                Some((query, o)) => (
                    query,
                    Orientation::parse(o)
                        .ok_or_else(|| format!("unknown orientation \"{o}\" in \"{entry}\""))?,
                ),
                None => (entry.as_str(), Orientation::Upright),
            };
            let card = deck
                .find(query.trim())
                .ok_or_else(|| format!("card not found: \"{query}\""))?;
            Ok(DrawnCard {
                card: card.id.clone(),
                position: position.clone(),
                orientation,
                sequence,
            })
        })
        .collect()
}

/// Resolve the question category: explicit, classified, or none.
fn question_category(bundle: &SystemBundle, req: &ReadingRequest) -> Option<String> {
    if let Some(category) = &req.question_type {
        return Some(category.clone());
    }
    if !req.classify {
        return None;
    }
    let question = req.question.as_deref().unwrap_or_default();
    let classifier =
        KeywordClassifier::default().restricted_to(&bundle.deck.system().question_categories);
    let category = classifier.classify_now(question);
    info!(%category, "question classified");
    Some(category)
}

/// Draw (or lay the given cards) and assemble.
fn assemble_reading(req: &ReadingRequest) -> Result<AssembledContext, String> {
    let library = load_library(&req.data)?;
    let bundle = select_system(&library, req.system.as_deref())?;
    let spread = bundle.spreads.spread(&req.spread).map_err(|e| e.to_string())?;

    let drawn = if req.cards.is_empty() {
        let config = DrawConfig {
            seed: req.seed,
            allow_reversals: req.reversals,
        };
        kl_reading::draw(&bundle.deck, spread, &config).map_err(|e| e.to_string())?
    } else {
        let positions: Vec<String> = spread.positions().iter().map(|p| p.name.clone()).collect();
        parse_cards(&bundle.deck, &req.cards, &positions)?
    };

    let options = AssembleOptions {
        question: req.question.clone(),
        category: question_category(bundle, req),
        combinations: req.combinations,
    };

    kl_reading::assemble(&bundle.deck, spread, &drawn, &options).map_err(|e| e.to_string())
}

/// Shorten to `max` characters for table cells.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let cut: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{cut}...")
    } else if text.is_empty() {
        "-".to_string()
    } else {
        text.to_string()
    }
}
