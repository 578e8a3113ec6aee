//! Loading oracle systems from JSON files on disk.
//!
//! A library root holds one directory per system:
//!
//! ```text
//! <root>/lenormand/system.json
//! <root>/lenormand/cards/*.json
//! <root>/lenormand/spreads.json      {"spreads": [ ... ]}
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::card::CardDocument;
use crate::coverage::coverage_gaps;
use crate::deck::Deck;
use crate::error::{DocumentError, DocumentResult};
use crate::source::SpreadBook;
use crate::spread::SpreadDocument;
use crate::system::{OracleSystem, SystemId};

/// A loaded system: its deck and its validated spreads.
#[derive(Debug, Clone)]
pub struct SystemBundle {
    /// Cards and schema.
    pub deck: Deck,
    /// Validated spreads.
    pub spreads: SpreadBook,
}

#[derive(Deserialize)]
struct SpreadFile {
    spreads: Vec<SpreadDocument>,
}

/// Load one system directory.
pub fn load_system_dir(dir: &Path) -> DocumentResult<SystemBundle> {
    let system: OracleSystem = read_json(&dir.join("system.json"))?;

    let mut card_files = json_files(&dir.join("cards"))?;
    card_files.sort();
    let cards = card_files
        .iter()
        .map(|path| read_json::<CardDocument>(path))
        .collect::<DocumentResult<Vec<_>>>()?;
    let deck = Deck::new(system, cards)?;

    let spreads_path = dir.join("spreads.json");
    let docs = if spreads_path.exists() {
        read_json::<SpreadFile>(&spreads_path)?.spreads
    } else {
        Vec::new()
    };
    let spreads = SpreadBook::from_documents(docs, &deck)?;

    let gaps = coverage_gaps(&deck, &spreads).len();
    if gaps > 0 {
        warn!(system = %deck.system().id, gaps, "coverage gaps; affected readings fall back");
    }

    info!(
        system = %deck.system().id,
        cards = deck.len(),
        spreads = spreads.len(),
        "system loaded"
    );
    Ok(SystemBundle { deck, spreads })
}

/// Every system found under a library root, keyed by system id.
#[derive(Debug, Clone, Default)]
pub struct Library {
    systems: BTreeMap<SystemId, SystemBundle>,
}

impl Library {
    /// Load every sub-directory of `root` that contains a `system.json`.
    pub fn load(root: &Path) -> DocumentResult<Self> {
        let entries = fs::read_dir(root).map_err(|source| DocumentError::Io {
            path: root.to_path_buf(),
            source,
        })?;
        let mut dirs: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.join("system.json").is_file())
            .collect();
        dirs.sort();

        let mut systems = BTreeMap::new();
        for dir in dirs {
            debug!(dir = %dir.display(), "loading system directory");
            let bundle = load_system_dir(&dir)?;
            systems.insert(bundle.deck.system().id.clone(), bundle);
        }
        Ok(Self { systems })
    }

    /// Add an already-built bundle.
    pub fn insert(&mut self, bundle: SystemBundle) {
        self.systems
            .insert(bundle.deck.system().id.clone(), bundle);
    }

    /// Select a system by id.
    pub fn system(&self, id: &str) -> DocumentResult<&SystemBundle> {
        self.systems
            .get(&SystemId::new(id))
            .ok_or_else(|| DocumentError::SystemNotFound {
                id: id.to_string(),
                available: self.system_ids().join(", "),
            })
    }

    /// All system ids, sorted.
    pub fn system_ids(&self) -> Vec<&str> {
        self.systems.keys().map(SystemId::as_str).collect()
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> DocumentResult<T> {
    let text = fs::read_to_string(path).map_err(|source| DocumentError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| DocumentError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn json_files(dir: &Path) -> DocumentResult<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|source| DocumentError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    Ok(entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect())
}
