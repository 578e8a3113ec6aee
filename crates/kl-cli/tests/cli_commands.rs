//! Integration tests for the kl command line.

#![allow(deprecated)] // Command::cargo_bin – macro replacement not yet stable

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const SYSTEM: &str = r#"{
    "id": "lenormand",
    "name": "Petit Lenormand",
    "reversals": true,
    "meanings": {"line": {"opening": {}, "modifying": {}, "outcome": {}}},
    "question_categories": ["love", "career"],
    "partner_categories": ["person", "positive", "negative"]
}"#;

const CARDS: [(&str, &str); 4] = [
    (
        "01-rider.json",
        r#"{"id": "rider", "number": 1, "name": "Rider", "system": "lenormand",
            "core": {"category": "positive", "charge": "positive", "keywords": ["news", "speed"]},
            "meanings": {"line": {
                "opening": {"text": "news comes"},
                "modifying": {"text": "quickly"},
                "outcome": {"text": "a message arrives"}}},
            "topic_contexts": {"love": {"text": "an admirer"}},
            "directional": {"as_left": "speeds things up", "as_right": "brings news about it", "summary": "messenger"},
            "combinations": {"person": {"man": {"self_first": "news for a man", "partner_first": "a man sends news"}}}}"#,
    ),
    (
        "02-clover.json",
        r#"{"id": "clover", "number": 2, "name": "Clover", "system": "lenormand",
            "core": {"category": "positive", "charge": "positive", "keywords": ["luck"],
                     "essence": {"upright": "A small stroke of luck.", "reversed": "Luck passes by."}},
            "meanings": {"line": {
                "opening": {"text": "a lucky start"},
                "outcome": {"upright": "brief luck", "reversed": "luck slips away"}}},
            "directional": {"as_left": "lightens what follows", "as_right": "ends on a lucky note", "summary": "small luck"}}"#,
    ),
    (
        "08-coffin.json",
        r#"{"id": "coffin", "number": 8, "name": "Coffin", "system": "lenormand",
            "core": {"category": "negative", "charge": "negative", "keywords": ["ending"]},
            "meanings": {"line": {
                "opening": {"text": "an ending starts"},
                "modifying": {"text": "heavily"},
                "outcome": {"text": "closure"}}},
            "topic_contexts": {"love": {"text": "a breakup"}, "career": {"text": "a layoff"}},
            "directional": {"as_left": "ends what follows", "as_right": "is brought to an end", "summary": "closure"}}"#,
    ),
    (
        "28-man.json",
        r#"{"id": "man", "number": 28, "name": "Man", "system": "lenormand",
            "core": {"category": "person", "keywords": ["querent"]},
            "meanings": {"line": {
                "opening": {"text": "he starts it"},
                "modifying": {"text": "a man is involved"},
                "outcome": {"text": "he decides"}}},
            "topic_contexts": {"love": {"text": "a partner"}, "career": {"text": "a colleague"}},
            "directional": {"as_left": "he acts on it", "as_right": "it happens to him", "summary": "the querent"}}"#,
    ),
];

const SPREADS: &str = r#"{"spreads": [
    {"id": "three", "name": "Three Card Line", "system": "lenormand", "card_count": 3,
     "description": "Opening, development, outcome.",
     "positions": [
        {"name": "opening", "locator": "line.opening", "description": "how it begins",
         "adjacency": {"kind": "line", "role": "first"}},
        {"name": "modifying", "locator": "line.modifying", "description": "what shapes it",
         "adjacency": {"kind": "line", "role": "middle"}},
        {"name": "outcome", "locator": "line.outcome", "description": "where it leads",
         "question_adaptations": {"love": "where the relationship leads"},
         "adjacency": {"kind": "line", "role": "last"}}]},
    {"id": "single", "name": "Card of the Day", "system": "lenormand",
     "positions": [{"name": "day", "locator": "line.outcome"}]}
]}"#;

fn write_system(root: &Path, spreads: &str) {
    let dir = root.join("lenormand");
    fs::create_dir_all(dir.join("cards")).unwrap();
    fs::write(dir.join("system.json"), SYSTEM).unwrap();
    for (file, json) in CARDS {
        fs::write(dir.join("cards").join(file), json).unwrap();
    }
    fs::write(dir.join("spreads.json"), spreads).unwrap();
}

/// Create a temp library with one complete system.
fn test_library() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_system(dir.path(), SPREADS);
    dir
}

fn kl() -> Command {
    Command::cargo_bin("kl").unwrap()
}

fn path(dir: &TempDir) -> &str {
    dir.path().to_str().unwrap()
}

// ---------------------------------------------------------------------------
// list
// ---------------------------------------------------------------------------

#[test]
fn list_shows_cards_and_spreads() {
    let dir = test_library();
    kl().args(["list", "-d", path(&dir)])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Rider")
                .and(predicate::str::contains("Coffin"))
                .and(predicate::str::contains("4 cards"))
                .and(predicate::str::contains("Three Card Line"))
                .and(predicate::str::contains("2 spreads")),
        );
}

#[test]
fn list_spreads_only() {
    let dir = test_library();
    kl().args(["list", "spreads", "-d", path(&dir)])
        .assert()
        .success()
        .stdout(predicate::str::contains("Card of the Day").and(predicate::str::contains("Rider").not()));
}

#[test]
fn list_several_systems() {
    let dir = test_library();
    let tarot = dir.path().join("tarot");
    fs::create_dir_all(tarot.join("cards")).unwrap();
    fs::write(
        tarot.join("system.json"),
        r#"{"id": "tarot", "name": "Tarot", "meanings": {"present": {}},
            "partner_categories": ["major"]}"#,
    )
    .unwrap();
    fs::write(
        tarot.join("cards").join("00-fool.json"),
        r#"{"id": "fool", "name": "The Fool", "system": "tarot", "core": {"category": "major"},
            "meanings": {"present": {"upright": "a leap", "reversed": "a stumble"}}}"#,
    )
    .unwrap();

    kl().args(["list", "-d", path(&dir)])
        .assert()
        .success()
        .stdout(predicate::str::contains("tarot").and(predicate::str::contains("Petit Lenormand")));

    kl().args(["read", "single", "-d", path(&dir), "--seed", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--system"));

    kl().args(["list", "cards", "-d", path(&dir), "-s", "tarot"])
        .assert()
        .success()
        .stdout(predicate::str::contains("The Fool"));
}

#[test]
fn list_empty_dir_fails() {
    let dir = TempDir::new().unwrap();
    kl().args(["list", "-d", path(&dir)])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no oracle systems"));
}

// ---------------------------------------------------------------------------
// show
// ---------------------------------------------------------------------------

#[test]
fn show_card_by_name() {
    let dir = test_library();
    kl().args(["show", "clover", "-d", path(&dir)])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Clover")
                .and(predicate::str::contains("A small stroke of luck."))
                .and(predicate::str::contains("2/3 locators covered"))
                .and(predicate::str::contains("lightens what follows")),
        );
}

#[test]
fn show_unknown_card_fails() {
    let dir = test_library();
    kl().args(["show", "Sun", "-d", path(&dir)])
        .assert()
        .failure()
        .stderr(predicate::str::contains("card not found"));
}

// ---------------------------------------------------------------------------
// check
// ---------------------------------------------------------------------------

#[test]
fn check_reports_gaps_as_warnings() {
    let dir = test_library();
    kl().args(["check", "-d", path(&dir)])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("warning: clover")
                .and(predicate::str::contains("line.modifying"))
                .and(predicate::str::contains("2/12 ordered pairs curated")),
        );
}

#[test]
fn check_strict_fails_on_gaps() {
    let dir = test_library();
    kl().args(["check", "--strict", "-d", path(&dir)])
        .assert()
        .failure()
        .stderr(predicate::str::contains("coverage gaps"));
}

#[test]
fn check_rejects_unknown_locator() {
    let dir = TempDir::new().unwrap();
    write_system(
        dir.path(),
        r#"{"spreads": [{"id": "bad", "name": "Bad", "system": "lenormand",
            "positions": [{"name": "a", "locator": "line.ending"}]}]}"#,
    );
    kl().args(["check", "-d", path(&dir)])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown segment \"ending\""));
}

// ---------------------------------------------------------------------------
// draw
// ---------------------------------------------------------------------------

#[test]
fn draw_is_reproducible_with_seed() {
    let dir = test_library();
    let run = || {
        kl().args(["draw", "three", "-d", path(&dir), "--seed", "42", "-f", "json"])
            .output()
            .unwrap()
    };
    let first = run();
    let second = run();
    assert!(first.status.success());
    assert_eq!(first.stdout, second.stdout);

    let drawn: serde_json::Value = serde_json::from_slice(&first.stdout).unwrap();
    assert_eq!(drawn.as_array().unwrap().len(), 3);
}

#[test]
fn draw_without_reversals_is_upright() {
    let dir = test_library();
    kl().args(["draw", "three", "-d", path(&dir), "--seed", "3", "--no-reversals"])
        .assert()
        .success()
        .stdout(predicate::str::contains("upright").and(predicate::str::contains("reversed").not()));
}

#[test]
fn draw_unknown_spread_lists_available() {
    let dir = test_library();
    kl().args(["draw", "celtic", "-d", path(&dir)])
        .assert()
        .failure()
        .stderr(predicate::str::contains("available: single, three"));
}

// ---------------------------------------------------------------------------
// read
// ---------------------------------------------------------------------------

#[test]
fn read_with_given_cards() {
    let dir = test_library();
    kl().args(["read", "three", "-d", path(&dir), "-c", "rider,man,coffin"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("1. opening: Rider, upright")
                .and(predicate::str::contains("news for a man"))
                .and(predicate::str::contains("he acts on it"))
                .and(predicate::str::contains("is brought to an end")),
        );
}

#[test]
fn read_with_question_type_adapts_positions() {
    let dir = test_library();
    kl().args([
        "read", "three", "-d", path(&dir), "-c", "rider,clover:r,man", "-t", "love", "-q",
        "Will he call?",
    ])
    .assert()
    .success()
    .stdout(
        predicate::str::contains("Question: Will he call?")
            .and(predicate::str::contains("love: an admirer"))
            .and(predicate::str::contains("where the relationship leads"))
            .and(predicate::str::contains("Luck passes by. [core meaning]")),
    );
}

#[test]
fn read_classifies_question() {
    let dir = test_library();
    kl().args([
        "read", "three", "-d", path(&dir), "-c", "coffin,man,rider", "--classify", "-q",
        "Should I ask my boss for a promotion?",
    ])
    .assert()
    .success()
    .stdout(predicate::str::contains("Category: career").and(predicate::str::contains("career: a layoff")));
}

#[test]
fn read_json_is_structured() {
    let dir = test_library();
    let output = kl()
        .args(["read", "three", "-d", path(&dir), "--seed", "7", "-f", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let ctx: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(ctx["spread_id"], "three");
    assert_eq!(ctx["positions"].as_array().unwrap().len(), 3);
    assert_eq!(ctx["combinations"].as_array().unwrap().len(), 2);
    assert_eq!(ctx["positions"][0]["position"], "opening");
}

#[test]
fn read_markdown() {
    let dir = test_library();
    kl().args(["read", "single", "-d", path(&dir), "-c", "coffin", "-f", "markdown"])
        .assert()
        .success()
        .stdout(
            predicate::str::starts_with("# Card of the Day")
                .and(predicate::str::contains("### 1. day: Coffin (upright)"))
                .and(predicate::str::contains("## Combinations").not()),
        );
}

#[test]
fn read_rejects_configuration_errors() {
    let dir = test_library();
    kl().args(["read", "three", "-d", path(&dir), "-c", "rider,man"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("takes 3 cards"));

    kl().args(["read", "three", "-d", path(&dir), "--seed", "1", "-t", "weather"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not declare question category \"weather\""));

    kl().args(["read", "three", "-d", path(&dir), "-c", "rider,man:sideways,coffin"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown orientation"));
}

// ---------------------------------------------------------------------------
// combine
// ---------------------------------------------------------------------------

#[test]
fn combine_shows_both_orders() {
    let dir = test_library();
    kl().args(["combine", "man", "rider", "-d", path(&dir)])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Man -> Rider")
                .and(predicate::str::contains("a man sends news"))
                .and(predicate::str::contains("mirrored from rider"))
                .and(predicate::str::contains("Rider -> Man"))
                .and(predicate::str::contains("news for a man")),
        );
}

#[test]
fn combine_composes_uncurated_pairs() {
    let dir = test_library();
    kl().args(["combine", "clover", "coffin", "-d", path(&dir)])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("composed")
                .and(predicate::str::contains("challenges"))
                .and(predicate::str::contains("Clover leading: lightens what follows")),
        );
}

// ---------------------------------------------------------------------------
// synthesize
// ---------------------------------------------------------------------------

#[test]
fn synthesize_without_provider_prints_transcript() {
    let dir = test_library();
    kl().args(["synthesize", "three", "-d", path(&dir), "-c", "rider,man,coffin"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Three Card Line (lenormand)").and(predicate::str::contains("news for a man")));
}

#[test]
fn synthesize_replays_saved_context() {
    let dir = test_library();
    let output = kl()
        .args(["read", "three", "-d", path(&dir), "-c", "rider,man,coffin", "-f", "json"])
        .output()
        .unwrap();
    let saved = dir.path().join("context.json");
    fs::write(&saved, &output.stdout).unwrap();

    kl().args([
        "synthesize", "--from", saved.to_str().unwrap(), "-f", "json", "--tradition",
        "classical",
    ])
    .assert()
    .success()
    .stdout(
        predicate::str::contains("\"tradition\": \"classical\"")
            .and(predicate::str::contains("news for a man")),
    );
}

#[test]
fn synthesize_needs_a_spread_or_a_saved_context() {
    let dir = test_library();
    kl().args(["synthesize", "-d", path(&dir), "-c", "rider"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("<SPREAD>"));
}

#[test]
fn synthesize_stream_without_provider_prints_transcript() {
    let dir = test_library();
    kl().args(["synthesize", "three", "-d", path(&dir), "-c", "rider,man,coffin", "--stream"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Three Card Line (lenormand)").and(predicate::str::contains("news for a man")));
}

#[test]
fn anthropic_backend_needs_a_key() {
    let dir = test_library();
    kl().args(["synthesize", "single", "-d", path(&dir), "-c", "rider", "-p", "anthropic"])
        .env_remove("ANTHROPIC_API_KEY")
        .assert()
        .failure()
        .stderr(predicate::str::contains("set ANTHROPIC_API_KEY"));
}

#[test]
fn synthesize_rejects_unknown_backend_and_tradition() {
    let dir = test_library();
    kl().args(["synthesize", "single", "-d", path(&dir), "-c", "rider", "-p", "oracle-net"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown provider"));

    kl().args(["synthesize", "single", "-d", path(&dir), "-c", "rider", "--tradition", "runic"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown tradition"));
}
