//! Question classification: free-text question to question category.
//!
//! Every classifier answers with a category from its allowed vocabulary, or
//! `general` when nothing fits.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::NarrativeResult;
use crate::provider::{NarrativeProvider, PromptRequest};

/// The category meaning "no topic context".
pub const GENERAL: &str = "general";

/// Maps a question to a question category.
#[async_trait]
pub trait QuestionClassifier: Send + Sync {
    /// Classify `question`. Empty questions are `general`.
    async fn classify(&self, question: &str) -> NarrativeResult<String>;
}

fn default_table() -> BTreeMap<String, Vec<String>> {
    let table: [(&str, &[&str]); 5] = [
        (
            "love",
            &[
                "love", "relationship", "romance", "partner", "dating", "marriage", "married",
                "breakup", "soulmate", "boyfriend", "girlfriend", "husband", "wife", "crush",
                "ex",
            ],
        ),
        (
            "career",
            &[
                "career", "work", "job", "boss", "business", "promotion", "colleague",
                "colleagues", "interview", "employment", "profession", "office",
            ],
        ),
        (
            "spiritual",
            &[
                "spiritual", "purpose", "meaning", "path", "soul", "meditation", "growth",
                "enlightenment", "calling",
            ],
        ),
        (
            "financial",
            &[
                "money", "finance", "financial", "debt", "invest", "investment", "wealth",
                "salary", "savings", "rent", "loan",
            ],
        ),
        (
            "health",
            &[
                "health", "healing", "illness", "sick", "wellness", "energy", "vitality",
                "body", "stress", "sleep",
            ],
        ),
    ];
    table
        .into_iter()
        .map(|(category, words)| {
            (
                category.to_string(),
                words.iter().map(|w| (*w).to_string()).collect(),
            )
        })
        .collect()
}

/// Deterministic keyword-vote classifier.
///
/// The category with the most keyword hits wins; a tie or no hit is `general`.
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    table: BTreeMap<String, Vec<String>>,
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self {
            table: default_table(),
        }
    }
}

impl KeywordClassifier {
    /// A classifier with a custom keyword table.
    pub fn new(table: BTreeMap<String, Vec<String>>) -> Self {
        Self { table }
    }

    /// Keep only the categories in `allowed`.
    pub fn restricted_to(mut self, allowed: &[String]) -> Self {
        self.table.retain(|category, _| allowed.contains(category));
        self
    }

    /// Synchronous classification.
    pub fn classify_now(&self, question: &str) -> String {
        let lowered = question.to_lowercase();
        let words: Vec<&str> = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();

        let mut best: Option<(&str, usize)> = None;
        let mut tied = false;
        for (category, keywords) in &self.table {
            let hits = words
                .iter()
                .filter(|w| keywords.iter().any(|k| k == *w))
                .count();
            if hits == 0 {
                continue;
            }
            match best {
                Some((_, top)) if hits < top => {}
                Some((_, top)) if hits == top => tied = true,
                _ => {
                    best = Some((category.as_str(), hits));
                    tied = false;
                }
            }
        }
        match best {
            Some((category, _)) if !tied => category.to_string(),
            _ => GENERAL.to_string(),
        }
    }
}

#[async_trait]
impl QuestionClassifier for KeywordClassifier {
    async fn classify(&self, question: &str) -> NarrativeResult<String> {
        Ok(self.classify_now(question))
    }
}

/// Asks a narrative provider to pick the category.
pub struct ProviderClassifier {
    provider: Arc<dyn NarrativeProvider>,
    categories: Vec<String>,
}

impl ProviderClassifier {
    /// Classify into `categories` (plus `general`) with `provider`.
    pub fn new(provider: Arc<dyn NarrativeProvider>, categories: Vec<String>) -> Self {
        Self {
            provider,
            categories,
        }
    }

    fn prompt(&self, question: &str) -> String {
        let mut options: Vec<String> = self
            .categories
            .iter()
            .filter(|c| c.as_str() != GENERAL)
            .map(|c| format!("- {c}"))
            .collect();
        options.push(format!("- {GENERAL} (none of the above, or several equally)"));
        format!(
            "Classify this question into exactly ONE of these categories:\n\n{}\n\n\
             Question: \"{question}\"\n\n\
             Respond with ONLY the category name, nothing else. Just one word.",
            options.join("\n")
        )
    }
}

impl std::fmt::Debug for ProviderClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderClassifier")
            .field("provider", &self.provider.name())
            .field("categories", &self.categories)
            .finish()
    }
}

#[async_trait]
impl QuestionClassifier for ProviderClassifier {
    async fn classify(&self, question: &str) -> NarrativeResult<String> {
        let question = question.trim();
        if question.is_empty() {
            return Ok(GENERAL.to_string());
        }
        let request = PromptRequest::new(self.prompt(question))
            .with_temperature(0.1)
            .with_max_tokens(20);
        let completion = self.provider.complete(request).await?;
        let label = completion
            .content
            .trim()
            .trim_matches(|c: char| !c.is_alphanumeric() && c != '_')
            .to_lowercase();
        debug!(raw = %completion.content, %label, "question classified");
        if self.categories.contains(&label) {
            Ok(label)
        } else {
            Ok(GENERAL.to_string())
        }
    }
}
