//! Shared fixtures for unit tests.

use std::sync::Mutex;

use async_trait::async_trait;
use kl_core::{Deck, Orientation, Spread, SpreadDocument};
use kl_reading::{AssembleOptions, AssembledContext, DrawnCard, assemble};

use crate::error::{NarrativeError, NarrativeResult};
use crate::provider::{Completion, NarrativeProvider, PromptRequest};

pub(crate) fn sample_context() -> AssembledContext {
    let system = serde_json::from_str(
        r#"{"id": "lenormand", "name": "Lenormand",
            "meanings": {"pair": {"first": {}, "second": {}}},
            "question_categories": ["love"],
            "partner_categories": ["person", "positive"]}"#,
    )
    .unwrap();
    let cards = [
        r#"{"id": "rider", "number": 1, "name": "Rider", "system": "lenormand",
            "core": {"category": "positive", "charge": "positive", "keywords": ["news"],
                     "essence": {"upright": "News is on its way."}},
            "meanings": {"pair": {"first": {"text": "news comes"}, "second": {"text": "news arrives"}}},
            "topic_contexts": {"love": {"text": "an admirer"}},
            "combinations": {"person": {"man": {"self_first": "news for a man", "partner_first": "a man sends news"}}}}"#,
        r#"{"id": "man", "number": 28, "name": "Man", "system": "lenormand",
            "core": {"category": "person", "keywords": ["querent"]},
            "meanings": {"pair": {"first": {"text": "he starts"}, "second": {"text": "he decides"}}}}"#,
    ]
    .iter()
    .map(|json| serde_json::from_str(json).unwrap())
    .collect();
    let deck = Deck::new(system, cards).unwrap();
    let doc: SpreadDocument = serde_json::from_str(
        r#"{"id": "pair", "name": "Pair", "system": "lenormand", "positions": [
            {"name": "first", "locator": "pair.first", "description": "what starts",
             "adjacency": {"kind": "line", "role": "first"}},
            {"name": "second", "locator": "pair.second", "description": "what follows",
             "adjacency": {"kind": "line", "role": "last"}}]}"#,
    )
    .unwrap();
    let spread = Spread::validate(doc, &deck).unwrap();
    let drawn = vec![
        DrawnCard {
            card: "rider".into(),
            position: "first".to_string(),
            orientation: Orientation::Upright,
            sequence: 0,
        },
        DrawnCard {
            card: "man".into(),
            position: "second".to_string(),
            orientation: Orientation::Upright,
            sequence: 1,
        },
    ];
    let options = AssembleOptions::default()
        .with_question("Will the news come?")
        .with_category("love");
    assemble(&deck, &spread, &drawn, &options).unwrap()
}

/// A provider that answers from a script and records the prompts it saw.
pub(crate) struct ScriptedProvider {
    reply: Result<String, String>,
    delay: Option<std::time::Duration>,
    pub(crate) seen: Mutex<Vec<PromptRequest>>,
}

impl ScriptedProvider {
    pub(crate) fn replying(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            delay: None,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            delay: None,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn slow(reply: &str, delay: std::time::Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::replying(reply)
        }
    }
}

#[async_trait]
impl NarrativeProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "script-1"
    }

    async fn complete(&self, request: PromptRequest) -> NarrativeResult<Completion> {
        self.seen.lock().unwrap().push(request);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.reply {
            Ok(text) => Ok(Completion {
                content: text.clone(),
                model: "script-1".to_string(),
                input_tokens: 10,
                output_tokens: 5,
                stop_reason: "stop".to_string(),
            }),
            Err(message) => Err(NarrativeError::MalformedResponse(message.clone())),
        }
    }
}
