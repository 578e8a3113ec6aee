use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use colored::Colorize;
use futures::StreamExt;
use kl_narrative::{
    NarrativeProvider, ProviderConfig, ProviderKind, SynthesizedReading, Synthesizer,
    SynthesizerConfig, Tradition,
};
use kl_reading::AssembledContext;
use tracing::warn;

use super::{OutputFormat, ReadingRequest};

pub struct SynthesizeRequest {
    /// `None` when replaying a saved context.
    pub reading: Option<ReadingRequest>,
    pub from: Option<PathBuf>,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub tradition: String,
    pub timeout_secs: u64,
    pub stream: bool,
    pub format: OutputFormat,
}

pub fn run(req: &SynthesizeRequest) -> Result<(), String> {
    let tradition = Tradition::parse(&req.tradition).map_err(|e| e.to_string())?;
    let provider = build_provider(req.provider.as_deref(), req.model.as_deref())?;

    // assembly finishes before any network call
    let context = match (&req.from, &req.reading) {
        (Some(path), _) => {
            let json = std::fs::read_to_string(path)
                .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
            AssembledContext::from_json(&json).map_err(|e| e.to_string())?
        }
        (None, Some(reading)) => super::assemble_reading(reading)?,
        (None, None) => return Err("give a spread id or --from <context.json>".to_string()),
    };

    let config = SynthesizerConfig::default()
        .with_tradition(tradition)
        .with_timeout(Duration::from_secs(req.timeout_secs));
    let synthesizer = match provider {
        Some(provider) => Synthesizer::with_provider(provider, config),
        None => Synthesizer::deterministic(config),
    };

    let runtime = tokio::runtime::Runtime::new().map_err(|e| e.to_string())?;
    if req.stream && matches!(req.format, OutputFormat::Text) {
        return runtime.block_on(stream_text(&synthesizer, &context));
    }
    let reading = runtime.block_on(synthesizer.synthesize_or_transcript(&context));
    print_reading(&reading, req.format)
}

fn build_provider(
    id: Option<&str>,
    model: Option<&str>,
) -> Result<Option<Arc<dyn NarrativeProvider>>, String> {
    let Some(id) = id else {
        return Ok(None);
    };
    let kind = ProviderKind::parse(id).map_err(|e| e.to_string())?;
    let mut config = ProviderConfig::from_env(kind);
    if let Some(model) = model {
        config = config.with_model(model);
    }
    kl_narrative::connect(config)
        .map(Some)
        .map_err(|e| e.to_string())
}

/// Print chunks as they arrive. A stream that cannot be opened falls back
/// to the transcript; one that breaks midway is an error.
async fn stream_text(synthesizer: &Synthesizer, context: &AssembledContext) -> Result<(), String> {
    let mut chunks = match synthesizer.stream(context).await {
        Ok(chunks) => chunks,
        Err(e) => {
            warn!(error = %e, "streaming failed, using transcript");
            println!("{}", context.transcript().trim_end());
            return Ok(());
        }
    };

    let mut out = std::io::stdout().lock();
    let mut last = String::new();
    while let Some(chunk) = chunks.next().await {
        let chunk = chunk.map_err(|e| e.to_string())?;
        out.write_all(chunk.as_bytes()).map_err(|e| e.to_string())?;
        out.flush().map_err(|e| e.to_string())?;
        last = chunk;
    }
    if !last.ends_with('\n') {
        writeln!(out).map_err(|e| e.to_string())?;
    }
    Ok(())
}

fn print_reading(reading: &SynthesizedReading, format: OutputFormat) -> Result<(), String> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(reading).map_err(|e| e.to_string())?;
            println!("{json}");
        }
        OutputFormat::Markdown => print!("{}", reading.to_markdown()),
        OutputFormat::Text => {
            if let Some(model) = &reading.model {
                println!(
                    "  {} {}",
                    format!("{} reading", reading.tradition).bold(),
                    format!("({model}, {} tokens)", reading.tokens_used).dimmed()
                );
                println!();
            }
            println!("{}", reading.synthesis.trim_end());
        }
    }
    Ok(())
}
