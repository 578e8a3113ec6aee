//! CLI frontend for the Kartenleger reading engine.

mod commands;

use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::OutputFormat;

#[derive(Parser)]
#[command(
    name = "kl",
    about = "Kartenleger: structured card readings from curated oracle data",
    version,
    propagate_version = true
)]
struct Cli {
    /// Log more (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Where to find oracle data.
#[derive(Args)]
struct DataArgs {
    /// Library directory with one sub-directory per system
    #[arg(short, long, default_value = ".")]
    data: PathBuf,

    /// System id (optional when the library holds a single system)
    #[arg(short, long)]
    system: Option<String>,
}

/// How to lay out and assemble a reading.
#[derive(Args)]
struct ReadingArgs {
    /// The querent's question
    #[arg(short, long)]
    question: Option<String>,

    /// Question category (e.g. love, career, general)
    #[arg(short = 't', long)]
    question_type: Option<String>,

    /// Pick the question category from the question text
    #[arg(long, conflicts_with = "question_type")]
    classify: bool,

    /// Cards to lay, in position order: `rider,man:r,coffin`
    #[arg(short, long, value_delimiter = ',')]
    cards: Vec<String>,

    /// RNG seed for a reproducible draw
    #[arg(long)]
    seed: Option<u64>,

    /// Keep every card upright
    #[arg(long)]
    no_reversals: bool,

    /// Skip pairwise combinations
    #[arg(long)]
    no_combinations: bool,

    #[command(flatten)]
    data: DataArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// List systems, or the cards and spreads of one system
    List {
        /// What to list: cards or spreads (default: both)
        what: Option<String>,

        #[command(flatten)]
        data: DataArgs,
    },

    /// Show a card document
    Show {
        /// Card id or name (case-insensitive)
        card: String,

        #[command(flatten)]
        data: DataArgs,
    },

    /// Validate every system and report coverage gaps
    Check {
        /// Library directory
        #[arg(short, long, default_value = ".")]
        data: PathBuf,

        /// Fail when any coverage gap is found
        #[arg(long)]
        strict: bool,
    },

    /// Draw cards for a spread without interpreting them
    Draw {
        /// Spread id
        spread: String,

        /// RNG seed for a reproducible draw
        #[arg(long)]
        seed: Option<u64>,

        /// Keep every card upright
        #[arg(long)]
        no_reversals: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        #[command(flatten)]
        data: DataArgs,
    },

    /// Draw and assemble a reading (deterministic, no narrative backend)
    Read {
        /// Spread id
        spread: String,

        #[command(flatten)]
        reading: ReadingArgs,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Resolve the combination of two cards in both orders
    Combine {
        /// First card id or name
        first: String,

        /// Second card id or name
        second: String,

        #[command(flatten)]
        data: DataArgs,
    },

    /// Assemble a reading and synthesize a narrative for it
    Synthesize {
        /// Spread id (not needed with --from)
        #[arg(required_unless_present = "from")]
        spread: Option<String>,

        #[command(flatten)]
        reading: ReadingArgs,

        /// Replay a saved context (from `read --format json`) instead of drawing
        #[arg(long)]
        from: Option<PathBuf>,

        /// Narrative backend: anthropic, openai or local (default: transcript only)
        #[arg(short, long)]
        provider: Option<String>,

        /// Model override
        #[arg(short, long)]
        model: Option<String>,

        /// Reading tradition: intuitive, classical, psychological
        #[arg(long, default_value = "intuitive")]
        tradition: String,

        /// Seconds to wait for the backend
        #[arg(long, default_value = "60")]
        timeout: u64,

        /// Print the narrative as it is written (text output only)
        #[arg(long)]
        stream: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::List { what, data } => {
            commands::list::run(&data.data, data.system.as_deref(), what.as_deref())
        }
        Commands::Show { card, data } => {
            commands::show::run(&data.data, data.system.as_deref(), &card)
        }
        Commands::Check { data, strict } => commands::check::run(&data, strict),
        Commands::Draw {
            spread,
            seed,
            no_reversals,
            format,
            data,
        } => commands::draw::run(
            &data.data,
            data.system.as_deref(),
            &spread,
            seed,
            !no_reversals,
            format,
        ),
        Commands::Read {
            spread,
            reading,
            format,
        } => commands::read::run(&reading.into_request(spread), format),
        Commands::Combine {
            first,
            second,
            data,
        } => commands::combine::run(&data.data, data.system.as_deref(), &first, &second),
        Commands::Synthesize {
            spread,
            reading,
            from,
            provider,
            model,
            tradition,
            timeout,
            stream,
            format,
        } => commands::synthesize::run(&commands::synthesize::SynthesizeRequest {
            reading: spread.map(|spread| reading.into_request(spread)),
            from,
            provider,
            model,
            tradition,
            timeout_secs: timeout,
            stream,
            format,
        }),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

impl ReadingArgs {
    fn into_request(self, spread: String) -> commands::ReadingRequest {
        commands::ReadingRequest {
            data: self.data.data,
            system: self.data.system,
            spread,
            question: self.question,
            question_type: self.question_type,
            classify: self.classify,
            cards: self.cards,
            seed: self.seed,
            reversals: !self.no_reversals,
            combinations: !self.no_combinations,
        }
    }
}
