// rust_core/src/bin/generate.rs
// Batch card generation. Runs N generations with bounded concurrency and
// streams each finished card as one JSON line to the output file.

use clap::Parser;
use futures_util::stream::{self, StreamExt};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

use meme_card_core::{
    CardGenerator, GeneratorConfig, ImageService, LiveGenerator, Offline, TextService,
};

#[derive(Debug, Parser)]
#[command(name = "generate", about = "Generate meme trading cards into a JSONL file")]
struct Args {
    /// Number of cards to generate
    #[arg(short, long, default_value_t = 10)]
    count: usize,

    /// Generations in flight at once
    #[arg(short = 'j', long, default_value_t = 4)]
    concurrency: usize,

    #[arg(short, long, default_value = "generated_cards.jsonl")]
    output: PathBuf,

    /// Base seed; card i is rolled from seed + i
    #[arg(short, long)]
    seed: Option<u64>,

    /// Skip the backends and use fallback names, flavor and art
    #[arg(long)]
    offline: bool,

    /// Also log each generated card and every balance re-roll
    #[arg(short, long)]
    verbose: bool,
}

// Backend failures are absorbed into fallback cards, so warnings are the only trace of them.
const DEFAULT_LOG_FILTER: &str = "warn";
const VERBOSE_LOG_FILTER: &str = "warn,meme_card_core=debug";

/// `RUST_LOG` wins when set; otherwise warnings, or debug for the library with `--verbose`.
fn log_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { VERBOSE_LOG_FILTER } else { DEFAULT_LOG_FILTER })
    })
}

#[derive(Debug, Default)]
struct Tally {
    written: usize,
    failed: usize,
}

async fn run<T, I>(generator: CardGenerator<T, I>, args: &Args) -> Result<Tally, Box<dyn std::error::Error>>
where
    T: TextService,
    I: ImageService,
{
    let report = generator.check_connections().await;
    println!(
        ">>> Backends: text {} | image {}",
        if report.text { "online" } else { "offline" },
        if report.image { "online" } else { "offline" }
    );

    let file = File::create(&args.output)?;
    let mut writer = BufWriter::new(file);
    let mut tally = Tally::default();

    let generator = &generator;
    let mut results = stream::iter(0..args.count)
        .map(|i| async move {
            match args.seed {
                Some(seed) => generator.generate_card_seeded(seed.wrapping_add(i as u64)).await,
                None => generator.generate_card().await,
            }
        })
        .buffer_unordered(args.concurrency.max(1));

    while let Some(result) = results.next().await {
        match result {
            Ok(card) => {
                serde_json::to_writer(&mut writer, &card)?;
                writer.write_all(b"\n")?;
                tally.written += 1;
            }
            Err(e) => {
                eprintln!("\n>>> Generation failed: {}", e);
                tally.failed += 1;
            }
        }
        print!("\rGenerated: {} | Failed: {}", tally.written, tally.failed);
        let _ = std::io::stdout().flush();
    }

    writer.flush()?;
    println!();
    Ok(tally)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Logs go to stderr so they do not tear the progress line on stdout.
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(args.verbose))
        .with_writer(std::io::stderr)
        .init();

    println!(">>> Initializing Meme Card Generator...");

    let started = Instant::now();
    let tally = if args.offline {
        println!(">>> Offline mode: fallback names and placeholder art.");
        run(CardGenerator::new(Offline, Offline), &args).await?
    } else {
        match GeneratorConfig::from_env() {
            Ok(config) => run(LiveGenerator::from_config(&config)?, &args).await?,
            Err(e) => {
                println!(">>> {}. Falling back to offline mode.", e);
                run(CardGenerator::new(Offline, Offline), &args).await?
            }
        }
    };

    println!(
        ">>> Done. {} cards written to {} in {:.1}s ({} failed).",
        tally.written,
        args.output.display(),
        started.elapsed().as_secs_f64(),
        tally.failed
    );
    Ok(())
}
