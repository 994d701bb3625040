//! Scan command - run value detection over a recognized-text file.

use std::collections::HashMap;
use std::fs;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use scanval_core::models::DetectionConfig;
use scanval_core::{
    BuiltinCurrencyStore, ContactDetector, CurrencyDetector, DateDetector, DetectionResult,
    DetectorExecutor, FixedRateSource, IdentifierDetector, InMemoryIdentifierStore,
    ProgressEvent, ProgressListener, ValueDetector,
};

/// Arguments for the scan command.
#[derive(Args)]
pub struct ScanArgs {
    /// Input text file ("-" for stdin)
    #[arg(required = true)]
    input: PathBuf,

    /// Detectors to run
    #[arg(short, long, value_delimiter = ',', default_values = ["date", "currency", "identifier", "contact"])]
    detectors: Vec<DetectorKind>,

    /// BCP 47 language tag of the scanned document
    #[arg(short, long, default_value = "en")]
    language_tag: String,

    /// File with known identifiers, one per line
    #[arg(short, long)]
    known_ids: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Hide the progress bar
    #[arg(long)]
    no_progress: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum DetectorKind {
    /// Dates, times, date-times
    Date,
    /// Currency amounts
    Currency,
    /// Known identifiers by edit distance
    Identifier,
    /// E-mail addresses and phone numbers
    Contact,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Plain text summary
    Text,
}

/// Forwards the aggregated progress stream to an indicatif bar.
struct BarListener {
    bar: ProgressBar,
}

impl ProgressListener for BarListener {
    fn on_progress(&self, event: &ProgressEvent) {
        self.bar.set_length(event.word_count as u64);
        self.bar.set_position(event.word_number as u64);
    }

    fn on_finished(&self) {
        self.bar.finish_and_clear();
    }
}

pub async fn run(args: ScanArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    // Load configuration
    let config = if let Some(path) = config_path {
        DetectionConfig::from_file(std::path::Path::new(path))?
    } else {
        DetectionConfig::default()
    };

    let text = read_input(&args.input)?;
    debug!(chars = text.len(), "read input text");

    let executor = DetectorExecutor::new(build_detectors(&args, &config)?)?;

    if !args.no_progress {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} units")?
                .progress_chars("=>-"),
        );
        executor.add_listener(Arc::new(BarListener { bar }));
    }

    let results = executor.execute(&text, &args.language_tag).await?;
    info!(
        detectors = results.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "detection finished"
    );

    let rendered = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(&results)?,
        OutputFormat::Text => render_text(&results),
    };

    match args.output {
        Some(path) => fs::write(path, rendered)?,
        None => println!("{rendered}"),
    }
    Ok(())
}

fn read_input(path: &PathBuf) -> anyhow::Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        return Ok(text);
    }
    if !path.exists() {
        anyhow::bail!("Input file not found: {}", path.display());
    }
    Ok(fs::read_to_string(path)?)
}

fn build_detectors(
    args: &ScanArgs,
    config: &DetectionConfig,
) -> anyhow::Result<Vec<Arc<dyn ValueDetector>>> {
    let mut detectors: Vec<Arc<dyn ValueDetector>> = Vec::new();

    for kind in &args.detectors {
        match kind {
            DetectorKind::Date => {
                detectors.push(Arc::new(DateDetector::new(&config.date)?));
            }
            DetectorKind::Currency => {
                let store = BuiltinCurrencyStore::new();
                let rates = if config.currency.supported_codes.is_empty() {
                    FixedRateSource::supporting_all(&store)
                        .map_err(|e| anyhow::anyhow!("currency store: {e}"))?
                } else {
                    FixedRateSource::new(config.currency.supported_codes.iter().cloned())
                };
                detectors.push(Arc::new(CurrencyDetector::new(&store, &rates)?));
            }
            DetectorKind::Identifier => {
                let corpus = match &args.known_ids {
                    Some(path) => fs::read_to_string(path)?
                        .lines()
                        .map(str::trim)
                        .filter(|line| !line.is_empty())
                        .map(str::to_string)
                        .collect(),
                    None => Vec::new(),
                };
                let store = Arc::new(InMemoryIdentifierStore::new(corpus));
                detectors.push(Arc::new(IdentifierDetector::new(store, &config.identifier)?));
            }
            DetectorKind::Contact => {
                detectors.push(Arc::new(ContactDetector::new()));
            }
        }
    }

    Ok(detectors)
}

fn render_text(results: &HashMap<String, Vec<DetectionResult>>) -> String {
    let mut names: Vec<&String> = results.keys().collect();
    names.sort();

    let mut out = String::new();
    for name in names {
        let candidates = &results[name];
        out.push_str(&format!(
            "{} {} ({} candidates)\n",
            style("▸").cyan(),
            style(name).bold(),
            candidates.len()
        ));
        for candidate in candidates {
            out.push_str(&format!(
                "    {:<30} {:?}\n",
                candidate.matched_text, candidate.value
            ));
        }
    }
    if out.is_empty() {
        out.push_str("no results\n");
    }
    out
}
