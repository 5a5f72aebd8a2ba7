mod clean;
mod config;
mod driver;
mod enrich;
mod parser;
mod records;
mod runner;
mod scrape;
mod sink;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::{Args, Parser, Subcommand};
use tracing::info;

use config::{ScrapeConfig, BASE_URL, DEFAULT_OUTPUT, DEFAULT_OWNERS_OUTPUT};
use driver::chromium::{ChromiumSession, LaunchOptions};
use driver::Session;

#[derive(Parser)]
#[command(
    name = "flood_scraper",
    about = "Flood control project scraper: region sweep, cleaning and contractor lookup"
)]
struct Cli {
    /// Defaults to `scrape` with default options
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Sweep every region and append its projects to the output CSV
    Scrape(ScrapeArgs),
    /// Clean a scraped CSV and build the contractor table
    Clean {
        /// Raw scrape CSV
        #[arg(default_value = DEFAULT_OUTPUT)]
        input: PathBuf,
        /// Reference dataset keyed by ContractId (districts, municipality, budget)
        #[arg(short, long)]
        reference: Option<PathBuf>,
    },
    /// Look up contractor owners (needs GEMINI_API_KEY)
    Enrich {
        /// Contractor table produced by `clean`
        input: PathBuf,
        #[arg(short, long, default_value = DEFAULT_OWNERS_OUTPUT)]
        out: PathBuf,
        #[arg(short, long, default_value_t = enrich::DEFAULT_BATCH_SIZE)]
        batch_size: usize,
        #[arg(short, long, default_value = enrich::DEFAULT_MODEL)]
        model: String,
    },
    /// Scrape + clean in one go
    Run {
        #[command(flatten)]
        scrape: ScrapeArgs,
        #[arg(long)]
        reference: Option<PathBuf>,
    },
}

#[derive(Args, Clone)]
struct ScrapeArgs {
    /// Output CSV; appended to when it already exists
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    out: PathBuf,
    /// Listing page to start from
    #[arg(long, default_value = BASE_URL)]
    url: String,
    /// Only these regions (repeatable); default is every region
    #[arg(short, long = "region")]
    regions: Vec<String>,
    /// Show the browser window
    #[arg(long)]
    headed: bool,
    /// Chrome/Chromium binary
    #[arg(long)]
    chrome: Option<PathBuf>,
    /// Seconds to wait for a control before giving up on it
    #[arg(long, default_value_t = 10)]
    wait_secs: u64,
    /// Consecutive alerts tolerated while loading more rows
    #[arg(long, default_value_t = 5)]
    max_alert_retries: usize,
}

impl Default for ScrapeArgs {
    fn default() -> Self {
        Self {
            out: PathBuf::from(DEFAULT_OUTPUT),
            url: BASE_URL.to_string(),
            regions: Vec::new(),
            headed: false,
            chrome: None,
            wait_secs: 10,
            max_alert_retries: 5,
        }
    }
}

impl ScrapeArgs {
    fn config(&self) -> ScrapeConfig {
        ScrapeConfig {
            base_url: self.url.clone(),
            wait_timeout: Duration::from_secs(self.wait_secs),
            max_alert_retries: self.max_alert_retries,
            ..ScrapeConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command.unwrap_or(Commands::Scrape(ScrapeArgs::default())) {
        Commands::Scrape(args) => scrape(&args).await,
        Commands::Clean { input, reference } => {
            let report = clean::clean(&input, reference.as_deref())?;
            report.print();
            Ok(())
        }
        Commands::Enrich {
            input,
            out,
            batch_size,
            model,
        } => {
            let options = enrich::EnrichOptions {
                model,
                batch_size,
                ..Default::default()
            };
            let rows = enrich::enrich(&input, &out, &options).await?;
            println!("Contractor owner lookup complete: {} rows in {}", rows, out.display());
            Ok(())
        }
        Commands::Run { scrape: args, reference } => {
            scrape(&args).await?;
            if !args.out.exists() {
                println!("Nothing was scraped; skipping clean.");
                return Ok(());
            }
            let report = clean::clean(&args.out, reference.as_deref())?;
            report.print();
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

/// Region failures are reported in the summary, not as an error; only a
/// browser that will not start or a listing without a region filter is fatal.
async fn scrape(args: &ScrapeArgs) -> anyhow::Result<()> {
    let config = args.config();
    let options = LaunchOptions {
        headed: args.headed,
        chrome: args.chrome.clone(),
        command_timeout: config.wait_timeout,
    };

    let mut session = ChromiumSession::launch(&options).await?;
    let outcome = sweep(&mut session, &args.regions, &args.out, &config).await;
    if let Err(e) = session.quit().await {
        tracing::warn!("Browser shutdown: {}", e);
    }
    outcome
}

async fn sweep<S: Session>(
    session: &mut S,
    only: &[String],
    out: &Path,
    config: &ScrapeConfig,
) -> anyhow::Result<()> {
    session.navigate(&config.base_url).await?;
    tokio::time::sleep(config.settle_delay).await;

    let mut regions = scrape::enumerate_regions(session, config).await?;
    if !only.is_empty() {
        regions.retain(|r| only.iter().any(|o| o.eq_ignore_ascii_case(r)));
        info!("Restricted to {} of the listed regions", regions.len());
    }

    let summary = runner::run(session, &regions, out, config).await;
    summary.print();
    Ok(())
}

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use driver::fake::{FakeRegion, FakeSession};

    #[test]
    fn no_arguments_means_scrape() {
        let cli = Cli::try_parse_from(["flood_scraper"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn region_flag_repeats() {
        let cli = Cli::try_parse_from(["flood_scraper", "scrape", "-r", "NCR", "-r", "BARMM"]).unwrap();
        match cli.command {
            Some(Commands::Scrape(args)) => {
                assert_eq!(args.regions, vec!["NCR", "BARMM"]);
                assert_eq!(args.out, PathBuf::from(DEFAULT_OUTPUT));
            }
            _ => panic!("expected scrape"),
        }
    }

    #[tokio::test]
    async fn sweep_can_be_restricted() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.csv");
        let mut session = FakeSession::new(vec![
            ("NCR", FakeRegion::paired("NCR", 4, 8)),
            ("BARMM", FakeRegion::paired("BARMM", 3, 6)),
        ]);

        sweep(&mut session, &["barmm".to_string()], &out, &ScrapeConfig::immediate())
            .await
            .unwrap();
        assert_eq!(session.visited, vec![BASE_URL]);
        let content = std::fs::read_to_string(&out).unwrap();
        assert_eq!(content.lines().count(), 1 + 3);
    }

    #[tokio::test]
    async fn sweep_without_region_filter_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = FakeSession::new(vec![("NCR", FakeRegion::paired("NCR", 1, 2))]);
        session.missing_region_select = true;

        let result = sweep(&mut session, &[], &dir.path().join("out.csv"), &ScrapeConfig::immediate()).await;
        assert!(result.is_err());
    }

    #[test]
    fn durations() {
        assert_eq!(format_duration(Duration::from_secs(75)), "1m 15s");
        assert_eq!(format_duration(Duration::from_secs(3725)), "1h 2m 5s");
    }
}
