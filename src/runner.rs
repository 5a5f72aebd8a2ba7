use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Local};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::config::ScrapeConfig;
use crate::driver::Session;
use crate::scrape::{expand_all, extract, select_region};
use crate::sink;

/// Result of one region's select → expand → extract → append pass.
#[derive(Debug, Clone, PartialEq)]
pub enum RegionOutcome {
    Success {
        region: String,
        rows: usize,
        partial: usize,
        clicks: usize,
    },
    /// The region was shown but its rows never reached the destination.
    PartialFailure { region: String, reason: String },
    /// The region could not be selected.
    Skipped { region: String, reason: String },
}

impl RegionOutcome {
    pub fn region(&self) -> &str {
        match self {
            RegionOutcome::Success { region, .. }
            | RegionOutcome::PartialFailure { region, .. }
            | RegionOutcome::Skipped { region, .. } => region,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RegionOutcome::Success { .. })
    }
}

/// Counters for the sweep in progress.
#[derive(Debug)]
pub struct RunState {
    pub total_regions: usize,
    pub current: usize,
    pub rows_written: usize,
    pub partial_rows: usize,
    pub started_at: DateTime<Local>,
}

impl RunState {
    fn new(total_regions: usize) -> Self {
        RunState {
            total_regions,
            current: 0,
            rows_written: 0,
            partial_rows: 0,
            started_at: Local::now(),
        }
    }
}

#[derive(Debug)]
pub struct RunSummary {
    pub outcomes: Vec<RegionOutcome>,
    pub rows_written: usize,
    pub partial_rows: usize,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
}

impl RunSummary {
    pub fn elapsed(&self) -> Duration {
        (self.finished_at - self.started_at)
            .to_std()
            .unwrap_or_default()
    }

    pub fn failures(&self) -> impl Iterator<Item = &RegionOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    pub fn print(&self) {
        let ok = self.outcomes.iter().filter(|o| o.is_success()).count();
        println!("Start Time: {}", self.started_at.format("%Y-%m-%d %H:%M:%S"));
        println!("End Time:   {}", self.finished_at.format("%Y-%m-%d %H:%M:%S"));
        println!(
            "Regions: {} ok, {} failed. Rows written: {} ({} without details).",
            ok,
            self.outcomes.len() - ok,
            self.rows_written,
            self.partial_rows
        );
        for outcome in self.failures() {
            let reason = match outcome {
                RegionOutcome::PartialFailure { reason, .. } => format!("failed after loading: {reason}"),
                RegionOutcome::Skipped { reason, .. } => format!("skipped: {reason}"),
                RegionOutcome::Success { .. } => continue,
            };
            println!("  {}: {}", outcome.region(), reason);
        }
        let secs = self.elapsed().as_secs();
        println!("Total Runtime: {} minutes {} seconds", secs / 60, secs % 60);
    }
}

/// Sweep every region in order, appending each region's records to
/// `destination`. One region failing never stops the others.
pub async fn run<S: Session>(
    session: &mut S,
    regions: &[String],
    destination: &Path,
    config: &ScrapeConfig,
) -> RunSummary {
    let mut state = RunState::new(regions.len());
    let mut outcomes = Vec::with_capacity(regions.len());

    for region in regions {
        state.current += 1;
        info!("[{}/{}] {}", state.current, state.total_regions, region);

        let outcome = scrape_region(session, region, destination, config).await;
        match &outcome {
            RegionOutcome::Success { rows, partial, .. } => {
                state.rows_written += rows;
                state.partial_rows += partial;
                println!("{} data has been added to csv ({} rows).", region, rows);
            }
            RegionOutcome::PartialFailure { reason, .. } => {
                warn!("{}: {}", region, reason);
                println!("There seems to be an issue writing data for {}.", region);
            }
            RegionOutcome::Skipped { reason, .. } => {
                warn!("Skipping {}: {}", region, reason);
            }
        }
        outcomes.push(outcome);
    }

    RunSummary {
        outcomes,
        rows_written: state.rows_written,
        partial_rows: state.partial_rows,
        started_at: state.started_at,
        finished_at: Local::now(),
    }
}

async fn scrape_region<S: Session>(
    session: &mut S,
    region: &str,
    destination: &Path,
    config: &ScrapeConfig,
) -> RegionOutcome {
    if let Err(e) = select_region(session, region, config).await {
        // Leave the page in a known state for the next region.
        let _ = session.refresh().await;
        return RegionOutcome::Skipped {
            region: region.to_string(),
            reason: format!("{e:#}"),
        };
    }

    let pb = spinner(config.show_progress);
    let report = expand_all(session, region, config, &pb).await;
    info!(
        "{}: {} clicks, {} alerts, stopped on {:?}",
        region, report.clicks, report.alerts, report.exhaustion
    );
    let extracted = extract(session, region, config, &pb).await;
    pb.finish_and_clear();

    let batch = match extracted {
        Ok(batch) if batch.is_empty() => {
            warn!("{}: no rows found", region);
            batch
        }
        Ok(batch) => batch,
        Err(e) => {
            let _ = session.refresh().await;
            return RegionOutcome::PartialFailure {
                region: region.to_string(),
                reason: format!("{e:#}"),
            };
        }
    };

    match sink::append(&batch, destination) {
        Ok(rows) => RegionOutcome::Success {
            region: region.to_string(),
            rows,
            partial: batch.partial,
            clicks: report.clicks,
        },
        Err(e) => RegionOutcome::PartialFailure {
            region: region.to_string(),
            reason: format!("{e:#}"),
        },
    }
}

fn spinner(visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}") {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}
