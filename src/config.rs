use std::time::Duration;

pub const BASE_URL: &str = "https://sumbongsapangulo.ph/";
pub const DEFAULT_OUTPUT: &str = "flood-control-data.csv";
pub const DEFAULT_OWNERS_OUTPUT: &str = "projects_contractors_with_owners.csv";

// ── Site selectors ──

pub const FILTER_TOGGLE: &str = "#toggle-filters";
pub const REGION_SELECT: &str = "#region";
pub const REGION_OPTION: &str = "option";
pub const FILTER_SEARCH: &str = ".filter-search";
pub const LOAD_MORE: &str = "div.fcp-loadmore-wrap button#load-more-projects";
pub const RESULT_ITEMS: &str = "#projects-body > tr, #projects-body > template";
pub const ROW_CELL: &str = "td";

/// Label the load-more button carries while more rows remain.
pub const LOAD_MORE_LABEL: &str = "Load more";

/// Timings and limits for one region sweep.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    pub base_url: String,
    /// Ceiling for every explicit wait on a UI control.
    pub wait_timeout: Duration,
    /// Pause after navigation, region selection and reloads.
    pub settle_delay: Duration,
    /// Pause after each load-more click so new rows can render.
    pub click_delay: Duration,
    /// Pause after dismissing an unexpected alert.
    pub alert_backoff: Duration,
    /// Consecutive alert interruptions tolerated before a region is treated as exhausted.
    pub max_alert_retries: usize,
    /// Consecutive clicks that reveal no new rows before a region is treated as exhausted.
    pub max_stalled_clicks: usize,
    pub show_progress: bool,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            wait_timeout: Duration::from_secs(10),
            settle_delay: Duration::from_secs(2),
            click_delay: Duration::from_secs(1),
            alert_backoff: Duration::from_secs(3),
            max_alert_retries: 5,
            max_stalled_clicks: 3,
            show_progress: true,
        }
    }
}

#[cfg(test)]
impl ScrapeConfig {
    /// No pauses and no progress output.
    pub fn immediate() -> Self {
        Self {
            wait_timeout: Duration::ZERO,
            settle_delay: Duration::ZERO,
            click_delay: Duration::ZERO,
            alert_backoff: Duration::ZERO,
            show_progress: false,
            ..Self::default()
        }
    }
}
