use indicatif::ProgressBar;
use tracing::{debug, info, warn};

use crate::config::{ScrapeConfig, LOAD_MORE, LOAD_MORE_LABEL, RESULT_ITEMS};
use crate::driver::{DriverError, Session};

/// Why a region stopped revealing rows. Every variant is a normal end
/// of pagination; partial data is kept.
#[derive(Debug, Clone, PartialEq)]
pub enum Exhaustion {
    /// No clickable load-more control within the wait.
    NoControl,
    /// The control is there but no longer says "Load more".
    Label(String),
    /// Too many alerts in a row.
    AlertCeiling(usize),
    /// Clicks kept landing without revealing any new rows.
    Stalled(usize),
    /// The control vanished, the click was blocked or timed out.
    Interaction(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaginationReport {
    pub clicks: usize,
    pub alerts: usize,
    pub exhaustion: Exhaustion,
}

enum Step {
    Clicked,
    Done(Exhaustion),
}

/// Click "Load more" until the listing for the selected region is fully
/// revealed. Never fails: a stuck region ends as exhausted.
pub async fn expand_all<S: Session>(
    session: &mut S,
    region: &str,
    config: &ScrapeConfig,
    pb: &ProgressBar,
) -> PaginationReport {
    let mut clicks = 0;
    let mut alerts = 0;
    let mut retries = 0;
    let mut stalled = 0;
    let mut shown = shown_items(session).await.unwrap_or(0);

    let exhaustion = loop {
        match load_more_once(session, config).await {
            Ok(Step::Clicked) => {
                clicks += 1;
                retries = 0;
                pb.set_message(format!("{region}: clicked 'Load more' {clicks} times"));
                pb.tick();
                tokio::time::sleep(config.click_delay).await;

                // An intercepted click or an empty server page looks like success.
                if let Some(now) = shown_items(session).await {
                    if now > shown {
                        shown = now;
                        stalled = 0;
                    } else {
                        stalled += 1;
                        debug!("{}: click {} revealed no new rows", region, clicks);
                        if stalled >= config.max_stalled_clicks {
                            break Exhaustion::Stalled(stalled);
                        }
                    }
                }
            }
            Ok(Step::Done(reason)) => break reason,
            Err(DriverError::UnexpectedAlert(message)) => {
                alerts += 1;
                retries += 1;
                warn!("Unexpected alert on {}: {}", region, message);
                if retries > config.max_alert_retries {
                    let _ = session.dismiss_alert().await;
                    break Exhaustion::AlertCeiling(retries - 1);
                }
                match session.dismiss_alert().await {
                    Ok(()) => {
                        info!("Alert dismissed");
                        tokio::time::sleep(config.alert_backoff).await;
                    }
                    Err(e) => {
                        warn!("No alert found on retry: {}", e);
                        tokio::time::sleep(config.settle_delay).await;
                    }
                }
            }
            Err(e) => break Exhaustion::Interaction(e.to_string()),
        }
    };

    match &exhaustion {
        Exhaustion::NoControl | Exhaustion::Label(_) => {
            info!("{}: no more projects to load after {} clicks", region, clicks)
        }
        other => warn!("{}: pagination stopped after {} clicks ({:?})", region, clicks, other),
    }

    PaginationReport {
        clicks,
        alerts,
        exhaustion,
    }
}

/// Rows and templates currently in the listing. `None` while an alert is up.
async fn shown_items<S: Session>(session: &S) -> Option<usize> {
    session.find_all(RESULT_ITEMS).await.ok().map(|items| items.len())
}

async fn load_more_once<S: Session>(
    session: &mut S,
    config: &ScrapeConfig,
) -> Result<Step, DriverError> {
    let button = match session.wait_for(LOAD_MORE, config.wait_timeout).await {
        Ok(button) => button,
        Err(e @ DriverError::UnexpectedAlert(_)) => return Err(e),
        Err(e) => {
            debug!("Load more unavailable: {}", e);
            return Ok(Step::Done(Exhaustion::NoControl));
        }
    };

    if session.attribute(&button, "disabled").await?.is_some() {
        return Ok(Step::Done(Exhaustion::NoControl));
    }

    let label = session.text(&button).await?;
    if label.trim() != LOAD_MORE_LABEL {
        return Ok(Step::Done(Exhaustion::Label(label.trim().to_string())));
    }

    session.scroll_into_view(&button).await?;
    session.click(&button).await?;
    Ok(Step::Clicked)
}
