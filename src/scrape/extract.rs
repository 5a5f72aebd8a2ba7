use anyhow::{Context, Result};
use indicatif::ProgressBar;
use tracing::{debug, info, warn};

use crate::config::{ScrapeConfig, RESULT_ITEMS, ROW_CELL};
use crate::driver::Session;
use crate::parser::{pair_adjacent, parse_template, Item};
use crate::records::{Batch, ProjectRecord, RawRow};

/// Read every loaded result row with its hidden template and rebuild one
/// record per project. Reloads the page afterwards.
pub async fn extract<S: Session>(
    session: &mut S,
    region: &str,
    config: &ScrapeConfig,
    pb: &ProgressBar,
) -> Result<Batch> {
    let elements = session
        .find_all(RESULT_ITEMS)
        .await
        .context("Cannot read result rows")?;

    let mut items = Vec::with_capacity(elements.len());
    let mut rows = 0usize;
    for element in &elements {
        let tag = session.tag_name(element).await?;
        match tag.as_str() {
            "tr" => {
                let cells = session.find_within(element, ROW_CELL).await?;
                let mut values = Vec::with_capacity(cells.len());
                for cell in &cells {
                    values.push(session.text(cell).await?);
                }
                items.push(Item::Row(RawRow::from_cells(values)));
                rows += 1;
                pb.set_message(format!("{region}: scraped {rows} rows"));
                pb.tick();
            }
            "template" => items.push(Item::Detail(session.inner_html(element).await?)),
            other => debug!("Skipping <{}> in results", other),
        }
    }

    let batch = assemble(region, items);
    info!(
        "{}: {} records ({} without details, {} stray templates)",
        region,
        batch.len(),
        batch.partial,
        batch.orphans
    );

    if let Err(e) = session.refresh().await {
        warn!("Reload after {} failed: {}", region, e);
    }
    tokio::time::sleep(config.settle_delay).await;

    Ok(batch)
}

/// Pair rows with the template markup that follows them and parse it.
/// Rows whose template is missing or unreadable are kept without details.
pub fn assemble(region: &str, items: Vec<Item<RawRow, String>>) -> Batch {
    let paired = pair_adjacent(items);
    let mut batch = Batch {
        region: region.to_string(),
        records: Vec::with_capacity(paired.pairs.len()),
        partial: 0,
        orphans: paired.orphans.len(),
    };

    for (row, html) in paired.pairs {
        let template = match html.as_deref().map(parse_template) {
            Some(Ok(fields)) => Some(fields),
            Some(Err(e)) => {
                warn!("{}: unreadable template for '{}': {}", region, row.description, e);
                None
            }
            None => {
                debug!("{}: no template after '{}'", region, row.description);
                None
            }
        };
        let record = ProjectRecord::merge(row, template);
        if record.is_partial() {
            batch.partial += 1;
        }
        batch.records.push(record);
    }

    batch
}
