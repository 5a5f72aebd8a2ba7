use anyhow::{Context, Result};
use tracing::info;

use crate::config::{ScrapeConfig, FILTER_SEARCH, FILTER_TOGGLE, REGION_OPTION, REGION_SELECT};
use crate::driver::Session;

/// Read the region dropdown and return every option after the "all
/// regions" placeholder, in display order. Reloads the page afterwards.
pub async fn enumerate_regions<S: Session>(
    session: &mut S,
    config: &ScrapeConfig,
) -> Result<Vec<String>> {
    let toggle = session
        .wait_for(FILTER_TOGGLE, config.wait_timeout)
        .await
        .context("Filter toggle not found")?;
    session.click(&toggle).await?;

    let dropdown = session
        .find(REGION_SELECT)
        .await
        .context("Region dropdown not found")?;

    let options = session.find_within(&dropdown, REGION_OPTION).await?;
    let mut regions = Vec::with_capacity(options.len().saturating_sub(1));
    for option in options.iter().skip(1) {
        let label = session.text(option).await?;
        let label = label.trim();
        if !label.is_empty() {
            regions.push(label.to_string());
        }
    }

    session.refresh().await?;
    tokio::time::sleep(config.settle_delay).await;

    info!("Found {} regions", regions.len());
    Ok(regions)
}

/// Filter the listing down to one region and run the search.
pub async fn select_region<S: Session>(
    session: &mut S,
    region: &str,
    config: &ScrapeConfig,
) -> Result<()> {
    let toggle = session
        .wait_for(FILTER_TOGGLE, config.wait_timeout)
        .await
        .context("Filter toggle not found")?;
    session.click(&toggle).await?;

    let dropdown = session
        .wait_present(REGION_SELECT, config.wait_timeout)
        .await
        .context("Region dropdown not found")?;
    session
        .select_option(&dropdown, region)
        .await
        .with_context(|| format!("Cannot select region {}", region))?;

    let search = session
        .find(FILTER_SEARCH)
        .await
        .context("Search button not found")?;
    session.click(&search).await?;

    tokio::time::sleep(config.settle_delay).await;
    info!("Scraping data for {}", region);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::fake::{FakeRegion, FakeSession};

    fn two_regions() -> FakeSession {
        FakeSession::new(vec![
            ("NCR", FakeRegion::paired("NCR", 3, 6)),
            ("Region I", FakeRegion::paired("Region I", 2, 4)),
        ])
    }

    #[tokio::test]
    async fn skips_placeholder_and_keeps_order() {
        let mut session = two_regions();
        let regions = enumerate_regions(&mut session, &ScrapeConfig::immediate())
            .await
            .unwrap();
        assert_eq!(regions, vec!["NCR", "Region I"]);
        assert_eq!(session.refreshes, 1);
    }

    #[tokio::test]
    async fn missing_dropdown_is_an_error() {
        let mut session = two_regions();
        session.missing_region_select = true;
        let err = enumerate_regions(&mut session, &ScrapeConfig::immediate())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Region dropdown not found"));
    }

    #[tokio::test]
    async fn selecting_shows_region_rows() {
        let mut session = two_regions();
        select_region(&mut session, "Region I", &ScrapeConfig::immediate())
            .await
            .unwrap();
        let items = session
            .find_all(crate::config::RESULT_ITEMS)
            .await
            .unwrap();
        assert_eq!(items.len(), 4);
    }

    #[tokio::test]
    async fn hidden_native_select_is_still_usable() {
        let mut session = two_regions();
        session.hidden_region_select = true;
        select_region(&mut session, "NCR", &ScrapeConfig::immediate())
            .await
            .unwrap();
        let items = session
            .find_all(crate::config::RESULT_ITEMS)
            .await
            .unwrap();
        assert_eq!(items.len(), 6);
    }

    #[tokio::test]
    async fn unknown_region_fails() {
        let mut session = two_regions();
        let err = select_region(&mut session, "Atlantis", &ScrapeConfig::immediate())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Atlantis"));
    }
}
