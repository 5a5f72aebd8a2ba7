//! Browser session primitives.
//!
//! The scraping pipeline only talks to a [`Session`]; the Chromium
//! implementation lives in [`chromium`], and tests drive an in-memory page.

pub mod chromium;
#[cfg(test)]
pub mod fake;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("no element matches `{0}`")]
    NotFound(String),
    #[error("timed out after {timeout:?} waiting for `{selector}`")]
    Timeout { selector: String, timeout: Duration },
    #[error("unexpected alert: {0}")]
    UnexpectedAlert(String),
    #[error("no alert is open")]
    NoAlert,
    #[error("browser: {0}")]
    Browser(String),
}

/// One live page that the pipeline drives. Not shared: every command
/// mutates global UI state (selected filter, loaded rows, scroll position).
#[async_trait]
pub trait Session: Send + Sync + Sized {
    type Element: Send + Sync;

    async fn navigate(&mut self, url: &str) -> Result<(), DriverError>;

    async fn find(&self, selector: &str) -> Result<Self::Element, DriverError>;

    /// All matches in document order. An empty list is not an error.
    async fn find_all(&self, selector: &str) -> Result<Vec<Self::Element>, DriverError>;

    async fn find_within(
        &self,
        parent: &Self::Element,
        selector: &str,
    ) -> Result<Vec<Self::Element>, DriverError>;

    /// Block until `selector` resolves to a visible, enabled element or
    /// `timeout` elapses.
    async fn wait_for(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Self::Element, DriverError>;

    /// Block until `selector` is attached to the document, visible or not.
    async fn wait_present(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Self::Element, DriverError>;

    async fn click(&mut self, element: &Self::Element) -> Result<(), DriverError>;

    async fn scroll_into_view(&mut self, element: &Self::Element) -> Result<(), DriverError>;

    /// Pick the `<option>` of a `<select>` whose visible text equals `label`.
    async fn select_option(
        &mut self,
        element: &Self::Element,
        label: &str,
    ) -> Result<(), DriverError>;

    /// Lower-cased tag name.
    async fn tag_name(&self, element: &Self::Element) -> Result<String, DriverError>;

    async fn text(&self, element: &Self::Element) -> Result<String, DriverError>;

    async fn attribute(
        &self,
        element: &Self::Element,
        name: &str,
    ) -> Result<Option<String>, DriverError>;

    async fn inner_html(&self, element: &Self::Element) -> Result<String, DriverError>;

    async fn refresh(&mut self) -> Result<(), DriverError>;

    async fn dismiss_alert(&mut self) -> Result<(), DriverError>;

    async fn quit(self) -> Result<(), DriverError>;
}
