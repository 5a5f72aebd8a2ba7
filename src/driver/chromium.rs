//! Chromium-backed session using chromiumoxide.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::{
    EventJavascriptDialogOpening, HandleJavaScriptDialogParams,
};
use chromiumoxide::element::Element;
use chromiumoxide::error::CdpError;
use chromiumoxide::page::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{DriverError, Session};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

const IS_CLICKABLE_JS: &str = "function() { \
    const r = this.getBoundingClientRect(); \
    return !this.disabled && r.width > 0 && r.height > 0; }";

const TAG_NAME_JS: &str = "function() { return this.tagName.toLowerCase(); }";

impl From<CdpError> for DriverError {
    fn from(e: CdpError) -> Self {
        DriverError::Browser(e.to_string())
    }
}

#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    /// Show the browser window instead of running headless.
    pub headed: bool,
    /// Explicit Chrome/Chromium binary; autodetected when unset.
    pub chrome: Option<PathBuf>,
    /// Upper bound for a single click round-trip.
    pub command_timeout: Duration,
}

pub struct ChromiumSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    dialogs: JoinHandle<()>,
    /// Message of the JavaScript dialog currently blocking the page.
    pending_dialog: Arc<Mutex<Option<String>>>,
    command_timeout: Duration,
}

impl ChromiumSession {
    pub async fn launch(options: &LaunchOptions) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions");
        if options.headed {
            builder = builder.with_head();
        }
        if let Some(path) = &options.chrome {
            builder = builder.chrome_executable(path);
        }
        let config = builder
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build browser config: {e}"))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("failed to launch Chromium")?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .context("failed to open a page")?;

        let pending_dialog = Arc::new(Mutex::new(None));
        let mut events = page
            .event_listener::<EventJavascriptDialogOpening>()
            .await
            .context("failed to subscribe to dialog events")?;
        let slot = Arc::clone(&pending_dialog);
        let dialogs = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                debug!("Dialog opened: {}", event.message);
                if let Ok(mut pending) = slot.lock() {
                    *pending = Some(event.message.clone());
                }
            }
        });

        let command_timeout = if options.command_timeout.is_zero() {
            Duration::from_secs(10)
        } else {
            options.command_timeout
        };

        Ok(Self {
            browser,
            page,
            handler,
            dialogs,
            pending_dialog,
            command_timeout,
        })
    }

    fn pending(&self) -> Option<String> {
        self.pending_dialog.lock().ok().and_then(|p| p.clone())
    }

    /// Every command fails while a dialog is open, the way a real user
    /// cannot interact with the page behind it.
    fn check_dialog(&self) -> Result<(), DriverError> {
        match self.pending() {
            Some(message) => Err(DriverError::UnexpectedAlert(message)),
            None => Ok(()),
        }
    }

    async fn call_js(
        &self,
        element: &Element,
        function: impl Into<String>,
    ) -> Result<Option<serde_json::Value>, DriverError> {
        let returns = element.call_js_fn(function, false).await?;
        Ok(returns.result.value)
    }

    async fn is_clickable(&self, element: &Element) -> bool {
        matches!(
            self.call_js(element, IS_CLICKABLE_JS).await,
            Ok(Some(serde_json::Value::Bool(true)))
        )
    }
}

#[async_trait]
impl Session for ChromiumSession {
    type Element = Element;

    async fn navigate(&mut self, url: &str) -> Result<(), DriverError> {
        self.check_dialog()?;
        self.page.goto(url).await?;
        let _ = self.page.wait_for_navigation().await;
        Ok(())
    }

    async fn find(&self, selector: &str) -> Result<Element, DriverError> {
        self.check_dialog()?;
        self.page
            .find_element(selector)
            .await
            .map_err(|_| DriverError::NotFound(selector.to_string()))
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<Element>, DriverError> {
        self.check_dialog()?;
        Ok(self.page.find_elements(selector).await?)
    }

    async fn find_within(&self, parent: &Element, selector: &str) -> Result<Vec<Element>, DriverError> {
        self.check_dialog()?;
        Ok(parent.find_elements(selector).await?)
    }

    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<Element, DriverError> {
        let deadline = Instant::now() + timeout;
        loop {
            self.check_dialog()?;
            if let Ok(element) = self.page.find_element(selector).await {
                if self.is_clickable(&element).await {
                    return Ok(element);
                }
            }
            if Instant::now() >= deadline {
                return Err(DriverError::Timeout {
                    selector: selector.to_string(),
                    timeout,
                });
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn wait_present(&self, selector: &str, timeout: Duration) -> Result<Element, DriverError> {
        let deadline = Instant::now() + timeout;
        loop {
            self.check_dialog()?;
            if let Ok(element) = self.page.find_element(selector).await {
                return Ok(element);
            }
            if Instant::now() >= deadline {
                return Err(DriverError::Timeout {
                    selector: selector.to_string(),
                    timeout,
                });
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn click(&mut self, element: &Element) -> Result<(), DriverError> {
        self.check_dialog()?;
        // A dialog raised by the click can hold the input event open.
        match tokio::time::timeout(self.command_timeout, element.click()).await {
            Ok(result) => {
                result?;
            }
            Err(_) => {
                self.check_dialog()?;
                return Err(DriverError::Timeout {
                    selector: "click".to_string(),
                    timeout: self.command_timeout,
                });
            }
        }
        self.check_dialog()
    }

    async fn scroll_into_view(&mut self, element: &Element) -> Result<(), DriverError> {
        self.check_dialog()?;
        element.scroll_into_view().await?;
        Ok(())
    }

    async fn select_option(&mut self, element: &Element, label: &str) -> Result<(), DriverError> {
        self.check_dialog()?;
        let quoted = serde_json::to_string(label)
            .map_err(|e| DriverError::Browser(e.to_string()))?;
        let function = format!(
            "function() {{ \
                const label = {quoted}; \
                const opt = Array.from(this.options).find(o => o.text.trim() === label); \
                if (!opt) return false; \
                this.value = opt.value; \
                this.dispatchEvent(new Event('change', {{ bubbles: true }})); \
                return true; }}"
        );
        match self.call_js(element, function).await? {
            Some(serde_json::Value::Bool(true)) => Ok(()),
            _ => Err(DriverError::NotFound(format!("option `{label}`"))),
        }
    }

    async fn tag_name(&self, element: &Element) -> Result<String, DriverError> {
        self.check_dialog()?;
        let value = self.call_js(element, TAG_NAME_JS).await?;
        Ok(value
            .as_ref()
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string())
    }

    async fn text(&self, element: &Element) -> Result<String, DriverError> {
        self.check_dialog()?;
        Ok(element.inner_text().await?.unwrap_or_default())
    }

    async fn attribute(&self, element: &Element, name: &str) -> Result<Option<String>, DriverError> {
        self.check_dialog()?;
        Ok(element.attribute(name).await?)
    }

    async fn inner_html(&self, element: &Element) -> Result<String, DriverError> {
        self.check_dialog()?;
        Ok(element.inner_html().await?.unwrap_or_default())
    }

    async fn refresh(&mut self) -> Result<(), DriverError> {
        self.check_dialog()?;
        self.page.reload().await?;
        Ok(())
    }

    async fn dismiss_alert(&mut self) -> Result<(), DriverError> {
        if self.pending().is_none() {
            return Err(DriverError::NoAlert);
        }
        self.page
            .execute(HandleJavaScriptDialogParams::new(false))
            .await?;
        if let Ok(mut pending) = self.pending_dialog.lock() {
            *pending = None;
        }
        Ok(())
    }

    async fn quit(mut self) -> Result<(), DriverError> {
        if let Err(e) = self.browser.close().await {
            warn!("Browser did not close cleanly: {}", e);
        }
        let _ = self.browser.wait().await;
        self.dialogs.abort();
        self.handler.abort();
        Ok(())
    }
}
