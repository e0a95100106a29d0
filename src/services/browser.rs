use std::time::{Duration, Instant};

use thirtyfour::{By, DesiredCapabilities, WebDriver};

use crate::{
    error::ScrapeError,
    services::fetcher::{Fetch, FetchMode, PageContent, PageRequest},
};

const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(500);
const SCROLL_TO_BOTTOM: &str = "window.scrollTo(0, document.body.scrollHeight);";

/// A load-more step against an already-open page. `Ok(false)` means the
/// page stopped producing new content, which ends the advance sequence
/// without being an error.
#[allow(async_fn_in_trait)]
pub trait Advance {
    async fn advance(&self) -> Result<bool, ScrapeError>;
}

/// Rendered fetcher: owns one WebDriver session for the duration of a
/// run. The session must be shut down with [`BrowserFetcher::quit`] on
/// every path out of the run; dropping it silently leaks the browser
/// process.
pub struct BrowserFetcher {
    driver: WebDriver,
    expected_content: String,
    wait_timeout: Duration,
    settle: Duration,
}

impl BrowserFetcher {
    /// `expected_content` is the CSS selector whose presence marks a
    /// loaded view, both on first paint and after each scroll.
    pub async fn connect(
        webdriver_url: &str,
        expected_content: &str,
        wait_timeout: Duration,
        settle: Duration,
    ) -> Result<Self, ScrapeError> {
        let caps = DesiredCapabilities::chrome();
        let driver = WebDriver::new(webdriver_url, caps).await?;

        if let Err(e) = driver.maximize_window().await {
            let _ = driver.quit().await;
            return Err(e.into());
        }

        Ok(BrowserFetcher {
            driver,
            expected_content: expected_content.to_string(),
            wait_timeout,
            settle,
        })
    }

    pub async fn open(&self, request: &PageRequest) -> Result<(), ScrapeError> {
        self.driver.goto(request.url.as_str()).await?;

        if request.mode == FetchMode::Rendered && !self.wait_for_expected_content().await? {
            log::warn!(
                "Expected content {} never appeared on {}",
                self.expected_content,
                request.url
            );
        }

        Ok(())
    }

    pub async fn content(&self) -> Result<PageContent, ScrapeError> {
        let html = self.driver.source().await?;
        Ok(PageContent::new(html))
    }

    pub async fn quit(self) -> Result<(), ScrapeError> {
        self.driver.quit().await?;
        Ok(())
    }

    /// Bounded poll for the expected-content selector. `Ok(false)` is a
    /// timeout; webdriver failures propagate as errors.
    async fn wait_for_expected_content(&self) -> Result<bool, ScrapeError> {
        let deadline = Instant::now() + self.wait_timeout;
        loop {
            let found = !self
                .driver
                .find_all(By::Css(self.expected_content.as_str()))
                .await?
                .is_empty();
            if found {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(WAIT_POLL_INTERVAL).await;
        }
    }
}

impl Advance for BrowserFetcher {
    // TODO: also compare item counts between scrolls; on pages that keep
    // the first batch in the DOM, presence alone never detects a stall.
    async fn advance(&self) -> Result<bool, ScrapeError> {
        self.driver.execute(SCROLL_TO_BOTTOM, vec![]).await?;

        if !self.wait_for_expected_content().await? {
            return Ok(false);
        }

        tokio::time::sleep(self.settle).await;
        Ok(true)
    }
}

impl Fetch for BrowserFetcher {
    async fn fetch(&self, request: &PageRequest) -> Result<PageContent, ScrapeError> {
        self.open(request).await?;
        self.content().await
    }
}
