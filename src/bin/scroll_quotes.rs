use std::{path::Path, time::Duration};

use env_logger::Env;
use gleaner::{
    configuration,
    services::{collect_with_scrolling, persist, BrowserFetcher, FieldRule, PageExtractor, PageRequest},
};

const TARGET_URL: &str = "http://quotes.toscrape.com/scroll";
const SCROLL_COUNT: u32 = 3;
const EXPECTED_CONTENT: &str = ".quote";
const CONTENT_WAIT: Duration = Duration::from_secs(10);
const SETTLE_DELAY: Duration = Duration::from_secs(1);
const OUTPUT_FILE: &str = "scraped_dynamic_scroll_data.csv";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    log::info!("Starting dynamic scroll scraper for {}", TARGET_URL);

    let extractor = PageExtractor::new(
        "div.quote",
        vec![
            FieldRule::text("Quote", "span.text")?,
            FieldRule::text("Author", "small.author")?,
            FieldRule::constant("Method", "Browser Scroll"),
        ],
    )?;

    let browser = BrowserFetcher::connect(
        configuration::WEBDRIVER_URL,
        EXPECTED_CONTENT,
        CONTENT_WAIT,
        SETTLE_DELAY,
    )
    .await?;
    let request = PageRequest::rendered_page(TARGET_URL)?;

    // Scroll a bounded number of times, then extract once over the whole
    // loaded page. The session is quit inside, whatever the outcome.
    let records = match collect_with_scrolling(browser, &request, SCROLL_COUNT, &extractor).await {
        Ok(records) => records,
        Err(e) => {
            log::error!("Scroll run failed: {}", e);
            return Ok(());
        }
    };

    log::info!("Total quotes found after scrolling: {}", records.len());
    persist(&records, Path::new(OUTPUT_FILE))?;

    Ok(())
}
