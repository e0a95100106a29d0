use std::{path::Path, time::Duration};

use env_logger::Env;
use gleaner::{
    configuration,
    domain::record::{FieldValue, Record},
    services::{persist, BrowserFetcher, Fetch, FieldRule, PageExtractor, PageRequest},
};

const TARGET_URL: &str = "https://webscraper.io/test-sites/e-commerce/static/computers/laptops";
const EXPECTED_CONTENT: &str = ".thumbnail";
const CONTENT_WAIT: Duration = Duration::from_secs(10);
const PREMIUM_THRESHOLD: f64 = 1000.0;
const OUTPUT_FILE: &str = "tech_market_analysis.csv";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    log::info!("Starting tech marketplace scraper");

    let extractor = PageExtractor::new(
        "div.thumbnail",
        vec![
            FieldRule::attr("Product Model", "a.title", "title")?,
            FieldRule::text("Specifications", "p.description")?,
            FieldRule::price("Price (USD)", "h4.price")?,
            FieldRule::text_or_missing("Review Count", "div.ratings p")?,
            FieldRule::constant("Category", "Laptops & Accessories"),
        ],
    )?;

    let browser = BrowserFetcher::connect(
        configuration::WEBDRIVER_URL,
        EXPECTED_CONTENT,
        CONTENT_WAIT,
        Duration::ZERO,
    )
    .await?;
    let request = PageRequest::rendered_page(TARGET_URL)?;

    // Single rendered view, no scrolling; quit before acting on the result.
    let fetch_outcome = browser.fetch(&request).await;
    if let Err(e) = browser.quit().await {
        log::warn!("Failed to shut down browser session: {}", e);
    }

    let records = match fetch_outcome {
        Ok(content) => extractor.extract(&content),
        Err(e) => {
            log::error!("Rendered fetch failed: {}", e);
            return Ok(());
        }
    };

    let records = flag_market_segment(records);

    log::info!("Extracted {} tech items", records.len());
    persist(&records, Path::new(OUTPUT_FILE))?;

    Ok(())
}

/// Appends a derived column splitting the inventory into price tiers.
fn flag_market_segment(records: Vec<Record>) -> Vec<Record> {
    records
        .into_iter()
        .map(|mut record| {
            let segment = match record.get("Price (USD)").and_then(FieldValue::as_number) {
                Some(price) if price > PREMIUM_THRESHOLD => "Premium",
                _ => "Standard",
            };
            record.push("Market Segment", FieldValue::text(segment));
            record
        })
        .collect()
}
