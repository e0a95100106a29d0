use std::{path::Path, time::Duration};

use env_logger::Env;
use gleaner::{
    configuration,
    services::{persist, Fetch, FieldRule, HttpFetcher, PageExtractor, PageRequest},
};

const TARGET_URL: &str = "http://quotes.toscrape.com/tag/life/";
const OUTPUT_FILE: &str = "scraped_quotes_data.csv";
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    log::info!("Starting quotes scraper for {}", TARGET_URL);

    let extractor = PageExtractor::new(
        "div.quote",
        vec![
            FieldRule::text("quote", "span.text")?,
            FieldRule::text("author", "small.author")?,
            FieldRule::joined_text("tags", "div.tags a.tag", ", ")?,
        ],
    )?;

    let fetcher = HttpFetcher::new(FETCH_TIMEOUT, &configuration::MOCK_PROXY)?;
    let request = PageRequest::static_page(TARGET_URL)?;

    let records = match fetcher.fetch(&request).await {
        Ok(content) => extractor.extract(&content),
        Err(e) => {
            log::error!("Request failed: {}", e);
            return Ok(());
        }
    };

    log::info!("Extracted {} quotes", records.len());
    persist(&records, Path::new(OUTPUT_FILE))?;

    Ok(())
}
