use std::{path::Path, time::Duration};

use env_logger::Env;
use gleaner::{
    configuration,
    services::{collect_pages, persist, FieldRule, HttpFetcher, PageExtractor, PagePlan},
};

const BASE_URL: &str = "https://scrapeme.live/shop/page/{page}/";
const START_PAGE: u32 = 1;
const END_PAGE: u32 = 3;
const PAGE_DELAY: Duration = Duration::from_secs(2);
const FETCH_TIMEOUT: Duration = Duration::from_secs(15);
const OUTPUT_FILE: &str = "scraped_ecommerce_inventory.csv";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    log::info!("Starting multi-page inventory scraper");

    let extractor = PageExtractor::new(
        "li.product",
        vec![
            FieldRule::text_or_missing("Product_Title", "h2.woocommerce-loop-product__title")?,
            FieldRule::price("Price_EUR", "span.price")?,
            FieldRule::presence("Rating_Status", "div.star-rating", "Rated", "Unrated")?,
        ],
    )?;

    let fetcher = HttpFetcher::new(FETCH_TIMEOUT, &configuration::MOCK_PROXY)?;
    let plan = PagePlan {
        url_template: BASE_URL.to_string(),
        start: START_PAGE,
        end: END_PAGE,
        delay: PAGE_DELAY,
    };

    let records = collect_pages(&fetcher, &plan, &extractor).await;

    log::info!("Multi-page scrape complete, {} records total", records.len());
    persist(&records, Path::new(OUTPUT_FILE))?;

    Ok(())
}
