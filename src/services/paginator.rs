use std::time::Duration;

use crate::{
    domain::record::Record,
    error::ScrapeError,
    services::{
        browser::{Advance, BrowserFetcher},
        extractor::PageExtractor,
        fetcher::{Fetch, FetchMode, PageContent, PageRequest},
    },
};

/// Inclusive page range walked by [`collect_pages`]. The template's
/// `{page}` marker is substituted with the page number.
pub struct PagePlan {
    pub url_template: String,
    pub start: u32,
    pub end: u32,
    pub delay: Duration,
}

impl PagePlan {
    pub fn page_url(&self, page: u32) -> String {
        self.url_template.replace("{page}", &page.to_string())
    }
}

/// Walks the page range in order, accumulating extracted records and
/// sleeping the politeness delay between pages. A failed fetch ends the
/// walk early; records gathered so far are kept.
pub async fn collect_pages<F: Fetch>(
    fetcher: &F,
    plan: &PagePlan,
    extractor: &PageExtractor,
) -> Vec<Record> {
    let mut records = Vec::new();

    for page in plan.start..=plan.end {
        let url = plan.page_url(page);
        log::info!("Fetching page {} from: {}", page, url);

        let request = match PageRequest::new(&url, FetchMode::Static) {
            Ok(request) => request,
            Err(e) => {
                log::error!("Bad page url {}: {}. Stopping pagination.", url, e);
                break;
            }
        };

        match fetcher.fetch(&request).await {
            Ok(content) => {
                let page_records = extractor.extract(&content);
                log::info!("Extracted {} items from page {}", page_records.len(), page);
                records.extend(page_records);
            }
            Err(e) => {
                log::error!("Failed to fetch {}: {}. Stopping pagination.", url, e);
                break;
            }
        }

        tokio::time::sleep(plan.delay).await;
    }

    records
}

/// Runs at most `max_advances` load-more steps, stopping at the first
/// one that reports no new content. Returns the number of completed
/// advances.
pub async fn drive_advances<A: Advance>(
    advancer: &A,
    max_advances: u32,
) -> Result<u32, ScrapeError> {
    for step in 0..max_advances {
        if !advancer.advance().await? {
            log::info!("No new content after advance {} of {}", step + 1, max_advances);
            return Ok(step);
        }
        log::info!("Advance {} of {} loaded new content", step + 1, max_advances);
    }
    Ok(max_advances)
}

/// Scroll-variant run: open the page, advance a bounded number of
/// times, then extract once over everything loaded. The driver session
/// is shut down before the result is returned, whatever happened.
pub async fn collect_with_scrolling(
    browser: BrowserFetcher,
    request: &PageRequest,
    max_advances: u32,
    extractor: &PageExtractor,
) -> Result<Vec<Record>, ScrapeError> {
    let outcome = scroll_and_read(&browser, request, max_advances).await;

    if let Err(e) = browser.quit().await {
        log::warn!("Failed to shut down browser session: {}", e);
    }

    Ok(extractor.extract(&outcome?))
}

async fn scroll_and_read(
    browser: &BrowserFetcher,
    request: &PageRequest,
    max_advances: u32,
) -> Result<PageContent, ScrapeError> {
    browser.open(request).await?;
    drive_advances(browser, max_advances).await?;
    browser.content().await
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use super::{collect_pages, drive_advances, PagePlan};
    use crate::{
        error::ScrapeError,
        services::{
            browser::Advance,
            extractor::{FieldRule, PageExtractor},
            fetcher::{Fetch, PageContent, PageRequest},
        },
    };

    const ITEM_PAGE: &str = r#"<div class="item"><span class="name">thing</span></div>"#;

    struct ScriptedFetcher {
        // one entry per expected call; Err aborts that page
        pages: Vec<Result<String, ()>>,
        seen: Mutex<Vec<String>>,
    }

    impl ScriptedFetcher {
        fn new(pages: Vec<Result<String, ()>>) -> Self {
            ScriptedFetcher {
                pages,
                seen: Mutex::new(Vec::new()),
            }
        }

        fn seen_urls(&self) -> Vec<String> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl Fetch for ScriptedFetcher {
        async fn fetch(&self, request: &PageRequest) -> Result<PageContent, ScrapeError> {
            let mut seen = self.seen.lock().unwrap();
            let index = seen.len();
            seen.push(request.url.to_string());
            match &self.pages[index] {
                Ok(html) => Ok(PageContent::new(html.clone())),
                Err(()) => Err(ScrapeError::Selector("scripted failure".to_string())),
            }
        }
    }

    fn item_extractor() -> PageExtractor {
        PageExtractor::new(
            "div.item",
            vec![FieldRule::text("name", "span.name").unwrap()],
        )
        .unwrap()
    }

    fn plan() -> PagePlan {
        PagePlan {
            url_template: "http://shop.test/page/{page}/".to_string(),
            start: 1,
            end: 3,
            delay: Duration::ZERO,
        }
    }

    #[test]
    fn template_substitutes_page_number() {
        assert_eq!(plan().page_url(2), "http://shop.test/page/2/");
    }

    #[tokio::test]
    async fn walks_the_full_range_in_increasing_order() {
        let fetcher = ScriptedFetcher::new(vec![
            Ok(ITEM_PAGE.to_string()),
            Ok(ITEM_PAGE.to_string()),
            Ok(ITEM_PAGE.to_string()),
        ]);

        let records = collect_pages(&fetcher, &plan(), &item_extractor()).await;

        assert_eq!(records.len(), 3);
        assert_eq!(
            fetcher.seen_urls(),
            vec![
                "http://shop.test/page/1/",
                "http://shop.test/page/2/",
                "http://shop.test/page/3/",
            ]
        );
    }

    #[tokio::test]
    async fn stops_at_first_failure_keeping_earlier_records() {
        let fetcher = ScriptedFetcher::new(vec![
            Ok(ITEM_PAGE.to_string()),
            Err(()),
            Ok(ITEM_PAGE.to_string()),
        ]);

        let records = collect_pages(&fetcher, &plan(), &item_extractor()).await;

        // page 3 is never attempted
        assert_eq!(fetcher.seen_urls().len(), 2);
        assert_eq!(records.len(), 1);
    }

    struct ScriptedAdvancer {
        outcomes: Vec<bool>,
        calls: Mutex<usize>,
    }

    impl ScriptedAdvancer {
        fn new(outcomes: Vec<bool>) -> Self {
            ScriptedAdvancer {
                outcomes,
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    impl Advance for ScriptedAdvancer {
        async fn advance(&self) -> Result<bool, ScrapeError> {
            let mut calls = self.calls.lock().unwrap();
            let outcome = self.outcomes[*calls];
            *calls += 1;
            Ok(outcome)
        }
    }

    #[tokio::test]
    async fn advances_stop_once_content_runs_out() {
        let advancer = ScriptedAdvancer::new(vec![true, true, false, true]);

        let completed = drive_advances(&advancer, 4).await.unwrap();

        assert_eq!(completed, 2);
        assert_eq!(advancer.calls(), 3);
    }

    #[tokio::test]
    async fn advances_are_bounded_by_the_plan() {
        let advancer = ScriptedAdvancer::new(vec![true, true, true, true]);

        let completed = drive_advances(&advancer, 3).await.unwrap();

        assert_eq!(completed, 3);
        assert_eq!(advancer.calls(), 3);
    }
}
