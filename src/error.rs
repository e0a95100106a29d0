use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("invalid url {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("webdriver error: {0}")]
    Browser(#[from] thirtyfour::error::WebDriverError),

    #[error("invalid selector: {0}")]
    Selector(String),

    #[error("csv write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("output write failed: {0}")]
    Io(#[from] std::io::Error),
}
