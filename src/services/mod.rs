pub mod browser;
pub mod extractor;
pub mod fetcher;
pub mod paginator;
pub mod sink;

pub use browser::*;
pub use extractor::*;
pub use fetcher::*;
pub use paginator::*;
pub use sink::*;
