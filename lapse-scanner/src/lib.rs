pub mod crawler;
pub mod error;
pub mod extract;
pub mod result;

pub use crawler::{Crawler, PageCallback, TraversalContext};
pub use error::ScanError;
pub use extract::{extract_domains, extract_internal_links};
pub use result::{CrawlOutcome, PageResult};
