pub mod crawl;
pub mod decode;
pub mod enrich;
pub mod error;
pub mod fetch;
pub mod normalize;
pub(crate) mod rate_limit;
pub mod request;
pub mod types;

pub use crawl::{crawl, CrawlConfig, CrawlOutcome, CrawlStatus};
pub use decode::decode_page;
pub use enrich::{enrich_record, ProductUrlBuilder};
pub use error::ScraperError;
pub use fetch::{HttpPageFetcher, PageFetcher};
pub use normalize::normalize_record;
pub use request::ListingQuery;
pub use types::{DecodedPage, EnrichedRecord, FetchedPage, PaginationState, RawRecord};
