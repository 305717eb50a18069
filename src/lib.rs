pub mod cli;
pub mod crawler;
pub mod discovery;
pub mod fetcher;
pub mod layout;
pub mod merger;
pub mod report;
pub mod resolver;
pub mod rewriter;
pub mod storage;

// Re-export main types for convenience
pub use crawler::{CrawlError, SiteCrawler};
pub use discovery::{Resource, ResourceKind};
pub use fetcher::{FetchError, Fetcher};
pub use layout::CacheLayout;
pub use merger::{MergeError, Merger};
pub use report::{CrawlReport, ItemFailure, MergeReport};
pub use resolver::{Origin, OriginPolicy};
pub use storage::SiteStore;
