use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::warn;
use url::Url;

use crate::discovery;
use crate::fetcher::{FetchError, Fetcher};
use crate::report::CrawlReport;
use crate::resolver::{self, Origin, OriginPolicy};
use crate::rewriter;
use crate::storage::SiteStore;

/// Extensions fetched as text; everything else is fetched as raw bytes.
const TEXT_EXTENSIONS: &[&str] = &["css", "js", "html", "htm", "xml", "txt", "json"];

#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("invalid target URL: {0}")]
    InvalidTarget(String),
    #[error("failed to build the HTTP client: {0}")]
    Client(#[source] FetchError),
    #[error("failed to fetch the entry document: {0}")]
    EntryUnreachable(#[source] FetchError),
    #[error(transparent)]
    Output(#[from] anyhow::Error),
}

/// Mirrors one site: the entry page, its assets, well-known root files,
/// and first-hop linked pages with their assets. All fetches run
/// sequentially; only an unreachable entry document is fatal.
pub struct SiteCrawler {
    fetcher: Fetcher,
    origin: Origin,
    target: Url,
    output_root: PathBuf,
}

impl SiteCrawler {
    /// The mirrored tree lands under `downloads_dir/<host>`.
    pub fn new(target: &str, downloads_dir: &Path) -> Result<Self, CrawlError> {
        let target =
            Url::parse(target).map_err(|_| CrawlError::InvalidTarget(target.to_string()))?;
        let origin =
            Origin::of(&target).ok_or_else(|| CrawlError::InvalidTarget(target.to_string()))?;
        let output_root = downloads_dir.join(origin.host());
        let fetcher = Fetcher::new().map_err(CrawlError::Client)?;
        Ok(Self {
            fetcher,
            origin,
            target,
            output_root,
        })
    }

    /// Tighten (or relax) what counts as the same site.
    pub fn with_origin_policy(mut self, policy: OriginPolicy) -> Self {
        self.origin = self.origin.with_policy(policy);
        self
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Run the crawl, streaming human-readable status lines to `progress`.
    pub async fn run(
        &self,
        progress: &mut dyn FnMut(&str),
    ) -> Result<CrawlReport, CrawlError> {
        let store = SiteStore::new(&self.output_root)?;
        let mut report = CrawlReport::new(self.output_root.clone());

        progress(&format!("Fetching entry page: {}", self.target));
        let markup = match self.fetcher.fetch_text(self.target.as_str()).await {
            Ok(markup) => markup,
            Err(err) => {
                progress(&format!("Mirror failed: {err}"));
                return Err(CrawlError::EntryUnreachable(err));
            }
        };

        // Discovery always runs over the fetched text, before rewriting.
        let resources = discovery::discover_resources(&markup, &self.target, &self.origin);
        let page_links = discovery::discover_page_links(&markup, &self.target, &self.origin);

        let entry = rewriter::rewrite_for_offline(&markup).unwrap_or_else(|err| {
            warn!(error = %err, "entry page rewrite failed, storing it unmodified");
            markup.clone()
        });
        store.save("index.html", entry.as_bytes())?;
        report.success(&self.target);

        progress(&format!(
            "Found {} resources and {} linked pages",
            resources.len(),
            page_links.len()
        ));

        let total = resources.len();
        for (index, resource) in resources.iter().enumerate() {
            self.fetch_resource(&store, &resource.url, &mut report).await;
            progress(&format!("{}/{total} resources downloaded", index + 1));
        }

        let common = discovery::discover_common_files(&self.fetcher, &self.target).await;
        if !common.is_empty() {
            progress(&format!("Found {} well-known root files", common.len()));
        }
        let total = common.len();
        for (index, url) in common.iter().enumerate() {
            self.fetch_resource(&store, url, &mut report).await;
            progress(&format!("{}/{total} well-known files downloaded", index + 1));
        }

        // First hop only: links found inside these pages are not followed.
        let total = page_links.len();
        for (index, page) in page_links.iter().enumerate() {
            self.mirror_linked_page(&store, page, &mut report).await;
            progress(&format!("{}/{total} pages downloaded", index + 1));
        }

        progress(&format!("Mirror complete: {}", self.output_root.display()));
        Ok(report)
    }

    /// Fetch one asset and store it at its mapped path. Failures are
    /// recorded in the report and never abort the crawl.
    async fn fetch_resource(&self, store: &SiteStore, url: &Url, report: &mut CrawlReport) {
        let local_path = resolver::to_local_path(url);
        let fetched = if is_text_path(&local_path) {
            self.fetcher
                .fetch_text(url.as_str())
                .await
                .map(String::into_bytes)
        } else {
            self.fetcher.fetch_binary(url.as_str()).await
        };
        let content = match fetched {
            Ok(content) => content,
            Err(err) => {
                warn!(url = %url, error = %err, "resource fetch failed");
                report.failure(url, &err);
                return;
            }
        };
        match store.save(&local_path, &content) {
            Ok(_) => report.success(url),
            Err(err) => {
                warn!(url = %url, error = %err, "resource write failed");
                report.failure(url, &err);
            }
        }
    }

    /// Mirror a first-hop page: fetch, rewrite, store, then fetch the
    /// assets it references.
    async fn mirror_linked_page(&self, store: &SiteStore, page: &Url, report: &mut CrawlReport) {
        let markup = match self.fetcher.fetch_text(page.as_str()).await {
            Ok(markup) => markup,
            Err(err) => {
                warn!(url = %page, error = %err, "linked page fetch failed");
                report.failure(page, &err);
                return;
            }
        };
        let resources = discovery::discover_resources(&markup, page, &self.origin);
        let rewritten = rewriter::rewrite_for_offline(&markup).unwrap_or_else(|err| {
            warn!(url = %page, error = %err, "linked page rewrite failed, storing it unmodified");
            markup.clone()
        });
        match store.save(&resolver::to_local_path(page), rewritten.as_bytes()) {
            Ok(_) => report.success(page),
            Err(err) => {
                warn!(url = %page, error = %err, "linked page write failed");
                report.failure(page, &err);
                return;
            }
        }
        for resource in &resources {
            self.fetch_resource(store, &resource.url, report).await;
        }
    }
}

fn is_text_path(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| TEXT_EXTENSIONS.iter().any(|t| ext.eq_ignore_ascii_case(t)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_extension_check_covers_the_known_set() {
        for path in [
            "a.css", "b.js", "c.html", "d.htm", "e.xml", "f.txt", "g.json", "H.CSS",
        ] {
            assert!(is_text_path(path), "expected text: {path}");
        }
        for path in ["a.png", "b.woff2", "c.pdf", "noext", "d.mp4"] {
            assert!(!is_text_path(path), "expected binary: {path}");
        }
    }

    #[test]
    fn output_root_is_keyed_by_host() {
        let crawler = SiteCrawler::new("https://example.com/start", Path::new("/tmp/dl")).unwrap();
        assert_eq!(crawler.output_root(), Path::new("/tmp/dl/example.com"));
    }

    #[test]
    fn rejects_targets_without_a_host() {
        assert!(matches!(
            SiteCrawler::new("not a url", Path::new("/tmp/dl")),
            Err(CrawlError::InvalidTarget(_))
        ));
        assert!(matches!(
            SiteCrawler::new("data:text/plain,hi", Path::new("/tmp/dl")),
            Err(CrawlError::InvalidTarget(_))
        ));
    }
}
