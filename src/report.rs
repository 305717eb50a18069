use std::path::PathBuf;

use serde::Serialize;

/// One skipped item and the reason it was skipped.
#[derive(Debug, Clone, Serialize)]
pub struct ItemFailure {
    pub item: String,
    pub reason: String,
}

/// Outcome of a mirror run. Per-item failures never abort a crawl, so a
/// report with a non-empty `failed` list is still a successful mirror.
#[derive(Debug, Serialize)]
pub struct CrawlReport {
    pub output_root: PathBuf,
    pub succeeded: Vec<String>,
    pub failed: Vec<ItemFailure>,
}

impl CrawlReport {
    pub(crate) fn new(output_root: PathBuf) -> Self {
        Self {
            output_root,
            succeeded: Vec::new(),
            failed: Vec::new(),
        }
    }

    pub(crate) fn success(&mut self, item: impl ToString) {
        self.succeeded.push(item.to_string());
    }

    pub(crate) fn failure(&mut self, item: impl ToString, reason: impl ToString) {
        self.failed.push(ItemFailure {
            item: item.to_string(),
            reason: reason.to_string(),
        });
    }
}

/// Outcome of a merge run: the merged file plus what was and was not
/// inlined into it.
#[derive(Debug, Serialize)]
pub struct MergeReport {
    pub output_file: PathBuf,
    pub inlined: Vec<String>,
    pub failed: Vec<ItemFailure>,
}
