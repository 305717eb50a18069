use url::Url;

/// How strictly a candidate URL must agree with the crawl target to count
/// as part of the same site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OriginPolicy {
    /// Hostnames must match; scheme and port are ignored.
    #[default]
    HostOnly,
    /// Scheme and hostname must both match.
    SchemeAndHost,
}

/// The origin a crawl is anchored to.
#[derive(Debug, Clone)]
pub struct Origin {
    host: String,
    scheme: String,
    policy: OriginPolicy,
}

impl Origin {
    /// Returns `None` for URLs without a host (e.g. `file:` URLs).
    pub fn of(url: &Url) -> Option<Self> {
        Some(Self {
            host: url.host_str()?.to_string(),
            scheme: url.scheme().to_string(),
            policy: OriginPolicy::default(),
        })
    }

    pub fn with_policy(mut self, policy: OriginPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn matches(&self, url: &Url) -> bool {
        let same_host = url.host_str() == Some(self.host.as_str());
        match self.policy {
            OriginPolicy::HostOnly => same_host,
            OriginPolicy::SchemeAndHost => same_host && url.scheme() == self.scheme,
        }
    }
}

const UNFETCHABLE_PREFIXES: [&str; 4] = ["data:", "javascript:", "mailto:", "tel:"];

/// Resolve a markup reference against a base URL.
///
/// Protocol-relative references inherit the base scheme, root-relative
/// references inherit scheme and host, everything else follows standard
/// URL-resolution rules. References that are not fetchable resources
/// (`data:`, `javascript:`, `mailto:`, `tel:`, fragment-only) yield `None`.
pub fn resolve(reference: &str, base: &Url) -> Option<Url> {
    let reference = reference.trim();
    if reference.is_empty() || reference.starts_with('#') {
        return None;
    }
    let lower = reference.to_ascii_lowercase();
    if UNFETCHABLE_PREFIXES.iter().any(|p| lower.starts_with(p)) {
        return None;
    }
    if let Some(rest) = reference.strip_prefix("//") {
        return Url::parse(&format!("{}://{}", base.scheme(), rest)).ok();
    }
    base.join(reference).ok()
}

/// Map a URL to the tree-relative path it is stored at inside a mirror.
///
/// The root path maps to `index.html`; otherwise the URL path component is
/// used with exactly one leading slash stripped. Two URLs with the same path
/// always map to the same location (idempotent overwrite).
pub fn to_local_path(url: &Url) -> String {
    let path = url.path();
    if path.is_empty() || path == "/" {
        return "index.html".to_string();
    }
    path.strip_prefix('/').unwrap_or(path).to_string()
}
