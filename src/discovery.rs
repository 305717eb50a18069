use std::collections::HashSet;

use regex::Regex;
use select::document::Document;
use select::predicate::Name;
use serde::Serialize;
use url::Url;

use crate::fetcher::Fetcher;
use crate::resolver::{self, Origin};

/// What a discovered reference points at. Drives logging and reporting;
/// the text-versus-binary fetch decision is made from the local path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ResourceKind {
    Stylesheet,
    Script,
    Image,
    Font,
    Media,
    Document,
    Icon,
    Manifest,
    Generic,
}

/// A same-origin asset referenced by a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub url: Url,
    pub kind: ResourceKind,
    pub same_origin: bool,
}

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "svg", "ico", "webp", "bmp"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "ogg", "avi", "mov"];
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg", "aac", "flac"];
const DOCUMENT_EXTENSIONS: &[&str] = &["pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx"];

const BACKGROUND_URL_PATTERN: &str =
    r#"(?i)background[^:;{}]*:[^;{}]*url\(\s*['"]?([^'"()\s]+\.(?:jpg|jpeg|png|gif|svg|ico|webp|bmp))['"]?\s*\)"#;
const FONT_FACE_URL_PATTERN: &str =
    r#"(?i)@font-face[^}]*url\(\s*['"]?([^'"()\s]+\.(?:woff2?|ttf|otf|eot))['"]?\s*\)"#;

/// Files commonly served from a site root that never appear in markup.
const COMMON_ROOT_FILES: &[&str] = &[
    "robots.txt",
    "sitemap.xml",
    "favicon.ico",
    "favicon.svg",
    "favicon.png",
    "apple-touch-icon.png",
    "manifest.json",
    ".well-known/security.txt",
];

/// Scan a markup document for referenced same-origin assets.
///
/// Pure over `(markup, base, origin)`: identical input yields an identical
/// ordered list with no carried-over state between calls. Scan order is
/// fixed (stylesheets, scripts, images, CSS backgrounds, icons, media,
/// fonts, document links, manifest); duplicates by resolved URL and
/// off-origin references are dropped.
pub fn discover_resources(markup: &str, base: &Url, origin: &Origin) -> Vec<Resource> {
    let document = Document::from(markup);
    let mut collector = Collector::new(base, origin);

    for link in document.find(Name("link")) {
        if let (Some(rel), Some(href)) = (link.attr("rel"), link.attr("href")) {
            if rel.contains("stylesheet") {
                collector.push(href, ResourceKind::Stylesheet);
            }
        }
    }

    for script in document.find(Name("script")) {
        if let Some(src) = script.attr("src") {
            collector.push(src, ResourceKind::Script);
        }
    }

    for img in document.find(Name("img")) {
        if let Some(src) = img.attr("src") {
            if has_extension(src, IMAGE_EXTENSIONS) {
                collector.push(src, ResourceKind::Image);
            }
        }
    }

    // Backgrounds declared in <style> blocks or inline style attributes.
    if let Ok(pattern) = Regex::new(BACKGROUND_URL_PATTERN) {
        for capture in pattern.captures_iter(markup) {
            if let Some(reference) = capture.get(1) {
                collector.push(reference.as_str(), ResourceKind::Image);
            }
        }
    }

    for link in document.find(Name("link")) {
        if let (Some(rel), Some(href)) = (link.attr("rel"), link.attr("href")) {
            if rel.contains("icon") {
                collector.push(href, ResourceKind::Icon);
            }
        }
    }

    for video in document.find(Name("video")) {
        if let Some(src) = video.attr("src") {
            if has_extension(src, VIDEO_EXTENSIONS) {
                collector.push(src, ResourceKind::Media);
            }
        }
    }
    for source in document.find(Name("source")) {
        if let Some(src) = source.attr("src") {
            if has_extension(src, VIDEO_EXTENSIONS) {
                collector.push(src, ResourceKind::Media);
            }
        }
    }
    for audio in document.find(Name("audio")) {
        if let Some(src) = audio.attr("src") {
            if has_extension(src, AUDIO_EXTENSIONS) {
                collector.push(src, ResourceKind::Media);
            }
        }
    }

    if let Ok(pattern) = Regex::new(FONT_FACE_URL_PATTERN) {
        for capture in pattern.captures_iter(markup) {
            if let Some(reference) = capture.get(1) {
                collector.push(reference.as_str(), ResourceKind::Font);
            }
        }
    }

    for anchor in document.find(Name("a")) {
        if let Some(href) = anchor.attr("href") {
            if has_extension(href, DOCUMENT_EXTENSIONS) {
                collector.push(href, ResourceKind::Document);
            }
        }
    }

    for link in document.find(Name("link")) {
        if let (Some(rel), Some(href)) = (link.attr("rel"), link.attr("href")) {
            if rel == "manifest" {
                collector.push(href, ResourceKind::Manifest);
            }
        }
    }

    collector.resources
}

/// Scan a markup document for same-origin page links worth mirroring:
/// anchors whose href ends in `.htm`/`.html` and is not an absolute
/// `http(s)` URL, a `mailto:`/`tel:` reference, or a bare fragment.
pub fn discover_page_links(markup: &str, base: &Url, origin: &Origin) -> Vec<Url> {
    let document = Document::from(markup);
    let mut seen = HashSet::new();
    let mut pages = Vec::new();

    for anchor in document.find(Name("a")) {
        let Some(href) = anchor.attr("href") else { continue };
        let href = href.trim();
        let lower = href.to_ascii_lowercase();
        if lower.starts_with("http://")
            || lower.starts_with("https://")
            || lower.starts_with("mailto:")
            || lower.starts_with("tel:")
            || href.starts_with('#')
        {
            continue;
        }
        if !(lower.ends_with(".html") || lower.ends_with(".htm")) {
            continue;
        }
        let Some(url) = resolver::resolve(href, base) else { continue };
        if !origin.matches(&url) {
            continue;
        }
        if seen.insert(url.to_string()) {
            pages.push(url);
        }
    }

    pages
}

/// Probe the site root for well-known files and return those that exist.
/// Probe failures are silently excluded; this never fails.
pub async fn discover_common_files(fetcher: &Fetcher, base: &Url) -> Vec<Url> {
    let mut found = Vec::new();
    if base.host_str().is_none() {
        return found;
    }
    for name in COMMON_ROOT_FILES {
        let Ok(candidate) = base.join(&format!("/{name}")) else { continue };
        if fetcher.probe_exists(candidate.as_str()).await {
            found.push(candidate);
        }
    }
    found
}

struct Collector<'a> {
    base: &'a Url,
    origin: &'a Origin,
    seen: HashSet<String>,
    resources: Vec<Resource>,
}

impl<'a> Collector<'a> {
    fn new(base: &'a Url, origin: &'a Origin) -> Self {
        Self {
            base,
            origin,
            seen: HashSet::new(),
            resources: Vec::new(),
        }
    }

    fn push(&mut self, reference: &str, kind: ResourceKind) {
        let Some(url) = resolver::resolve(reference, self.base) else { return };
        let same_origin = self.origin.matches(&url);
        if !same_origin {
            return;
        }
        if self.seen.insert(url.to_string()) {
            self.resources.push(Resource { url, kind, same_origin });
        }
    }
}

/// True when the reference's path (ignoring query and fragment) ends in
/// one of the given extensions.
fn has_extension(reference: &str, extensions: &[&str]) -> bool {
    let trimmed = reference
        .split(['?', '#'])
        .next()
        .unwrap_or(reference)
        .to_ascii_lowercase();
    extensions
        .iter()
        .any(|ext| trimmed.ends_with(&format!(".{ext}")))
}
