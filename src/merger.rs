use std::fs;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use lol_html::html_content::ContentType;
use lol_html::{element, rewrite_str, RewriteStrSettings};
use thiserror::Error;
use tracing::warn;

use crate::report::{ItemFailure, MergeReport};

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("no HTML file found under {0}")]
    NoHtmlFound(PathBuf),
    #[error("failed to read or write the merged document: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to transform the entry document: {0}")]
    Rewrite(String),
}

/// Collapses a mirrored tree into one self-contained HTML document:
/// local stylesheets and scripts are embedded as text, local images as
/// base64 data URIs, and every remaining local link is defused.
pub struct Merger {
    tree_root: PathBuf,
    site_name: String,
    output_dir: PathBuf,
}

impl Merger {
    /// The merged file lands beside the tree by default.
    pub fn new(tree_root: &Path, site_name: &str) -> Self {
        let output_dir = tree_root.parent().unwrap_or(tree_root).to_path_buf();
        Self {
            tree_root: tree_root.to_path_buf(),
            site_name: site_name.to_string(),
            output_dir,
        }
    }

    pub fn with_output_dir(mut self, dir: &Path) -> Self {
        self.output_dir = dir.to_path_buf();
        self
    }

    /// Select the entry document, run the four inline passes over it, and
    /// write `{site_name}_merged.html`. Per-element failures are recorded
    /// and skipped; only a missing entry document is fatal.
    pub fn merge(&self) -> Result<MergeReport, MergeError> {
        let entry = self.select_entry()?;
        let markup = fs::read_to_string(&entry)?;

        let mut inlined = Vec::new();
        let mut failed = Vec::new();

        let markup = self.inline_stylesheets(&markup, &mut inlined, &mut failed)?;
        let markup = self.inline_scripts(&markup, &mut inlined, &mut failed)?;
        let markup = self.inline_images(&markup, &mut inlined, &mut failed)?;
        let markup = defuse_anchors(&markup)?;

        fs::create_dir_all(&self.output_dir)?;
        let output_file = self
            .output_dir
            .join(format!("{}_merged.html", self.site_name));
        fs::write(&output_file, markup)?;

        Ok(MergeReport {
            output_file,
            inlined,
            failed,
        })
    }

    /// Entry policy: any `index.html` in the tree, else the first file
    /// directly in the tree root, else the first HTML file found at all.
    fn select_entry(&self) -> Result<PathBuf, MergeError> {
        let html_files = find_html_files(&self.tree_root);
        if html_files.is_empty() {
            return Err(MergeError::NoHtmlFound(self.tree_root.clone()));
        }
        if let Some(index) = html_files.iter().find(|file| {
            file.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.eq_ignore_ascii_case("index.html"))
        }) {
            return Ok(index.clone());
        }
        if let Some(root_level) = html_files
            .iter()
            .find(|file| file.parent() == Some(self.tree_root.as_path()))
        {
            return Ok(root_level.clone());
        }
        Ok(html_files[0].clone())
    }

    fn inline_stylesheets(
        &self,
        markup: &str,
        inlined: &mut Vec<String>,
        failed: &mut Vec<ItemFailure>,
    ) -> Result<String, MergeError> {
        rewrite_str(
            markup,
            RewriteStrSettings {
                element_content_handlers: vec![element!(
                    r#"link[rel="stylesheet"][href]"#,
                    |el| {
                        let Some(href) = el.get_attribute("href") else { return Ok(()) };
                        if is_remote(&href) {
                            return Ok(());
                        }
                        match fs::read_to_string(self.tree_root.join(&href)) {
                            Ok(css) => {
                                el.replace(
                                    &format!("<style type=\"text/css\">{css}</style>"),
                                    ContentType::Html,
                                );
                                inlined.push(href);
                            }
                            Err(err) => {
                                warn!(href = %href, error = %err, "stylesheet inline failed");
                                failed.push(ItemFailure {
                                    item: href,
                                    reason: err.to_string(),
                                });
                            }
                        }
                        Ok(())
                    }
                )],
                ..RewriteStrSettings::default()
            },
        )
        .map_err(|err| MergeError::Rewrite(err.to_string()))
    }

    fn inline_scripts(
        &self,
        markup: &str,
        inlined: &mut Vec<String>,
        failed: &mut Vec<ItemFailure>,
    ) -> Result<String, MergeError> {
        rewrite_str(
            markup,
            RewriteStrSettings {
                element_content_handlers: vec![element!("script[src]", |el| {
                    let Some(src) = el.get_attribute("src") else { return Ok(()) };
                    if is_remote(&src) {
                        return Ok(());
                    }
                    match fs::read_to_string(self.tree_root.join(&src)) {
                        Ok(js) => {
                            el.replace(
                                &format!("<script type=\"text/javascript\">{js}</script>"),
                                ContentType::Html,
                            );
                            inlined.push(src);
                        }
                        Err(err) => {
                            warn!(src = %src, error = %err, "script inline failed");
                            failed.push(ItemFailure {
                                item: src,
                                reason: err.to_string(),
                            });
                        }
                    }
                    Ok(())
                })],
                ..RewriteStrSettings::default()
            },
        )
        .map_err(|err| MergeError::Rewrite(err.to_string()))
    }

    fn inline_images(
        &self,
        markup: &str,
        inlined: &mut Vec<String>,
        failed: &mut Vec<ItemFailure>,
    ) -> Result<String, MergeError> {
        rewrite_str(
            markup,
            RewriteStrSettings {
                element_content_handlers: vec![element!("img[src]", |el| {
                    let Some(src) = el.get_attribute("src") else { return Ok(()) };
                    if is_remote(&src) || src.starts_with("data:") {
                        return Ok(());
                    }
                    let path = self.tree_root.join(&src);
                    match fs::read(&path) {
                        Ok(bytes) => {
                            let mime = mime_for_path(&path);
                            el.set_attribute(
                                "src",
                                &format!("data:{mime};base64,{}", BASE64.encode(&bytes)),
                            )?;
                            inlined.push(src);
                        }
                        Err(err) => {
                            warn!(src = %src, error = %err, "image inline failed");
                            failed.push(ItemFailure {
                                item: src,
                                reason: err.to_string(),
                            });
                        }
                    }
                    Ok(())
                })],
                ..RewriteStrSettings::default()
            },
        )
        .map_err(|err| MergeError::Rewrite(err.to_string()))
    }
}

/// A merged artifact has no working internal navigation: every local,
/// non-fragment anchor is pointed at `#`, struck through, and titled with
/// the destination it used to have.
fn defuse_anchors(markup: &str) -> Result<String, MergeError> {
    rewrite_str(
        markup,
        RewriteStrSettings {
            element_content_handlers: vec![element!("a[href]", |el| {
                let Some(href) = el.get_attribute("href") else { return Ok(()) };
                if is_remote(&href) || href.starts_with('#') {
                    return Ok(());
                }
                el.set_attribute("href", "#")?;
                el.set_attribute("style", "text-decoration: line-through")?;
                el.set_attribute("title", &format!("Original link: {href} (no longer available)"))?;
                Ok(())
            })],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|err| MergeError::Rewrite(err.to_string()))
}

fn is_remote(reference: &str) -> bool {
    reference.starts_with("http")
}

/// Extensions that get a real image MIME type in data URIs. Everything
/// else, known to `mime_guess` or not, is embedded as an octet stream.
const INLINE_IMAGE_EXTENSIONS: &[&str] =
    &["jpg", "jpeg", "png", "gif", "svg", "bmp", "webp", "ico"];

fn mime_for_path(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| {
            INLINE_IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .map(|ext| mime_guess::from_ext(ext).first_or_octet_stream())
        .unwrap_or(mime_guess::mime::APPLICATION_OCTET_STREAM)
        .essence_str()
        .to_string()
}

/// Depth-first walk collecting every `.html` file. Directory entries are
/// visited in name order so entry selection is deterministic.
fn find_html_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let Ok(entries) = fs::read_dir(dir) else { return files };
    let mut paths: Vec<PathBuf> = entries.flatten().map(|entry| entry.path()).collect();
    paths.sort();
    for path in paths {
        if path.is_dir() {
            files.extend(find_html_files(&path));
        } else if path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("html"))
        {
            files.push(path);
        }
    }
    files
}
