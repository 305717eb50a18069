use lol_html::errors::RewritingError;
use lol_html::{element, rewrite_str, RewriteStrSettings};

/// Rewrite root-relative references so a stored page browses correctly
/// from the local tree: `/assets/x.css` becomes `assets/x.css`, a bare `/`
/// becomes `index.html`. Absolute URLs, protocol-relative URLs, fragments,
/// and already relative values are left untouched.
///
/// This is a syntactic, attribute-scoped pass over stylesheet/script/image/
/// anchor attributes; it never descends into CSS `url()` bodies.
pub fn rewrite_for_offline(markup: &str) -> Result<String, RewritingError> {
    rewrite_str(
        markup,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!("link[href]", |el| {
                    if let Some(href) = el.get_attribute("href") {
                        if let Some(local) = strip_site_root(&href) {
                            el.set_attribute("href", &local)?;
                        }
                    }
                    Ok(())
                }),
                element!("script[src]", |el| {
                    if let Some(src) = el.get_attribute("src") {
                        if let Some(local) = strip_site_root(&src) {
                            el.set_attribute("src", &local)?;
                        }
                    }
                    Ok(())
                }),
                element!("img[src]", |el| {
                    if let Some(src) = el.get_attribute("src") {
                        if let Some(local) = strip_site_root(&src) {
                            el.set_attribute("src", &local)?;
                        }
                    }
                    Ok(())
                }),
                element!("a[href]", |el| {
                    if let Some(href) = el.get_attribute("href") {
                        if let Some(local) = strip_site_root(&href) {
                            el.set_attribute("href", &local)?;
                        }
                    }
                    Ok(())
                }),
            ],
            ..RewriteStrSettings::default()
        },
    )
}

/// Site-root-relative values (a single leading slash) become
/// document-relative; everything else returns `None`.
fn strip_site_root(value: &str) -> Option<String> {
    if !value.starts_with('/') || value.starts_with("//") {
        return None;
    }
    let stripped = &value[1..];
    if stripped.is_empty() {
        Some("index.html".to_string())
    } else {
        Some(stripped.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_leading_separator_from_root_relative_values() {
        let markup = r#"<link rel="stylesheet" href="/assets/style.css"><script src="/app.js"></script><img src="/img/logo.png"><a href="/about.html">about</a>"#;
        let rewritten = rewrite_for_offline(markup).unwrap();
        assert!(rewritten.contains(r#"href="assets/style.css""#));
        assert!(rewritten.contains(r#"src="app.js""#));
        assert!(rewritten.contains(r#"src="img/logo.png""#));
        assert!(rewritten.contains(r#"href="about.html""#));
    }

    #[test]
    fn bare_root_becomes_index_html() {
        let markup = r#"<a href="/">home</a>"#;
        let rewritten = rewrite_for_offline(markup).unwrap();
        assert!(rewritten.contains(r#"href="index.html""#));
    }

    #[test]
    fn leaves_everything_else_untouched() {
        let markup = r##"
            <a href="https://example.com/page">absolute</a>
            <script src="//cdn.example.com/lib.js"></script>
            <a href="#section">fragment</a>
            <img src="data:image/png;base64,AAAA">
            <a href="already/relative.html">relative</a>
            <a href="mailto:x@example.com">mail</a>
        "##;
        let rewritten = rewrite_for_offline(markup).unwrap();
        assert!(rewritten.contains(r#"href="https://example.com/page""#));
        assert!(rewritten.contains(r#"src="//cdn.example.com/lib.js""#));
        assert!(rewritten.contains(r##"href="#section""##));
        assert!(rewritten.contains(r#"src="data:image/png;base64,AAAA""#));
        assert!(rewritten.contains(r#"href="already/relative.html""#));
        assert!(rewritten.contains(r#"href="mailto:x@example.com""#));
    }

    #[test]
    fn preserves_other_attributes() {
        let markup = r#"<a href="/p" class="btn" target="_blank">x</a>"#;
        let rewritten = rewrite_for_offline(markup).unwrap();
        assert!(rewritten.contains(r#"href="p""#));
        assert!(rewritten.contains(r#"class="btn""#));
        assert!(rewritten.contains(r#"target="_blank""#));
    }
}
