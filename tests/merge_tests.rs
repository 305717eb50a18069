use std::fs;
use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use tempfile::tempdir;

use offsite::merger::{MergeError, Merger};

const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 9, 8, 7];

fn write(tree: &Path, relative: &str, content: &[u8]) {
    let path = tree.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

#[test]
fn inlines_local_assets_and_defuses_local_links() {
    let dir = tempdir().unwrap();
    let tree = dir.path().join("example.com");
    write(
        &tree,
        "index.html",
        br##"<html><head>
<link rel="stylesheet" href="assets/style.css">
<link rel="stylesheet" href="https://cdn.example.net/remote.css">
<script src="app.js"></script>
</head><body>
<img src="img/logo.png">
<a href="about.html">about</a>
<a href="https://example.com/external">external</a>
<a href="#top">top</a>
</body></html>"##,
    );
    write(&tree, "assets/style.css", b"body { margin: 0; }");
    write(&tree, "app.js", b"console.log('hi');");
    write(&tree, "img/logo.png", PNG_BYTES);

    let report = Merger::new(&tree, "example").merge().unwrap();
    let html = fs::read_to_string(&report.output_file).unwrap();

    assert!(html.contains(r#"<style type="text/css">body { margin: 0; }</style>"#));
    assert!(html.contains(r#"<script type="text/javascript">console.log('hi');</script>"#));

    // Remote stylesheet stays an external reference.
    assert!(html.contains(r#"href="https://cdn.example.net/remote.css""#));

    let marker = "data:image/png;base64,";
    let start = html.find(marker).expect("no data URI in merged output") + marker.len();
    let end = start + html[start..].find('"').unwrap();
    assert_eq!(BASE64.decode(&html[start..end]).unwrap(), PNG_BYTES);

    // The local anchor is defused, the external and fragment anchors are not.
    assert!(html.contains(r#"title="Original link: about.html (no longer available)""#));
    assert!(html.contains("text-decoration: line-through"));
    assert!(html.contains(r#"href="https://example.com/external""#));
    assert!(html.contains(r##"href="#top""##));
    assert!(!html.contains(r#"href="about.html""#));

    assert_eq!(report.inlined.len(), 3);
    assert!(report.failed.is_empty());
}

#[test]
fn a_missing_asset_is_recorded_and_skipped() {
    let dir = tempdir().unwrap();
    let tree = dir.path().join("site");
    write(
        &tree,
        "index.html",
        br#"<html><head><link rel="stylesheet" href="gone.css"></head><body></body></html>"#,
    );

    let report = Merger::new(&tree, "site").merge().unwrap();
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].item, "gone.css");

    // The unreadable stylesheet link is left in place.
    let html = fs::read_to_string(&report.output_file).unwrap();
    assert!(html.contains(r#"href="gone.css""#));
}

#[test]
fn index_html_is_preferred_over_other_files() {
    let dir = tempdir().unwrap();
    let tree = dir.path().join("site");
    write(&tree, "a/b.html", b"<html><body>WRONG</body></html>");
    write(&tree, "index.html", b"<html><body>ENTRY</body></html>");

    let report = Merger::new(&tree, "site").merge().unwrap();
    let html = fs::read_to_string(&report.output_file).unwrap();
    assert!(html.contains("ENTRY"));
}

#[test]
fn first_root_level_file_is_used_without_an_index() {
    let dir = tempdir().unwrap();
    let tree = dir.path().join("site");
    write(&tree, "a.html", b"<html><body>FIRST</body></html>");
    write(&tree, "b.html", b"<html><body>SECOND</body></html>");

    let report = Merger::new(&tree, "site").merge().unwrap();
    let html = fs::read_to_string(&report.output_file).unwrap();
    assert!(html.contains("FIRST"));
}

#[test]
fn a_tree_without_html_fails() {
    let dir = tempdir().unwrap();
    let tree = dir.path().join("site");
    write(&tree, "style.css", b"body {}");

    let err = Merger::new(&tree, "site").merge().unwrap_err();
    assert!(matches!(err, MergeError::NoHtmlFound(_)));
}

#[test]
fn merged_output_can_be_redirected() {
    let dir = tempdir().unwrap();
    let tree = dir.path().join("site");
    let merged_dir = dir.path().join("merged");
    write(&tree, "index.html", b"<html><body>hi</body></html>");

    let report = Merger::new(&tree, "site")
        .with_output_dir(&merged_dir)
        .merge()
        .unwrap();
    assert_eq!(report.output_file, merged_dir.join("site_merged.html"));
    assert!(report.output_file.exists());
}
