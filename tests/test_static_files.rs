use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use gatehouse::http::dispatch::{FileTransmitter, Transmit};
use gatehouse::http::headers::HeaderRegistry;
use gatehouse::http::mime::{MimeRegistration, MimeRegistry};
use gatehouse::http::request::{Method, Request, RequestBuilder};
use gatehouse::http::static_files::PublicFolder;
use gatehouse::http::transport::Outbox;

fn folder() -> PublicFolder {
    let mime = MimeRegistry::with_registration(MimeRegistration::Minimal);
    PublicFolder::new(Arc::new(HeaderRegistry::new()), Arc::new(mime))
}

fn public_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("index.html"), "<h1>home</h1>").unwrap();
    fs::write(dir.path().join("app.js"), "console.log(1)").unwrap();
    fs::write(dir.path().join("app.js.gz"), b"\x1f\x8b\x08").unwrap();
    fs::write(dir.path().join("blob.qqq"), "???").unwrap();
    fs::create_dir(dir.path().join("docs")).unwrap();
    fs::write(dir.path().join("docs").join("index.html"), "docs").unwrap();
    dir
}

fn request(method: Method, path: &str, headers: &[(&str, &str)]) -> Request {
    headers
        .iter()
        .fold(RequestBuilder::new().method(method).path(path), |b, (k, v)| b.header(k, *v))
        .build()
        .unwrap()
}

fn attempt(root: &Path, req: &Request) -> (Transmit, Outbox) {
    let mut out = Outbox::new();
    let outcome = folder().attempt(req, root, &req.path, &mut out);
    (outcome, out)
}

#[test]
fn test_resolve_maps_below_root() {
    let root = Path::new("/srv/www");

    assert_eq!(
        PublicFolder::resolve(root, "/css/site.css"),
        Some(PathBuf::from("/srv/www/css/site.css"))
    );
    assert_eq!(
        PublicFolder::resolve(root, "/"),
        Some(PathBuf::from("/srv/www/index.html"))
    );
    assert_eq!(
        PublicFolder::resolve(root, "/docs/?page=2"),
        Some(PathBuf::from("/srv/www/docs/index.html"))
    );
    assert_eq!(
        PublicFolder::resolve(root, "/a.txt#top"),
        Some(PathBuf::from("/srv/www/a.txt"))
    );
}

#[test]
fn test_resolve_rejects_traversal() {
    let root = Path::new("/srv/www");

    assert_eq!(PublicFolder::resolve(root, "/../etc/passwd"), None);
    assert_eq!(PublicFolder::resolve(root, "/docs/../../secret"), None);
    assert_eq!(PublicFolder::resolve(root, "//etc/passwd"), PublicFolder::resolve(root, "/etc/passwd"));
}

#[test]
fn test_serves_file_with_registered_type() {
    let dir = public_dir();
    let req = request(Method::GET, "/index.html", &[]);

    let (outcome, out) = attempt(dir.path(), &req);

    assert_eq!(outcome, Transmit::Handled);
    let res = &out.responses()[0];
    assert_eq!(res.body, b"<h1>home</h1>".to_vec());
    assert_eq!(res.header("content-type"), Some("text/html"));
    assert_eq!(res.header("content-length"), Some("13"));
    assert_eq!(res.header("cache-control"), Some("max-age=3600"));
    assert_eq!(res.header("connection"), None);
}

#[test]
fn test_directory_path_serves_index() {
    let dir = public_dir();

    let (outcome, out) = attempt(dir.path(), &request(Method::GET, "/docs/", &[]));

    assert_eq!(outcome, Transmit::Handled);
    assert_eq!(out.responses()[0].body, b"docs".to_vec());
}

#[test]
fn test_unknown_extension_falls_back_to_octet_stream() {
    let dir = public_dir();

    let (_, out) = attempt(dir.path(), &request(Method::GET, "/blob.qqq", &[]));

    assert_eq!(
        out.responses()[0].header("content-type"),
        Some("application/octet-stream")
    );
}

#[test]
fn test_gzip_sibling_preferred_when_accepted() {
    let dir = public_dir();
    let req = request(Method::GET, "/app.js", &[("Accept-Encoding", "deflate, gzip")]);

    let (outcome, out) = attempt(dir.path(), &req);

    assert_eq!(outcome, Transmit::Handled);
    let res = &out.responses()[0];
    assert_eq!(res.body, b"\x1f\x8b\x08".to_vec());
    assert_eq!(res.header("content-encoding"), Some("gzip"));
    // Type comes from the uncompressed name.
    assert_eq!(res.header("content-type"), Some("application/javascript"));
}

#[test]
fn test_plain_file_without_accept_encoding() {
    let dir = public_dir();

    let (_, out) = attempt(dir.path(), &request(Method::GET, "/app.js", &[]));

    let res = &out.responses()[0];
    assert_eq!(res.body, b"console.log(1)".to_vec());
    assert_eq!(res.header("content-encoding"), None);
}

#[test]
fn test_head_sends_headers_only() {
    let dir = public_dir();

    let (outcome, out) = attempt(dir.path(), &request(Method::HEAD, "/index.html", &[]));

    assert_eq!(outcome, Transmit::Handled);
    let res = &out.responses()[0];
    assert!(res.body.is_empty());
    assert_eq!(res.header("content-length"), Some("13"));
}

#[test]
fn test_declines_other_methods_and_missing_files() {
    let dir = public_dir();

    for req in [
        request(Method::POST, "/index.html", &[]),
        request(Method::GET, "/missing.html", &[]),
        request(Method::GET, "/docs", &[]),
        request(Method::GET, "/../index.html", &[]),
    ] {
        let (outcome, out) = attempt(dir.path(), &req);
        assert_eq!(outcome, Transmit::Declined, "path {}", req.path);
        assert!(out.is_empty());
    }
}

#[test]
fn test_connection_close_is_echoed() {
    let dir = public_dir();
    let req = request(Method::GET, "/index.html", &[("Connection", "close")]);

    let (_, out) = attempt(dir.path(), &req);

    assert_eq!(out.responses()[0].header("connection"), Some("close"));
}
