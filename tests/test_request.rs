use std::sync::Arc;

use gatehouse::http::atom::Atom;
use gatehouse::http::request::{Method, Request, RequestBuilder};

fn get(headers: &[(&str, &str)]) -> Request {
    headers
        .iter()
        .fold(RequestBuilder::new().method(Method::GET).path("/"), |b, (k, v)| b.header(k, *v))
        .build()
        .unwrap()
}

#[test]
fn test_request_header_retrieval() {
    let req = get(&[("Host", "example.com"), ("Content-Type", "application/json")]);

    assert_eq!(req.header("Host"), Some("example.com"));
    assert_eq!(req.header("content-type"), Some("application/json"));
    assert_eq!(req.header("Missing"), None);
}

#[test]
fn test_request_header_returns_last_of_repeated_values() {
    let req = get(&[("Host", "a.example"), ("Host", "b.example")]);

    assert_eq!(req.header("Host"), Some("b.example"));
    assert_eq!(req.header_values("host").unwrap().len(), 2);
}

#[test]
fn test_request_content_length_parsing() {
    let req = get(&[("Content-Length", "42")]);

    assert_eq!(req.content_length(), 42);
}

#[test]
fn test_request_content_length_missing() {
    assert_eq!(get(&[]).content_length(), 0);
}

#[test]
fn test_request_content_length_invalid() {
    let req = get(&[("Content-Length", "not-a-number")]);

    assert_eq!(req.content_length(), 0);
}

#[test]
fn test_request_keep_alive_http11_default() {
    assert!(get(&[]).keep_alive());
}

#[test]
fn test_request_keep_alive_close() {
    assert!(!get(&[("Connection", "close")]).keep_alive());
}

#[test]
fn test_request_keep_alive_case_insensitive() {
    assert!(get(&[("Connection", "Keep-Alive")]).keep_alive());
}

#[test]
fn test_request_http10_closes_by_default() {
    let req = RequestBuilder::new()
        .method(Method::GET)
        .path("/")
        .version("HTTP/1.0")
        .build()
        .unwrap();
    assert!(!req.keep_alive());

    let req = RequestBuilder::new()
        .method(Method::GET)
        .path("/")
        .version("HTTP/1.0")
        .header("Connection", "keep-alive")
        .build()
        .unwrap();
    assert!(req.keep_alive());
}

#[test]
fn test_request_method_from_string() {
    assert_eq!(Method::from_str("GET"), Some(Method::GET));
    assert_eq!(Method::from_str("POST"), Some(Method::POST));
    assert_eq!(Method::from_str("INVALID"), None);
    assert_eq!(Method::from_str("get"), None); // Case-sensitive
    assert_eq!(Method::PATCH.as_str(), "PATCH");
}

#[test]
fn test_request_builder_requires_method_and_path() {
    assert!(RequestBuilder::new().path("/").build().is_err());
    assert!(RequestBuilder::new().method(Method::GET).build().is_err());
}

#[test]
fn test_request_builder_header_atom_keeps_name() {
    let name = Atom::new("host");
    let req = RequestBuilder::new()
        .method(Method::GET)
        .path("/")
        .header_atom(name.clone(), "example.com")
        .build()
        .unwrap();

    let (stored, _) = req.headers.iter().next().unwrap();
    assert!(stored.ptr_eq(&name));
}

#[test]
fn test_request_udata_downcast() {
    let mut req = get(&[]);
    assert!(req.udata_as::<u32>().is_none());

    req.udata = Some(Arc::new(7u32));
    assert_eq!(req.udata_as::<u32>(), Some(&7));
    assert!(req.udata_as::<String>().is_none());
}
