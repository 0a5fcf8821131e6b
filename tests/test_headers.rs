use std::sync::Arc;

use gatehouse::http::atom::Atom;
use gatehouse::http::headers::{Canonical, HeaderMap, HeaderRegistry, HeaderValue};

// The process-wide slot is shared by every test in this binary; only this
// test touches it.
#[test]
fn test_global_registry_lifecycle() {
    HeaderRegistry::teardown();
    assert!(HeaderRegistry::current().is_none());

    let first = HeaderRegistry::initialize();
    let second = HeaderRegistry::initialize();
    assert!(Arc::ptr_eq(&first, &second));
    assert!(first.get(Canonical::Host).ptr_eq(second.get(Canonical::Host)));

    let held = first.get(Canonical::Accept).clone();
    HeaderRegistry::teardown();
    assert!(HeaderRegistry::current().is_none());
    // Outstanding references stay usable after teardown.
    assert_eq!(held.as_str(), "accept");

    let fresh = HeaderRegistry::initialize();
    assert!(!Arc::ptr_eq(&first, &fresh));
    HeaderRegistry::teardown();
}

#[test]
fn test_registry_holds_every_canonical_entry() {
    let registry = HeaderRegistry::new();

    assert_eq!(registry.len(), Canonical::ALL.len());
    assert_eq!(registry.get(Canonical::EventStream).as_str(), "text/event-stream");
    assert_eq!(registry.get(Canonical::ContentTypeDefault).as_str(), "application/octet-stream");
    assert_eq!(registry.get(Canonical::NoCache).as_str(), "no-cache, max-age=0");
    assert_eq!(registry.get(Canonical::WebSocketVersion).as_str(), "13");
}

#[test]
fn test_registry_entries_are_distinct_per_instance() {
    let a = HeaderRegistry::new();
    let b = HeaderRegistry::new();

    assert!(!a.get(Canonical::Host).ptr_eq(b.get(Canonical::Host)));
    assert_eq!(a.get(Canonical::Host), b.get(Canonical::Host));
}

#[test]
fn test_intern_returns_shared_atom_for_known_names() {
    let registry = HeaderRegistry::new();

    let host = registry.intern("host");
    assert!(host.ptr_eq(registry.get(Canonical::Host)));

    let custom = registry.intern("x-request-id");
    assert_eq!(custom.as_str(), "x-request-id");
    assert!(registry.lookup("x-request-id").is_none());
}

#[test]
fn test_header_map_append_and_insert() {
    let mut headers = HeaderMap::new();
    let name = Atom::new("set-cookie");

    headers.append(name.clone(), Atom::new("a=1"));
    assert!(matches!(headers.get(&name), Some(HeaderValue::Single(_))));

    headers.append(name.clone(), Atom::new("b=2"));
    headers.append(name.clone(), Atom::new("c=3"));
    let values: Vec<&str> = headers.get(&name).unwrap().iter().map(Atom::as_str).collect();
    assert_eq!(values, ["a=1", "b=2", "c=3"]);

    headers.insert(name.clone(), Atom::new("d=4"));
    assert_eq!(headers.get(&name).unwrap().len(), 1);
    assert_eq!(headers.len(), 1);
}

#[test]
fn test_header_map_collapse() {
    let mut headers = HeaderMap::new();
    let host = Atom::new("host");

    assert!(headers.collapse(&host).is_none());

    headers.append(host.clone(), Atom::new("only.example"));
    assert_eq!(headers.collapse(&host).unwrap(), "only.example");

    headers.append(host.clone(), Atom::new("a.example"));
    headers.append(host.clone(), Atom::new("b.example"));
    headers.append(host.clone(), Atom::new("c.example"));
    assert_eq!(headers.collapse(&host).unwrap(), "c.example");
    assert_eq!(headers.get(&host).unwrap().len(), 1);
}

#[test]
fn test_header_map_lookup_by_str_and_remove() {
    let registry = HeaderRegistry::new();
    let mut headers = HeaderMap::new();
    headers.append(registry.get(Canonical::Origin).clone(), Atom::new("https://a.example"));

    assert!(headers.get_str("origin").is_some());
    assert!(headers.remove("origin").is_some());
    assert!(headers.is_empty());
}
