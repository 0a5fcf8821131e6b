//! Canonical header names and values.
//!
//! The [`HeaderRegistry`] allocates one [`Atom`] for every header name and
//! header value the server compares against. The parser interns incoming
//! header names through it, so a request's `host` key and the registry's
//! `host` entry share storage and compare by pointer.
//!
//! A registry can be built standalone with [`HeaderRegistry::new`] (tests,
//! embedded listeners) or through the process-wide slot managed by
//! [`HeaderRegistry::initialize`] and [`HeaderRegistry::teardown`].

use std::collections::HashMap;
use std::collections::hash_map;
use std::sync::{Arc, PoisonError, RwLock};

use crate::http::atom::Atom;

/// Every canonical header name and value known to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Canonical {
    Accept,
    AcceptEncoding,
    AcceptRanges,
    Allow,
    CacheControl,
    Connection,
    ContentEncoding,
    ContentLength,
    ContentRange,
    ContentType,
    Cookie,
    Date,
    Etag,
    Host,
    IfNoneMatch,
    IfRange,
    LastModified,
    Origin,
    Range,
    SetCookie,
    TransferEncoding,
    Upgrade,
    WebSocketKey,
    WebSocketAccept,
    Bytes,
    Chunked,
    Close,
    ContentTypeDefault,
    Gzip,
    KeepAlive,
    MaxAge,
    NoCache,
    EventStream,
    WebSocket,
    WebSocketVersionName,
    UpgradeToken,
    WebSocketVersion,
}

impl Canonical {
    pub const ALL: [Canonical; 37] = [
        Canonical::Accept,
        Canonical::AcceptEncoding,
        Canonical::AcceptRanges,
        Canonical::Allow,
        Canonical::CacheControl,
        Canonical::Connection,
        Canonical::ContentEncoding,
        Canonical::ContentLength,
        Canonical::ContentRange,
        Canonical::ContentType,
        Canonical::Cookie,
        Canonical::Date,
        Canonical::Etag,
        Canonical::Host,
        Canonical::IfNoneMatch,
        Canonical::IfRange,
        Canonical::LastModified,
        Canonical::Origin,
        Canonical::Range,
        Canonical::SetCookie,
        Canonical::TransferEncoding,
        Canonical::Upgrade,
        Canonical::WebSocketKey,
        Canonical::WebSocketAccept,
        Canonical::Bytes,
        Canonical::Chunked,
        Canonical::Close,
        Canonical::ContentTypeDefault,
        Canonical::Gzip,
        Canonical::KeepAlive,
        Canonical::MaxAge,
        Canonical::NoCache,
        Canonical::EventStream,
        Canonical::WebSocket,
        Canonical::WebSocketVersionName,
        Canonical::UpgradeToken,
        Canonical::WebSocketVersion,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Canonical::Accept => "accept",
            Canonical::AcceptEncoding => "accept-encoding",
            Canonical::AcceptRanges => "accept-ranges",
            Canonical::Allow => "allow",
            Canonical::CacheControl => "cache-control",
            Canonical::Connection => "connection",
            Canonical::ContentEncoding => "content-encoding",
            Canonical::ContentLength => "content-length",
            Canonical::ContentRange => "content-range",
            Canonical::ContentType => "content-type",
            Canonical::Cookie => "cookie",
            Canonical::Date => "date",
            Canonical::Etag => "etag",
            Canonical::Host => "host",
            Canonical::IfNoneMatch => "if-none-match",
            Canonical::IfRange => "if-range",
            Canonical::LastModified => "last-modified",
            Canonical::Origin => "origin",
            Canonical::Range => "range",
            Canonical::SetCookie => "set-cookie",
            Canonical::TransferEncoding => "transfer-encoding",
            Canonical::Upgrade => "upgrade",
            Canonical::WebSocketKey => "sec-websocket-key",
            Canonical::WebSocketAccept => "sec-websocket-accept",
            Canonical::Bytes => "bytes",
            Canonical::Chunked => "chunked",
            Canonical::Close => "close",
            Canonical::ContentTypeDefault => "application/octet-stream",
            Canonical::Gzip => "gzip",
            Canonical::KeepAlive => "keep-alive",
            Canonical::MaxAge => "max-age=3600",
            Canonical::NoCache => "no-cache, max-age=0",
            Canonical::EventStream => "text/event-stream",
            Canonical::WebSocket => "websocket",
            Canonical::WebSocketVersionName => "sec-websocket-version",
            Canonical::UpgradeToken => "Upgrade",
            Canonical::WebSocketVersion => "13",
        }
    }
}

/// Deduplicated storage for the [`Canonical`] strings.
#[derive(Debug)]
pub struct HeaderRegistry {
    entries: Vec<Atom>,
    by_name: HashMap<&'static str, usize>,
}

static GLOBAL: RwLock<Option<Arc<HeaderRegistry>>> = RwLock::new(None);

impl HeaderRegistry {
    /// Allocates every canonical entry.
    ///
    /// Allocation failure aborts the process; there is no partially
    /// populated registry.
    pub fn new() -> Self {
        let mut entries = Vec::with_capacity(Canonical::ALL.len());
        let mut by_name = HashMap::with_capacity(Canonical::ALL.len());

        for (index, canonical) in Canonical::ALL.iter().enumerate() {
            let name = canonical.as_str();
            entries.push(Atom::new(name));
            by_name.insert(name, index);
        }

        Self { entries, by_name }
    }

    /// Populates the process-wide registry and returns it.
    ///
    /// Calling this again while a registry is installed returns the installed
    /// one without allocating. Must happen before the first dispatch.
    pub fn initialize() -> Arc<HeaderRegistry> {
        if let Some(existing) = Self::current() {
            return existing;
        }

        let mut slot = GLOBAL.write().unwrap_or_else(PoisonError::into_inner);
        // Another thread may have won the race between the read and write lock.
        let registry = slot.get_or_insert_with(|| {
            tracing::debug!(entries = Canonical::ALL.len(), "Initializing header registry");
            Arc::new(HeaderRegistry::new())
        });
        Arc::clone(registry)
    }

    /// The process-wide registry, if [`initialize`](Self::initialize) ran.
    pub fn current() -> Option<Arc<HeaderRegistry>> {
        GLOBAL
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(Arc::clone)
    }

    /// Releases the process-wide registry.
    ///
    /// Callers must ensure dispatch has stopped. References still held
    /// elsewhere stay valid until they are dropped.
    pub fn teardown() {
        let released = GLOBAL.write().unwrap_or_else(PoisonError::into_inner).take();
        if released.is_some() {
            tracing::debug!("Header registry released");
        }
    }

    /// The canonical atom for `canonical`.
    pub fn get(&self, canonical: Canonical) -> &Atom {
        // `entries` is built from `Canonical::ALL` in declaration order.
        &self.entries[canonical as usize]
    }

    /// Finds the canonical atom spelled exactly `name`.
    pub fn lookup(&self, name: &str) -> Option<&Atom> {
        self.by_name.get(name).map(|&index| &self.entries[index])
    }

    /// Returns the canonical atom for `name` when one exists, otherwise a
    /// fresh atom holding `name`.
    pub fn intern(&self, name: &str) -> Atom {
        self.lookup(name).cloned().unwrap_or_else(|| Atom::new(name))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for HeaderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// A header's value: one entry, or every entry in arrival order when the
/// header was repeated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderValue {
    Single(Atom),
    Multiple(Vec<Atom>),
}

impl HeaderValue {
    /// The single value, or `None` for a repeated header.
    pub fn as_single(&self) -> Option<&Atom> {
        match self {
            HeaderValue::Single(value) => Some(value),
            HeaderValue::Multiple(_) => None,
        }
    }

    /// The most recently supplied value.
    pub fn last(&self) -> Option<&Atom> {
        match self {
            HeaderValue::Single(value) => Some(value),
            HeaderValue::Multiple(values) => values.last(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Atom> {
        let values: &[Atom] = match self {
            HeaderValue::Single(value) => std::slice::from_ref(value),
            HeaderValue::Multiple(values) => values,
        };
        values.iter()
    }

    pub fn len(&self) -> usize {
        match self {
            HeaderValue::Single(_) => 1,
            HeaderValue::Multiple(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Header storage keyed by (usually canonical) lowercase names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    entries: HashMap<Atom, HeaderValue>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `name` to `value`, discarding any previous values.
    pub fn insert(&mut self, name: Atom, value: Atom) -> Option<HeaderValue> {
        self.entries.insert(name, HeaderValue::Single(value))
    }

    /// Adds `value` after any existing values for `name`.
    pub fn append(&mut self, name: Atom, value: Atom) {
        match self.entries.entry(name) {
            hash_map::Entry::Vacant(slot) => {
                slot.insert(HeaderValue::Single(value));
            }
            hash_map::Entry::Occupied(mut slot) => {
                let current = slot.get_mut();
                let merged = match std::mem::replace(current, HeaderValue::Multiple(Vec::new())) {
                    HeaderValue::Single(first) => vec![first, value],
                    HeaderValue::Multiple(mut values) => {
                        values.push(value);
                        values
                    }
                };
                *current = HeaderValue::Multiple(merged);
            }
        }
    }

    pub fn get(&self, name: &Atom) -> Option<&HeaderValue> {
        self.entries.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&HeaderValue> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &Atom) -> bool {
        self.entries.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<HeaderValue> {
        self.entries.remove(name)
    }

    /// Reduces a repeated header to its last value.
    ///
    /// Returns the value left in place, or `None` when the header is absent.
    pub fn collapse(&mut self, name: &Atom) -> Option<&Atom> {
        let value = self.entries.get_mut(name)?;
        if let HeaderValue::Multiple(values) = &mut *value {
            let last = values.pop()?;
            *value = HeaderValue::Single(last);
        }
        value.as_single()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Atom, &HeaderValue)> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_table_matches_declaration_order() {
        let registry = HeaderRegistry::new();

        for canonical in Canonical::ALL {
            assert_eq!(registry.get(canonical).as_str(), canonical.as_str());
        }
    }

    #[test]
    fn lookup_is_case_exact() {
        let registry = HeaderRegistry::new();

        let found = registry.lookup("upgrade").unwrap();
        assert!(found.ptr_eq(registry.get(Canonical::Upgrade)));
        let token = registry.lookup("Upgrade").unwrap();
        assert!(token.ptr_eq(registry.get(Canonical::UpgradeToken)));
    }

    #[test]
    fn collapse_keeps_last_value() {
        let mut headers = HeaderMap::new();
        let host = Atom::new("host");
        headers.append(host.clone(), Atom::new("a.example"));
        headers.append(host.clone(), Atom::new("b.example"));

        assert_eq!(headers.collapse(&host).unwrap(), "b.example");
        assert!(headers.get(&host).unwrap().as_single().is_some());
    }
}
