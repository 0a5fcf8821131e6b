//! Listener bootstrap.
//!
//! [`ServerContext`] is built once per listener and shared by every
//! connection task. It owns the registries the dispatcher reads, so their
//! lifetime is tied to the listener instead of to process start-up hooks.

pub mod listener;

use std::sync::Arc;

use crate::http::dispatch::{RequestDispatcher, Settings};
use crate::http::headers::HeaderRegistry;
use crate::http::mime::MimeRegistry;
use crate::http::static_files::PublicFolder;

pub struct ServerContext {
    pub settings: Settings,
    pub headers: Arc<HeaderRegistry>,
    pub mime: Arc<MimeRegistry>,
    pub dispatcher: RequestDispatcher,
}

impl ServerContext {
    /// Wires the dispatcher to a [`PublicFolder`] transmitter over `mime`.
    pub fn new(settings: Settings, headers: Arc<HeaderRegistry>, mime: Arc<MimeRegistry>) -> Self {
        let transmitter = Arc::new(PublicFolder::new(Arc::clone(&headers), Arc::clone(&mime)));
        let dispatcher = RequestDispatcher::new(Arc::clone(&headers), transmitter);

        Self {
            settings,
            headers,
            mime,
            dispatcher,
        }
    }

    /// Empties the MIME table once the listener has stopped.
    ///
    /// The header registry is process-wide and is released separately by
    /// [`HeaderRegistry::teardown`].
    pub fn shutdown(&self) {
        tracing::debug!("Clearing mime-types");
        self.mime.clear();
        self.mime.stats();
    }
}
