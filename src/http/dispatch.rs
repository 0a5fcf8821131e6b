//! Request and response dispatch.
//!
//! # Request decision order
//!
//! Every parsed request takes exactly one of these branches, checked in
//! order:
//!
//! ```text
//!   no Host header ───────────────► 400
//!   Upgrade header ──┬─ "h2…" ────► 400 (no HTTP/2 over cleartext)
//!                    └─ other ────► on_upgrade(token)
//!   Accept == text/event-stream ──► on_upgrade("sse")
//!   public folder set ── handled ─► done
//!                     └─ declined ┐
//!   ◄─────────────────────────────┘
//!   on_request
//! ```
//!
//! Repeated Host headers are collapsed to the last value before any branch
//! is chosen.

use std::any::Any;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::http::atom::Atom;
use crate::http::error;
use crate::http::headers::{Canonical, HeaderRegistry, HeaderValue};
use crate::http::request::Request;
use crate::http::response::StatusCode;
use crate::http::transport::Transport;

/// Opaque per-listener user data copied into every request.
pub type Udata = Arc<dyn Any + Send + Sync>;

/// Protocol token passed to [`Handler::on_upgrade`] for event-stream requests.
pub const SSE_PROTOCOL: &[u8] = b"sse";

/// Application callbacks for one listener.
pub trait Handler: Send + Sync {
    /// Handles a request no earlier branch claimed.
    fn on_request(&self, req: &mut Request, out: &mut dyn Transport);

    /// Handles a response received in client mode.
    fn on_response(&self, _res: &mut Request) {}

    /// Handles a protocol upgrade or an event-stream request.
    ///
    /// `protocol` is only valid for the duration of the call. The default
    /// refuses the upgrade with 400.
    fn on_upgrade(&self, req: &mut Request, protocol: &[u8], out: &mut dyn Transport) {
        tracing::debug!(
            protocol = %String::from_utf8_lossy(protocol),
            "Upgrade not supported by handler"
        );
        if let Err(e) = error::respond(req, StatusCode::BadRequest, out) {
            tracing::warn!(error = %e, "Failed to refuse upgrade");
        }
    }
}

/// Outcome of a static file attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transmit {
    /// A response was sent; dispatch ends here.
    Handled,
    /// Nothing was sent; dispatch continues to the application.
    Declined,
}

/// Serves files from a public folder.
pub trait FileTransmitter: Send + Sync {
    fn attempt(&self, req: &Request, root: &Path, path: &str, out: &mut dyn Transport) -> Transmit;
}

/// Listener configuration shared by every request it serves.
#[derive(Clone)]
pub struct Settings {
    pub public_folder: Option<PathBuf>,
    pub handler: Arc<dyn Handler>,
    pub udata: Option<Udata>,
}

impl Settings {
    pub fn new(handler: Arc<dyn Handler>) -> Self {
        Self {
            public_folder: None,
            handler,
            udata: None,
        }
    }

    pub fn with_public_folder(mut self, root: impl Into<PathBuf>) -> Self {
        self.public_folder = Some(root.into());
        self
    }

    pub fn with_udata(mut self, udata: Udata) -> Self {
        self.udata = Some(udata);
        self
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("public_folder", &self.public_folder)
            .field("udata", &self.udata.is_some())
            .finish_non_exhaustive()
    }
}

/// The branch a request took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    /// Answered with an error status.
    Rejected(StatusCode),
    /// Passed to `on_upgrade` with the Upgrade header's token.
    Upgrade,
    /// Passed to `on_upgrade` with [`SSE_PROTOCOL`].
    EventStream,
    /// Served by the file transmitter.
    Static,
    /// Passed to `on_request`.
    Application,
}

pub struct RequestDispatcher {
    headers: Arc<HeaderRegistry>,
    transmitter: Arc<dyn FileTransmitter>,
}

impl RequestDispatcher {
    pub fn new(headers: Arc<HeaderRegistry>, transmitter: Arc<dyn FileTransmitter>) -> Self {
        Self { headers, transmitter }
    }

    pub fn registry(&self) -> &HeaderRegistry {
        &self.headers
    }

    /// Routes `req` to exactly one terminal branch.
    pub fn dispatch(&self, req: &mut Request, settings: &Settings, out: &mut dyn Transport) -> Branch {
        req.udata = settings.udata.clone();

        let host = self.headers.get(Canonical::Host);
        if req.headers.collapse(host).is_none() {
            tracing::debug!(path = %req.path, "missing Host header");
            return self.reject(req, StatusCode::BadRequest, out);
        }

        let upgrade = self.headers.get(Canonical::Upgrade);
        if let Some(value) = req.headers.get(upgrade) {
            // The last value wins for a repeated Upgrade header, as for Host.
            if let Some(token) = value.last().cloned() {
                return self.upgrade(req, token, settings, out);
            }
        }

        if self.accepts_event_stream(req) {
            settings.handler.on_upgrade(req, SSE_PROTOCOL, out);
            return Branch::EventStream;
        }

        if let Some(root) = &settings.public_folder {
            if self.transmitter.attempt(req, root, &req.path, out) == Transmit::Handled {
                return Branch::Static;
            }
        }

        settings.handler.on_request(req, out);
        Branch::Application
    }

    // `token` is an extra reference to the header value, held until return so
    // the callback's slice stays valid even if the handler clears the headers.
    fn upgrade(
        &self,
        req: &mut Request,
        token: Atom,
        settings: &Settings,
        out: &mut dyn Transport,
    ) -> Branch {
        req.upgrade = Some(token.clone());

        if token.as_bytes().starts_with(b"h2") {
            tracing::debug!(protocol = %token, "Refusing cleartext HTTP/2 upgrade");
            return self.reject(req, StatusCode::BadRequest, out);
        }

        settings.handler.on_upgrade(req, token.as_bytes(), out);
        Branch::Upgrade
    }

    fn accepts_event_stream(&self, req: &Request) -> bool {
        let accept = self.headers.get(Canonical::Accept);
        let sse = self.headers.get(Canonical::EventStream);
        matches!(req.headers.get(accept), Some(HeaderValue::Single(value)) if value == sse)
    }

    fn reject(&self, req: &Request, status: StatusCode, out: &mut dyn Transport) -> Branch {
        if let Err(e) = error::respond(req, status, out) {
            tracing::warn!(status = status.as_u16(), error = %e, "Failed to send error response");
        }
        Branch::Rejected(status)
    }
}

/// The branch a client-mode response took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseBranch {
    Response,
    Upgrade,
}

pub struct ResponseDispatcher {
    headers: Arc<HeaderRegistry>,
}

impl ResponseDispatcher {
    pub fn new(headers: Arc<HeaderRegistry>) -> Self {
        Self { headers }
    }

    /// Routes a received response to `on_response`, or to `on_upgrade` when
    /// it carries an Upgrade header.
    pub fn dispatch(&self, res: &mut Request, settings: &Settings, out: &mut dyn Transport) -> ResponseBranch {
        res.udata = settings.udata.clone();

        let upgrade = self.headers.get(Canonical::Upgrade);
        let token = res.headers.get(upgrade).and_then(HeaderValue::last).cloned();
        match token {
            None => {
                settings.handler.on_response(res);
                ResponseBranch::Response
            }
            Some(token) => {
                res.upgrade = Some(token.clone());
                settings.handler.on_upgrade(res, token.as_bytes(), out);
                ResponseBranch::Upgrade
            }
        }
    }
}
