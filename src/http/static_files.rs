//! Public folder file transmitter.
//!
//! Serves GET and HEAD requests straight from disk. Anything it cannot or
//! should not serve is declined so dispatch falls through to the
//! application handler.

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use crate::http::dispatch::{FileTransmitter, Transmit};
use crate::http::headers::{Canonical, HeaderRegistry};
use crate::http::mime::MimeRegistry;
use crate::http::request::{Method, Request};
use crate::http::response::{ResponseBuilder, StatusCode};
use crate::http::transport::Transport;

const INDEX_FILE: &str = "index.html";

pub struct PublicFolder {
    headers: Arc<HeaderRegistry>,
    mime: Arc<MimeRegistry>,
}

impl PublicFolder {
    pub fn new(headers: Arc<HeaderRegistry>, mime: Arc<MimeRegistry>) -> Self {
        Self { headers, mime }
    }

    /// Maps a request path onto a file below `root`.
    ///
    /// Returns `None` for paths that would escape `root`.
    pub fn resolve(root: &Path, path: &str) -> Option<PathBuf> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let mut resolved = root.to_path_buf();

        for component in Path::new(path.trim_start_matches('/')).components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
            }
        }

        if path.is_empty() || path.ends_with('/') {
            resolved.push(INDEX_FILE);
        }
        Some(resolved)
    }

    fn accepts_gzip(&self, req: &Request) -> bool {
        let name = self.headers.get(Canonical::AcceptEncoding);
        let gzip = self.headers.get(Canonical::Gzip).as_str();
        req.headers
            .get(name)
            .is_some_and(|value| value.iter().any(|v| v.as_str().contains(gzip)))
    }

    fn content_type(&self, file: &Path) -> String {
        self.mime
            .lookup_path(file)
            .unwrap_or_else(|| self.headers.get(Canonical::ContentTypeDefault).clone())
            .to_string()
    }
}

impl FileTransmitter for PublicFolder {
    fn attempt(&self, req: &Request, root: &Path, path: &str, out: &mut dyn Transport) -> Transmit {
        if !matches!(req.method, Method::GET | Method::HEAD) {
            return Transmit::Declined;
        }

        let Some(file) = Self::resolve(root, path) else {
            tracing::debug!(path, "Rejected path outside public folder");
            return Transmit::Declined;
        };

        let mut served = file.clone();
        let mut encoding = None;
        if self.accepts_gzip(req) {
            let mut gz = file.clone().into_os_string();
            gz.push(".gz");
            let gz = PathBuf::from(gz);
            if gz.is_file() {
                served = gz;
                encoding = Some(self.headers.get(Canonical::Gzip));
            }
        }

        let body = match fs::read(&served) {
            Ok(body) => body,
            Err(e) => {
                tracing::trace!(file = %served.display(), error = %e, "Static file not served");
                return Transmit::Declined;
            }
        };

        let mut builder = ResponseBuilder::new(StatusCode::Ok)
            .header(Canonical::ContentType.as_str(), self.content_type(&file))
            .header(Canonical::ContentLength.as_str(), body.len().to_string())
            .header(
                Canonical::CacheControl.as_str(),
                self.headers.get(Canonical::MaxAge).as_str(),
            );
        if let Some(encoding) = encoding {
            builder = builder.header(Canonical::ContentEncoding.as_str(), encoding.as_str());
        }
        if !req.keep_alive() {
            builder = builder.header(
                Canonical::Connection.as_str(),
                self.headers.get(Canonical::Close).as_str(),
            );
        }
        if req.method == Method::GET {
            builder = builder.body(body);
        }

        match out.send(builder.build()) {
            Ok(()) => {
                tracing::debug!(file = %served.display(), "Served static file");
                Transmit::Handled
            }
            Err(e) => {
                // Connection is gone; nothing else can be sent on it.
                tracing::warn!(file = %served.display(), error = %e, "Failed to send static file");
                Transmit::Handled
            }
        }
    }
}
