//! Client mode: send one request and dispatch the response.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use url::Url;

use crate::http::atom::Atom;
use crate::http::dispatch::{ResponseBranch, ResponseDispatcher, Settings};
use crate::http::headers::{Canonical, HeaderRegistry};
use crate::http::parser::{parse_http_response, ParseError};
use crate::http::request::Request;
use crate::http::transport::Outbox;
use crate::http::writer::serialize_request;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// A response received in client mode and the branch it took.
#[derive(Debug)]
pub struct Exchange {
    pub response: Request,
    pub branch: ResponseBranch,
}

pub struct Client {
    headers: Arc<HeaderRegistry>,
    dispatcher: ResponseDispatcher,
    settings: Settings,
}

impl Client {
    pub fn new(headers: Arc<HeaderRegistry>, settings: Settings) -> Self {
        let dispatcher = ResponseDispatcher::new(Arc::clone(&headers));
        Self {
            headers,
            dispatcher,
            settings,
        }
    }

    /// Sends `request` to `url` and routes the response through
    /// [`ResponseDispatcher`].
    ///
    /// `request.path` is replaced by the URL's path and query, and a Host
    /// header is added when missing.
    pub async fn exchange(&self, url: &Url, mut request: Request) -> anyhow::Result<Exchange> {
        let host = url.host_str().context("URL missing host")?;
        let port = url.port_or_known_default().unwrap_or(80);

        request.path = match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        };
        let host_name = self.headers.get(Canonical::Host);
        if !request.headers.contains(host_name) {
            let value = match url.port() {
                Some(port) => format!("{}:{}", host, port),
                None => host.to_string(),
            };
            request.headers.insert(host_name.clone(), Atom::from(value));
        }

        let addr = format!("{}:{}", host, port);
        let mut stream = timeout(CONNECT_TIMEOUT, TcpStream::connect(&addr))
            .await
            .context("Connection timeout")?
            .with_context(|| format!("Failed to connect to {}", addr))?;

        stream.write_all(&serialize_request(&request)).await?;
        stream.flush().await?;
        tracing::trace!(%addr, path = %request.path, "Request sent");

        let mut response = self.read_response(&mut stream, &request).await?;

        let mut outbox = Outbox::new();
        let branch = self.dispatcher.dispatch(&mut response, &self.settings, &mut outbox);
        if !outbox.is_empty() {
            tracing::debug!(queued = outbox.responses().len(), "Discarding responses queued in client mode");
        }

        Ok(Exchange { response, branch })
    }

    async fn read_response(&self, stream: &mut TcpStream, sent: &Request) -> anyhow::Result<Request> {
        let mut buffer = BytesMut::with_capacity(8192);
        let mut eof = false;

        loop {
            match parse_http_response(&buffer, sent, &self.headers, eof) {
                Ok((response, _)) => return Ok(response),
                Err(ParseError::Incomplete) if !eof => {}
                Err(ParseError::Incomplete) => {
                    anyhow::bail!("Connection closed before complete response received")
                }
                Err(e) => return Err(e).context("Invalid response"),
            }

            let n = stream.read_buf(&mut buffer).await?;
            eof = n == 0;
        }
    }
}
