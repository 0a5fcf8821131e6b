use std::sync::Arc;

use bytes::{Buf, BytesMut};
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;

use crate::http::error;
use crate::http::parser::{parse_http_request, ParseError};
use crate::http::request::Request;
use crate::http::response::StatusCode;
use crate::http::transport::Outbox;
use crate::http::writer::ResponseWriter;
use crate::server::ServerContext;

const READ_CHUNK: usize = 4096;

pub struct Connection {
    stream: TcpStream,
    buffer: BytesMut,
    state: ConnectionState,
    ctx: Arc<ServerContext>,
}

pub enum ConnectionState {
    Reading,
    Processing(Request),
    Writing(ResponseWriter, bool), // bool = keep_alive?
    Closed,
}

enum Incoming {
    Request(Request),
    Malformed(ParseError),
    Eof,
}

impl Connection {
    pub fn new(stream: TcpStream, ctx: Arc<ServerContext>) -> Self {
        Self {
            stream,
            buffer: BytesMut::with_capacity(READ_CHUNK),
            state: ConnectionState::Reading,
            ctx,
        }
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            self.state = match std::mem::replace(&mut self.state, ConnectionState::Closed) {
                ConnectionState::Reading => match self.read_request().await? {
                    Incoming::Request(req) => ConnectionState::Processing(req),
                    Incoming::Malformed(e) => self.reject_malformed(e),
                    Incoming::Eof => ConnectionState::Closed,
                },

                ConnectionState::Processing(mut req) => self.handle_request(&mut req),

                ConnectionState::Writing(mut writer, keep_alive) => {
                    writer.write_to_stream(&mut self.stream).await?;

                    if keep_alive {
                        ConnectionState::Reading // go back for next request
                    } else {
                        ConnectionState::Closed
                    }
                }

                ConnectionState::Closed => {
                    break;
                }
            };
        }

        Ok(())
    }

    async fn read_request(&mut self) -> anyhow::Result<Incoming> {
        loop {
            // Try parsing whatever we already have
            if !self.buffer.is_empty() {
                match parse_http_request(&self.buffer, &self.ctx.headers) {
                    Ok((request, consumed)) => {
                        self.buffer.advance(consumed);
                        return Ok(Incoming::Request(request));
                    }

                    Err(ParseError::Incomplete) => {
                        // Need more data → fall through to read
                    }

                    Err(e) => return Ok(Incoming::Malformed(e)),
                }
            }

            let n = self.stream.read_buf(&mut self.buffer).await?;

            if n == 0 {
                if !self.buffer.is_empty() {
                    tracing::debug!(buffered = self.buffer.len(), "Peer closed mid-request");
                }
                return Ok(Incoming::Eof);
            }
        }
    }

    fn handle_request(&self, req: &mut Request) -> ConnectionState {
        let mut outbox = Outbox::new();
        let branch = self
            .ctx
            .dispatcher
            .dispatch(req, &self.ctx.settings, &mut outbox);

        tracing::debug!(
            ?branch,
            method = req.method.as_str(),
            path = %req.path,
            "Request dispatched"
        );

        if outbox.is_empty() {
            tracing::debug!(path = %req.path, "No response queued, closing connection");
            return ConnectionState::Closed;
        }

        let keep_alive = !outbox.is_closed() && req.keep_alive();
        ConnectionState::Writing(ResponseWriter::batch(&outbox.take()), keep_alive)
    }

    fn reject_malformed(&self, e: ParseError) -> ConnectionState {
        tracing::debug!(error = %e, "Malformed request");

        let status = match e {
            ParseError::HeadersTooLarge => StatusCode::HeaderFieldsTooLarge,
            ParseError::BodyTooLarge => StatusCode::PayloadTooLarge,
            ParseError::InvalidMethod => StatusCode::NotImplemented,
            _ => StatusCode::BadRequest,
        };

        let mut outbox = Outbox::new();
        if let Err(err) = error::send_error(status.as_u16(), Some(&mut outbox), Some(&self.ctx.settings)) {
            tracing::warn!(error = %err, "Could not report malformed request");
        }
        ConnectionState::Writing(ResponseWriter::batch(&outbox.take()), false)
    }
}
