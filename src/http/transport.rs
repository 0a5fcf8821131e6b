//! The sending side of a connection as seen by synchronous dispatch code.
//!
//! Dispatch, the error responder and the file transmitter never touch a
//! socket. They hand finished responses to a [`Transport`]; the async
//! connection drains its [`Outbox`] to the stream afterwards.

use thiserror::Error;

use crate::http::response::Response;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connection is closed")]
    Closed,
    #[error("transport I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

pub trait Transport {
    /// Queues `response` for delivery.
    fn send(&mut self, response: Response) -> Result<(), TransportError>;

    /// Marks the connection for closing once queued responses are written.
    fn close(&mut self);

    fn is_open(&self) -> bool;
}

/// In-memory transport filled during dispatch.
#[derive(Debug, Default)]
pub struct Outbox {
    responses: Vec<Response>,
    closed: bool,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn responses(&self) -> &[Response] {
        &self.responses
    }

    /// Removes the queued responses, leaving the close flag untouched.
    pub fn take(&mut self) -> Vec<Response> {
        std::mem::take(&mut self.responses)
    }
}

impl Transport for Outbox {
    fn send(&mut self, response: Response) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        self.responses.push(response);
        Ok(())
    }

    fn close(&mut self) {
        self.closed = true;
    }

    fn is_open(&self) -> bool {
        !self.closed
    }
}
