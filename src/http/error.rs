//! Error responses.
//!
//! [`respond`] answers a parsed request with a status page. [`send_error`]
//! reports an error on a connection that may not have a request yet (for
//! example a malformed request line) and always closes it afterwards.

use thiserror::Error;

use crate::http::dispatch::Settings;
use crate::http::request::Request;
use crate::http::response::{Response, StatusCode};
use crate::http::transport::{Transport, TransportError};

#[derive(Debug, Error)]
pub enum ErrorReportError {
    #[error("status code must be non-zero")]
    InvalidStatus,
    #[error("no connection to report the error on")]
    MissingConnection,
    #[error("no listener settings for the connection")]
    MissingSettings,
    #[error("error response could not be sent: {0}")]
    Send(#[from] TransportError),
}

/// Sends an error page for `status` on a connection without a live request.
///
/// Nothing is sent and the connection is left as it was when any argument is
/// missing or `status` is zero. Otherwise the connection is closed whether or
/// not the send succeeded.
pub fn send_error(
    status: u16,
    conn: Option<&mut dyn Transport>,
    settings: Option<&Settings>,
) -> Result<(), ErrorReportError> {
    if status == 0 {
        return Err(ErrorReportError::InvalidStatus);
    }
    let conn = conn.ok_or(ErrorReportError::MissingConnection)?;
    let settings = settings.ok_or(ErrorReportError::MissingSettings)?;

    let status = StatusCode::from_u16(status);
    let mut response = Response::error(status);
    response
        .headers
        .insert("connection".to_string(), "close".to_string());

    let sent = conn.send(response);
    conn.close();

    if let Err(e) = &sent {
        tracing::warn!(
            status = status.as_u16(),
            public_folder = ?settings.public_folder,
            error = %e,
            "Failed to send error report"
        );
    }
    sent.map_err(ErrorReportError::from)
}

/// Answers `req` with an error page for `status`.
///
/// The connection stays open unless the request asked to close it.
pub fn respond(
    req: &Request,
    status: StatusCode,
    out: &mut dyn Transport,
) -> Result<(), TransportError> {
    let mut response = Response::error(status);
    if !req.keep_alive() {
        response
            .headers
            .insert("connection".to_string(), "close".to_string());
    }

    tracing::debug!(
        status = status.as_u16(),
        method = req.method.as_str(),
        path = %req.path,
        "Sending error response"
    );
    out.send(response)
}
