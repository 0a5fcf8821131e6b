use thiserror::Error;

use crate::http::atom::Atom;
use crate::http::headers::{HeaderMap, HeaderRegistry};
use crate::http::request::{Method, Request};
use crate::http::response::StatusCode;

/// Upper bound on the request line plus headers.
pub const MAX_HEADER_BYTES: usize = 64 * 1024;

/// Upper bound on a message body, declared or read to end of stream.
pub const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed start line")]
    InvalidRequest,
    #[error("unknown method")]
    InvalidMethod,
    #[error("malformed header line")]
    InvalidHeader,
    #[error("invalid content-length")]
    InvalidContentLength,
    #[error("invalid status line")]
    InvalidStatus,
    #[error("header section exceeds 64 KiB")]
    HeadersTooLarge,
    #[error("body exceeds 8 MiB")]
    BodyTooLarge,
    #[error("message incomplete")]
    Incomplete,
}

/// Parses one request from the front of `buf`.
///
/// Header names are lowercased and interned through `registry`; a repeated
/// header keeps every value in arrival order. Returns the request and the
/// number of bytes it occupied.
pub fn parse_http_request(
    buf: &[u8],
    registry: &HeaderRegistry,
) -> Result<(Request, usize), ParseError> {
    let (head, headers_end) = split_head(buf)?;
    let mut lines = head.split("\r\n");

    // Request line
    let request_line = lines.next().ok_or(ParseError::InvalidRequest)?;
    let mut parts = request_line.split_whitespace();

    let method_str = parts.next().ok_or(ParseError::InvalidRequest)?;
    let path = parts.next().ok_or(ParseError::InvalidRequest)?;
    let version = parts.next().ok_or(ParseError::InvalidRequest)?;

    let method = Method::from_str(method_str).ok_or(ParseError::InvalidMethod)?;
    let headers = parse_headers(lines, registry)?;
    let (body, consumed) = take_body(buf, headers_end, &headers)?;

    let request = Request {
        method,
        path: path.to_string(),
        version: version.to_string(),
        headers,
        body,
        status: None,
        udata: None,
        upgrade: None,
    };

    Ok((request, consumed))
}

/// Parses one response from the front of `buf` for the request `sent`.
///
/// The result reuses `sent`'s method and path; `status` and `headers` come
/// from the wire. A body without content-length runs to end of stream, so it
/// stays `Incomplete` until `eof` is set.
pub fn parse_http_response(
    buf: &[u8],
    sent: &Request,
    registry: &HeaderRegistry,
    eof: bool,
) -> Result<(Request, usize), ParseError> {
    let (head, headers_end) = split_head(buf)?;
    let mut lines = head.split("\r\n");

    let status_line = lines.next().ok_or(ParseError::InvalidStatus)?;
    let mut parts = status_line.splitn(3, ' ');
    let version = parts.next().ok_or(ParseError::InvalidStatus)?;
    let code: u16 = parts
        .next()
        .and_then(|code| code.parse().ok())
        .ok_or(ParseError::InvalidStatus)?;

    let status = StatusCode::from_u16(code);
    let headers = parse_headers(lines, registry)?;
    let delimited = headers.get_str("content-length").is_some()
        || status.forbids_body()
        || sent.method == Method::HEAD;
    let (body, consumed) = if delimited {
        take_body(buf, headers_end, &headers)?
    } else if buf.len() - (headers_end + 4) > MAX_BODY_BYTES {
        return Err(ParseError::BodyTooLarge);
    } else if eof {
        (buf[headers_end + 4..].to_vec(), buf.len())
    } else {
        return Err(ParseError::Incomplete);
    };

    let response = Request {
        method: sent.method.clone(),
        path: sent.path.clone(),
        version: version.to_string(),
        headers,
        body,
        status: Some(status),
        udata: None,
        upgrade: None,
    };

    Ok((response, consumed))
}

fn split_head(buf: &[u8]) -> Result<(&str, usize), ParseError> {
    // Look for header/body separator
    let headers_end = match find_headers_end(buf) {
        Some(end) => end,
        None if buf.len() > MAX_HEADER_BYTES => return Err(ParseError::HeadersTooLarge),
        None => return Err(ParseError::Incomplete),
    };
    if headers_end > MAX_HEADER_BYTES {
        return Err(ParseError::HeadersTooLarge);
    }

    let head = std::str::from_utf8(&buf[..headers_end])
        .map_err(|_| ParseError::InvalidRequest)?;
    Ok((head, headers_end))
}

fn parse_headers<'a>(
    lines: impl Iterator<Item = &'a str>,
    registry: &HeaderRegistry,
) -> Result<HeaderMap, ParseError> {
    let mut headers = HeaderMap::new();

    for line in lines {
        if line.is_empty() {
            continue;
        }

        let (key, value) = line
            .split_once(':')
            .ok_or(ParseError::InvalidHeader)?;

        let key = key.trim();
        if key.is_empty() {
            return Err(ParseError::InvalidHeader);
        }

        headers.append(
            registry.intern(&key.to_ascii_lowercase()),
            Atom::new(value.trim()),
        );
    }

    Ok(headers)
}

fn take_body(
    buf: &[u8],
    headers_end: usize,
    headers: &HeaderMap,
) -> Result<(Vec<u8>, usize), ParseError> {
    let body_bytes = &buf[headers_end + 4..];

    let content_length = headers
        .get_str("content-length")
        .and_then(|v| v.last())
        .map(|v| v.as_str().parse::<usize>().map_err(|_| ParseError::InvalidContentLength))
        .transpose()?
        .unwrap_or(0);

    // Refuse before buffering so a huge declared length cannot grow the buffer.
    if content_length > MAX_BODY_BYTES {
        return Err(ParseError::BodyTooLarge);
    }
    if body_bytes.len() < content_length {
        return Err(ParseError::Incomplete);
    }

    let body = body_bytes[..content_length].to_vec();
    Ok((body, headers_end + 4 + content_length))
}

fn find_headers_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4)
        .position(|w| w == b"\r\n\r\n")
}
