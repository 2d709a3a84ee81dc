//! HTTP response building module
//!
//! Provides the `ResponseWriter` that the gate and the host fallback write into,
//! plus plain-text status pages for declined requests.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use hyper::{HeaderMap, Response, StatusCode};
use thiserror::Error;

/// Errors raised when a response is written out of order
#[derive(Debug, Error)]
pub enum ResponseError {
    /// Headers and status are frozen once the first body byte is written.
    #[error("cannot set '{name}': response body already started")]
    HeadersSent { name: String },
}

/// Response under construction for a single request
///
/// Headers and status may be changed until the body starts. After that any
/// attempt to touch them fails with [`ResponseError::HeadersSent`], the same
/// constraint a streaming host server imposes.
#[derive(Debug)]
pub struct ResponseWriter {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
    body_started: bool,
}

impl ResponseWriter {
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Vec::new(),
            body_started: false,
        }
    }

    /// Finished plain-text status page on top of `headers`
    ///
    /// Builds the whole response at once, so nothing can be out of order.
    pub fn status_page(status: StatusCode, mut headers: HeaderMap) -> Self {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        Self {
            status,
            headers,
            body: status_text(status).into_bytes(),
            body_started: true,
        }
    }

    /// Set (or replace) a response header
    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) -> Result<(), ResponseError> {
        if self.body_started {
            return Err(ResponseError::HeadersSent {
                name: name.as_str().to_string(),
            });
        }
        self.headers.insert(name, value);
        Ok(())
    }

    pub fn set_status(&mut self, status: StatusCode) -> Result<(), ResponseError> {
        if self.body_started {
            return Err(ResponseError::HeadersSent {
                name: ":status".to_string(),
            });
        }
        self.status = status;
        Ok(())
    }

    /// Append bytes to the body, freezing headers and status
    pub fn write_body(&mut self, chunk: &[u8]) {
        self.body_started = true;
        self.body.extend_from_slice(chunk);
    }

    pub const fn status(&self) -> StatusCode {
        self.status
    }

    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Header value as a string, if present and visible ASCII
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub const fn body_started(&self) -> bool {
        self.body_started
    }

    /// Finish the response for hyper
    pub fn into_response(self) -> Response<Full<Bytes>> {
        let mut response = Response::new(Full::new(Bytes::from(self.body)));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

impl Default for ResponseWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Write a plain-text status page such as `404 Not Found`
pub fn write_status_page(writer: &mut ResponseWriter, status: StatusCode) -> Result<(), ResponseError> {
    writer.set_status(status)?;
    writer.set_header(CONTENT_TYPE, HeaderValue::from_static("text/plain"))?;
    writer.write_body(status_text(status).as_bytes());
    Ok(())
}

fn status_text(status: StatusCode) -> String {
    format!(
        "{} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown")
    )
}
