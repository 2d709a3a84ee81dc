//! Cross-origin headers written at the start of every gate invocation

use crate::http::{ResponseError, ResponseWriter};
use hyper::header::{
    HeaderMap, HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN,
};

pub const ALLOW_ORIGIN: &str = "*";
pub const ALLOW_METHODS: &str = "GET, POST, OPTIONS";
pub const ALLOW_HEADERS: &str = "Content-Type";

/// Set the three CORS headers, replacing any previous values
pub fn apply_cors_headers(writer: &mut ResponseWriter) -> Result<(), ResponseError> {
    writer.set_header(
        ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static(ALLOW_ORIGIN),
    )?;
    writer.set_header(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOW_METHODS),
    )?;
    writer.set_header(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOW_HEADERS),
    )
}

/// The same three headers as a fresh map, for responses built in one piece
pub fn cors_headers() -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(3);
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static(ALLOW_ORIGIN));
    headers.insert(ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static(ALLOW_METHODS));
    headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static(ALLOW_HEADERS));
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cors_headers_set() {
        let mut writer = ResponseWriter::new();
        apply_cors_headers(&mut writer).unwrap();
        assert_eq!(writer.header("access-control-allow-origin"), Some("*"));
        assert_eq!(
            writer.header("access-control-allow-methods"),
            Some("GET, POST, OPTIONS")
        );
        assert_eq!(
            writer.header("access-control-allow-headers"),
            Some("Content-Type")
        );
    }

    #[test]
    fn test_cors_idempotent() {
        let mut writer = ResponseWriter::new();
        apply_cors_headers(&mut writer).unwrap();
        apply_cors_headers(&mut writer).unwrap();
        assert_eq!(writer.headers().len(), 3);
    }

    #[test]
    fn test_cors_header_map_matches_writer() {
        let mut writer = ResponseWriter::new();
        apply_cors_headers(&mut writer).unwrap();
        assert_eq!(&cors_headers(), writer.headers());
    }
}
