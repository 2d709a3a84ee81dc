//! MIME type detection module
//!
//! Content types are produced by a [`MimeDetector`] queried with a file path.
//! Two detectors ship with the crate: [`SniffingDetector`] inspects the leading
//! bytes of the file, [`ExtensionDetector`] maps the file extension.

use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Bytes read from the head of a file for sniffing
pub const SNIFF_LEN: u64 = 512;

/// Type reported for a zero-length file
pub const EMPTY: &str = "application/x-empty";

/// Detects the content type of a file on disk
///
/// `None` means no usable type; callers serve the file without a
/// `Content-Type` header in that case.
pub trait MimeDetector: Send + Sync {
    fn detect(&self, path: &Path) -> Option<String>;
}

impl<F> MimeDetector for F
where
    F: Fn(&Path) -> Option<String> + Send + Sync,
{
    fn detect(&self, path: &Path) -> Option<String> {
        self(path)
    }
}

/// Content sniffing on magic bytes and markup prefixes
#[derive(Debug, Default, Clone, Copy)]
pub struct SniffingDetector;

impl MimeDetector for SniffingDetector {
    fn detect(&self, path: &Path) -> Option<String> {
        let mut head = Vec::with_capacity(SNIFF_LEN as usize);
        File::open(path)
            .and_then(|f| f.take(SNIFF_LEN).read_to_end(&mut head))
            .ok()?;
        Some(sniff(&head).to_string())
    }
}

/// Extension lookup, for deployments that prefer it over sniffing
#[derive(Debug, Default, Clone, Copy)]
pub struct ExtensionDetector;

impl MimeDetector for ExtensionDetector {
    fn detect(&self, path: &Path) -> Option<String> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        get_content_type(&extension).map(ToString::to_string)
    }
}

/// Fixed-offset magic numbers
const SIGNATURES: &[(&[u8], &str)] = &[
    (b"\x89PNG\r\n\x1a\n", "image/png"),
    (b"\xFF\xD8\xFF", "image/jpeg"),
    (b"GIF87a", "image/gif"),
    (b"GIF89a", "image/gif"),
    (b"\x00\x00\x01\x00", "image/vnd.microsoft.icon"),
    (b"%PDF-", "application/pdf"),
    (b"PK\x03\x04", "application/zip"),
    (b"\x1F\x8B", "application/gzip"),
    (b"7z\xBC\xAF\x27\x1C", "application/x-7z-compressed"),
    (b"\x00asm", "application/wasm"),
    (b"OggS", "audio/ogg"),
    (b"fLaC", "audio/flac"),
    (b"ID3", "audio/mpeg"),
    (b"\x1A\x45\xDF\xA3", "video/webm"),
    (b"wOFF", "font/woff"),
    (b"wOF2", "font/woff2"),
    (b"OTTO", "font/otf"),
    (b"\x00\x01\x00\x00\x00", "font/ttf"),
];

/// Sniff a content type from the leading bytes of a file
///
/// Empty input is `application/x-empty`, as libmagic reports it.
///
/// # Examples
/// ```
/// use corsgate::http::mime::sniff;
/// assert_eq!(sniff(b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR"), "image/png");
/// assert_eq!(sniff(b"hello world\n"), "text/plain");
/// assert_eq!(sniff(b""), "application/x-empty");
/// ```
pub fn sniff(head: &[u8]) -> &'static str {
    if head.is_empty() {
        return EMPTY;
    }

    if let Some(&(_, mime)) = SIGNATURES.iter().find(|(magic, _)| head.starts_with(magic)) {
        return mime;
    }

    if let Some(mime) = sniff_container(head) {
        return mime;
    }

    if head.contains(&0) {
        return "application/octet-stream";
    }

    if let Some(mime) = sniff_markup(head) {
        return mime;
    }

    match std::str::from_utf8(head) {
        Ok(_) => "text/plain",
        // A multi-byte character cut off by the sniff window is still text
        Err(e) if e.error_len().is_none() => "text/plain",
        Err(_) => "application/octet-stream",
    }
}

/// RIFF, ISO-BMFF and tar have their markers past offset zero
fn sniff_container(head: &[u8]) -> Option<&'static str> {
    if head.len() >= 12 && &head[0..4] == b"RIFF" {
        return match &head[8..12] {
            b"WEBP" => Some("image/webp"),
            b"WAVE" => Some("audio/wav"),
            b"AVI " => Some("video/x-msvideo"),
            _ => None,
        };
    }

    if head.len() >= 12 && &head[4..8] == b"ftyp" {
        return match &head[8..12] {
            b"qt  " => Some("video/quicktime"),
            b"M4A " => Some("audio/mp4"),
            b"avif" => Some("image/avif"),
            _ => Some("video/mp4"),
        };
    }

    if head.len() >= 262 && &head[257..262] == b"ustar" {
        return Some("application/x-tar");
    }

    None
}

const HTML_PREFIXES: &[&[u8]] = &[b"<!doctype html", b"<html", b"<head", b"<body"];

fn starts_with_ci(text: &[u8], prefix: &[u8]) -> bool {
    text.len() >= prefix.len() && text[..prefix.len()].eq_ignore_ascii_case(prefix)
}

fn sniff_markup(head: &[u8]) -> Option<&'static str> {
    let text = head.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(head);
    let start = text.iter().position(|b| !b.is_ascii_whitespace())?;
    let text = &text[start..];

    if HTML_PREFIXES.iter().any(|p| starts_with_ci(text, p)) {
        return Some("text/html");
    }
    if starts_with_ci(text, b"<svg") {
        return Some("image/svg+xml");
    }
    if starts_with_ci(text, b"<?xml") {
        let has_svg = text.windows(4).any(|w| w.eq_ignore_ascii_case(b"<svg"));
        return Some(if has_svg { "image/svg+xml" } else { "text/xml" });
    }
    None
}

/// Get MIME Content-Type based on a lower-case file extension
///
/// # Examples
/// ```
/// use corsgate::http::mime::get_content_type;
/// assert_eq!(get_content_type("html"), Some("text/html; charset=utf-8"));
/// assert_eq!(get_content_type("mp4"), Some("video/mp4"));
/// assert_eq!(get_content_type("xyz"), None);
/// ```
pub fn get_content_type(extension: &str) -> Option<&'static str> {
    let mime = match extension {
        // Text
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css",
        "txt" | "md" => "text/plain; charset=utf-8",
        "xml" => "application/xml",

        // JavaScript/WASM
        "js" | "mjs" => "application/javascript",
        "json" => "application/json",
        "wasm" => "application/wasm",

        // Images
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "webp" => "image/webp",

        // Video
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "ogg" | "ogv" => "video/ogg",
        "mov" => "video/quicktime",
        "avi" => "video/x-msvideo",

        // Audio
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "flac" => "audio/flac",
        "m4a" => "audio/mp4",

        // Fonts
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "otf" => "font/otf",
        "eot" => "application/vnd.ms-fontobject",

        // Documents
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "gz" | "gzip" => "application/gzip",
        "tar" => "application/x-tar",

        _ => return None,
    };
    Some(mime)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_images() {
        assert_eq!(sniff(b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR"), "image/png");
        assert_eq!(sniff(b"\xFF\xD8\xFF\xE0\0\x10JFIF"), "image/jpeg");
        assert_eq!(sniff(b"GIF89a\x01\0\x01\0"), "image/gif");
        assert_eq!(sniff(b"RIFF\x24\0\0\0WEBPVP8 "), "image/webp");
    }

    #[test]
    fn test_sniff_media_and_documents() {
        assert_eq!(sniff(b"RIFF\x24\0\0\0WAVEfmt "), "audio/wav");
        assert_eq!(sniff(b"\0\0\0\x18ftypisom\0\0\x02\0"), "video/mp4");
        assert_eq!(sniff(b"%PDF-1.7\n"), "application/pdf");
        assert_eq!(sniff(b"\0asm\x01\0\0\0"), "application/wasm");
    }

    #[test]
    fn test_sniff_tar() {
        let mut head = vec![b'a'; 512];
        head[257..262].copy_from_slice(b"ustar");
        assert_eq!(sniff(&head), "application/x-tar");
    }

    #[test]
    fn test_sniff_markup() {
        assert_eq!(sniff(b"\n  <!DOCTYPE html><html>"), "text/html");
        assert_eq!(sniff(b"<HTML><body>hi</body></HTML>"), "text/html");
        assert_eq!(
            sniff(b"<?xml version=\"1.0\"?>\n<svg xmlns=\"http://www.w3.org/2000/svg\"/>"),
            "image/svg+xml"
        );
        assert_eq!(sniff(b"<?xml version=\"1.0\"?><feed/>"), "text/xml");
        assert_eq!(sniff(b"\xEF\xBB\xBF<svg></svg>"), "image/svg+xml");
    }

    #[test]
    fn test_sniff_text_and_binary() {
        assert_eq!(sniff("body { color: red; }".as_bytes()), "text/plain");
        assert_eq!(sniff("héllo".as_bytes()), "text/plain");
        // Truncated multi-byte sequence at the end of the window
        assert_eq!(sniff(b"caf\xC3"), "text/plain");
        assert_eq!(sniff(b"\x01\x02\x00\x03"), "application/octet-stream");
        assert_eq!(sniff(b"\xFF\xFE\xFD"), "application/octet-stream");
        assert_eq!(sniff(b""), EMPTY);
    }

    #[test]
    fn test_common_types() {
        assert_eq!(get_content_type("html"), Some("text/html; charset=utf-8"));
        assert_eq!(get_content_type("css"), Some("text/css"));
        assert_eq!(get_content_type("js"), Some("application/javascript"));
        assert_eq!(get_content_type("png"), Some("image/png"));
    }

    #[test]
    fn test_unknown_extension() {
        assert_eq!(get_content_type("xyz"), None);
    }

    #[test]
    fn test_detectors_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let png = dir.path().join("LOGO.PNG");
        std::fs::write(&png, b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR").unwrap();
        let empty = dir.path().join("empty.bin");
        std::fs::write(&empty, b"").unwrap();

        assert_eq!(SniffingDetector.detect(&png).as_deref(), Some("image/png"));
        assert_eq!(SniffingDetector.detect(&empty).as_deref(), Some("application/x-empty"));
        assert_eq!(SniffingDetector.detect(&dir.path().join("missing")), None);

        assert_eq!(ExtensionDetector.detect(&png).as_deref(), Some("image/png"));
        assert_eq!(ExtensionDetector.detect(&empty), None);
    }

    #[test]
    fn test_closure_detector() {
        let fixed = |_: &Path| Some("application/x-test".to_string());
        assert_eq!(
            fixed.detect(Path::new("/nowhere")).as_deref(),
            Some("application/x-test")
        );
    }
}
