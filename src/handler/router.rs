//! Request dispatch module
//!
//! Entry point for HTTP request processing. The gate does blocking file I/O,
//! so each request runs on tokio's blocking pool and the connection task only
//! awaits the finished response.

use crate::config::AppState;
use crate::gate::Outcome;
use crate::handler::fallback;
use crate::http::ResponseWriter;
use crate::logger::{self, AccessLogEntry};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Request, Response, Version};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Main entry point for HTTP request handling
///
/// Only the method and the request target are consulted; the body is never read.
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let method = req.method().as_str().to_string();
    let raw_uri = req.uri().to_string();

    let mut entry = state
        .access_log
        .then(|| access_entry(&req, peer_addr, &method, &raw_uri));
    drop(req);

    let task_state = Arc::clone(&state);
    let task_method = method.clone();
    let task_uri = raw_uri.clone();
    let (writer, gate) = match tokio::task::spawn_blocking(move || {
        dispatch(&task_state, &task_method, &task_uri)
    })
    .await
    {
        Ok(done) => done,
        Err(e) => {
            logger::log_error(&format!("Gate task failed for {method} {raw_uri}: {e}"));
            (fallback::internal_error(), "error")
        }
    };

    if let Some(entry) = entry.as_mut() {
        entry.status = writer.status().as_u16();
        entry.body_bytes = writer.body().len();
        entry.content_type = writer.header("content-type").map(ToString::to_string);
        entry.gate = gate;
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(entry, &state.config.logging.access_log_format);
    }

    Ok(writer.into_response())
}

/// Run the gate and, if it declines, the host fallback
///
/// Never fails: a read error becomes a 500 that still carries CORS headers.
/// Returns the finished response and its access-log label.
pub fn dispatch(state: &AppState, method: &str, raw_uri: &str) -> (ResponseWriter, &'static str) {
    let mut writer = ResponseWriter::new();

    let result = state
        .gate
        .run(method, raw_uri, &mut writer)
        .and_then(|outcome| match outcome {
            Outcome::Handled if method == "OPTIONS" => Ok("preflight"),
            Outcome::Handled => Ok("served"),
            Outcome::Declined(reason) => {
                fallback::handle_decline(state, method, raw_uri, reason, &mut writer)
            }
        });

    match result {
        Ok(gate) => {
            logger::log_debug(&format!("{method} {raw_uri} -> {gate}"));
            (writer, gate)
        }
        Err(e) => {
            logger::log_error(&format!("{method} {raw_uri}: {e}"));
            (fallback::internal_error(), "error")
        }
    }
}

fn access_entry<B>(
    req: &Request<B>,
    peer_addr: SocketAddr,
    method: &str,
    raw_uri: &str,
) -> AccessLogEntry {
    let header = |name: &str| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string)
    };

    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        method.to_string(),
        raw_uri.to_string(),
    );
    entry.http_version = version_label(req.version()).to_string();
    entry.referer = header("referer");
    entry.user_agent = header("user-agent");
    entry
}

fn version_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}
