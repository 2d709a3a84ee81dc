//! Host fallback for declined requests
//!
//! The gate never writes a 404 body or runs scripts. Declined requests land
//! here: directories get an index file lookup, scripts get the configured
//! policy, everything else a plain 404. Responses are written on the same
//! writer, so the gate's CORS headers stay.

use crate::config::{AppState, ScriptPolicy};
use crate::gate::{cors, path, DeclineReason, GateError, Outcome};
use crate::http::{write_status_page, ResponseWriter};
use hyper::StatusCode;

/// Apply host handling for a declined request
///
/// Returns the access-log label for how the request ended.
pub fn handle_decline(
    state: &AppState,
    method: &str,
    raw_uri: &str,
    reason: DeclineReason,
    writer: &mut ResponseWriter,
) -> Result<&'static str, GateError> {
    match reason {
        DeclineReason::Script => {
            write_status_page(writer, script_status(state.config.fallback.script_policy))?;
            Ok("script")
        }
        DeclineReason::NotFound => {
            if let Some(index_uri) = find_index(state, raw_uri) {
                match state.gate.run(method, &index_uri, writer)? {
                    Outcome::Handled => return Ok("index"),
                    Outcome::Declined(DeclineReason::Script) => {
                        write_status_page(writer, script_status(state.config.fallback.script_policy))?;
                        return Ok("script");
                    }
                    Outcome::Declined(DeclineReason::NotFound) => {}
                }
            }
            write_status_page(writer, StatusCode::NOT_FOUND)?;
            Ok("not_found")
        }
    }
}

const fn script_status(policy: ScriptPolicy) -> StatusCode {
    match policy {
        ScriptPolicy::Forbidden => StatusCode::FORBIDDEN,
        ScriptPolicy::NotFound => StatusCode::NOT_FOUND,
    }
}

/// Request URI of the first configured index file inside a directory path
fn find_index(state: &AppState, raw_uri: &str) -> Option<String> {
    let dir = state.gate.resolve(raw_uri);
    if !dir.is_dir() {
        return None;
    }

    let base = path::request_path(raw_uri).trim_end_matches('/');
    state
        .config
        .fallback
        .index_files
        .iter()
        .find(|name| dir.join(name).is_file())
        .map(|name| format!("{base}/{name}"))
}

/// Fresh 500 response that still carries the CORS headers
pub fn internal_error() -> ResponseWriter {
    ResponseWriter::status_page(StatusCode::INTERNAL_SERVER_ERROR, cors::cors_headers())
}
