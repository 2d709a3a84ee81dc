//! Static asset gate
//!
//! Decides, for one request, whether to serve a file from the document root,
//! answer a CORS pre-flight, or decline so the host server applies its own
//! handling. The gate holds only read-only configuration and is shared
//! across requests behind an `Arc`.
//!
//! File I/O is blocking; the host runs the gate on tokio's blocking pool.
//! There is an accepted race between the regular-file check and the read:
//! a file removed in between surfaces as [`GateError::Read`] and is never
//! retried.

pub mod cors;
pub mod path;

use crate::config::{DetectorKind, GateConfig};
use crate::http::{ExtensionDetector, MimeDetector, ResponseError, ResponseWriter, SniffingDetector};
use crate::logger;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::StatusCode;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

use path::Confinement;

/// Errors that cross the gate boundary
#[derive(Debug, Error)]
pub enum GateError {
    /// The file passed the regular-file check but could not be read.
    #[error("failed to read '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The document root could not be canonicalized at startup.
    #[error("document root '{}' is not accessible: {source}", .path.display())]
    DocumentRoot {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Response(#[from] ResponseError),
}

/// Why the gate left a request to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclineReason {
    /// Path has a host-executed script extension
    Script,
    /// Missing path or not a regular file
    NotFound,
}

/// A file ready to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

/// Per-request decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Preflight,
    Decline(DeclineReason),
    Serve(Asset),
}

/// Terminal signal for the host server
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The response is complete
    Handled,
    /// Nothing was written beyond CORS headers; the host takes over
    Declined(DeclineReason),
}

pub struct StaticAssetGate {
    document_root: PathBuf,
    canonical_root: Option<PathBuf>,
    script_extensions: Vec<String>,
    detector: Arc<dyn MimeDetector>,
}

impl std::fmt::Debug for StaticAssetGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticAssetGate")
            .field("document_root", &self.document_root)
            .field("canonical_root", &self.canonical_root)
            .field("script_extensions", &self.script_extensions)
            .finish_non_exhaustive()
    }
}

impl StaticAssetGate {
    /// Gate with the unhardened defaults: `.php` guard, content sniffing,
    /// no root confinement
    pub fn new(document_root: impl Into<PathBuf>) -> Self {
        Self {
            document_root: document_root.into(),
            canonical_root: None,
            script_extensions: vec!["php".to_string()],
            detector: Arc::new(SniffingDetector),
        }
    }

    /// Build a gate from the `[gate]` configuration section
    pub fn from_config(config: &GateConfig) -> Result<Self, GateError> {
        let detector: Arc<dyn MimeDetector> = match config.mime_detector {
            DetectorKind::Sniff => Arc::new(SniffingDetector),
            DetectorKind::Extension => Arc::new(ExtensionDetector),
        };

        let gate = Self::new(&config.document_root)
            .with_script_extensions(&config.script_extensions)
            .with_detector(detector);

        if config.confine_to_root {
            gate.confined()
        } else {
            Ok(gate)
        }
    }

    #[must_use]
    pub fn with_detector(mut self, detector: Arc<dyn MimeDetector>) -> Self {
        self.detector = detector;
        self
    }

    /// Replace the script extension set (leading dots and case are ignored)
    #[must_use]
    pub fn with_script_extensions(mut self, extensions: &[String]) -> Self {
        self.script_extensions = extensions
            .iter()
            .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
            .collect();
        self
    }

    /// Refuse paths that resolve outside the document root
    ///
    /// Symlinks and `..` segments are resolved before the containment check.
    pub fn confined(mut self) -> Result<Self, GateError> {
        let canonical = self
            .document_root
            .canonicalize()
            .map_err(|source| GateError::DocumentRoot {
                path: self.document_root.clone(),
                source,
            })?;
        self.canonical_root = Some(canonical);
        Ok(self)
    }

    /// Resolved filesystem path for a raw request URI
    pub fn resolve(&self, raw_uri: &str) -> PathBuf {
        path::resolve(&self.document_root, path::request_path(raw_uri))
    }

    /// Decide what to do with a request
    ///
    /// Only the serve branch touches file contents.
    pub fn handle(&self, method: &str, raw_uri: &str) -> Result<Decision, GateError> {
        if method == "OPTIONS" {
            return Ok(Decision::Preflight);
        }

        let resolved = self.resolve(raw_uri);

        if path::has_script_extension(&resolved, &self.script_extensions) {
            return Ok(Decision::Decline(DeclineReason::Script));
        }

        let target = match &self.canonical_root {
            None => resolved,
            Some(root) => match path::confine(&resolved, root) {
                Confinement::Inside(canonical) => canonical,
                Confinement::Outside(canonical) => {
                    logger::log_warning(&format!(
                        "Path traversal attempt blocked: {} -> {}",
                        path::request_path(raw_uri),
                        canonical.display()
                    ));
                    return Ok(Decision::Decline(DeclineReason::NotFound));
                }
                Confinement::Unresolved => return Ok(Decision::Decline(DeclineReason::NotFound)),
            },
        };

        if !std::fs::metadata(&target).is_ok_and(|m| m.is_file()) {
            return Ok(Decision::Decline(DeclineReason::NotFound));
        }

        let content_type = self.detector.detect(&target);
        let body = std::fs::read(&target).map_err(|source| GateError::Read {
            path: target.clone(),
            source,
        })?;

        Ok(Decision::Serve(Asset { content_type, body }))
    }

    /// Write a decision into the response
    ///
    /// A detected type that is not a valid header value is dropped, same as
    /// a failed detection.
    pub fn apply(decision: Decision, writer: &mut ResponseWriter) -> Result<Outcome, ResponseError> {
        match decision {
            Decision::Preflight => {
                writer.set_status(StatusCode::OK)?;
                Ok(Outcome::Handled)
            }
            Decision::Decline(reason) => Ok(Outcome::Declined(reason)),
            Decision::Serve(asset) => {
                let content_type = asset
                    .content_type
                    .as_deref()
                    .and_then(|ct| HeaderValue::from_str(ct).ok());
                if let Some(value) = content_type {
                    writer.set_header(CONTENT_TYPE, value)?;
                }
                writer.set_status(StatusCode::OK)?;
                writer.write_body(&asset.body);
                Ok(Outcome::Handled)
            }
        }
    }

    /// Full request sequence: CORS headers, decision, response
    pub fn run(
        &self,
        method: &str,
        raw_uri: &str,
        writer: &mut ResponseWriter,
    ) -> Result<Outcome, GateError> {
        cors::apply_cors_headers(writer)?;
        let decision = self.handle(method, raw_uri)?;
        Ok(Self::apply(decision, writer)?)
    }
}
