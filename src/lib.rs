//! Static asset gate with CORS headers, embedded in a hyper request pipeline.
//!
//! For every request the [`gate::StaticAssetGate`] sets CORS headers, then
//! answers pre-flights, serves regular files from the document root with a
//! sniffed content type, or declines so the host applies its own handling.

pub mod config;
pub mod gate;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;
