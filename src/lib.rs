//! fahctl: client library and CLI for Folding@Home assignment and work
//! servers.
//!
//! The work server organizes computational work as Project → Run → Clone →
//! Generation; the assignment server spreads client load across work servers
//! by weight and constraints. [`client::FahClient`] exposes both as typed,
//! synchronous operations authenticated with a client certificate over
//! mutual TLS.

pub mod client;
pub mod config;
pub mod models;

pub use client::credentials::Credential;
pub use client::errors::FahError;
pub use client::fah_client::FahClient;
