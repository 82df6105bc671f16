//! Catalog-BOT core: transport-agnostic event types and the error surface.
//!
//! This crate defines the outcome events reported by the enrichment service
//! and the error type shared by the gateway. It carries no transport or
//! runtime dependencies so it can be reused by any producer of events.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths surface as `CatalogBotError`/`Result`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod event;

/// Shared result type.
pub use error::{CatalogBotError, Result};
pub use event::{Portal, RawEvent, RequestEvent, Source, MAX_LATENCY_SECONDS};
