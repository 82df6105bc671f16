//! Catalog-BOT metrics gateway library entry.
//!
//! This crate wires the portal metrics aggregator, its snapshot poller and
//! the HTTP surface (dashboard, ingest, ops) into one service. It is
//! consumed by the binary (`main.rs`) and by integration tests.

pub mod api;
pub mod app_state;
pub mod config;
pub mod obs;
pub mod ops;
pub mod router;
