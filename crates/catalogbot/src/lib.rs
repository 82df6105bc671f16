//! Top-level facade crate for Catalog-BOT portal metrics.
//!
//! Re-exports core types and the gateway library so users can depend on a single crate.

pub mod core {
    pub use catalogbot_core::*;
}

pub mod gateway {
    pub use catalogbot_gateway::*;
}
