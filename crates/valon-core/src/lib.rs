//! Session, task and command-dispatch engine for Valon.

mod broadcast;
pub mod calc;
mod engine;
mod error;
mod fetch;
mod ledger;
mod registry;
mod router;
#[cfg(test)]
mod testutil;

pub use broadcast::{BroadcastCoordinator, Delivery, Outbound, PublishReport};
pub use calc::CalcError;
pub use engine::{Connected, Disconnected, Engine, EngineConfig, Submission};
pub use error::ValonError;
pub use fetch::{Fetcher, HttpFetcher};
pub use ledger::{TaskLedger, TaskRecord};
pub use registry::SessionRegistry;
pub use router::{AgentIdentity, CommandRouter, StatsView, format_uptime};

/// Result type for Valon operations.
pub type Result<T> = std::result::Result<T, ValonError>;
