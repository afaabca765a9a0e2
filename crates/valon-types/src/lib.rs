//! Shared types for the Valon command-processing service.

mod outcome;
mod session;
mod stats;
mod task;
mod ws;

pub use outcome::*;
pub use session::*;
pub use stats::*;
pub use task::*;
pub use ws::*;
