//! Bulk placeholder-file generation.
//!
//! Enumerates every directory under a root, works out how many files each
//! needs to approach a target total, and creates them from a pool of worker
//! processes that each run a fixed number of writer threads.

pub mod config;
pub mod coordinator;
pub mod creator;
pub mod enumerate;
pub mod error;
pub mod logging;
pub mod plan;
pub mod wire;
pub mod worker;

pub use config::Config;
pub use coordinator::{Coordinator, Dispatch, RunSummary};
pub use creator::{FileOutcome, create_placeholder};
pub use enumerate::enumerate_directories;
pub use error::{Error, Result};
pub use worker::{WorkOrder, Worker};
