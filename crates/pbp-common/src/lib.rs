//! PBP Common Library
//!
//! Shared plumbing for the PBP workspace. Currently this is the logging
//! bootstrap used by the ingestion binary; anything else that grows a second
//! consumer belongs here too.
//!
//! # Example
//!
//! ```no_run
//! use pbp_common::logging::{init_logging, LogConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = LogConfig::from_env()?;
//!     init_logging(&config)?;
//!     Ok(())
//! }
//! ```

pub mod logging;
