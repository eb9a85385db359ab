//! bpt command-line runner
//!
//! Loads `bpt.toml` and a process description, runs the requested stages and
//! renders a [`Report`].
//!
//! ```text
//! bpt.toml ─▶ BptConfig ─┐
//!                        ▼
//! process.yaml ─▶ Pipeline (validate → gather → static / dynamic) ─▶ Report
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod pipeline;
pub mod report;

pub use config::{BptConfig, ConfigError, EndpointConfig, RoleConfig, StoreConfig};
pub use pipeline::{Mode, Pipeline};
pub use report::{Report, Stage, StageReport};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
