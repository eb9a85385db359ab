//! bpt Static File Confirmation
//!
//! Checks an application's source tree against gathered assertions without
//! running it.
//!
//! # Architecture
//!
//! ```text
//! ArtifactLocations → ArtifactReader → DescriptorCache → ArtifactDescriptor
//!                                                              ↓
//!                   Assertions → StaticConfirmation (+ EventGraph) → Outcome
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use bpt_static::{ArtifactLocations, StaticConfirmation};
//!
//! let outcome = StaticConfirmation::new(ArtifactLocations::rooted("path/to/app"))
//!     .confirm(&assertions)
//!     .await;
//! assert!(outcome.is_valid());
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod cache;
mod confirm;
pub mod descriptor;
pub mod error;
pub mod graph;
mod locations;
mod reader;

pub use cache::{CacheStats, ContentHash, DescriptorCache};
pub use confirm::{StaticConfig, StaticConfirmation};
pub use descriptor::{ArtifactDescriptor, Authorization, DeclaredField};
pub use error::{StaticError, StaticResult};
pub use graph::EventGraph;
pub use locations::{ArtifactKind, ArtifactLocations};
pub use reader::{ArtifactReader, LocatedDescriptor};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
