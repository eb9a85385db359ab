//! bpt Dynamic Assertion Confirmation
//!
//! Runs each scenario against a live application over GraphQL and observes
//! the persisted entity snapshots and read models that result.
//!
//! # Architecture
//!
//! ```text
//!                  ┌──────────────── ClientRegistry (role → GraphQlClient)
//!                  ▼
//! Assertions → DynamicConfirmation ─ MutationBuilder / ReadModelQuery
//!                  │
//!                  └─ poll_until → SnapshotStore → compare → Outcome
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use bpt_dynamic::{ClientRegistry, DynamicConfirmation, HttpGraphQlClient, LocalEventStore};
//!
//! let anonymous = HttpGraphQlClient::new(url, timeout)?;
//! let registry = ClientRegistry::new(Arc::new(anonymous.clone()))
//!     .with_role("Guest", Arc::new(anonymous.with_token(guest_token)));
//! let outcome = DynamicConfirmation::new(Arc::new(registry), Arc::new(LocalEventStore::new(path)))
//!     .confirm(&assertions)
//!     .await;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod compare;
mod config;
pub mod error;
pub mod mutation;
pub mod poll;
pub mod query;
mod roles;
mod runner;
pub mod store;
pub mod testing;
pub mod transport;

pub use compare::{check_not_values, check_values, FieldFailure};
pub use config::DynamicConfig;
pub use error::{ResolveError, StoreError, TransportError};
pub use mutation::MutationBuilder;
pub use poll::{poll_until, PollTimeout};
pub use query::{FilterExpr, FilterOp, ReadModelQuery};
pub use roles::ClientRegistry;
pub use runner::DynamicConfirmation;
pub use store::{LocalEventStore, SnapshotEnvelope, SnapshotKey, SnapshotStore};
pub use transport::{GraphQlClient, GraphQlRequest, HttpGraphQlClient};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
