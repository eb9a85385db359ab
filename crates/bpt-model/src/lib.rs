//! bpt Process Model
//!
//! Typed description of a business process under test, plus the small
//! utility layer every other bpt crate leans on.
//!
//! # Core Concepts
//!
//! - [`Process`]: Root input: trigger plus ordered, uniquely named scenarios
//! - [`Scenario`]: One exercised path (inputs, setup actions, expectations)
//! - [`StateUpdate`] / [`VisibleUpdate`]: Expected entity state and read-model visibility
//! - [`RoleSpec`]: `"all"` or a set of role names
//! - [`Issue`] / [`Outcome`]: The result shape of every checking stage
//! - [`ValueType`]: Inferred shape of a raw value, including type-keyword sentinels
//!
//! # Example
//!
//! ```rust,ignore
//! use bpt_model::{Process, ProcessFormat};
//!
//! let process = Process::parse(source, ProcessFormat::Json)?;
//! assert_eq!(process.trigger.command_name(), "OrderCocktail");
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod case;
mod collections;
mod correlation;
mod error;
mod issue;
pub mod loose_json;
mod process;
mod value;

pub use collections::find_duplicates;
pub use correlation::{CorrelationId, TID_FIELD};
pub use error::ModelError;
pub use issue::{Issue, Outcome};
pub use process::{
    Inputs, PrecedingAction, Process, ProcessFormat, RoleSpec, Scenario, StateUpdate, Trigger,
    ValueMap, VisibleUpdate, ALL_ROLES, DEFAULT_ID_KEY,
};
pub use value::{is_blank, is_truthy, numeric_eq, ValueType};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
