//! bpt Assertions
//!
//! Turns an authored [`Process`](bpt_model::Process) into the normalized
//! [`Assertions`] both confirmation stages consume.
//!
//! # Pipeline
//!
//! ```text
//! Process → ProcessValidator ──(issues: stop)──▶ Outcome::Invalid
//!                 │
//!                 └─(valid)─▶ gather() → Assertions → {static, dynamic}
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use bpt_assertions::{gather, ProcessValidator};
//!
//! let outcome = ProcessValidator::new().validate(&process);
//! if outcome.is_valid() {
//!     let assertions = gather(&process);
//!     assert!(assertions.all_scenario_inputs["drink"].required);
//! }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod gather;
mod validator;

pub use gather::{
    gather, Assertions, CommandAssertion, FieldTable, InputAssertion, ReadModelAssertion,
    RolePartitions,
};
pub use validator::ProcessValidator;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
