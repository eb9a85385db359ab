//! Testing utilities for bpt workspace
//!
//! Shared process fixtures and a generator for a small conforming
//! application source tree (the "bar" application).

#![allow(missing_docs)]

mod fixtures;
mod sources;

pub use fixtures::{
    bar_process, cocktail_process, process_from_json, rejected_cocktail_process,
    unique_input_process,
};
pub use sources::{bar_app, write_bar_app, write_source, BarAppFile};
