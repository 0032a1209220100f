//! Command implementations

pub mod completions;
pub mod review;
pub mod schema;
