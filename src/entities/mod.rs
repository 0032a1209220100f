//! Entity type definitions

pub mod review;

pub use review::{Review, ReviewRef, ReviewRow};
