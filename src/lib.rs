//! Reviews: performance review records
//!
//! Reviews live in a SQLite `reviews` table. Each row is represented in
//! memory by exactly one shared [`entities::Review`] instance, tracked by the
//! identity map inside [`core::ReviewStore`].

pub mod cli;
pub mod core;
pub mod entities;
