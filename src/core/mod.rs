//! Core module - storage, validation and caching for reviews

pub mod config;
pub mod db;
pub mod directory;
pub mod error;
pub mod identity_map;
pub mod store;

pub use config::Config;
pub use db::Database;
pub use directory::{Employee, EmployeeDirectory, SqlEmployeeDirectory, StaticDirectory};
pub use error::{ReviewError, ValidationError};
pub use identity_map::IdentityMap;
pub use store::ReviewStore;
