//! gymplanner - weekly workout plan, rest timer and progress log
//!
//! The plan and logs live in a local SQLite cache and are pushed to a
//! hosted database in the background.

pub mod caps;
pub mod config;
pub mod db;
pub mod input;
pub mod model;
pub mod remote;
pub mod store;
pub mod timer;
pub mod tui;

pub use db::LocalCache;
pub use store::{Session, WorkoutStore};
