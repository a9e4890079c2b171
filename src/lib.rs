//! A client for the BudgetPlanner expense tracker.
//!
//! `ApiClient` sends authenticated requests through a `Transport`, the repositories in `repo`
//! turn responses into typed entities or a `RepoError`, and `view` holds the snapshots that screens
//! display, reloading them when a mutation invalidates what they show.

pub mod api;
pub mod args;
pub mod commands;
mod config;
mod error;
pub mod model;
pub mod repo;
pub mod session;
pub mod stats;
mod utils;
pub mod view;


pub use api::Mode;
pub use config::Config;
pub use error::{Error, FieldErrors, Result};
