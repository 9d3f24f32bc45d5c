//! # CCRM Common Library
//!
//! Shared code for the call-center CRM services and maintenance tools:
//! - Document store over SQLite (collections, subcollections, atomic batches)
//! - Domain models (call centers, prospects, sessions, steps, ...)
//! - Event bus for in-process notifications
//! - Configuration loading and logging bootstrap
//! - Time and id helpers

pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod models;
pub mod store;
pub mod time;
pub mod uuid_utils;

pub use error::{Error, Result};
pub use store::{DocumentStore, WriteBatch};
