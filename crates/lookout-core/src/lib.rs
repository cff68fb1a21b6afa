//! Core types and trait definitions for the Lookout telemetry store.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Watchers, the recorder and storage backends all depend on it.

pub mod entry;
pub mod error;
pub mod store;

pub use error::{Error, Result};
