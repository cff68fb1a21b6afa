//! JSON query API for Lookout entries.
//!
//! Exposes an axum [`Router`] backed by any [`EntriesRepository`]. Auth, TLS
//! and the UI are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/lookout", lookout_server::router(store.clone()))
//! ```

pub mod entries;
pub mod error;

use std::{path::PathBuf, sync::Arc};

use axum::{Router, routing::get};
use lookout_core::store::EntriesRepository;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

pub use error::ApiError;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `LOOKOUT_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:       String,
  #[serde(default = "default_port")]
  pub port:       u16,
  pub store_path: PathBuf,
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 8404 }

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn router<S>(store: Arc<S>) -> Router<()>
where
  S: EntriesRepository + 'static,
{
  Router::new()
    .route("/entries", get(entries::list::<S>))
    .route("/entries/{id}", get(entries::get_one::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(store)
}

// ─── Integration tests ────────────────────────────────────────────────────────
