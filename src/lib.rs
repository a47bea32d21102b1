//! itemhub
//!
//! Users, companies and items in PostgreSQL behind a cache-aside layer.
//!
//! - [`cache`]: key/value stores, typed serializer and the cache manager
//! - [`services`]: entity cache services, invalidation rules and the
//!   application services that tie them to the repositories

use shadow_rs::shadow;
shadow!(build);

pub mod cache;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod logger;
pub mod models;
pub mod repositories;
pub mod schema;
pub mod services;
pub mod state;

pub use state::AppState;

pub fn pkg_version() -> &'static str {
    build::PKG_VERSION
}

pub fn clap_long_version() -> &'static str {
    build::CLAP_LONG_VERSION
}
