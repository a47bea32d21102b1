//! Command handlers

mod cache;
mod check;

pub use cache::CacheCommandHandler;
pub use check::CheckCommandHandler;
