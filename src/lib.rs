//! Search proxy
//!
//! A thin indexing and query layer over a full-text engine. Callers store
//! [`IndexEntry`](models::IndexEntry) documents and query them with
//! attribute matchers; the [`Index`](search::Index) facade compiles those
//! into engine queries, batches writes and maps hits back into entries.

pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod search;

pub use config::Config;
pub use error::{IndexError, Result};
pub use search::{EngineIndex, Index};
