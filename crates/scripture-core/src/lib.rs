//! # Scripture Core
//!
//! Runtime-agnostic retrieval logic for Scripture Harness: verse models,
//! the canonical book table, citation parsing, the store abstraction,
//! hybrid (exact + vector) search, neighbor expansion, overlay planning,
//! and grounding-document formatting.
//!
//! This crate contains no tokio, sqlx, HTTP, or filesystem dependencies.
//! Network-bound work (embedding providers, overlay fetching) is expressed
//! through traits that the application crate implements.

pub mod canon;
pub mod context;
pub mod embedding;
pub mod error;
pub mod expand;
pub mod models;
pub mod overlay;
pub mod reference;
pub mod search;
pub mod store;
