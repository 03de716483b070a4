//! # Scripture Harness
//!
//! Hybrid Bible verse retrieval and grounding-context assembly for AI tools.
//!
//! A query is matched two ways at once: citations in the text ("Romans
//! 8:28", "로마서 8장 28절") are looked up exactly, and the whole query is
//! embedded for vector search. The merged ranking is expanded with
//! neighboring verses, optionally shown in a display-only overlay
//! translation fetched per request, and rendered into a grounding document
//! plus a list of citable sources.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────────┐   ┌──────────────┐
//! │  query   │──▶│ exact ∪ vector   │──▶│ expand ±w    │
//! └──────────┘   │ (scripture-core) │   │ neighbors    │
//!                └────────┬─────────┘   └──────┬───────┘
//!                         │                    ▼
//!                ┌────────▼─────────┐   ┌──────────────┐
//!                │ SQLite verse     │   │ overlay      │
//!                │ index (read-only)│   │ fetch (ESV)  │
//!                └──────────────────┘   └──────┬───────┘
//!                                              ▼
//!                                       ┌──────────────┐
//!                                       │ grounding    │
//!                                       │ text+sources │
//!                                       └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! scx init                                   # create the read schema
//! scx refs "see Romans 8:28 and 요한복음 3:16"  # parse citations
//! scx search "peace in hard times"
//! scx context "What does Romans 8:28 mean?" --overlay
//! scx chapter 시편 23
//! scx stats
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Database connection |
//! | [`migrate`] | Verse index schema |
//! | [`sqlite_store`] | SQLite `VerseStore` |
//! | [`embedding`] | Embedding providers |
//! | [`overlay`] | Overlay translation client and concurrent fetching |
//! | [`service`] | Request orchestration |
//! | [`search`] | `refs` / `search` / `context` commands |
//! | [`chapter`] | `chapter` command |
//! | [`stats`] | `stats` command |

pub mod chapter;
pub mod config;
pub mod db;
pub mod embedding;
pub mod migrate;
pub mod overlay;
pub mod search;
pub mod service;
pub mod sqlite_store;
pub mod stats;

pub use scripture_core;
