//! The `framestack-runtime` facade: wires the persistence, engine, and
//! provider crates into one `Engine` handle a caller drives.
//!
//! `Engine` owns one [`framestack_index::Database`], one
//! [`framestack_providers::EmbeddingOracle`], one [`framestack_engine::Cache`],
//! the per-run mutexes and the bounded oracle semaphore described by the
//! concurrency model, and exposes the async project/run/frame/anchor/event/
//! trace/context/query operations those lower crates implement. No CLI or
//! MCP surface lives here — both are external collaborators that would
//! depend on this crate, not the other way around.

mod artifacts;
pub mod config;
mod engine;
pub mod error;
mod layout;
mod ops;
mod tasks;

pub use config::Config;
pub use engine::Engine;
pub use layout::ProjectLayout;
