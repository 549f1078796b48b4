//! Public SDK for building tools on top of the framestack memory runtime.
//!
//! # Overview
//!
//! `framestack-sdk` provides a high-level, stable API for a project's
//! frame-stack memory: the append-only event log, the frame tree, pinned
//! anchors, and the token-budgeted context bundles an agent assembles from
//! them. It abstracts away indexing, embedding, and concurrency, exposing
//! only the primitives a caller needs to record a run and retrieve context
//! for it.
//!
//! # Quickstart
//!
//! ```no_run
//! use framestack_sdk::{ContextClient, types::{FrameType, Intent, ContextDelta}};
//! use serde_json::json;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ContextClient::connect("./my-project")?;
//! client.register_project("my-project").await?;
//!
//! let run = client.start_run().await?;
//! let root = run.create_root_frame(FrameType::Task, "implement-feature", json!({})).await?;
//!
//! let bundle = run.assemble_context(Intent::Coding, 4000, ContextDelta::default()).await?;
//! println!("hot stack: {} entries", bundle.hot_stack.len());
//!
//! run.finish(framestack_sdk::types::RunState::Completed).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! This SDK acts as a facade over:
//! - `framestack-types`: the shared domain model and error envelope
//! - `framestack-core`: content hashing, workspace path resolution, clocks
//! - `framestack-providers`: embedding oracle dispatch
//! - `framestack-index`: SQLite-backed storage
//! - `framestack-engine`: retrieval, context assembly, trace detection, intent parsing
//! - `framestack-runtime`: the orchestrating `Engine` this crate wraps

pub mod client;
pub mod error;
pub mod types;

pub use client::{ContextClient, RunHandle};
pub use error::{Error, ErrorKind, Result};
