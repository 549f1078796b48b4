//! Retrieval, context assembly, trace detection, and intent parsing for
//! the framestack memory engine (C6-C9).
//!
//! `store` wraps `framestack_index`'s raw SQL with the lifecycle and
//! append-only invariants of the frame/event/anchor model (C1-C4).
//! Everything here is synchronous except where it crosses the embedding
//! oracle boundary; callers orchestrate concurrency and cancellation
//! (`framestack-runtime` owns that).

pub mod assembler;
pub mod cache;
pub mod intent;
pub mod retrieval;
pub mod store;
pub mod trace;

pub use assembler::assemble;
pub use cache::{Cache, CacheStats};
pub use intent::{parse as parse_intent_query, GroupBy, InterpretedQuery, OutputFormat, ParsedQuery, SortKey};
pub use retrieval::{retrieve, RetrievalOutcome, RetrievalRequest, Strategy};
pub use store::{anchor_index, event_log, frame_store};
pub use trace::{compress_if_aged, TraceBuilder, TraceConfig};
