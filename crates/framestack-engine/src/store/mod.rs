//! Invariant-enforcing layer over `framestack_index`'s raw SQL queries:
//! frame lifecycle and branching (§4.2), the append-only event log (§4.1),
//! and the pinned-fact anchor index (§4.3).

pub mod anchor_index;
pub mod event_log;
pub mod frame_store;
