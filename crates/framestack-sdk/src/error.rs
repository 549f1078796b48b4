//! Error type re-export for the SDK.
//!
//! Every operation on [`crate::ContextClient`] returns
//! `framestack_types::Result`, the same typed envelope every other crate in
//! the workspace uses — the SDK boundary adds no error type of its own.

pub use framestack_types::{Error, ErrorKind, Result};
