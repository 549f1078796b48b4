//! Operations the [`crate::Engine`] facade exposes, split by the domain
//! entity they operate on. Every file here only adds `impl Engine` blocks;
//! `Engine` itself and its shared state live in `crate::engine`.

mod anchor;
mod context;
mod event;
mod external;
mod frame;
mod project;
mod query;
mod run;
