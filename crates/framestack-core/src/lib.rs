//! Infrastructure shared by the higher-level framestack crates: workspace
//! path resolution, content hashing, and event sequencing. No knowledge of
//! storage schemas or retrieval lives here.

pub mod clock;
pub mod hash;
pub mod path;
pub mod text;

pub use clock::Clock;
pub use hash::{content_hash, content_hash_parts};
pub use text::tokenize;
pub use path::{
    discover_project_root, expand_tilde, normalize_path, paths_equal, project_id_from_root,
    resolve_effective_project_id, resolve_workspace_path, Error, Result,
};
