use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use uuid::Uuid;

/// Opaque, content-stable project identifier.
///
/// Derived from a repository URL or working-directory path so that the
/// same project always yields the same identifier across processes,
/// per the storage invariant in the data model.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(String);

impl ProjectId {
    pub fn from_source(source: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(source.as_bytes());
        Self(format!("{:x}", hasher.finalize()))
    }

    /// Reconstruct a [`ProjectId`] from its already-hashed wire form, e.g.
    /// when reading one back out of storage. Does not re-hash.
    pub fn from_raw(hashed: impl Into<String>) -> Self {
        Self(hashed.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

macro_rules! uuid_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

uuid_id!(RunId, "Identifier for one end-to-end session under a project.");
uuid_id!(FrameId, "Identifier for a node on the reasoning call stack.");
uuid_id!(EventId, "Identifier for a single append-only log record.");
uuid_id!(AnchorId, "Identifier for a pinned fact/decision/constraint.");
uuid_id!(TraceId, "Identifier for a bounded group of tool-call events.");
uuid_id!(TaskId, "Identifier for an externally tracked task record.");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_id_is_stable_for_same_source() {
        let a = ProjectId::from_source("/home/dev/repo");
        let b = ProjectId::from_source("/home/dev/repo");
        assert_eq!(a, b);
    }

    #[test]
    fn project_id_differs_for_different_source() {
        let a = ProjectId::from_source("/home/dev/repo-a");
        let b = ProjectId::from_source("/home/dev/repo-b");
        assert_ne!(a, b);
    }

    #[test]
    fn frame_id_round_trips_through_display_and_parse() {
        let id = FrameId::new();
        let text = id.to_string();
        let parsed: FrameId = text.parse().unwrap();
        assert_eq!(id, parsed);
    }
}
