use std::time::Duration;

use framestack_types::Result;

use crate::local::{normalize, LocalOracle};
use crate::remote::RemoteOracle;

const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(5);

/// Text-to-vector capability: `embed(text) -> vector of fixed dim`,
/// `dim() -> natural number`.
///
/// An explicit-dispatch variant over `{Local, Remote, HybridWithFallback}`
/// per spec.md §9's redesign note — no trait object, no virtual dispatch.
pub enum EmbeddingOracle {
    Local(LocalOracle),
    Remote(RemoteOracle),
    Hybrid(HybridOracle),
}

impl EmbeddingOracle {
    pub fn local(dim: usize) -> Self {
        EmbeddingOracle::Local(LocalOracle::new(dim))
    }

    pub fn remote(remote: RemoteOracle) -> Self {
        EmbeddingOracle::Remote(remote)
    }

    pub fn hybrid(remote: RemoteOracle, target_dim: usize) -> Self {
        EmbeddingOracle::Hybrid(HybridOracle::new(remote, target_dim))
    }

    pub fn dim(&self) -> usize {
        match self {
            EmbeddingOracle::Local(o) => o.dim(),
            EmbeddingOracle::Remote(o) => o.dim(),
            EmbeddingOracle::Hybrid(o) => o.target_dim,
        }
    }

    /// Embed `text`. Never blocks indefinitely: a `Hybrid` oracle bounds
    /// the remote call by a timeout and falls back to its local encoder,
    /// returning the embedding plus whether this call degraded to local.
    pub async fn embed(&self, text: &str) -> Result<EmbedOutcome> {
        match self {
            EmbeddingOracle::Local(o) => Ok(EmbedOutcome { vector: o.embed(text), degraded: false }),
            EmbeddingOracle::Remote(o) => {
                Ok(EmbedOutcome { vector: o.embed(text).await?, degraded: false })
            }
            EmbeddingOracle::Hybrid(o) => Ok(o.embed(text).await),
        }
    }
}

/// Result of one `embed` call: the vector, and whether the call fell back
/// to the local encoder (surfaced by the retrieval pipeline as
/// `degraded_semantic`).
pub struct EmbedOutcome {
    pub vector: Vec<f32>,
    pub degraded: bool,
}

/// Tries the remote oracle first under a bounded timeout; on timeout or
/// error, falls back to the local encoder for that call. Always pads or
/// truncates the result to `target_dim`.
pub struct HybridOracle {
    local: LocalOracle,
    remote: RemoteOracle,
    target_dim: usize,
    timeout: Duration,
}

impl HybridOracle {
    pub fn new(remote: RemoteOracle, target_dim: usize) -> Self {
        Self {
            local: LocalOracle::new(target_dim),
            remote,
            target_dim,
            timeout: DEFAULT_REMOTE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn embed(&self, text: &str) -> EmbedOutcome {
        match tokio::time::timeout(self.timeout, self.remote.embed(text)).await {
            Ok(Ok(vector)) => EmbedOutcome { vector: fit_dim(vector, self.target_dim), degraded: false },
            Ok(Err(_)) | Err(_) => {
                EmbedOutcome { vector: self.local.embed(text), degraded: true }
            }
        }
    }
}

/// Pad with zeros or truncate `vector` to exactly `target_dim`, then
/// re-normalize so padding/truncation doesn't change the vector's
/// direction-only semantics used by cosine similarity.
fn fit_dim(mut vector: Vec<f32>, target_dim: usize) -> Vec<f32> {
    vector.resize(target_dim, 0.0);
    normalize(&mut vector);
    vector
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::unconfigured_remote;

    #[tokio::test]
    async fn local_oracle_never_degrades() {
        let oracle = EmbeddingOracle::local(32);
        let outcome = oracle.embed("fix the login bug").await.unwrap();
        assert!(!outcome.degraded);
        assert_eq!(outcome.vector.len(), 32);
    }

    #[tokio::test]
    async fn hybrid_falls_back_to_local_on_remote_failure() {
        let oracle = EmbeddingOracle::hybrid(unconfigured_remote(16), 16);
        let outcome = oracle.embed("database connection timeout").await.unwrap();
        assert!(outcome.degraded);
        assert_eq!(outcome.vector.len(), 16);
    }

    #[tokio::test]
    async fn hybrid_prefers_remote_when_it_succeeds() {
        let remote = RemoteOracle::new(8, |_text| async { Ok(vec![1.0; 8]) });
        let oracle = EmbeddingOracle::hybrid(remote, 8);
        let outcome = oracle.embed("anything").await.unwrap();
        assert!(!outcome.degraded);
    }

    #[test]
    fn fit_dim_pads_short_vectors() {
        let fitted = fit_dim(vec![1.0, 1.0], 4);
        assert_eq!(fitted.len(), 4);
    }

    #[test]
    fn fit_dim_truncates_long_vectors() {
        let fitted = fit_dim(vec![1.0; 10], 4);
        assert_eq!(fitted.len(), 4);
    }
}
