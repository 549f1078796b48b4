use std::sync::Mutex;

use sha2::{Digest, Sha256};

use framestack_core::tokenize;

/// Deterministic feature-hashed TF-IDF-style encoder.
///
/// Each token is hashed into one of `dim` fixed positions (stable across
/// processes: the hash is SHA-256 of the token bytes, not a randomly seeded
/// hasher). Term weight at that position is `tf * idf`, where `idf` is
/// maintained incrementally from every text this encoder has ever seen —
/// the "built incrementally from the stream" realization spec.md calls for.
pub struct LocalOracle {
    dim: usize,
    state: Mutex<IdfState>,
}

struct IdfState {
    documents_seen: u64,
    /// document frequency per hashed bucket: how many documents contained
    /// at least one token that hashed into this bucket.
    doc_freq: Vec<u64>,
}

impl LocalOracle {
    pub fn new(dim: usize) -> Self {
        let dim = dim.max(1);
        Self {
            dim,
            state: Mutex::new(IdfState { documents_seen: 0, doc_freq: vec![0; dim] }),
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Hash a token to a bucket in `[0, dim)`. Stable across processes.
    fn bucket(&self, token: &str) -> usize {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        let digest = hasher.finalize();
        let mut acc = [0u8; 8];
        acc.copy_from_slice(&digest[..8]);
        (u64::from_le_bytes(acc) % self.dim as u64) as usize
    }

    /// Record a new document's tokens against the running document-frequency
    /// table, then return the TF-IDF-weighted embedding for that document.
    pub fn embed(&self, text: &str) -> Vec<f32> {
        let tokens = tokenize(text);
        let mut term_freq = vec![0u32; self.dim];
        let mut buckets_present = vec![false; self.dim];
        for token in &tokens {
            let b = self.bucket(token);
            term_freq[b] += 1;
            buckets_present[b] = true;
        }

        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.documents_seen += 1;
        for (bucket, present) in buckets_present.iter().enumerate() {
            if *present {
                state.doc_freq[bucket] += 1;
            }
        }

        let total_docs = state.documents_seen as f32;
        let mut vector = vec![0.0f32; self.dim];
        for (bucket, tf) in term_freq.into_iter().enumerate() {
            if tf == 0 {
                continue;
            }
            let df = state.doc_freq[bucket].max(1) as f32;
            let idf = (total_docs / df).ln().max(0.0) + 1.0;
            vector[bucket] = tf as f32 * idf;
        }

        normalize(&mut vector);
        vector
    }
}

/// L2-normalize in place; leaves an all-zero vector unchanged.
pub(crate) fn normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedding_dimension_matches_declared_dim() {
        let oracle = LocalOracle::new(64);
        let vector = oracle.embed("fix the login bug");
        assert_eq!(vector.len(), 64);
    }

    #[test]
    fn bucket_assignment_is_stable_across_calls() {
        let oracle = LocalOracle::new(64);
        assert_eq!(oracle.bucket("login"), oracle.bucket("login"));
    }

    #[test]
    fn repeated_common_tokens_get_down_weighted_by_idf() {
        let oracle = LocalOracle::new(256);
        for _ in 0..20 {
            oracle.embed("the common recurring token appears here");
        }
        let common_weight = oracle.embed("token")[oracle.bucket("token")];
        let rare_weight = oracle.embed("zephyr")[oracle.bucket("zephyr")];
        assert!(rare_weight >= common_weight);
    }

    #[test]
    fn empty_text_yields_zero_vector() {
        let oracle = LocalOracle::new(32);
        let vector = oracle.embed("to a is");
        assert!(vector.iter().all(|v| *v == 0.0));
    }
}
