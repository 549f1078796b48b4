//! Embedding oracle interface (C5): text -> fixed-width vector.
//!
//! Two built-in realizations plus a fallback wrapper, dispatched by an
//! explicit enum rather than a trait object (see spec.md §9's redesign
//! note on ad-hoc hierarchies). The actual remote embedding service is an
//! out-of-scope external collaborator; [`remote::RemoteOracle`] only
//! defines the shape a caller plugs one into.

pub mod local;
pub mod oracle;
pub mod remote;

pub use local::LocalOracle;
pub use oracle::{EmbedOutcome, EmbeddingOracle, HybridOracle};
pub use remote::{unconfigured_remote, RemoteOracle};

/// Cosine similarity in `[-1, 1]`; `0.0` if either vector is all zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let len = a.len().min(b.len());
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for i in 0..len {
        dot += a[i] as f64 * b[i] as f64;
        norm_a += (a[i] as f64).powi(2);
        norm_b += (b[i] as f64).powi(2);
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_vectors_have_similarity_one() {
        let v = vec![1.0, 2.0, 3.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn zero_vector_has_zero_similarity() {
        let zero = vec![0.0, 0.0];
        let other = vec![1.0, 1.0];
        assert_eq!(cosine_similarity(&zero, &other), 0.0);
    }
}
