use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use framestack_types::{Error, Result};

type EmbedFuture = Pin<Box<dyn Future<Output = Result<Vec<f32>>> + Send>>;

/// Delegates embedding to an external provider the caller supplies.
///
/// The actual remote embedding service is the out-of-scope "pluggable
/// oracle" named in spec.md §1 — this wraps whatever callback the host
/// application wires up (an HTTP client, an in-process model server, …)
/// without this crate depending on any particular transport.
#[derive(Clone)]
pub struct RemoteOracle {
    dim: usize,
    delegate: Arc<dyn Fn(String) -> EmbedFuture + Send + Sync>,
}

impl RemoteOracle {
    pub fn new<F, Fut>(dim: usize, delegate: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<f32>>> + Send + 'static,
    {
        Self {
            dim,
            delegate: Arc::new(move |text| Box::pin(delegate(text))),
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        (self.delegate)(text.to_string()).await
    }
}

/// A [`RemoteOracle`] that always fails, for tests and for configurations
/// that declare `embedding_provider = "remote"` without wiring a delegate.
pub fn unconfigured_remote(dim: usize) -> RemoteOracle {
    RemoteOracle::new(dim, |_text| async {
        Err(Error::oracle_unavailable("no remote embedding delegate configured"))
    })
}
