//! Text embeddings with a deterministic offline fallback.
//!
//! When the embeddings provider is configured, vectors come from it.
//! When it is not, or a call fails, we derive a stable pseudo-embedding
//! from a hash of the input so similarity behavior stays deterministic
//! and testable without a network.

use crate::provider::EmbeddingClient;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sha2::{Digest, Sha256};
use statrs::distribution::Normal;
use tracing::warn;

/// Dimensionality of every vector in the system, provider or fallback.
pub const EMBEDDING_DIM: usize = 1536;

pub struct Embedder {
    client: Option<EmbeddingClient>,
}

impl Embedder {
    pub fn new(client: Option<EmbeddingClient>) -> Self {
        Self { client }
    }

    /// Offline embedder that always uses the hash fallback.
    pub fn offline() -> Self {
        Self { client: None }
    }

    /// Embed one text. Provider failures degrade to the fallback
    /// vector; this never errors.
    pub async fn embed(&self, text: &str) -> Vec<f32> {
        if let Some(client) = &self.client {
            match client.embed(text).await {
                Ok(v) if v.len() == EMBEDDING_DIM => return v,
                Ok(v) => {
                    warn!(len = v.len(), "provider embedding had unexpected length, using fallback");
                }
                Err(e) => {
                    warn!(error = %e, "embedding call failed, using fallback");
                }
            }
        }
        fallback_vector(text)
    }
}

/// Deterministic pseudo-embedding: seed a PRNG from the text hash and
/// draw standard-normal samples. Same text, same vector, any machine.
pub fn fallback_vector(text: &str) -> Vec<f32> {
    let digest = Sha256::digest(text.as_bytes());
    let mut seed_bytes = [0u8; 8];
    seed_bytes.copy_from_slice(&digest[..8]);
    let seed = u64::from_le_bytes(seed_bytes);

    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(0.0, 1.0).expect("standard normal parameters are valid");
    (0..EMBEDDING_DIM)
        .map(|_| rng.sample(normal) as f32)
        .collect()
}
