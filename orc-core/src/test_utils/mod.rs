//! In-memory fakes for testing.
//!
//! Available behind the `test-utils` feature flag. These are minimal
//! implementations that prove the provider trait APIs are usable
//! without a real model or embedding backend.

mod fake_embedding;
mod fake_model;

pub use fake_embedding::FakeEmbeddingProvider;
pub use fake_model::FakeModelProvider;
