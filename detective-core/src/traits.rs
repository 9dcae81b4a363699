//! Core trait definitions

use crate::error::DetectiveResult;
use crate::types::{AnalysisResult, Credential};
use async_trait::async_trait;

/// Small persistent key-value slot store, the stand-in for browser local storage
///
/// Access is synchronous. Implementations use interior mutability so a store can be
/// shared between the session and whoever inspects it.
pub trait KeyValueStore: Send + Sync {
    /// Read a value; `Ok(None)` when the key is absent
    fn get(&self, key: &str) -> DetectiveResult<Option<String>>;

    /// Write a value, replacing any previous one
    fn set(&self, key: &str, value: &str) -> DetectiveResult<()>;

    /// Remove a value; removing an absent key is not an error
    fn remove(&self, key: &str) -> DetectiveResult<()>;
}

/// External service that fact-checks a claim
#[async_trait]
pub trait AnalysisService: Send + Sync {
    /// Analyze a claim with the given credential.
    ///
    /// Failures carry a human-readable message (see [`crate::DetectiveError::message`]).
    async fn analyze(
        &self,
        claim: &str,
        credential: &Credential,
    ) -> DetectiveResult<AnalysisResult>;
}
