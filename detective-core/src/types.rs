//! Core data type definitions

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::logging::LoggingConfig;

/// Minimum trimmed length (exclusive) a credential must exceed to be accepted from user input
pub const MIN_CREDENTIAL_LEN: usize = 10;

/// Secret token authorizing calls to the analysis service
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Whether `candidate` passes the client-side sanity check for manual entry.
    ///
    /// This is a length check only; it says nothing about whether the service accepts the key.
    pub fn is_acceptable(candidate: &str) -> bool {
        candidate.trim().chars().count() > MIN_CREDENTIAL_LEN
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Display form with only the first and last four characters visible
    pub fn masked(&self) -> String {
        let chars: Vec<char> = self.0.trim().chars().collect();
        if chars.len() <= 8 {
            return "*".repeat(chars.len());
        }
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}{}{}", head, "*".repeat(chars.len() - 8), tail)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential").field(&self.masked()).finish()
    }
}

/// A single claim submitted for analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub claim: String,
}

impl AnalysisRequest {
    pub fn new(claim: impl Into<String>) -> Self {
        Self {
            claim: claim.into(),
        }
    }
}

/// Overall verdict on a claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Verified,
    LikelyTrue,
    Misleading,
    LikelyFalse,
    False,
    Unverifiable,
}

impl Verdict {
    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Verified => "Verified",
            Verdict::LikelyTrue => "Likely true",
            Verdict::Misleading => "Misleading",
            Verdict::LikelyFalse => "Likely false",
            Verdict::False => "False",
            Verdict::Unverifiable => "Unverifiable",
        }
    }
}

/// The three lenses of the Tri-Lens Protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lens {
    Source,
    Evidence,
    Logic,
}

impl Lens {
    pub const ALL: [Lens; 3] = [Lens::Source, Lens::Evidence, Lens::Logic];

    pub fn title(&self) -> &'static str {
        match self {
            Lens::Source => "Source lens",
            Lens::Evidence => "Evidence lens",
            Lens::Logic => "Logic lens",
        }
    }
}

/// Findings for one lens
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LensAssessment {
    pub lens: Lens,
    /// 0-100, higher is more credible
    pub score: u8,
    pub findings: String,
}

/// Structured credibility analysis produced by the analysis service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub verdict: Verdict,
    /// 0-100, higher is more credible
    pub credibility_score: u8,
    pub summary: String,
    #[serde(default)]
    pub lenses: Vec<LensAssessment>,
    #[serde(default)]
    pub red_flags: Vec<String>,
    #[serde(default)]
    pub verification_steps: Vec<String>,
}

impl AnalysisResult {
    pub fn lens(&self, lens: Lens) -> Option<&LensAssessment> {
        self.lenses.iter().find(|l| l.lens == lens)
    }
}

/// Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectiveConfig {
    pub analysis: AnalysisConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Gemini model name
    pub model: String,
    /// API root, without the `/v1beta` suffix
    pub base_url: String,
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the local credential store (`~` is expanded)
    pub data_dir: String,
    /// File name of the key-value store inside `data_dir`
    pub store_file: String,
}
