//! Detective Analysis - claim analysis backed by Google Gemini
//!
//! Provides the [`GeminiClient`] implementation of [`detective_core::AnalysisService`]
//! and the Tri-Lens Protocol prompt it sends.

pub mod gemini;
pub mod protocol;

pub use gemini::GeminiClient;
pub use protocol::{protocol_guide, system_instruction, LensGuide, TRI_LENS_PROTOCOL};
