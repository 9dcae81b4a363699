//! Gemini `generateContent` client implementing [`AnalysisService`]

use async_trait::async_trait;
use detective_core::{
    AnalysisConfig, AnalysisResult, AnalysisService, Credential, DetectiveError, DetectiveResult,
    ErrorContext, Lens, LensAssessment, Verdict,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::protocol::system_instruction;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini API client
pub struct GeminiClient {
    client: reqwest::Client,
    config: AnalysisConfig,
    endpoint: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    response_mime_type: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

/// Google API error envelope
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

/// Analysis as the model writes it; scores and verdict are normalised afterwards
#[derive(Debug, Deserialize)]
struct RawAnalysis {
    verdict: String,
    credibility_score: f64,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    lenses: Vec<RawLens>,
    #[serde(default)]
    red_flags: Vec<String>,
    #[serde(default)]
    verification_steps: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawLens {
    lens: String,
    #[serde(default)]
    score: f64,
    #[serde(default)]
    findings: String,
}

impl GeminiClient {
    /// Create a new Gemini client
    pub fn new(config: AnalysisConfig) -> DetectiveResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| DetectiveError::Config {
                message: format!("Failed to create HTTP client: {}", e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("gemini_client").with_operation("create_client"),
            })?;

        let endpoint = format!(
            "{}/v1beta/models/{}:generateContent",
            config.base_url.trim_end_matches('/'),
            config.model
        );

        info!("Created Gemini client for model {}", config.model);

        Ok(Self {
            client,
            config,
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn build_request(&self, claim: &str) -> GenerateContentRequest {
        GenerateContentRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: Some(system_instruction()),
                }],
            },
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(claim.to_string()),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
                response_mime_type: "application/json".to_string(),
            },
        }
    }

    fn api_key_header(credential: &Credential) -> DetectiveResult<reqwest::header::HeaderValue> {
        let mut value = reqwest::header::HeaderValue::from_str(credential.expose().trim())
            .map_err(|_| DetectiveError::Authentication {
                message: "API key contains characters that cannot be sent".to_string(),
                context: ErrorContext::new("gemini_client")
                    .with_operation("api_key_header")
                    .with_suggestion("Paste the key again without line breaks"),
            })?;
        value.set_sensitive(true);
        Ok(value)
    }
}

#[async_trait]
impl AnalysisService for GeminiClient {
    async fn analyze(
        &self,
        claim: &str,
        credential: &Credential,
    ) -> DetectiveResult<AnalysisResult> {
        debug!(
            endpoint = %self.endpoint,
            claim_chars = claim.chars().count(),
            "Requesting analysis"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header(API_KEY_HEADER, Self::api_key_header(credential)?)
            .json(&self.build_request(claim))
            .send()
            .await
            .map_err(|e| transport_error(e, self.config.timeout_seconds))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let error = map_error_response(
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown error"),
                &body,
            );
            warn!(status = status.as_u16(), error = %error, "Gemini request rejected");
            return Err(error);
        }

        let body: GenerateContentResponse =
            response.json().await.map_err(|e| DetectiveError::Llm {
                message: format!("Failed to read model response: {}", e),
                model: Some(self.config.model.clone()),
                context: ErrorContext::new("gemini_client").with_operation("read_response"),
            })?;

        let text = extract_text(body, &self.config.model)?;
        let result = parse_analysis(&text, &self.config.model)?;

        info!(
            verdict = result.verdict.label(),
            credibility_score = result.credibility_score,
            "Analysis received"
        );

        Ok(result)
    }
}

fn transport_error(error: reqwest::Error, timeout_seconds: u64) -> DetectiveError {
    let message = if error.is_timeout() {
        format!("Request timed out after {}s", timeout_seconds)
    } else {
        format!("Request failed: {}", error)
    };

    DetectiveError::Network {
        message,
        source: Some(Box::new(error)),
        context: ErrorContext::new("gemini_client")
            .with_operation("send")
            .with_suggestion("Check network connectivity and try again"),
    }
}

/// Map a non-success response to an error.
///
/// Authentication failures always mention "API key" so that callers matching on the
/// message text can tell them apart from other failures.
fn map_error_response(status: u16, reason: &str, body: &str) -> DetectiveError {
    let envelope = serde_json::from_str::<ErrorEnvelope>(body).ok();
    let detail = match &envelope {
        Some(e) if !e.error.message.is_empty() => e.error.message.clone(),
        _ if !body.trim().is_empty() => body.trim().to_string(),
        _ => reason.to_string(),
    };
    let api_status = envelope.and_then(|e| e.error.status).unwrap_or_default();

    let key_rejected = status == 401
        || status == 403
        || detail.contains("API key")
        || body.contains("API_KEY_INVALID");

    let context = ErrorContext::new("gemini_client")
        .with_operation("generate_content")
        .with_metadata("status", &status.to_string())
        .with_metadata("api_status", &api_status);

    if key_rejected {
        return DetectiveError::Authentication {
            message: format!("API key rejected ({} {}): {}", status, reason, detail),
            context: context.with_suggestion("Re-enter a valid Gemini API key"),
        };
    }

    if status == 429 {
        return DetectiveError::RateLimit {
            message: format!("Request failed: {} {}: {}", status, reason, detail),
            retry_after_ms: None,
            context: context.with_suggestion("Wait a moment before submitting again"),
        };
    }

    DetectiveError::Network {
        message: format!("Request failed: {} {}: {}", status, reason, detail),
        source: None,
        context: context.with_suggestion("Check the Gemini service status and try again"),
    }
}

fn extract_text(response: GenerateContentResponse, model: &str) -> DetectiveResult<String> {
    let no_output = |detail: String| DetectiveError::Llm {
        message: format!("No analysis returned by the model{}", detail),
        model: Some(model.to_string()),
        context: ErrorContext::new("gemini_client").with_operation("extract_text"),
    };

    let Some(candidate) = response.candidates.into_iter().next() else {
        let reason = response
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .map(|r| format!(" (blocked: {})", r))
            .unwrap_or_default();
        return Err(no_output(reason));
    };

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        let reason = candidate
            .finish_reason
            .map(|r| format!(" (finish reason: {})", r))
            .unwrap_or_default();
        return Err(no_output(reason));
    }

    Ok(text)
}

/// Strip a surrounding markdown code fence, if the model added one
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn parse_verdict(raw: &str) -> Verdict {
    let normalized = raw.trim().to_lowercase().replace([' ', '-'], "_");
    match normalized.as_str() {
        "verified" | "true" => Verdict::Verified,
        "likely_true" | "mostly_true" => Verdict::LikelyTrue,
        "misleading" | "mixed" | "partly_true" => Verdict::Misleading,
        "likely_false" | "mostly_false" => Verdict::LikelyFalse,
        "false" | "fake" => Verdict::False,
        _ => Verdict::Unverifiable,
    }
}

fn parse_lens(raw: &str) -> Option<Lens> {
    match raw.trim().to_lowercase().as_str() {
        "source" | "sources" => Some(Lens::Source),
        "evidence" => Some(Lens::Evidence),
        "logic" | "reasoning" => Some(Lens::Logic),
        _ => None,
    }
}

fn clamp_score(score: f64) -> u8 {
    if score.is_nan() {
        return 0;
    }
    score.round().clamp(0.0, 100.0) as u8
}

fn parse_analysis(text: &str, model: &str) -> DetectiveResult<AnalysisResult> {
    let raw: RawAnalysis =
        serde_json::from_str(strip_code_fence(text)).map_err(|e| DetectiveError::Llm {
            message: format!("Model returned an unreadable analysis: {}", e),
            model: Some(model.to_string()),
            context: ErrorContext::new("gemini_client")
                .with_operation("parse_analysis")
                .with_suggestion("Submit the claim again"),
        })?;

    let lenses = raw
        .lenses
        .into_iter()
        .filter_map(|l| {
            let lens = parse_lens(&l.lens);
            if lens.is_none() {
                debug!(lens = %l.lens, "Dropping unknown lens");
            }
            lens.map(|lens| LensAssessment {
                lens,
                score: clamp_score(l.score),
                findings: l.findings,
            })
        })
        .collect();

    Ok(AnalysisResult {
        verdict: parse_verdict(&raw.verdict),
        credibility_score: clamp_score(raw.credibility_score),
        summary: raw.summary,
        lenses,
        red_flags: raw.red_flags,
        verification_steps: raw.verification_steps,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_uses_model_and_trims_slash() {
        let config = AnalysisConfig {
            base_url: "http://localhost:9999/".to_string(),
            model: "gemini-test".to_string(),
            ..AnalysisConfig::default()
        };
        let client = GeminiClient::new(config).unwrap();
        assert_eq!(
            client.endpoint(),
            "http://localhost:9999/v1beta/models/gemini-test:generateContent"
        );
        assert_eq!(client.model(), "gemini-test");
    }

    #[test]
    fn test_request_body_shape() {
        let client = GeminiClient::new(AnalysisConfig::default()).unwrap();
        let body =
            serde_json::to_value(client.build_request("The moon is made of cheese")).unwrap();

        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(
            body["contents"][0]["parts"][0]["text"],
            "The moon is made of cheese"
        );
        assert_eq!(
            body["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert!(body["systemInstruction"]["parts"][0]["text"]
            .as_str()
            .unwrap()
            .contains("Tri-Lens"));
        assert!(body["systemInstruction"].get("role").is_none());
    }

    #[test]
    fn test_invalid_key_body_maps_to_authentication() {
        let body = r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT"}}"#;
        let error = map_error_response(400, "Bad Request", body);
        assert!(matches!(error, DetectiveError::Authentication { .. }));
        assert!(error.message().contains("API key"));
    }

    #[test]
    fn test_unauthorized_status_mentions_key_and_code() {
        let error = map_error_response(401, "Unauthorized", "");
        assert!(matches!(error, DetectiveError::Authentication { .. }));
        assert!(error.message().contains("API key"));
        assert!(error.message().contains("401"));
    }

    #[test]
    fn test_server_error_is_generic() {
        let body = r#"{"error":{"code":500,"message":"Internal error encountered.","status":"INTERNAL"}}"#;
        let error = map_error_response(500, "Internal Server Error", body);
        assert!(matches!(error, DetectiveError::Network { .. }));
        assert_eq!(
            error.message(),
            "Request failed: 500 Internal Server Error: Internal error encountered."
        );
    }

    #[test]
    fn test_rate_limit_maps_to_rate_limit() {
        let error = map_error_response(429, "Too Many Requests", "quota exhausted");
        assert!(matches!(error, DetectiveError::RateLimit { .. }));
        assert!(!error.message().contains("API key"));
    }

    #[test]
    fn test_parse_fenced_analysis_and_normalise() {
        let text = "```json\n{\"verdict\":\"Likely False\",\"credibility_score\":142.4,\"summary\":\"s\",\"lenses\":[{\"lens\":\"Source\",\"score\":-3,\"findings\":\"anonymous\"},{\"lens\":\"vibes\",\"score\":50,\"findings\":\"?\"}]}\n```";
        let result = parse_analysis(text, "m").unwrap();
        assert_eq!(result.verdict, Verdict::LikelyFalse);
        assert_eq!(result.credibility_score, 100);
        assert_eq!(result.lenses.len(), 1);
        assert_eq!(result.lenses[0].lens, Lens::Source);
        assert_eq!(result.lenses[0].score, 0);
    }

    #[test]
    fn test_unknown_verdict_is_unverifiable() {
        assert_eq!(parse_verdict("who knows"), Verdict::Unverifiable);
        assert_eq!(parse_verdict("mostly-true"), Verdict::LikelyTrue);
    }

    #[test]
    fn test_empty_candidates_report_block_reason() {
        let response: GenerateContentResponse =
            serde_json::from_str(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).unwrap();
        let error = extract_text(response, "m").unwrap_err();
        assert!(error.message().contains("SAFETY"));
    }

    #[test]
    fn test_garbage_text_is_llm_error() {
        let error = parse_analysis("I think it is false.", "m").unwrap_err();
        assert!(matches!(error, DetectiveError::Llm { .. }));
    }
}
