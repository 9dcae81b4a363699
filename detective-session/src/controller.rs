//! Session controller: credential lifecycle and the analysis request state machine

use detective_core::{
    log_operation_start, performance, AnalysisRequest, AnalysisResult, AnalysisService,
    Credential, DetectiveResult, KeyValueStore,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::state::{RequestState, View};

/// Storage slot holding the saved API key
pub const CREDENTIAL_SLOT: &str = "DIGITAL_DETECTIVE_KEY";

/// Shown when a failure carries no message of its own
pub const GENERIC_FAILURE_MESSAGE: &str = "Analysis failed.";

/// Claims longer than this (in characters) get the quick-run suggestion
pub const QUICK_RUN_MIN_CHARS: usize = 50;

const PLACEHOLDER_MARKER: &str = "YOUR_API_KEY";

/// Turn a build-time default into a credential, rejecting unset and placeholder values
pub fn usable_default_credential(raw: Option<&str>) -> Option<Credential> {
    let raw = raw?;
    if raw.is_empty() || raw == "undefined" || raw.contains(PLACEHOLDER_MARKER) {
        return None;
    }
    Some(Credential::new(raw))
}

/// Whether a failure message suggests the API key was rejected.
///
/// Plain substring match; a "401" appearing for unrelated reasons also triggers it.
pub fn requires_reauthentication(message: &str) -> bool {
    message.contains("API key") || message.contains("401")
}

/// One user's fact-checking session
pub struct SessionController {
    store: Arc<dyn KeyValueStore>,
    service: Arc<dyn AnalysisService>,
    credential: Option<Credential>,
    pending_credential: String,
    prompt_visible: bool,
    claim_text: String,
    request: RequestState,
}

impl SessionController {
    /// Restore the saved credential, falling back to `default_credential`.
    ///
    /// The prompt is shown when neither yields a credential. A default is adopted for
    /// this session only and never written to the store.
    pub fn initialize(
        store: Arc<dyn KeyValueStore>,
        service: Arc<dyn AnalysisService>,
        default_credential: Option<&str>,
    ) -> Self {
        let stored = match store.get(CREDENTIAL_SLOT) {
            Ok(value) => value.filter(|v| !v.is_empty()).map(Credential::new),
            Err(e) => {
                warn!(error = %e, "Could not read saved API key, treating as absent");
                None
            }
        };

        let credential = match stored {
            Some(credential) => {
                info!("Using saved API key");
                Some(credential)
            }
            None => {
                let fallback = usable_default_credential(default_credential);
                if fallback.is_some() {
                    info!("Using built-in default API key");
                }
                fallback
            }
        };

        let prompt_visible = credential.is_none();
        if prompt_visible {
            debug!("No usable API key, prompting");
        }

        Self {
            store,
            service,
            credential,
            pending_credential: String::new(),
            prompt_visible,
            claim_text: String::new(),
            request: RequestState::Idle,
        }
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    pub fn prompt_visible(&self) -> bool {
        self.prompt_visible
    }

    pub fn view(&self) -> View {
        if self.prompt_visible {
            View::CredentialPrompt
        } else {
            View::Main
        }
    }

    pub fn pending_credential(&self) -> &str {
        &self.pending_credential
    }

    /// Update the prompt's input buffer
    pub fn set_pending_credential(&mut self, text: impl Into<String>) {
        self.pending_credential = text.into();
    }

    /// Whether the prompt's submit affordance is enabled
    pub fn can_save_credential(&self) -> bool {
        Credential::is_acceptable(&self.pending_credential)
    }

    /// Save whatever is in the prompt's input buffer
    pub fn save_pending_credential(&mut self) -> DetectiveResult<bool> {
        let candidate = self.pending_credential.clone();
        let accepted = self.save_credential(&candidate)?;
        if accepted {
            self.pending_credential.clear();
        }
        Ok(accepted)
    }

    /// Persist and activate `candidate` if it passes the length check.
    ///
    /// Returns `Ok(false)` and changes nothing when it does not. A failed write also
    /// leaves the session unchanged.
    pub fn save_credential(&mut self, candidate: &str) -> DetectiveResult<bool> {
        if !Credential::is_acceptable(candidate) {
            debug!("Rejected API key candidate: too short");
            return Ok(false);
        }

        self.store.set(CREDENTIAL_SLOT, candidate)?;
        self.credential = Some(Credential::new(candidate));
        self.prompt_visible = false;

        info!("API key saved");
        Ok(true)
    }

    /// Forget the credential everywhere and show the prompt.
    ///
    /// The in-memory session is cleared even if erasing the stored copy fails; that
    /// failure is still returned.
    pub fn clear_credential(&mut self) -> DetectiveResult<()> {
        self.credential = None;
        self.pending_credential.clear();
        self.prompt_visible = true;

        self.store.remove(CREDENTIAL_SLOT)?;
        info!("API key cleared");
        Ok(())
    }

    pub fn claim_text(&self) -> &str {
        &self.claim_text
    }

    pub fn set_claim_text(&mut self, text: impl Into<String>) {
        self.claim_text = text.into();
    }

    pub fn request_state(&self) -> &RequestState {
        &self.request
    }

    pub fn is_loading(&self) -> bool {
        self.request.is_loading()
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.request.result()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.request.error_message()
    }

    /// Whether to nudge the user to run the analysis they have typed
    pub fn suggests_quick_run(&self) -> bool {
        matches!(self.request, RequestState::Idle | RequestState::Failed { .. })
            && self.claim_text.chars().count() > QUICK_RUN_MIN_CHARS
    }

    /// Enter the loading state for the current claim.
    ///
    /// Returns `None`, touching nothing, when the claim is blank. Re-entry while already
    /// loading is not guarded here.
    pub fn begin_analysis(&mut self) -> Option<AnalysisRequest> {
        if self.claim_text.trim().is_empty() {
            return None;
        }

        self.request = RequestState::Loading;
        Some(AnalysisRequest::new(self.claim_text.clone()))
    }

    /// Record the outcome of the request started by [`Self::begin_analysis`]
    pub fn finish_analysis(&mut self, outcome: DetectiveResult<AnalysisResult>) {
        if !self.request.is_loading() {
            debug!("Analysis finished without a pending request");
        }

        match outcome {
            Ok(result) => {
                info!(verdict = result.verdict.label(), "Analysis complete");
                self.request = RequestState::Ready(result);
            }
            Err(error) => {
                error.log();

                let mut message = error.message();
                if message.trim().is_empty() {
                    message = GENERIC_FAILURE_MESSAGE.to_string();
                }

                let reauth_required = requires_reauthentication(&message);
                if reauth_required {
                    warn!("Analysis failure looks like a rejected API key, prompting again");
                    self.prompt_visible = true;
                }

                self.request = RequestState::Failed {
                    message,
                    reauth_required,
                };
            }
        }
    }

    /// Analyze the current claim with the active credential.
    ///
    /// Returns whether a request was issued. One attempt per call, no retry.
    pub async fn submit_claim(&mut self) -> bool {
        let Some(request) = self.begin_analysis() else {
            return false;
        };

        log_operation_start!("analyze_claim", claim_chars = request.claim.chars().count());

        let credential = self
            .credential
            .clone()
            .unwrap_or_else(|| Credential::new(""));
        let service = Arc::clone(&self.service);

        let outcome = performance::measure_async(
            "analyze_claim",
            service.analyze(&request.claim, &credential),
        )
        .await;

        self.finish_analysis(outcome);
        true
    }

    /// Clear the claim, result and error; the credential stays
    pub fn reset_session(&mut self) {
        self.claim_text.clear();
        self.request = RequestState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_defaults_are_rejected() {
        assert!(usable_default_credential(None).is_none());
        assert!(usable_default_credential(Some("")).is_none());
        assert!(usable_default_credential(Some("undefined")).is_none());
        assert!(usable_default_credential(Some("YOUR_API_KEY_HERE")).is_none());
        assert!(usable_default_credential(Some("paste-YOUR_API_KEY")).is_none());
    }

    #[test]
    fn test_real_default_is_adopted_even_if_short() {
        let credential = usable_default_credential(Some("abc")).unwrap();
        assert_eq!(credential.expose(), "abc");
    }

    #[test]
    fn test_reauthentication_heuristic() {
        assert!(requires_reauthentication("API key not valid"));
        assert!(requires_reauthentication("Request failed: 401 Unauthorized"));
        assert!(!requires_reauthentication("Request failed: 500 Internal"));
        assert!(!requires_reauthentication("api key expired"));
    }
}
