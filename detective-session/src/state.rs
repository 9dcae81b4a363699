//! Request and view state of a session

use detective_core::AnalysisResult;

/// Lifecycle of the current analysis request.
///
/// Holding result and error in one enum rules out "loading with a stale error" and
/// similar combinations.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RequestState {
    #[default]
    Idle,
    Loading,
    Ready(AnalysisResult),
    Failed {
        message: String,
        reauth_required: bool,
    },
}

impl RequestState {
    pub fn is_loading(&self) -> bool {
        matches!(self, RequestState::Loading)
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        match self {
            RequestState::Ready(result) => Some(result),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            RequestState::Failed { message, .. } => Some(message),
            _ => None,
        }
    }
}

/// Which screen a front end should render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Ask for an API key before anything else
    CredentialPrompt,
    /// Claim input, result or error
    Main,
}
