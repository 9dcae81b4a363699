//! Detective Session - the session controller
//!
//! Owns the credential lifecycle (saved key, build-time default, prompt) and the
//! request state machine around a single analysis call.

pub mod controller;
pub mod state;
pub mod store;

pub use controller::{
    requires_reauthentication, usable_default_credential, SessionController, CREDENTIAL_SLOT,
    GENERIC_FAILURE_MESSAGE, QUICK_RUN_MIN_CHARS,
};
pub use state::{RequestState, View};
pub use store::{FileStore, MemoryStore};
