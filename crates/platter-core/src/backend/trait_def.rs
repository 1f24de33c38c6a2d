//! The `ModelBackend` trait -- the adapter interface for generative-model
//! backends.
//!
//! Each concrete backend (hosted chat API, network-served local model,
//! in-process template model) implements this trait. The trait is
//! intentionally object-safe so it can be stored as `Box<dyn ModelBackend>`
//! in the [`super::BackendRegistry`].

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// One generation request. The backend treats `system` and `user` as opaque
/// text; everything the model needs is already embedded by the prompt
/// builder.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub system: String,
    pub user: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Hard per-call budget; expiry maps to [`BackendError::Timeout`].
    pub timeout: Duration,
}

impl GenerateRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            max_tokens: 2000,
            temperature: 0.7,
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Errors a backend may surface across the adapter boundary.
///
/// Backend-specific failures (HTTP status codes, connection errors, missing
/// credentials) are all folded into `Unavailable`; nothing provider-specific
/// crosses this boundary. Both variants are transient from the caller's point
/// of view -- retrying is the caller's decision, never the adapter's.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend {backend} unavailable: {reason}")]
    Unavailable { backend: String, reason: String },

    #[error("backend {backend} timed out after {elapsed:?}")]
    Timeout { backend: String, elapsed: Duration },
}

impl BackendError {
    pub fn unavailable(backend: &str, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            backend: backend.to_owned(),
            reason: reason.into(),
        }
    }

    pub fn timeout(backend: &str, elapsed: Duration) -> Self {
        Self::Timeout {
            backend: backend.to_owned(),
            elapsed,
        }
    }
}

/// Adapter interface for generative-model backends.
///
/// Implementors translate one request into one raw text reply. They hold no
/// cross-call state beyond their configured endpoint and credentials, do no
/// caching, and never retry internally.
///
/// # Object Safety
///
/// This trait is object-safe: it can be stored as `Box<dyn ModelBackend>` in
/// collections such as [`super::BackendRegistry`].
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Human-readable name for this backend (e.g. "openai").
    fn name(&self) -> &str;

    /// Produce raw model text for the request.
    ///
    /// The reply is untrusted free text; parsing and validation belong to
    /// the caller. Implementations must bound the call by
    /// `request.timeout` and report expiry as [`BackendError::Timeout`].
    async fn generate(&self, request: &GenerateRequest) -> Result<String, BackendError>;
}

// Compile-time assertion: ModelBackend must be object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn ModelBackend) {}
};
