//! PAT-based credential for the work item tracking server.
//!
//! The server accepts a Personal Access Token as HTTP Basic authentication with an
//! empty user name.

use base64::Engine;
use secrecy::{ExposeSecret, SecretString};

/// PAT-based credential.
///
/// The PAT is stored using `SecretString` and only exposed while the
/// `Authorization` header value is built.
///
/// # Example
///
/// ```rust
/// use tfsclient::api::PatCredential;
///
/// let credential = PatCredential::from_string("your-pat-token".to_string());
/// assert!(credential.authorization_header().starts_with("Basic "));
/// ```
#[derive(Clone)]
pub struct PatCredential {
    pat: SecretString,
}

impl PatCredential {
    /// Creates a new PAT credential from a SecretString.
    pub fn new(pat: SecretString) -> Self {
        Self { pat }
    }

    /// Creates a new PAT credential from a plain string.
    pub fn from_string(pat: String) -> Self {
        Self {
            pat: SecretString::from(pat),
        }
    }

    /// Value of the `Authorization` header: `Basic base64(":" + pat)`.
    pub fn authorization_header(&self) -> String {
        let encoded = base64::engine::general_purpose::STANDARD
            .encode(format!(":{}", self.pat.expose_secret()));
        format!("Basic {encoded}")
    }
}

impl std::fmt::Debug for PatCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatCredential")
            .field("pat", &"[REDACTED]")
            .finish()
    }
}
