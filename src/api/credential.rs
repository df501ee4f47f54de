//! Personal Access Token handling for Azure DevOps requests.
//!
//! Azure DevOps accepts a PAT as the password of HTTP Basic authentication
//! with an empty user name.

use base64::Engine;
use reqwest::header::HeaderValue;
use secrecy::{ExposeSecret, SecretString};

use crate::error::ApiError;

/// PAT-based credential for Azure DevOps authentication.
///
/// The token is kept in a `SecretString` and never shows up in `Debug` output.
///
/// # Example
///
/// ```rust
/// use devops_queries::api::PatCredential;
/// use secrecy::SecretString;
///
/// let credential = PatCredential::new(SecretString::from("pat".to_string()));
/// let header = credential.basic_auth_header().unwrap();
/// assert!(header.is_sensitive());
/// ```
#[derive(Clone)]
pub struct PatCredential {
    pat: SecretString,
}

impl PatCredential {
    pub fn new(pat: SecretString) -> Self {
        Self { pat }
    }

    /// `Basic base64(":" + pat)`, marked sensitive so it is left out of
    /// reqwest's debug output.
    pub fn basic_auth_header(&self) -> Result<HeaderValue, ApiError> {
        let encoded = base64::engine::general_purpose::STANDARD
            .encode(format!(":{}", self.pat.expose_secret()));
        let mut value = HeaderValue::from_str(&format!("Basic {encoded}"))
            .map_err(|_| ApiError::InvalidCredential)?;
        value.set_sensitive(true);
        Ok(value)
    }
}

impl std::fmt::Debug for PatCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatCredential")
            .field("pat", &"[REDACTED]")
            .finish()
    }
}
