//! Google Cloud credential helper
//!
//! Resolves Application Default Credentials once at startup and hands out
//! `Authorization` header values for individual gRPC requests. Token caching
//! and refresh are handled inside the credentials provider.

use google_cloud_auth::credentials::{Builder as CredentialsBuilder, CacheableResource, Credentials};
use http::Extensions;

use crate::core::caller::CallFailure;
use crate::errors::ConfigError;

/// ADC-backed credential source shared by all in-flight requests
pub struct GoogleAuth {
    credentials: Credentials,
}

impl GoogleAuth {
    /// Resolve Application Default Credentials
    ///
    /// Uses the standard lookup chain: `GOOGLE_APPLICATION_CREDENTIALS`,
    /// gcloud user credentials, then the metadata server.
    pub fn new() -> Result<Self, ConfigError> {
        let credentials = CredentialsBuilder::default()
            .build()
            .map_err(|e| ConfigError::Credentials(e.to_string()))?;
        Ok(Self { credentials })
    }

    /// Current `Authorization` header value (`Bearer <token>`)
    pub async fn authorization_value(&self) -> Result<String, CallFailure> {
        let headers = match self
            .credentials
            .headers(Extensions::new())
            .await
            .map_err(|e| CallFailure::Other(format!("credential refresh failed: {e}")))?
        {
            CacheableResource::New { data, .. } => data,
            // Only returned when an entity tag is supplied; a fresh
            // Extensions never carries one.
            CacheableResource::NotModified => {
                return Err(CallFailure::Other(
                    "credential provider returned no headers".to_string(),
                ));
            }
        };

        headers
            .get(http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| {
                CallFailure::Other("credential provider returned no authorization header".into())
            })
    }
}
