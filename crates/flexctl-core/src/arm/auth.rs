//! Service principal token acquisition
//!
//! Client-credentials grant against the Microsoft identity platform v2
//! endpoint. Tokens are cached and refreshed shortly before they expire.

use super::error::ArmError;
use super::wire::{TokenError, TokenResponse};
use crate::config::ServicePrincipal;
use reqwest::header::CONTENT_TYPE;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, trace};

/// Refresh this long before the provider-reported expiry
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

struct CachedToken {
    value: String,
    expires_at: Instant,
}

pub(crate) struct TokenProvider {
    http: reqwest::Client,
    principal: ServicePrincipal,
    token_url: String,
    scope: String,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
    pub fn new(
        http: reqwest::Client,
        principal: &ServicePrincipal,
        authority_host: &str,
        management_endpoint: &str,
    ) -> Self {
        let token_url = format!(
            "{}/{}/oauth2/v2.0/token",
            authority_host.trim_end_matches('/'),
            urlencoding::encode(&principal.tenant_id)
        );
        let scope = format!("{}/.default", management_endpoint.trim_end_matches('/'));

        Self {
            http,
            principal: principal.clone(),
            token_url,
            scope,
            cached: Mutex::new(None),
        }
    }

    /// A valid bearer token, fetching a new one when needed
    pub async fn token(&self) -> Result<String, ArmError> {
        let mut cached = self.cached.lock().await;

        if let Some(ref token) = *cached
            && Instant::now() < token.expires_at
        {
            trace!("Reusing cached access token");
            return Ok(token.value.clone());
        }

        debug!(
            "Requesting access token for client {}",
            self.principal.client_id
        );
        let fresh = self.fetch().await?;
        let value = fresh.value.clone();
        *cached = Some(fresh);
        Ok(value)
    }

    async fn fetch(&self) -> Result<CachedToken, ArmError> {
        let form = serde_urlencoded::to_string([
            ("grant_type", "client_credentials"),
            ("client_id", self.principal.client_id.as_str()),
            ("client_secret", self.principal.client_secret.as_str()),
            ("scope", self.scope.as_str()),
        ])
        .map_err(|e| ArmError::InvalidResponse(format!("Failed to encode token request: {}", e)))?;

        let response = self
            .http
            .post(&self.token_url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = match serde_json::from_str::<TokenError>(&body) {
                Ok(err) if !err.error_description.is_empty() => err.error_description,
                Ok(err) if !err.error.is_empty() => err.error,
                _ => format!("token endpoint returned HTTP {}", status.as_u16()),
            };
            return Err(ArmError::Authentication { message });
        }

        let token: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| ArmError::InvalidResponse(format!("Malformed token response: {}", e)))?;

        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(EXPIRY_MARGIN);
        Ok(CachedToken {
            value: token.access_token,
            expires_at: Instant::now() + lifetime,
        })
    }
}
