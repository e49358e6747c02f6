// ─── Identity Provider ───
// Keycloak OpenID Connect endpoints for the authorization-code flow.

use serde::Deserialize;
use tracing::debug;

use crate::core::config::LauncherConfig;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::http::Transport;

use super::pkce;

/// Token endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenSet {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    /// Refresh token lifetime in seconds; `0` or absent for offline tokens.
    #[serde(default)]
    pub refresh_expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct OAuthErrorBody {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct IdentityProvider {
    realm_url: String,
    client_id: String,
    redirect_uri: String,
}

impl IdentityProvider {
    pub fn new(config: &LauncherConfig) -> Self {
        Self {
            realm_url: config.identity_realm.trim_end_matches('/').to_string(),
            client_id: config.client_id.clone(),
            redirect_uri: config.redirect_uri.clone(),
        }
    }

    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    pub fn authorization_endpoint(&self) -> String {
        format!("{}/protocol/openid-connect/auth", self.realm_url)
    }

    pub fn token_endpoint(&self) -> String {
        format!("{}/protocol/openid-connect/token", self.realm_url)
    }

    pub fn authorization_url(
        &self,
        state: &str,
        code_verifier: &str,
        scopes: &[&str],
    ) -> LauncherResult<String> {
        let challenge = pkce::code_challenge(code_verifier);
        let scope = scopes.join(" ");
        let url = reqwest::Url::parse_with_params(
            &self.authorization_endpoint(),
            &[
                ("response_type", "code"),
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("state", state),
                ("scope", scope.as_str()),
                ("code_challenge", challenge.as_str()),
                ("code_challenge_method", "S256"),
            ],
        )
        .map_err(|e| LauncherError::Other(format!("Invalid identity realm URL: {e}")))?;
        Ok(url.to_string())
    }

    pub async fn exchange_code(
        &self,
        transport: &dyn Transport,
        code: &str,
        code_verifier: &str,
    ) -> LauncherResult<TokenSet> {
        self.token_request(
            transport,
            &[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("client_id", self.client_id.as_str()),
                ("code_verifier", code_verifier),
            ],
        )
        .await
    }

    pub async fn refresh(
        &self,
        transport: &dyn Transport,
        refresh_token: &str,
    ) -> LauncherResult<TokenSet> {
        self.token_request(
            transport,
            &[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", self.client_id.as_str()),
            ],
        )
        .await
    }

    async fn token_request(
        &self,
        transport: &dyn Transport,
        form: &[(&str, &str)],
    ) -> LauncherResult<TokenSet> {
        let endpoint = self.token_endpoint();
        let response = transport
            .post_form(&endpoint, form)
            .await
            .map_err(|e| LauncherError::IdentityProvider(format!("token request failed: {e}")))?;

        if !response.is_success() {
            let detail = match response.json::<OAuthErrorBody>() {
                Ok(body) => match body.error_description {
                    Some(description) => format!("{}: {}", body.error, description),
                    None => body.error,
                },
                Err(_) => format!("HTTP {}", response.status),
            };
            return Err(LauncherError::IdentityProvider(detail));
        }

        debug!("Token endpoint answered {}", response.status);
        response
            .json::<TokenSet>()
            .map_err(|e| LauncherError::IdentityProvider(format!("malformed token response: {e}")))
    }
}
