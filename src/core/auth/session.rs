// ─── Session Manager ───
// Holds the signed-in user's tokens, drives the PKCE sign-in flow and
// refreshes the access token lazily when it is read.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{error, info, instrument, warn};

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::http::Transport;
use crate::core::state::store::JsonStore;

use super::pkce;
use super::provider::{IdentityProvider, TokenSet};

const KEY_ACCESS_TOKEN: &str = "accessToken";
const KEY_REFRESH_TOKEN: &str = "refreshToken";
const KEY_ACCESS_EXPIRES_AT: &str = "accessTokenExpiresAt";
const KEY_REFRESH_EXPIRES_AT: &str = "refreshTokenExpiresAt";

const SCOPES: [&str; 2] = ["openid", "offline_access"];

/// Token state of the current user.
///
/// `pending_*` and `join_token` only ever live in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pending_state: String,
    pending_code_verifier: String,
    pub access_token: String,
    pub refresh_token: String,
    /// Epoch milliseconds.
    pub access_token_expires_at: Option<i64>,
    /// Epoch milliseconds.
    pub refresh_token_expires_at: Option<i64>,
    join_token: String,
}

impl Session {
    pub fn has_pending_flow(&self) -> bool {
        !self.pending_state.is_empty()
    }
}

/// The persisted subset of a session.
#[derive(Debug, Clone)]
struct PersistedTokens {
    access_token: String,
    refresh_token: String,
    access_token_expires_at: Option<i64>,
    refresh_token_expires_at: Option<i64>,
}

impl From<&Session> for PersistedTokens {
    fn from(session: &Session) -> Self {
        Self {
            access_token: session.access_token.clone(),
            refresh_token: session.refresh_token.clone(),
            access_token_expires_at: session.access_token_expires_at,
            refresh_token_expires_at: session.refresh_token_expires_at,
        }
    }
}

pub struct SessionManager {
    provider: IdentityProvider,
    transport: Arc<dyn Transport>,
    store_path: PathBuf,
    session: Session,
}

impl SessionManager {
    /// Restore persisted tokens from `store_path` (`auth.json`).
    pub async fn load(
        provider: IdentityProvider,
        transport: Arc<dyn Transport>,
        store_path: PathBuf,
    ) -> LauncherResult<Self> {
        let store = JsonStore::load(&store_path).await?;
        let session = Session {
            access_token: store.get(KEY_ACCESS_TOKEN).unwrap_or_default(),
            refresh_token: store.get(KEY_REFRESH_TOKEN).unwrap_or_default(),
            access_token_expires_at: store.get(KEY_ACCESS_EXPIRES_AT),
            refresh_token_expires_at: store.get(KEY_REFRESH_EXPIRES_AT),
            ..Session::default()
        };

        Ok(Self {
            provider,
            transport,
            store_path,
            session,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn is_signed_in(&self) -> bool {
        !self.session.access_token.is_empty()
    }

    /// Start a sign-in flow. Any flow already in flight is abandoned.
    pub fn create_authorization_url(&mut self) -> LauncherResult<String> {
        let state = pkce::generate_state();
        let code_verifier = pkce::generate_code_verifier();
        let url = self
            .provider
            .authorization_url(&state, &code_verifier, &SCOPES)?;
        self.session.pending_state = state;
        self.session.pending_code_verifier = code_verifier;
        Ok(url)
    }

    /// Finish the flow started by `create_authorization_url`.
    ///
    /// Tokens are only touched once the provider has answered successfully.
    #[instrument(skip_all)]
    pub async fn validate_authorization_code(
        &mut self,
        code: &str,
        state: &str,
    ) -> LauncherResult<()> {
        if self.session.pending_state.is_empty() || state != self.session.pending_state {
            error!("State mismatch");
            return Err(LauncherError::StateMismatch);
        }

        let tokens = match self
            .provider
            .exchange_code(
                self.transport.as_ref(),
                code,
                &self.session.pending_code_verifier,
            )
            .await
        {
            Ok(tokens) => tokens,
            Err(e) => {
                error!("Authorization code exchange failed: {}", e);
                return Err(e);
            }
        };

        self.apply_tokens(tokens, now_ms());
        self.session.pending_state.clear();
        self.session.pending_code_verifier.clear();
        self.persist().await?;
        info!("Signed in");
        Ok(())
    }

    /// Handle the `selene://auth?code=..&state=..` redirect.
    pub async fn handle_redirect(&mut self, redirect: &str) -> LauncherResult<()> {
        let (code, state) = parse_redirect(redirect, self.provider.redirect_uri())?;
        self.validate_authorization_code(&code, &state).await
    }

    /// The current access token, refreshed first if it has expired.
    ///
    /// A failed refresh is logged and the stale token returned.
    pub async fn access_token(&mut self) -> LauncherResult<String> {
        if self.session.access_token.is_empty() {
            return Err(LauncherError::Unauthorized);
        }

        let expired = self
            .session
            .access_token_expires_at
            .is_some_and(|expires_at| now_ms() >= expires_at);

        if expired && !self.session.refresh_token.is_empty() {
            match self
                .provider
                .refresh(self.transport.as_ref(), &self.session.refresh_token)
                .await
            {
                Ok(tokens) => {
                    self.apply_tokens(tokens, now_ms());
                    if let Err(e) = self.persist().await {
                        warn!("Failed to persist refreshed tokens: {}", e);
                    }
                    info!("Access token refreshed");
                }
                Err(e) => error!("Token refresh failed, using stale access token: {}", e),
            }
        }

        Ok(self.session.access_token.clone())
    }

    /// Clear the tokens. Persisting happens in the background; await the
    /// returned handle to be sure it reached disk.
    pub fn sign_out(&mut self) -> JoinHandle<()> {
        self.session.access_token.clear();
        self.session.refresh_token.clear();
        self.session.access_token_expires_at = None;
        self.session.refresh_token_expires_at = None;

        let path = self.store_path.clone();
        let tokens = PersistedTokens::from(&self.session);
        tokio::spawn(async move {
            if let Err(e) = write_tokens(&path, &tokens).await {
                warn!("Failed to persist sign-out: {}", e);
            }
        })
    }

    pub fn join_token(&self) -> &str {
        &self.session.join_token
    }

    pub fn update_join_token(&mut self, token: impl Into<String>) {
        self.session.join_token = token.into();
    }

    /// Bearer for a game server's bundle endpoints: the join token issued
    /// for that server, or the account access token when none was issued.
    pub async fn bundle_bearer(&mut self) -> LauncherResult<String> {
        if !self.session.join_token.is_empty() {
            return Ok(self.session.join_token.clone());
        }
        self.access_token().await
    }

    fn apply_tokens(&mut self, tokens: TokenSet, now: i64) {
        self.session.access_token = tokens.access_token;
        self.session.access_token_expires_at =
            Some(now.saturating_add(tokens.expires_in.saturating_mul(1000)));
        if let Some(refresh_token) = tokens.refresh_token {
            self.session.refresh_token = refresh_token;
        }
        match tokens.refresh_expires_in {
            Some(ttl) if ttl > 0 => {
                self.session.refresh_token_expires_at =
                    Some(now.saturating_add(ttl.saturating_mul(1000)))
            }
            Some(_) => self.session.refresh_token_expires_at = None,
            None => {}
        }
    }

    async fn persist(&self) -> LauncherResult<()> {
        write_tokens(&self.store_path, &PersistedTokens::from(&self.session)).await
    }
}

async fn write_tokens(path: &Path, tokens: &PersistedTokens) -> LauncherResult<()> {
    let mut store = JsonStore::load(path).await?;
    store.set(KEY_ACCESS_TOKEN, &tokens.access_token)?;
    store.set(KEY_REFRESH_TOKEN, &tokens.refresh_token)?;
    store.set(KEY_ACCESS_EXPIRES_AT, tokens.access_token_expires_at)?;
    store.set(KEY_REFRESH_EXPIRES_AT, tokens.refresh_token_expires_at)?;
    store.save().await
}

fn parse_redirect(redirect: &str, expected: &str) -> LauncherResult<(String, String)> {
    let url = reqwest::Url::parse(redirect.trim())
        .map_err(|e| LauncherError::IdentityProvider(format!("invalid redirect URL: {e}")))?;
    let expected = reqwest::Url::parse(expected)
        .map_err(|e| LauncherError::IdentityProvider(format!("invalid redirect URI: {e}")))?;

    if url.scheme() != expected.scheme() || url.host_str() != expected.host_str() {
        return Err(LauncherError::IdentityProvider(format!(
            "unexpected redirect target: {redirect}"
        )));
    }

    let mut code = None;
    let mut state = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            _ => {}
        }
    }

    match (code, state) {
        (Some(code), Some(state)) if !code.is_empty() && !state.is_empty() => Ok((code, state)),
        _ => Err(LauncherError::IdentityProvider(
            "Missing code or state".into(),
        )),
    }
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}
