//! Identity provider client.
//!
//! Talks to the hosted auth service's REST API: builds the OAuth authorize
//! redirect, turns the redirect callback into a session, refreshes tokens and
//! signs out. The OAuth consent itself happens entirely on the provider side.

use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::types::errors::AuthError;
use crate::types::session::{AuthSession, AuthUser};
use crate::types::settings::BackendSettings;

/// Operations the session manager needs from the identity provider.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// URL the user agent must be sent to in order to start an OAuth sign-in.
    fn authorize_url(&self, provider: &str, redirect_to: &str) -> Result<String, AuthError>;

    /// Builds a session from the URL the provider redirected back to.
    async fn session_from_callback(&self, callback_url: &str) -> Result<AuthSession, AuthError>;

    /// Exchanges a refresh token for a fresh session.
    async fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession, AuthError>;

    /// Revokes the session on the provider side.
    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError>;
}

/// Token grant as returned by `/token`.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    #[serde(default = "default_token_type")]
    token_type: String,
    user: AuthUser,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// `AuthProvider` backed by the hosted auth REST API.
pub struct GoTrueClient {
    http: Client,
    auth_url: String,
    anon_key: String,
}

impl GoTrueClient {
    pub fn new(backend: &BackendSettings) -> Self {
        Self::with_client(Client::new(), backend)
    }

    pub fn with_client(http: Client, backend: &BackendSettings) -> Self {
        Self {
            http,
            auth_url: backend.auth_url(),
            anon_key: backend.anon_key.clone(),
        }
    }

    fn request(&self, builder: RequestBuilder, access_token: Option<&str>) -> RequestBuilder {
        let builder = builder.header("apikey", &self.anon_key);
        match access_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn fetch_user(&self, access_token: &str) -> Result<AuthUser, AuthError> {
        let url = format!("{}/user", self.auth_url);
        debug!(%url, "fetching signed-in user");
        let response = self
            .request(self.http.get(&url), Some(access_token))
            .send()
            .await
            .map_err(|e| AuthError::NetworkError(e.to_string()))?;
        let response = check_status(response).await?;
        response
            .json::<AuthUser>()
            .await
            .map_err(|e| AuthError::MalformedResponse(e.to_string()))
    }
}

#[async_trait]
impl AuthProvider for GoTrueClient {
    fn authorize_url(&self, provider: &str, redirect_to: &str) -> Result<String, AuthError> {
        let url = Url::parse_with_params(
            &format!("{}/authorize", self.auth_url),
            &[("provider", provider), ("redirect_to", redirect_to)],
        )
        .map_err(|e| AuthError::InvalidCallback(format!("bad auth URL: {}", e)))?;
        Ok(url.to_string())
    }

    async fn session_from_callback(&self, callback_url: &str) -> Result<AuthSession, AuthError> {
        let params = CallbackParams::parse(callback_url)?;
        let user = self.fetch_user(&params.access_token).await?;
        let expires_at = params
            .expires_at
            .or_else(|| params.expires_in.map(|secs| now_secs().saturating_add(secs)))
            .or_else(|| jwt_expiry(&params.access_token))
            .ok_or_else(|| AuthError::InvalidCallback("no token expiry".to_string()))?;

        Ok(AuthSession {
            access_token: params.access_token,
            refresh_token: params.refresh_token,
            expires_at,
            token_type: params.token_type,
            user,
        })
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession, AuthError> {
        let url = format!("{}/token", self.auth_url);
        debug!(%url, "refreshing session");
        let response = self
            .request(self.http.post(&url), None)
            .query(&[("grant_type", "refresh_token")])
            .json(&json!({ "refresh_token": refresh_token }))
            .send()
            .await
            .map_err(|e| AuthError::NetworkError(e.to_string()))?;
        let response = check_status(response).await?;
        let grant: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::MalformedResponse(e.to_string()))?;

        let expires_at = grant
            .expires_at
            .or_else(|| grant.expires_in.map(|secs| now_secs().saturating_add(secs)))
            .or_else(|| jwt_expiry(&grant.access_token))
            .ok_or_else(|| AuthError::MalformedResponse("no token expiry".to_string()))?;

        Ok(AuthSession {
            access_token: grant.access_token,
            refresh_token: grant.refresh_token,
            expires_at,
            token_type: grant.token_type,
            user: grant.user,
        })
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let url = format!("{}/logout", self.auth_url);
        let response = self
            .request(self.http.post(&url), Some(access_token))
            .send()
            .await
            .map_err(|e| AuthError::NetworkError(e.to_string()))?;
        check_status(response).await?;
        Ok(())
    }
}

async fn check_status(response: Response) -> Result<Response, AuthError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(AuthError::ApiError {
        status: status.as_u16(),
        message: error_message(&body),
    })
}

/// Pulls the human-readable message out of an error body.
pub(crate) fn error_message(body: &str) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        for key in ["message", "error_description", "msg", "error"] {
            if let Some(Value::String(msg)) = map.get(key) {
                return msg.clone();
            }
        }
    }
    body.trim().to_string()
}

fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

/// Reads the `exp` claim of a JWT without verifying its signature.
pub fn jwt_expiry(token: &str) -> Option<i64> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: Value = serde_json::from_slice(&bytes).ok()?;
    claims.get("exp")?.as_i64()
}

/// Parses an expiry field, which must be a positive number of seconds.
fn positive_secs(field: &str, value: &str) -> Result<i64, AuthError> {
    match value.parse::<i64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(AuthError::InvalidCallback(format!("bad {}: {}", field, value))),
    }
}

/// Token parameters carried in the fragment of the sign-in redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackParams {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: Option<i64>,
    pub expires_at: Option<i64>,
    pub token_type: String,
}

impl CallbackParams {
    /// Parses `...#access_token=..&refresh_token=..`. Falls back to the query
    /// string when the fragment is empty.
    pub fn parse(callback_url: &str) -> Result<Self, AuthError> {
        let mut url = Url::parse(callback_url)
            .map_err(|e| AuthError::InvalidCallback(format!("{}: {}", callback_url, e)))?;

        // Reuse the query parser for the fragment.
        if let Some(fragment) = url.fragment().filter(|f| !f.is_empty()).map(str::to_string) {
            url.set_query(Some(&fragment));
        }

        let mut access_token = None;
        let mut refresh_token = None;
        let mut expires_in = None;
        let mut expires_at = None;
        let mut token_type = None;
        let mut error = None;
        let mut error_description = None;

        for (key, value) in url.query_pairs() {
            let value = value.into_owned();
            match key.as_ref() {
                "access_token" => access_token = Some(value),
                "refresh_token" => refresh_token = Some(value),
                "expires_in" => expires_in = Some(positive_secs("expires_in", &value)?),
                "expires_at" => expires_at = Some(positive_secs("expires_at", &value)?),
                "token_type" => token_type = Some(value),
                "error" => error = Some(value),
                "error_description" => error_description = Some(value),
                _ => {}
            }
        }

        if let Some(error) = error {
            return Err(AuthError::InvalidCallback(match error_description {
                Some(desc) => format!("{}: {}", error, desc),
                None => error,
            }));
        }

        Ok(Self {
            access_token: access_token
                .filter(|t| !t.is_empty())
                .ok_or_else(|| AuthError::InvalidCallback("missing access_token".to_string()))?,
            refresh_token: refresh_token
                .filter(|t| !t.is_empty())
                .ok_or_else(|| AuthError::InvalidCallback("missing refresh_token".to_string()))?,
            expires_in,
            expires_at,
            token_type: token_type.unwrap_or_else(default_token_type),
        })
    }
}
