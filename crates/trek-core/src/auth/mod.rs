//! Bearer credential access and the remote auth client.
//!
//! All call sites obtain the bearer token through [`Credentials`], which owns
//! the session lifecycle: set on login, cleared on logout or expiry.

use std::fmt;
use std::sync::{Arc, RwLock};

use chrono::Utc;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::normalize_api_url;

const EXPIRY_SKEW_SECONDS: i64 = 60;
/// Longest slice of a non-JSON error body echoed back to the user.
const ERROR_BODY_CHARS: usize = 180;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub token: String,
    /// Unix seconds; `None` when the API does not advertise an expiry.
    pub expires_at: Option<i64>,
    pub user: AuthUser,
}

impl AuthSession {
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|expires_at| expires_at <= Utc::now().timestamp() + EXPIRY_SKEW_SECONDS)
    }
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("AuthSession")
            .field("token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .field("user", &self.user)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Not signed in. Run `trek auth login` first.")]
    NotSignedIn,
    #[error("Invalid auth configuration: {0}")]
    InvalidConfiguration(String),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Failed to parse JSON payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Auth API error: {0}")]
    Api(String),
    #[error("Secure storage error: {0}")]
    SecureStorage(String),
}

pub type AuthResult<T> = Result<T, AuthError>;

/// Durable storage for the signed-in session (keychain, file, memory).
pub trait SessionPersistence: Clone + Send + Sync + 'static {
    fn load_session(&self) -> AuthResult<Option<AuthSession>>;
    fn save_session(&self, session: &AuthSession) -> AuthResult<()>;
    fn clear_session(&self) -> AuthResult<()>;
}

/// Process-local session store.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    session: Arc<RwLock<Option<AuthSession>>>,
}

impl SessionPersistence for MemorySessionStore {
    fn load_session(&self) -> AuthResult<Option<AuthSession>> {
        let guard = self
            .session
            .read()
            .map_err(|error| AuthError::SecureStorage(error.to_string()))?;
        Ok(guard.clone())
    }

    fn save_session(&self, session: &AuthSession) -> AuthResult<()> {
        let mut guard = self
            .session
            .write()
            .map_err(|error| AuthError::SecureStorage(error.to_string()))?;
        *guard = Some(session.clone());
        Ok(())
    }

    fn clear_session(&self) -> AuthResult<()> {
        let mut guard = self
            .session
            .write()
            .map_err(|error| AuthError::SecureStorage(error.to_string()))?;
        *guard = None;
        Ok(())
    }
}

/// Anything that can hand out the current bearer token.
pub trait BearerSource: Send + Sync {
    fn bearer(&self) -> AuthResult<String>;

    /// Called when the API rejected the token.
    fn invalidate(&self) -> AuthResult<()>;
}

/// Single access point for the bearer credential.
#[derive(Clone)]
pub struct Credentials<S: SessionPersistence> {
    store: S,
    current: Arc<RwLock<Option<AuthSession>>>,
}

impl<S: SessionPersistence> Credentials<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            current: Arc::new(RwLock::new(None)),
        }
    }

    /// Current unexpired session, loading it from the store on first use.
    pub fn session(&self) -> AuthResult<Option<AuthSession>> {
        let cached = self
            .current
            .read()
            .map_err(|error| AuthError::SecureStorage(error.to_string()))?
            .clone();
        let session = match cached {
            Some(session) => Some(session),
            None => self.store.load_session()?,
        };

        match session {
            Some(session) if session.is_expired() => {
                tracing::info!("Stored session for {} has expired", session.user.id);
                self.clear()?;
                Ok(None)
            }
            Some(session) => {
                self.cache(Some(session.clone()))?;
                Ok(Some(session))
            }
            None => Ok(None),
        }
    }

    pub fn set(&self, session: AuthSession) -> AuthResult<()> {
        self.store.save_session(&session)?;
        self.cache(Some(session))
    }

    pub fn clear(&self) -> AuthResult<()> {
        self.store.clear_session()?;
        self.cache(None)
    }

    fn cache(&self, session: Option<AuthSession>) -> AuthResult<()> {
        let mut guard = self
            .current
            .write()
            .map_err(|error| AuthError::SecureStorage(error.to_string()))?;
        *guard = session;
        Ok(())
    }
}

impl<S: SessionPersistence> BearerSource for Credentials<S> {
    fn bearer(&self) -> AuthResult<String> {
        self.session()?
            .map(|session| session.token)
            .ok_or(AuthError::NotSignedIn)
    }

    fn invalidate(&self) -> AuthResult<()> {
        tracing::warn!("API rejected the stored credential; clearing session");
        self.clear()
    }
}

/// Client for the remote API's `/auth` endpoints.
#[derive(Clone)]
pub struct AuthClient<S: SessionPersistence> {
    api_url: String,
    client: Client,
    credentials: Credentials<S>,
}

impl<S: SessionPersistence> AuthClient<S> {
    pub fn new(api_url: impl AsRef<str>, credentials: Credentials<S>) -> AuthResult<Self> {
        let api_url = normalize_api_url(api_url.as_ref()).map_err(AuthError::InvalidConfiguration)?;
        Ok(Self {
            api_url,
            client: Client::builder().build()?,
            credentials,
        })
    }

    pub const fn credentials(&self) -> &Credentials<S> {
        &self.credentials
    }

    pub async fn login(&self, email: &str, password: &str) -> AuthResult<AuthSession> {
        validate_credentials(email, password)?;

        let payload = serde_json::json!({
            "email": email.trim(),
            "password": password,
        });
        let response = self
            .client
            .post(format!("{}/auth/login", self.api_url))
            .json(&payload)
            .send()
            .await?;
        let session = read_session_response(response).await?;
        self.credentials.set(session.clone())?;
        Ok(session)
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> AuthResult<AuthSession> {
        validate_credentials(email, password)?;
        if name.trim().is_empty() {
            return Err(AuthError::Api("Name is required".to_string()));
        }

        let payload = serde_json::json!({
            "name": name.trim(),
            "email": email.trim(),
            "password": password,
        });
        let response = self
            .client
            .post(format!("{}/auth/register", self.api_url))
            .json(&payload)
            .send()
            .await?;
        let session = read_session_response(response).await?;
        self.credentials.set(session.clone())?;
        Ok(session)
    }

    /// Fetch the profile behind the stored token.
    pub async fn current_user(&self) -> AuthResult<AuthUser> {
        let token = self.credentials.bearer()?;
        let response = self
            .client
            .get(format!("{}/auth/me", self.api_url))
            .bearer_auth(token)
            .send()
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            self.credentials.invalidate()?;
            return Err(AuthError::NotSignedIn);
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Api(parse_api_error(status, &body)));
        }
        Ok(response.json::<MeResponse>().await?.into())
    }

    pub fn logout(&self) -> AuthResult<()> {
        self.credentials.clear()
    }
}

fn validate_credentials(email: &str, password: &str) -> AuthResult<()> {
    if email.trim().is_empty() {
        return Err(AuthError::Api("Email is required".to_string()));
    }
    if password.trim().is_empty() {
        return Err(AuthError::Api("Password is required".to_string()));
    }
    Ok(())
}

async fn read_session_response(response: reqwest::Response) -> AuthResult<AuthSession> {
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(AuthError::Api(parse_api_error(status, &body)));
    }
    response.json::<LoginResponse>().await?.into_session()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    token: Option<String>,
    access_token: Option<String>,
    expires_at: Option<i64>,
    expires_in: Option<i64>,
    user: Option<AuthUser>,
}

impl LoginResponse {
    fn into_session(self) -> AuthResult<AuthSession> {
        let token = self
            .token
            .or(self.access_token)
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AuthError::Api("Auth response did not include a token".to_string()))?;
        let user = self
            .user
            .ok_or_else(|| AuthError::Api("Auth response did not include a user".to_string()))?;
        let expires_at = self.expires_at.or_else(|| {
            self.expires_in
                .map(|expires_in| Utc::now().timestamp().saturating_add(expires_in))
        });

        Ok(AuthSession {
            token,
            expires_at,
            user,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MeResponse {
    Wrapped { user: AuthUser },
    Flat(AuthUser),
}

impl From<MeResponse> for AuthUser {
    fn from(value: MeResponse) -> Self {
        match value {
            MeResponse::Wrapped { user } | MeResponse::Flat(user) => user,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
    message: Option<String>,
}

pub(crate) fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.message.or(payload.error) {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }

    let excerpt: String = body.trim().chars().take(ERROR_BODY_CHARS).collect();
    if excerpt.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{excerpt} ({})", status.as_u16())
    }
}
