//! Identity provider boundary
//!
//! Credentials and session tokens are delegated to an external identity
//! toolkit; this module is the REST client plus an in-memory variant for
//! zero-config startup and tests. State transitions are published on the
//! identity bus by the API layer, not here.

use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

const USER_AGENT: &str = concat!("sdir/", env!("CARGO_PKG_VERSION"));

/// Identity provider errors
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Email already registered")]
    EmailExists,

    #[error("Password too weak")]
    WeakPassword,

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// A resolved identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub uid: String,
    pub email: String,
}

/// A live session returned by register/login
#[derive(Debug, Clone)]
pub struct Session {
    pub uid: String,
    pub email: String,
    pub id_token: String,
}

/// Enum-dispatched identity provider backend
pub enum IdentityProvider {
    Google(GoogleIdentity),
    Memory(MemoryIdentity),
}

impl IdentityProvider {
    pub async fn register(&self, email: &str, password: &str) -> Result<Session, IdentityError> {
        match self {
            IdentityProvider::Google(p) => p.register(email, password).await,
            IdentityProvider::Memory(p) => p.register(email, password).await,
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Session, IdentityError> {
        match self {
            IdentityProvider::Google(p) => p.login(email, password).await,
            IdentityProvider::Memory(p) => p.login(email, password).await,
        }
    }

    /// Resolve a bearer token to its identity
    pub async fn lookup(&self, id_token: &str) -> Result<Identity, IdentityError> {
        match self {
            IdentityProvider::Google(p) => p.lookup(id_token).await,
            IdentityProvider::Memory(p) => p.lookup(id_token).await,
        }
    }

    /// Delete the account the token belongs to
    pub async fn delete_account(&self, id_token: &str) -> Result<(), IdentityError> {
        match self {
            IdentityProvider::Google(p) => p.delete_account(id_token).await,
            IdentityProvider::Memory(p) => p.delete_account(id_token).await,
        }
    }
}

// ============================================================================
// Identity toolkit REST client
// ============================================================================

/// Client for the managed identity toolkit's REST surface
pub struct GoogleIdentity {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthResponse {
    local_id: String,
    email: String,
    id_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    local_id: String,
    email: String,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    users: Option<Vec<LookupUser>>,
}

impl GoogleIdentity {
    pub fn new(base_url: String, api_key: String) -> Result<Self, IdentityError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| IdentityError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url,
            api_key,
        })
    }

    fn endpoint(&self, action: &str) -> String {
        format!("{}/accounts:{}", self.base_url, action)
    }

    async fn call(&self, action: &str, body: serde_json::Value) -> Result<reqwest::Response, IdentityError> {
        debug!(action, "Calling identity provider");
        let response = self
            .http
            .post(self.endpoint(action))
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| IdentityError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        // The toolkit reports domain errors as {"error":{"message":"CODE"}}
        let code: String = response
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|v| {
                v.get("error")
                    .and_then(|e| e.get("message"))
                    .and_then(|m| m.as_str())
                    .map(str::to_string)
            })
            .unwrap_or_default();

        Err(match code.as_str() {
            "EMAIL_EXISTS" => IdentityError::EmailExists,
            "WEAK_PASSWORD" | "MISSING_PASSWORD" => IdentityError::WeakPassword,
            "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => {
                IdentityError::InvalidCredentials
            }
            "INVALID_ID_TOKEN" | "USER_NOT_FOUND" => IdentityError::InvalidToken,
            _ => IdentityError::Api(status.as_u16(), code),
        })
    }

    async fn register(&self, email: &str, password: &str) -> Result<Session, IdentityError> {
        let response = self
            .call(
                "signUp",
                json!({ "email": email, "password": password, "returnSecureToken": true }),
            )
            .await?;
        let auth: AuthResponse = response
            .json()
            .await
            .map_err(|e| IdentityError::Parse(e.to_string()))?;
        Ok(Session {
            uid: auth.local_id,
            email: auth.email,
            id_token: auth.id_token,
        })
    }

    async fn login(&self, email: &str, password: &str) -> Result<Session, IdentityError> {
        let response = self
            .call(
                "signInWithPassword",
                json!({ "email": email, "password": password, "returnSecureToken": true }),
            )
            .await?;
        let auth: AuthResponse = response
            .json()
            .await
            .map_err(|e| IdentityError::Parse(e.to_string()))?;
        Ok(Session {
            uid: auth.local_id,
            email: auth.email,
            id_token: auth.id_token,
        })
    }

    async fn lookup(&self, id_token: &str) -> Result<Identity, IdentityError> {
        let response = self.call("lookup", json!({ "idToken": id_token })).await?;
        let lookup: LookupResponse = response
            .json()
            .await
            .map_err(|e| IdentityError::Parse(e.to_string()))?;
        let user = lookup
            .users
            .and_then(|mut users| users.pop())
            .ok_or(IdentityError::InvalidToken)?;
        Ok(Identity {
            uid: user.local_id,
            email: user.email,
        })
    }

    async fn delete_account(&self, id_token: &str) -> Result<(), IdentityError> {
        self.call("delete", json!({ "idToken": id_token })).await?;
        Ok(())
    }
}

// ============================================================================
// In-memory identity provider
// ============================================================================

struct MemoryAccount {
    uid: String,
    email: String,
    password: String,
}

/// In-memory identity provider: zero-config default and test double
pub struct MemoryIdentity {
    accounts: RwLock<Vec<MemoryAccount>>,
    tokens: RwLock<HashMap<String, String>>,
}

impl MemoryIdentity {
    pub fn new() -> Self {
        Self {
            accounts: RwLock::new(Vec::new()),
            tokens: RwLock::new(HashMap::new()),
        }
    }

    async fn issue_token(&self, uid: &str) -> String {
        let token = Uuid::new_v4().to_string();
        self.tokens
            .write()
            .await
            .insert(token.clone(), uid.to_string());
        token
    }

    async fn register(&self, email: &str, password: &str) -> Result<Session, IdentityError> {
        // Same minimum the managed toolkit enforces
        if password.len() < 6 {
            return Err(IdentityError::WeakPassword);
        }
        let mut accounts = self.accounts.write().await;
        if accounts.iter().any(|a| a.email == email) {
            return Err(IdentityError::EmailExists);
        }
        let uid = Uuid::new_v4().to_string();
        accounts.push(MemoryAccount {
            uid: uid.clone(),
            email: email.to_string(),
            password: password.to_string(),
        });
        drop(accounts);

        let id_token = self.issue_token(&uid).await;
        Ok(Session {
            uid,
            email: email.to_string(),
            id_token,
        })
    }

    async fn login(&self, email: &str, password: &str) -> Result<Session, IdentityError> {
        let uid = {
            let accounts = self.accounts.read().await;
            accounts
                .iter()
                .find(|a| a.email == email && a.password == password)
                .map(|a| a.uid.clone())
                .ok_or(IdentityError::InvalidCredentials)?
        };
        let id_token = self.issue_token(&uid).await;
        Ok(Session {
            uid,
            email: email.to_string(),
            id_token,
        })
    }

    async fn lookup(&self, id_token: &str) -> Result<Identity, IdentityError> {
        let uid = self
            .tokens
            .read()
            .await
            .get(id_token)
            .cloned()
            .ok_or(IdentityError::InvalidToken)?;
        let accounts = self.accounts.read().await;
        let account = accounts
            .iter()
            .find(|a| a.uid == uid)
            .ok_or(IdentityError::InvalidToken)?;
        Ok(Identity {
            uid: account.uid.clone(),
            email: account.email.clone(),
        })
    }

    async fn delete_account(&self, id_token: &str) -> Result<(), IdentityError> {
        let identity = self.lookup(id_token).await?;
        self.accounts
            .write()
            .await
            .retain(|a| a.uid != identity.uid);
        self.tokens
            .write()
            .await
            .retain(|_, uid| *uid != identity.uid);
        Ok(())
    }
}

impl Default for MemoryIdentity {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn register_login_lookup_round_trip() {
        let provider = MemoryIdentity::new();
        let session = provider.register("a@example.com", "secret1").await.unwrap();
        assert_eq!(session.email, "a@example.com");

        let login = provider.login("a@example.com", "secret1").await.unwrap();
        assert_eq!(login.uid, session.uid);

        let identity = provider.lookup(&login.id_token).await.unwrap();
        assert_eq!(identity.uid, session.uid);
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let provider = MemoryIdentity::new();
        provider.register("a@example.com", "secret1").await.unwrap();
        assert!(matches!(
            provider.register("a@example.com", "secret2").await,
            Err(IdentityError::EmailExists)
        ));
    }

    #[tokio::test]
    async fn short_password_is_rejected() {
        let provider = MemoryIdentity::new();
        assert!(matches!(
            provider.register("a@example.com", "short").await,
            Err(IdentityError::WeakPassword)
        ));
    }

    #[tokio::test]
    async fn wrong_password_is_invalid_credentials() {
        let provider = MemoryIdentity::new();
        provider.register("a@example.com", "secret1").await.unwrap();
        assert!(matches!(
            provider.login("a@example.com", "wrong-1").await,
            Err(IdentityError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn deleted_account_tokens_are_revoked() {
        let provider = MemoryIdentity::new();
        let session = provider.register("a@example.com", "secret1").await.unwrap();
        provider.delete_account(&session.id_token).await.unwrap();
        assert!(matches!(
            provider.lookup(&session.id_token).await,
            Err(IdentityError::InvalidToken)
        ));
    }
}
