//! Current-user resolution for record ownership.
//!
//! Records are owned by the signed-in user when there is one; otherwise the
//! owner is `None`. Lookup failures never block a save.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Id of the signed-in user, or `None` when anonymous.
    async fn current_user(&self) -> Option<String>;
}

/// No sign-in: every record is anonymous.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnonymousSession;

#[async_trait]
impl SessionProvider for AnonymousSession {
    async fn current_user(&self) -> Option<String> {
        None
    }
}

/// A user id known up front.
#[derive(Debug, Clone)]
pub struct StaticSession(pub String);

#[async_trait]
impl SessionProvider for StaticSession {
    async fn current_user(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

// ──────────────────────────────────────────────
// Supabase auth
// ──────────────────────────────────────────────

#[derive(Deserialize)]
struct AuthUser {
    id: String,
}

/// Resolves the user behind an access token via Supabase `GET /auth/v1/user`.
pub struct SupabaseSession {
    base_url: String,
    api_key: String,
    access_token: Option<String>,
    client: reqwest::Client,
}

impl SupabaseSession {
    pub fn new(
        base_url: &str,
        api_key: &str,
        access_token: Option<String>,
        timeout_secs: u64,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            access_token: access_token.filter(|t| !t.trim().is_empty()),
            client,
        })
    }
}

#[async_trait]
impl SessionProvider for SupabaseSession {
    async fn current_user(&self) -> Option<String> {
        let Some(token) = self.access_token.as_deref() else {
            tracing::debug!("No access token; saving anonymously");
            return None;
        };

        let response = self
            .client
            .get(format!("{}/auth/v1/user", self.base_url))
            .header("apikey", &self.api_key)
            .bearer_auth(token)
            .send()
            .await;

        let response = match response {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                tracing::warn!(status = r.status().as_u16(), "Session lookup rejected; saving anonymously");
                return None;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Session lookup failed; saving anonymously");
                return None;
            }
        };

        match response.json::<AuthUser>().await {
            Ok(user) => Some(user.id),
            Err(e) => {
                tracing::warn!(error = %e, "Unexpected session response; saving anonymously");
                None
            }
        }
    }
}
