use std::time::Duration;

use oauth2::{ResourceOwnerPassword, ResourceOwnerUsername, TokenResponse, basic::BasicTokenResponse};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::{AppResult, GetField};

use super::{AuthClient, AuthSession, Identity, Tokens};

impl AuthClient {
    /// Password grant, then the user-info lookup for the stable user id.
    pub async fn sign_in(&self, username: &str, password: &str) -> AppResult<AuthSession> {
        if username.trim().is_empty() || password.is_empty() {
            return Err("username and password are required".into());
        }

        let token = self
            .oauth
            .exchange_password(
                &ResourceOwnerUsername::new(username.to_owned()),
                &ResourceOwnerPassword::new(password.to_owned()),
            )
            .request_async(&self.http)
            .await?;
        let tokens = Tokens::from_response(&token, None);
        let identity = self.user_info(tokens.access.secret()).await?;

        tracing::info!(user_id = %identity.user_id, username = %identity.username, "signed in");
        Ok(AuthSession {
            identity,
            tokens: Mutex::new(tokens),
            client: self.clone(),
        })
    }

    pub(super) async fn user_info(&self, access_token: &str) -> AppResult<Identity> {
        let body: Value = self
            .http
            .get(&self.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let user_id = body.get_str_field("sub")?;
        let username = ["preferred_username", "username"]
            .iter()
            .find_map(|field| body.get(*field).and_then(Value::as_str))
            .map(str::to_owned)
            .unwrap_or_default();
        Ok(Identity { user_id, username })
    }

    /// Exchanges the session's refresh token for a new access token.
    pub async fn refresh(&self, session: &AuthSession) -> AppResult<()> {
        let mut tokens = session.tokens.lock().await;
        let Some(refresh) = tokens.refresh.clone() else {
            return Err("session has no refresh token".into());
        };

        let token = self
            .oauth
            .exchange_refresh_token(&refresh)
            .request_async(&self.http)
            .await?;
        *tokens = Tokens::from_response(&token, Some(refresh));
        tracing::debug!(user_id = %session.identity.user_id, "tokens refreshed");
        Ok(())
    }
}

impl Tokens {
    /// Providers may omit the refresh token on refresh; the old one stays valid then.
    fn from_response(token: &BasicTokenResponse, previous_refresh: Option<oauth2::RefreshToken>) -> Self {
        Tokens {
            access: token.access_token().clone(),
            refresh: token.refresh_token().cloned().or(previous_refresh),
            expires_at: token
                .expires_in()
                .map(|ttl| tokio::time::Instant::now() + ttl.saturating_sub(Duration::from_secs(30))),
        }
    }
}
