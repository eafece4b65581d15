//! Sign-in against the identity provider and the credential that rides on
//! every backend call.

use oauth2::{AccessToken, RefreshToken};
use tokio::{sync::Mutex, time::Instant};

use crate::{AppResult, backend::TokenSource};

mod clients;
mod login;
mod logout;

pub use clients::AuthClient;

/// Who is signed in. `user_id` is the provider's stable subject id and the
/// key every owned record carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub username: String,
}

impl Identity {
    pub fn new(user_id: impl Into<String>, username: impl Into<String>) -> Self {
        Identity {
            user_id: user_id.into(),
            username: username.into(),
        }
    }
}

struct Tokens {
    access: AccessToken,
    refresh: Option<RefreshToken>,
    expires_at: Option<Instant>,
}

impl Tokens {
    fn expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

pub struct AuthSession {
    identity: Identity,
    tokens: Mutex<Tokens>,
    client: AuthClient,
}

impl AuthSession {
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn client(&self) -> &AuthClient {
        &self.client
    }
}

#[async_trait::async_trait]
impl TokenSource for AuthSession {
    /// The current access token, refreshed first if it has run out.
    async fn token(&self) -> AppResult<Option<String>> {
        let needs_refresh = {
            let tokens = self.tokens.lock().await;
            tokens.expired() && tokens.refresh.is_some()
        };
        if needs_refresh {
            self.client.refresh(self).await?;
        }
        Ok(Some(self.tokens.lock().await.access.secret().clone()))
    }
}
