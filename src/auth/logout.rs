use oauth2::StandardRevocableToken;

use crate::AppResult;

use super::{AuthClient, AuthSession};

impl AuthClient {
    /// Ends the session. The refresh token (or the access token, if there is
    /// none) is revoked when the provider has a revocation endpoint.
    pub async fn sign_out(&self, session: &AuthSession) -> AppResult<()> {
        let token = {
            let tokens = session.tokens.lock().await;
            match &tokens.refresh {
                Some(refresh) => StandardRevocableToken::RefreshToken(refresh.clone()),
                None => StandardRevocableToken::AccessToken(tokens.access.clone()),
            }
        };

        match self.oauth.revoke_token(token) {
            Ok(request) => request.request_async(&self.http).await?,
            Err(oauth2::ConfigurationError::MissingUrl(_)) => {
                tracing::debug!("no revocation endpoint, dropping tokens locally");
            }
            Err(err) => return Err(err.into()),
        }

        tracing::info!(user_id = %session.identity.user_id, "signed out");
        Ok(())
    }
}
