use oauth2::{
    ClientId, ClientSecret, EndpointMaybeSet, EndpointNotSet, EndpointSet, RevocationUrl, StandardRevocableToken, TokenUrl,
    basic::{BasicClient, BasicErrorResponse, BasicRevocationErrorResponse, BasicTokenIntrospectionResponse, BasicTokenResponse},
};

use crate::{AppResult, config::ClientConfig};

pub(super) type PasswordClient = oauth2::Client<
    BasicErrorResponse,
    BasicTokenResponse,
    BasicTokenIntrospectionResponse,
    StandardRevocableToken,
    BasicRevocationErrorResponse,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointMaybeSet,
    EndpointSet,
>;

/// Talks to the identity provider: password grant, refresh, revocation and
/// the user-info endpoint.
#[derive(Clone)]
pub struct AuthClient {
    pub(super) oauth: PasswordClient,
    pub(super) http: reqwest::Client,
    pub(super) userinfo_url: String,
}

impl AuthClient {
    pub fn from_config(config: &ClientConfig) -> AppResult<AuthClient> {
        Self::new(
            &config.client_id,
            config.client_secret.as_deref(),
            &config.auth_token_url,
            &config.auth_userinfo_url,
            config.auth_revoke_url.as_deref(),
        )
    }

    pub fn new(
        client_id: &str,
        client_secret: Option<&str>,
        token_url: &str,
        userinfo_url: &str,
        revoke_url: Option<&str>,
    ) -> AppResult<AuthClient> {
        let token_url = TokenUrl::new(token_url.to_owned())?;
        let revoke_url = revoke_url.map(|url| RevocationUrl::new(url.to_owned())).transpose()?;
        if revoke_url.as_ref().is_some_and(|url| url.url().scheme() != "https") {
            return Err("revocation endpoint must use https".into());
        }

        let mut oauth = BasicClient::new(ClientId::new(client_id.to_owned()))
            .set_token_uri(token_url)
            .set_revocation_url_option(revoke_url);
        if let Some(secret) = client_secret {
            oauth = oauth.set_client_secret(ClientSecret::new(secret.to_owned()));
        }

        let http = reqwest::ClientBuilder::new()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(AuthClient {
            oauth,
            http,
            userinfo_url: userinfo_url.to_owned(),
        })
    }
}
