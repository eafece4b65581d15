use std::{sync::Arc, time::Duration};

use serde::Deserialize;

use crate::{AppResult, backend::TokenSource};

/// Object storage for media. Keys are opaque; URLs are short-lived.
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    async fn url_for(&self, key: &str) -> AppResult<String>;
    async fn upload(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> AppResult<()>;
}

#[derive(Deserialize)]
struct PresignResponse {
    url: String,
}

/// Talks to the storage gateway: `GET {base}/presign?key=..&expires=..` and
/// `PUT {base}/objects/{key}`.
pub struct HttpObjectStore {
    http: reqwest::Client,
    base_url: String,
    ttl: Duration,
    tokens: Arc<dyn TokenSource>,
}

impl HttpObjectStore {
    pub fn new(base_url: impl Into<String>, ttl: Duration, tokens: Arc<dyn TokenSource>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            ttl,
            tokens,
        }
    }

    async fn authorize(&self, builder: reqwest::RequestBuilder) -> AppResult<reqwest::RequestBuilder> {
        Ok(match self.tokens.token().await? {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }
}

#[async_trait::async_trait]
impl ObjectStore for HttpObjectStore {
    async fn url_for(&self, key: &str) -> AppResult<String> {
        let builder = self
            .http
            .get(format!("{}/presign", self.base_url))
            .query(&[("key", key.to_owned()), ("expires", self.ttl.as_secs().to_string())]);
        let response: PresignResponse = self
            .authorize(builder)
            .await?
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response.url)
    }

    async fn upload(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> AppResult<()> {
        let builder = self
            .http
            .put(format!("{}/objects/{key}", self.base_url))
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes);
        self.authorize(builder).await?.send().await?.error_for_status()?;
        Ok(())
    }
}
