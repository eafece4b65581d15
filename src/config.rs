use std::time::Duration;

use crate::AppResult;

/// Connection settings, read from the environment (and `.env` if present).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub graphql_url: String,
    pub api_key: Option<String>,
    pub storage_url: String,
    pub auth_token_url: String,
    pub auth_userinfo_url: String,
    pub auth_revoke_url: Option<String>,
    pub client_id: String,
    pub client_secret: Option<String>,
    pub page_size: u32,
    pub url_ttl: Duration,
    pub log_level: String,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl ClientConfig {
    pub fn from_env() -> AppResult<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| dotenv::var(key).ok())
    }

    /// Builds the config from any key lookup, so tests don't touch the process env.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let required = |key: &str| -> AppResult<String> {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(format!("missing {key}").into())
        };

        let page_size = match lookup("CHIRPLINE_PAGE_SIZE") {
            Some(v) => v.parse()?,
            None => 100,
        };
        let url_ttl = match lookup("CHIRPLINE_URL_TTL_SECS") {
            Some(v) => Duration::from_secs(v.parse()?),
            None => Duration::from_secs(900),
        };
        let log_format = match lookup("CHIRPLINE_LOG_FORMAT").as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Compact,
        };

        Ok(ClientConfig {
            graphql_url: required("CHIRPLINE_GRAPHQL_URL")?,
            api_key: lookup("CHIRPLINE_API_KEY"),
            storage_url: required("CHIRPLINE_STORAGE_URL")?,
            auth_token_url: required("CHIRPLINE_AUTH_TOKEN_URL")?,
            auth_userinfo_url: required("CHIRPLINE_AUTH_USERINFO_URL")?,
            auth_revoke_url: lookup("CHIRPLINE_AUTH_REVOKE_URL"),
            client_id: required("CHIRPLINE_CLIENT_ID")?,
            client_secret: lookup("CHIRPLINE_CLIENT_SECRET"),
            page_size,
            url_ttl,
            log_level: lookup("CHIRPLINE_LOG").unwrap_or_else(|| "info".to_owned()),
            log_format,
        })
    }
}
