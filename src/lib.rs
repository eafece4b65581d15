pub mod activity;
pub mod auth;
pub mod backend;
pub mod chats;
pub mod comments;
pub mod config;
pub mod follows;
pub mod graphql;
pub mod likes;
pub mod live;
pub mod logging;
pub mod media;
pub mod memory;
pub mod model;
pub mod notice;
pub mod notifications;
pub mod optimistic;
pub mod posts;
pub mod profiles;
pub mod reconcile;
pub mod storage;

use std::{fmt, sync::Arc};

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{auth::Identity, backend::Backend, graphql::GraphQlRequest, notice::Notices, storage::ObjectStore};

/// Everything a view or service needs to talk to the outside world.
///
/// Cloned into every view instead of living in a global, so tests can hand
/// in a [`memory::MemoryBackend`].
#[derive(Clone)]
pub struct Client {
    pub backend: Arc<dyn Backend>,
    pub store: Arc<dyn ObjectStore>,
    pub identity: Identity,
    pub notices: Notices,
    pub page_size: u32,
}

impl Client {
    pub fn new(backend: Arc<dyn Backend>, store: Arc<dyn ObjectStore>, identity: Identity) -> Self {
        Self {
            backend,
            store,
            identity,
            notices: Notices::new(),
            page_size: 100,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn user_id(&self) -> &str {
        &self.identity.user_id
    }

    /// Runs a query or mutation and decodes its root field.
    pub async fn run<T: DeserializeOwned>(&self, request: GraphQlRequest) -> AppResult<T> {
        let operation = request.operation;
        let data = self.backend.execute(request).await?;
        graphql::decode_root(operation, data)
    }

    /// Follows `nextToken` until the list is exhausted.
    pub async fn run_all<T: DeserializeOwned>(&self, request: GraphQlRequest) -> AppResult<Vec<T>> {
        let mut items = Vec::new();
        let mut page = graphql::PageRequest::first(self.page_size);
        loop {
            let next: graphql::Page<T> = self.run(request.clone().paged(&page)).await?;
            items.extend(next.items);
            match next.next_token {
                Some(token) => page = graphql::PageRequest::after(self.page_size, token),
                None => return Ok(items),
            }
        }
    }
}

pub trait GetField {
    fn get_str_field(&self, field: &str) -> AppResult<String>;
    fn get_obj_field(&self, field: &str) -> AppResult<&Value>;
}

impl GetField for serde_json::Value {
    fn get_str_field(&self, field: &str) -> AppResult<String> {
        Ok(self
            .get(field)
            .ok_or_else(|| format!("expected {field} in {self}"))?
            .as_str()
            .ok_or_else(|| format!("expected {field} in {self} to be string"))?
            .to_owned())
    }

    fn get_obj_field(&self, field: &str) -> AppResult<&Value> {
        self.get(field)
            .ok_or_else(|| format!("expected {field} in {self}").into())
    }
}

/// Renders user-written Markdown; raw HTML in the text is shown literally.
pub fn render_markdown(text: &str) -> String {
    use pulldown_cmark::{Event, Options, Parser};

    let parser = Parser::new_ext(text, Options::ENABLE_STRIKETHROUGH)
        .map(|event| match event {
            Event::Html(html) | Event::InlineHtml(html) => Event::Text(html),
            _ => event,
        });

    let mut html_output = String::new();
    pulldown_cmark::html::push_html(&mut html_output, parser);
    html_output
}

pub type AppResult<T> = Result<T, AppError>;
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#}", self.0)
    }
}

impl From<String> for AppError {
    fn from(err: String) -> Self {
        Self(anyhow::Error::msg(err))
    }
}

impl From<&str> for AppError {
    fn from(err: &str) -> Self {
        Self(anyhow::Error::msg(err.to_owned()))
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self(err)
    }
}

macro_rules! apperr_impl {
    ($E:ty) => {
        impl From<$E> for AppError {
            fn from(err: $E) -> Self {
                Self(anyhow::Error::from(err))
            }
        }
    };
}

apperr_impl!(serde_json::Error);
apperr_impl!(reqwest::Error);
apperr_impl!(oauth2::url::ParseError);
apperr_impl!(oauth2::ConfigurationError);
apperr_impl!(time::error::Parse);
apperr_impl!(time::error::Format);
apperr_impl!(std::num::ParseIntError);

impl<E: core::error::Error + Send + Sync + 'static, R: oauth2::ErrorResponse + Send + Sync + 'static> From<oauth2::RequestTokenError<E, R>> for AppError {
    fn from(err: oauth2::RequestTokenError<E, R>) -> Self {
        Self(anyhow::Error::from(err))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn get_field_reads_strings_and_objects() {
        let value = json!({ "sub": "u-1", "claims": { "role": "member" }, "age": 3 });
        assert_eq!(value.get_str_field("sub").unwrap(), "u-1");
        assert_eq!(value.get_obj_field("claims").unwrap()["role"], "member");

        let missing = value.get_str_field("email").unwrap_err().to_string();
        assert!(missing.starts_with("expected email in"), "{missing}");
        let not_string = value.get_str_field("age").unwrap_err().to_string();
        assert!(not_string.ends_with("to be string"), "{not_string}");
        assert!(value.get_obj_field("nope").is_err());
    }

    #[test]
    fn markdown_escapes_raw_html() {
        let html = render_markdown("**hi** <script>x</script>");
        assert!(html.contains("<strong>hi</strong>"));
        assert!(!html.contains("<script>"));
    }
}
