use std::{collections::VecDeque, sync::Arc, time::Duration};

use futures_util::{StreamExt, stream};
use reqwest::header::ACCEPT;
use serde_json::Value;

use crate::{
    AppResult,
    backend::{Backend, Subscription, TokenSource},
    graphql::{GraphQlRequest, OperationKind, into_data, sse::{SseDecoder, SseEvent}},
};

/// GraphQL over HTTP; subscriptions use the single-connection event-stream mode.
pub struct HttpBackend {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    tokens: Arc<dyn TokenSource>,
}

impl HttpBackend {
    pub fn new(endpoint: impl Into<String>, tokens: Arc<dyn TokenSource>) -> AppResult<Self> {
        let http = reqwest::ClientBuilder::new()
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
            api_key: None,
            tokens,
        })
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    async fn post(&self, request: &GraphQlRequest, accept: &str) -> AppResult<reqwest::Response> {
        let mut builder = self
            .http
            .post(&self.endpoint)
            .header(ACCEPT, accept)
            .json(&request.body());
        if let Some(api_key) = &self.api_key {
            builder = builder.header("x-api-key", api_key);
        }
        if let Some(token) = self.tokens.token().await? {
            builder = builder.bearer_auth(token);
        }

        Ok(builder.send().await?.error_for_status()?)
    }
}

fn event_to_data(event: SseEvent) -> Option<AppResult<Value>> {
    match event.event.as_deref() {
        Some("complete") => None,
        Some("error") => Some(Err(format!("subscription error: {}", event.data).into())),
        _ => Some(
            serde_json::from_str::<Value>(&event.data)
                .map_err(Into::into)
                .and_then(into_data),
        ),
    }
}

#[async_trait::async_trait]
impl Backend for HttpBackend {
    async fn execute(&self, request: GraphQlRequest) -> AppResult<Value> {
        if request.operation.kind() == OperationKind::Subscription {
            return Err(format!("{} must be subscribed to", request.operation.name()).into());
        }

        let body: Value = self.post(&request, "application/json").await?.json().await?;
        into_data(body)
    }

    async fn subscribe(&self, request: GraphQlRequest) -> AppResult<Subscription> {
        if request.operation.kind() != OperationKind::Subscription {
            return Err(format!("{} is not a subscription", request.operation.name()).into());
        }

        let response = self.post(&request, "text/event-stream").await?;
        let bytes = Box::pin(response.bytes_stream());

        let events = stream::unfold(
            (bytes, SseDecoder::new(), VecDeque::new(), false),
            |(mut bytes, mut decoder, mut pending, mut closed)| async move {
                loop {
                    if let Some(event) = pending.pop_front() {
                        let item = event_to_data(event)?;
                        return Some((item, (bytes, decoder, pending, closed)));
                    }
                    if closed {
                        return None;
                    }
                    match bytes.next().await {
                        Some(Ok(chunk)) => pending.extend(decoder.push(&chunk)),
                        Some(Err(e)) => {
                            closed = true;
                            return Some((Err(e.into()), (bytes, decoder, pending, closed)));
                        }
                        None => closed = true,
                    }
                }
            },
        );

        tracing::debug!(operation = request.operation.name(), "subscribed");
        Ok(Subscription::new(request.operation, events.boxed()))
    }
}
