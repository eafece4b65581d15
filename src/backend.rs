use futures_util::{StreamExt, stream::BoxStream};
use serde_json::Value;

use crate::{AppResult, graphql::{GraphQlRequest, Operation}};

/// The hosted GraphQL API.
///
/// `execute` resolves to the response's `data` object; `subscribe` yields one
/// `data` object per pushed change.
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    async fn execute(&self, request: GraphQlRequest) -> AppResult<Value>;
    async fn subscribe(&self, request: GraphQlRequest) -> AppResult<Subscription>;
}

/// Supplies the credential attached to every backend call.
///
/// `Ok(None)` sends the request without an `Authorization` header.
#[async_trait::async_trait]
pub trait TokenSource: Send + Sync + 'static {
    async fn token(&self) -> AppResult<Option<String>>;
}

pub struct NoAuth;

#[async_trait::async_trait]
impl TokenSource for NoAuth {
    async fn token(&self) -> AppResult<Option<String>> {
        Ok(None)
    }
}

/// A live push subscription. Dropping it closes the underlying stream.
pub struct Subscription {
    operation: Operation,
    events: BoxStream<'static, AppResult<Value>>,
}

impl Subscription {
    pub fn new(operation: Operation, events: BoxStream<'static, AppResult<Value>>) -> Self {
        Self { operation, events }
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// Next pushed `data` object; `None` once the server ends the stream.
    pub async fn next(&mut self) -> Option<AppResult<Value>> {
        self.events.next().await
    }

    pub fn unsubscribe(self) {
        tracing::debug!(operation = self.operation.name(), "unsubscribed");
    }
}
