pub mod catalog;
pub mod http;
pub mod sse;

pub use catalog::{Operation, OperationKind};

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value, json};

use crate::{AppResult, GetField};

/// A catalog operation plus its variables.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphQlRequest {
    pub operation: Operation,
    pub variables: Value,
}

impl GraphQlRequest {
    pub fn new(operation: Operation, variables: Value) -> Self {
        Self { operation, variables }
    }

    /// Adds `limit`/`nextToken` to the variables.
    pub fn paged(mut self, page: &PageRequest) -> Self {
        if let Value::Object(vars) = &mut self.variables {
            vars.insert("limit".to_owned(), json!(page.limit));
            if let Some(token) = &page.next_token {
                vars.insert("nextToken".to_owned(), json!(token));
            }
        }
        self
    }

    /// Wire body: `{ query, operationName, variables }`.
    pub fn body(&self) -> Value {
        json!({
            "query": self.operation.document(),
            "operationName": self.operation.name(),
            "variables": self.variables,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: u32,
    pub next_token: Option<String>,
}

impl PageRequest {
    pub fn first(limit: u32) -> Self {
        Self { limit, next_token: None }
    }

    pub fn after(limit: u32, token: impl Into<String>) -> Self {
        Self { limit, next_token: Some(token.into()) }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    #[serde(default)]
    pub next_token: Option<String>,
}

/// Builds `{ "or": [{ field: { eq: id } }, ...] }`.
pub fn any_of(field: &str, ids: &[String]) -> Value {
    let clauses: Vec<Value> = ids.iter().map(|id| json!({ field: { "eq": id } })).collect();
    json!({ "or": clauses })
}

/// Pulls the operation's root field out of a `data` object.
pub fn decode_root<T: DeserializeOwned>(operation: Operation, mut data: Value) -> AppResult<T> {
    data.get_obj_field(operation.root_field())?;
    let root = data[operation.root_field()].take();
    Ok(serde_json::from_value(root)?)
}

/// Turns a GraphQL response envelope into its `data`, failing on `errors`.
pub fn into_data(mut response: Value) -> AppResult<Value> {
    if let Some(errors) = response.get("errors").and_then(Value::as_array) {
        if !errors.is_empty() {
            let messages: Vec<&str> = errors
                .iter()
                .filter_map(|e| e.get("message").and_then(Value::as_str))
                .collect();
            return Err(format!("graphql: {}", messages.join("; ")).into());
        }
    }
    match response["data"].take() {
        Value::Null => Ok(Value::Object(Map::new())),
        data => Ok(data),
    }
}
