mod common;

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::{
    Form, Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chirpline::{auth::AuthClient, backend::TokenSource};
use serde_json::json;

#[derive(Clone, Default)]
struct Provider {
    grants: Arc<Mutex<Vec<HashMap<String, String>>>>,
}

async fn token(State(provider): State<Provider>, Form(form): Form<HashMap<String, String>>) -> Response {
    provider.grants.lock().unwrap().push(form.clone());
    match form.get("grant_type").map(String::as_str) {
        Some("password") if form.get("password").map(String::as_str) == Some("hunter2") => Json(json!({
            "access_token": "at-1",
            "token_type": "bearer",
            "expires_in": 5,
            "refresh_token": "rt-1"
        }))
        .into_response(),
        Some("password") => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "invalid_grant", "error_description": "bad credentials" })),
        )
            .into_response(),
        Some("refresh_token") => Json(json!({
            "access_token": "at-2",
            "token_type": "bearer",
            "expires_in": 3600
        }))
        .into_response(),
        _ => StatusCode::BAD_REQUEST.into_response(),
    }
}

async fn userinfo(headers: HeaderMap) -> Response {
    match headers.get("authorization").and_then(|v| v.to_str().ok()) {
        Some("Bearer at-1") | Some("Bearer at-2") => {
            Json(json!({ "sub": "sub-42", "username": "marta" })).into_response()
        }
        _ => StatusCode::UNAUTHORIZED.into_response(),
    }
}

async fn provider() -> (AuthClient, Provider) {
    let provider = Provider::default();
    let router = Router::new()
        .route("/oauth2/token", post(token))
        .route("/oauth2/userInfo", get(userinfo))
        .with_state(provider.clone());
    let base = common::spawn(router).await;
    let client = AuthClient::new(
        "app-client",
        Some("app-secret"),
        &format!("{base}/oauth2/token"),
        &format!("{base}/oauth2/userInfo"),
        None,
    )
    .unwrap();
    (client, provider)
}

#[tokio::test]
async fn sign_in_resolves_the_stable_id() {
    let (client, provider) = provider().await;
    let session = client.sign_in("marta", "hunter2").await.unwrap();

    assert_eq!(session.identity().user_id, "sub-42");
    assert_eq!(session.identity().username, "marta");
    let grants = provider.grants.lock().unwrap().clone();
    assert_eq!(grants[0]["grant_type"], "password");
    assert_eq!(grants[0]["username"], "marta");
}

#[tokio::test]
async fn wrong_password_fails() {
    let (client, _) = provider().await;
    assert!(client.sign_in("marta", "nope").await.is_err());
    assert!(client.sign_in("  ", "hunter2").await.is_err());
}

#[tokio::test]
async fn expired_token_is_refreshed_on_use() {
    let (client, provider) = provider().await;
    let session = client.sign_in("marta", "hunter2").await.unwrap();

    // expires_in is shorter than the safety margin, so the first use refreshes.
    assert_eq!(session.token().await.unwrap().as_deref(), Some("at-2"));
    assert_eq!(session.token().await.unwrap().as_deref(), Some("at-2"));

    let grants = provider.grants.lock().unwrap().clone();
    assert_eq!(grants.len(), 2);
    assert_eq!(grants[1]["grant_type"], "refresh_token");
    assert_eq!(grants[1]["refresh_token"], "rt-1");
}

#[tokio::test]
async fn sign_out_without_revocation_endpoint() {
    let (client, _) = provider().await;
    let session = client.sign_in("marta", "hunter2").await.unwrap();
    client.sign_out(&session).await.unwrap();
}
