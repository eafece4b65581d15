//! User profiles: lookup, first sign-in, search and the profile page.

use rand::seq::IndexedRandom;
use serde_json::json;

use crate::{
    AppResult, Client,
    graphql::{GraphQlRequest, Operation},
    model::UserProfile,
};

mod page;

pub use page::ProfilePage;

/// `Ok(None)` when no profile exists for `id`.
pub async fn get(client: &Client, id: &str) -> AppResult<Option<UserProfile>> {
    client
        .run(GraphQlRequest::new(Operation::GetUserProfile, json!({ "id": id })))
        .await
}

/// "Adjective Noun", for identities that come without a username.
pub fn random_alias() -> String {
    let adjectives = [
        "Quick", "Lazy", "Mysterious", "Jolly", "Brave", "Silent", "Witty", "Fierce",
        "Clever", "Gentle", "Wild", "Calm", "Bold", "Shy", "Proud", "Happy",
        "Eager", "Fancy", "Rusty", "Golden", "Silver", "Bright", "Lucky",
    ];
    let nouns = [
        "Fox", "Bear", "Eagle", "Wolf", "Dragon", "Tiger", "Lion", "Owl", "Rabbit",
        "Falcon", "Hawk", "Shark", "Panda", "Kitten", "Puppy", "Phoenix", "Griffin",
        "Turtle", "Dolphin", "Whale", "Elephant", "Giraffe", "Zebra",
    ];

    let mut rng = rand::rng();
    match (adjectives.choose(&mut rng), nouns.choose(&mut rng)) {
        (Some(adjective), Some(noun)) => format!("{adjective} {noun}"),
        _ => "Nameless User".to_owned(),
    }
}

/// The signed-in user's profile, created on first sign-in.
pub async fn ensure_profile(client: &Client) -> AppResult<UserProfile> {
    if let Some(profile) = get(client, client.user_id()).await? {
        return Ok(profile);
    }

    let username = match client.identity.username.trim() {
        "" => random_alias(),
        name => name.to_owned(),
    };
    tracing::info!(user_id = client.user_id(), username = %username, "creating profile");
    client
        .run(GraphQlRequest::new(
            Operation::CreateUserProfile,
            json!({ "input": { "id": client.user_id(), "username": username } }),
        ))
        .await
}

/// Profiles whose username contains `query`. A blank query finds nobody.
pub async fn search(client: &Client, query: &str) -> AppResult<Vec<UserProfile>> {
    let query = query.trim();
    if query.is_empty() {
        return Ok(Vec::new());
    }
    client
        .run_all(GraphQlRequest::new(
            Operation::ListUserProfiles,
            json!({ "filter": { "username": { "contains": query } } }),
        ))
        .await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        auth::Identity,
        memory::{MemoryBackend, MemoryObjectStore, Table},
    };

    fn client(backend: &Arc<MemoryBackend>, identity: Identity) -> Client {
        Client::new(backend.clone(), Arc::new(MemoryObjectStore::new()), identity)
    }

    #[tokio::test]
    async fn ensure_creates_once() {
        let backend = Arc::new(MemoryBackend::new());
        let me = client(&backend, Identity::new("sub-1", "marta"));

        let created = ensure_profile(&me).await.unwrap();
        assert_eq!((created.id.as_str(), created.username.as_str()), ("sub-1", "marta"));
        let again = ensure_profile(&me).await.unwrap();
        assert_eq!(again, created);
        assert_eq!(backend.count(Table::UserProfile), 1);
    }

    #[tokio::test]
    async fn nameless_identity_gets_an_alias() {
        let backend = Arc::new(MemoryBackend::new());
        let profile = ensure_profile(&client(&backend, Identity::new("sub-2", " "))).await.unwrap();
        assert_eq!(profile.username.split(' ').count(), 2);
    }

    #[tokio::test]
    async fn search_matches_substrings() {
        let backend = Arc::new(MemoryBackend::new());
        for (id, name) in [("1", "kalina"), ("2", "alice"), ("3", "bob")] {
            ensure_profile(&client(&backend, Identity::new(id, name))).await.unwrap();
        }
        let me = client(&backend, Identity::new("1", "kalina"));

        let mut found: Vec<String> = search(&me, " ali ").await.unwrap().into_iter().map(|p| p.username).collect();
        found.sort();
        assert_eq!(found, ["alice", "kalina"]);
        assert!(search(&me, "   ").await.unwrap().is_empty());
        assert!(backend.calls(Operation::ListUserProfiles).len() == 1);
    }

    #[tokio::test]
    async fn missing_profile_is_none() {
        let backend = Arc::new(MemoryBackend::new());
        assert_eq!(get(&client(&backend, Identity::new("x", "x")), "nobody").await.unwrap(), None);
    }
}
