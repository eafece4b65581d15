use serde_json::{Value, json};

use crate::{
    AppResult, Client,
    graphql::{GraphQlRequest, Operation},
    model::Follow,
    optimistic::{self, Toggle, ToggleMutation, ToggleOutcome, ToggleState},
};

struct FollowMutation<'a> {
    client: &'a Client,
    target_id: &'a str,
}

#[async_trait::async_trait]
impl ToggleMutation for FollowMutation<'_> {
    async fn activate(&self) -> AppResult<String> {
        let follow: Follow = self
            .client
            .run(GraphQlRequest::new(
                Operation::CreateFollow,
                json!({ "input": { "followerID": self.client.user_id(), "followedID": self.target_id } }),
            ))
            .await?;
        Ok(follow.id)
    }

    async fn deactivate(&self, record_id: &str) -> AppResult<()> {
        let _: Value = self
            .client
            .run(GraphQlRequest::new(Operation::DeleteFollow, json!({ "input": { "id": record_id } })))
            .await?;
        Ok(())
    }
}

/// Whether the signed-in user follows `target_id`. The toggle count is the
/// number of follow records (0 or 1).
pub struct FollowButton {
    client: Client,
    target_id: String,
    toggle: Toggle,
}

impl FollowButton {
    /// `None` for the user's own profile; nobody follows themselves.
    pub async fn load(client: &Client, target_id: &str) -> AppResult<Option<FollowButton>> {
        if target_id == client.user_id() {
            return Ok(None);
        }

        let follows: Vec<Follow> = client
            .run_all(GraphQlRequest::new(
                Operation::FollowsByFollowerId,
                json!({
                    "followerID": client.user_id(),
                    "filter": { "followedID": { "eq": target_id } },
                }),
            ))
            .await?;

        let state = ToggleState {
            active: !follows.is_empty(),
            count: u32::from(!follows.is_empty()),
            record_id: follows.first().map(|f| f.id.clone()),
        };
        Ok(Some(FollowButton {
            client: client.clone(),
            target_id: target_id.to_owned(),
            toggle: Toggle::new(state),
        }))
    }

    pub fn following(&self) -> bool {
        self.toggle.state().active
    }

    pub fn state(&self) -> ToggleState {
        self.toggle.state()
    }

    pub async fn press(&self) -> ToggleOutcome {
        let mutation = FollowMutation {
            client: &self.client,
            target_id: &self.target_id,
        };
        let action = if self.following() { "unfollow" } else { "follow" };
        optimistic::toggle(&self.toggle, &mutation, &self.client.notices, action).await
    }
}

/// Ids of everyone the signed-in user follows, for the following feed.
pub async fn following_ids(client: &Client) -> AppResult<Vec<String>> {
    let follows: Vec<Follow> = client
        .run_all(GraphQlRequest::new(
            Operation::FollowsByFollowerId,
            json!({ "followerID": client.user_id() }),
        ))
        .await?;

    let mut ids: Vec<String> = follows.into_iter().map(|f| f.followed_id).collect();
    ids.sort();
    ids.dedup();
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        auth::Identity,
        memory::{MemoryBackend, MemoryObjectStore, Table},
    };

    fn me(backend: &Arc<MemoryBackend>) -> Client {
        Client::new(backend.clone(), Arc::new(MemoryObjectStore::new()), Identity::new("me", "me"))
    }

    #[tokio::test]
    async fn no_button_on_own_profile() {
        let backend = Arc::new(MemoryBackend::new());
        assert!(FollowButton::load(&me(&backend), "me").await.unwrap().is_none());
        assert!(backend.calls(Operation::FollowsByFollowerId).is_empty());
    }

    #[tokio::test]
    async fn follow_shows_up_in_following_ids() {
        let backend = Arc::new(MemoryBackend::new());
        let client = me(&backend);
        for target in ["zoe", "amir"] {
            let button = FollowButton::load(&client, target).await.unwrap().unwrap();
            assert!(!button.following());
            assert_eq!(button.press().await, ToggleOutcome::Committed);
            assert!(button.following());
        }

        assert_eq!(following_ids(&client).await.unwrap(), ["amir", "zoe"]);
        let reloaded = FollowButton::load(&client, "zoe").await.unwrap().unwrap();
        assert!(reloaded.following());
        assert!(reloaded.state().record_id.is_some());
    }

    #[tokio::test]
    async fn unfollow_deletes_the_loaded_record() {
        let backend = Arc::new(MemoryBackend::new());
        let client = me(&backend);
        let first = FollowButton::load(&client, "zoe").await.unwrap().unwrap();
        first.press().await;

        let button = FollowButton::load(&client, "zoe").await.unwrap().unwrap();
        assert_eq!(button.press().await, ToggleOutcome::Committed);
        assert!(!button.following());
        assert_eq!(backend.count(Table::Follow), 0);
        assert!(following_ids(&client).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_unfollow_stays_following() {
        let backend = Arc::new(MemoryBackend::new());
        let client = me(&backend);
        let button = FollowButton::load(&client, "zoe").await.unwrap().unwrap();
        button.press().await;

        backend.fail_next(Operation::DeleteFollow, 1);
        assert_eq!(button.press().await, ToggleOutcome::RolledBack);
        assert!(button.following());
        assert_eq!(button.state().count, 1);
    }
}
