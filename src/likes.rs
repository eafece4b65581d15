use serde_json::{Value, json};

use crate::{
    AppResult, Client,
    graphql::{GraphQlRequest, Operation},
    model::Like,
    optimistic::{self, Toggle, ToggleMutation, ToggleOutcome, ToggleState},
};

struct LikeMutation<'a> {
    client: &'a Client,
    post_id: &'a str,
}

#[async_trait::async_trait]
impl ToggleMutation for LikeMutation<'_> {
    async fn activate(&self) -> AppResult<String> {
        let like: Like = self
            .client
            .run(GraphQlRequest::new(
                Operation::CreateLike,
                json!({ "input": { "postID": self.post_id, "userID": self.client.user_id() } }),
            ))
            .await?;
        Ok(like.id)
    }

    async fn deactivate(&self, record_id: &str) -> AppResult<()> {
        let _: Value = self
            .client
            .run(GraphQlRequest::new(Operation::DeleteLike, json!({ "input": { "id": record_id } })))
            .await?;
        Ok(())
    }
}

/// Like state of one post for the signed-in user.
pub struct LikeButton {
    client: Client,
    post_id: String,
    toggle: Toggle,
}

impl LikeButton {
    /// Counts the post's likes and finds the user's own, if any.
    pub async fn load(client: &Client, post_id: &str) -> AppResult<LikeButton> {
        let likes: Vec<Like> = client
            .run_all(GraphQlRequest::new(Operation::LikesByPostId, json!({ "postID": post_id })))
            .await?;
        let mine = likes.iter().find(|like| like.user_id == client.user_id());

        let state = ToggleState {
            active: mine.is_some(),
            count: u32::try_from(likes.len()).unwrap_or(u32::MAX),
            record_id: mine.map(|like| like.id.clone()),
        };
        Ok(LikeButton {
            client: client.clone(),
            post_id: post_id.to_owned(),
            toggle: Toggle::new(state),
        })
    }

    pub fn state(&self) -> ToggleState {
        self.toggle.state()
    }

    pub async fn press(&self) -> ToggleOutcome {
        let mutation = LikeMutation {
            client: &self.client,
            post_id: &self.post_id,
        };
        let action = if self.toggle.state().active { "unlike this post" } else { "like this post" };
        optimistic::toggle(&self.toggle, &mutation, &self.client.notices, action).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        auth::Identity,
        memory::{MemoryBackend, MemoryObjectStore, Table},
    };

    fn as_user(backend: &Arc<MemoryBackend>, id: &str) -> Client {
        Client::new(backend.clone(), Arc::new(MemoryObjectStore::new()), Identity::new(id, id)).with_page_size(2)
    }

    async fn like(client: &Client, post_id: &str) {
        let button = LikeButton::load(client, post_id).await.unwrap();
        assert_eq!(button.press().await, ToggleOutcome::Committed);
    }

    #[tokio::test]
    async fn load_counts_every_page_and_finds_mine() {
        let backend = Arc::new(MemoryBackend::new());
        for fan in ["a", "b", "c", "me"] {
            like(&as_user(&backend, fan), "p1").await;
        }
        like(&as_user(&backend, "a"), "other-post").await;

        let me = as_user(&backend, "me");
        let button = LikeButton::load(&me, "p1").await.unwrap();
        let state = button.state();
        assert!(state.active);
        assert_eq!(state.count, 4);
        assert!(state.record_id.is_some());
    }

    #[tokio::test]
    async fn like_then_unlike_round_trip() {
        let backend = Arc::new(MemoryBackend::new());
        let me = as_user(&backend, "me");
        let button = LikeButton::load(&me, "p1").await.unwrap();

        assert_eq!(button.press().await, ToggleOutcome::Committed);
        let liked = button.state();
        assert_eq!((liked.active, liked.count), (true, 1));
        assert_eq!(backend.count(Table::Like), 1);

        assert_eq!(button.press().await, ToggleOutcome::Committed);
        let deleted = backend.calls(Operation::DeleteLike);
        assert_eq!(deleted[0]["input"]["id"], json!(liked.record_id));
        assert_eq!(button.state(), ToggleState::default());
        assert_eq!(backend.count(Table::Like), 0);
    }

    #[tokio::test]
    async fn failed_like_rolls_back() {
        let backend = Arc::new(MemoryBackend::new());
        like(&as_user(&backend, "a"), "p1").await;
        let me = as_user(&backend, "me");
        let button = LikeButton::load(&me, "p1").await.unwrap();
        let before = button.state();
        let mut notices = me.notices.subscribe();

        backend.fail_next(Operation::CreateLike, 1);
        assert_eq!(button.press().await, ToggleOutcome::RolledBack);
        assert_eq!(button.state(), before);
        assert_eq!(notices.try_recv().unwrap().message, "Couldn't like this post. Please try again.");
    }
}
