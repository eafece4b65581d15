//! Live activity alerts: someone liked or commented on one of your posts,
//! or started following you.

use futures_util::future::select_all;
use serde_json::{Value, json};

use crate::{
    AppResult, Client,
    backend::Subscription,
    graphql::{self, GraphQlRequest, Operation},
    model::{Comment, Follow, Like, UserProfile},
};

const PREVIEW_CHARS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Like,
    Comment,
    Follow,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub kind: AlertKind,
    /// Whoever caused it.
    pub actor_id: String,
    pub text: String,
}

fn name(user: Option<&UserProfile>) -> &str {
    user.map_or("Someone", |u| u.username.as_str())
}

fn preview(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() { format!("{head}...") } else { head }
}

/// The like, comment and follow subscriptions for one user. They are opened
/// and released together.
pub struct ActivityFeed {
    me: String,
    subscriptions: Vec<Subscription>,
}

impl ActivityFeed {
    pub async fn start(client: &Client) -> AppResult<ActivityFeed> {
        let me = client.user_id().to_owned();
        let requests = [
            GraphQlRequest::new(Operation::OnCreateLike, json!({})),
            GraphQlRequest::new(Operation::OnCreateComment, json!({})),
            GraphQlRequest::new(Operation::OnCreateFollow, json!({ "filter": { "followedID": { "eq": me } } })),
        ];

        let mut subscriptions = Vec::with_capacity(requests.len());
        for request in requests {
            // An early return drops, and so closes, the ones already open.
            subscriptions.push(client.backend.subscribe(request).await?);
        }
        Ok(ActivityFeed { me, subscriptions })
    }

    /// Waits for the next event that concerns the user. `None` once every
    /// subscription has ended.
    pub async fn next(&mut self) -> Option<Alert> {
        loop {
            if self.subscriptions.is_empty() {
                return None;
            }

            let (event, index, _) = select_all(self.subscriptions.iter_mut().map(|s| Box::pin(s.next()))).await;
            let operation = self.subscriptions[index].operation();
            match event {
                None => {
                    tracing::info!(operation = operation.name(), "activity subscription ended");
                    self.subscriptions.remove(index);
                }
                Some(Err(err)) => {
                    tracing::warn!(operation = operation.name(), error = %err, "activity event failed");
                }
                Some(Ok(data)) => match self.alert(operation, data) {
                    Ok(Some(alert)) => return Some(alert),
                    Ok(None) => {}
                    Err(err) => {
                        tracing::warn!(operation = operation.name(), error = %err, "undecodable activity event");
                    }
                },
            }
        }
    }

    fn alert(&self, operation: Operation, data: Value) -> AppResult<Option<Alert>> {
        let me = self.me.as_str();
        let alert = match operation {
            Operation::OnCreateLike => {
                let like: Like = graphql::decode_root(operation, data)?;
                let on_my_post = like.post.as_ref().is_some_and(|p| p.user_id == me);
                (on_my_post && like.user_id != me).then(|| Alert {
                    kind: AlertKind::Like,
                    text: format!("{} liked your post", name(like.user.as_ref())),
                    actor_id: like.user_id,
                })
            }
            Operation::OnCreateComment => {
                let comment: Comment = graphql::decode_root(operation, data)?;
                let on_my_post = comment.post.as_ref().is_some_and(|p| p.user_id == me);
                (on_my_post && comment.user_id != me).then(|| Alert {
                    kind: AlertKind::Comment,
                    text: format!("{} commented: \"{}\"", name(comment.user.as_ref()), preview(&comment.content)),
                    actor_id: comment.user_id,
                })
            }
            Operation::OnCreateFollow => {
                let follow: Follow = graphql::decode_root(operation, data)?;
                (follow.followed_id == me && follow.follower_id != me).then(|| Alert {
                    kind: AlertKind::Follow,
                    text: format!("{} started following you", name(follow.follower.as_ref())),
                    actor_id: follow.follower_id,
                })
            }
            other => return Err(format!("{} is not an activity", other.name()).into()),
        };
        Ok(alert)
    }

    pub fn stop(self) {
        for subscription in self.subscriptions {
            subscription.unsubscribe();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        auth::Identity,
        follows::FollowButton,
        likes::LikeButton,
        memory::{MemoryBackend, MemoryObjectStore, Table},
        posts::compose,
    };

    fn as_user(backend: &Arc<MemoryBackend>, id: &str) -> Client {
        Client::new(backend.clone(), Arc::new(MemoryObjectStore::new()), Identity::new(id, id))
    }

    async fn setup() -> (Arc<MemoryBackend>, String) {
        let backend = Arc::new(MemoryBackend::new());
        for id in ["me", "omar"] {
            backend
                .insert(
                    Table::UserProfile,
                    &UserProfile { id: id.into(), username: id.into(), bio: None, avatar: None, cover_image: None },
                )
                .unwrap();
        }
        let post = compose(&as_user(&backend, "me"), "my post", None).await.unwrap();
        (backend, post.id)
    }

    #[tokio::test]
    async fn alerts_for_activity_on_my_things() {
        let (backend, post_id) = setup().await;
        let me = as_user(&backend, "me");
        let omar = as_user(&backend, "omar");
        let mut feed = ActivityFeed::start(&me).await.unwrap();
        assert_eq!(backend.live_subscriptions(), 3);

        // My own like is not news.
        LikeButton::load(&me, &post_id).await.unwrap().press().await;
        LikeButton::load(&omar, &post_id).await.unwrap().press().await;
        let alert = feed.next().await.unwrap();
        assert_eq!(alert.kind, AlertKind::Like);
        assert_eq!(alert.text, "omar liked your post");

        crate::comments::add(&omar, &post_id, "what a lovely post, really great").await.unwrap();
        let alert = feed.next().await.unwrap();
        assert_eq!(alert.text, "omar commented: \"what a lovely post, ...\"");

        FollowButton::load(&omar, "me").await.unwrap().unwrap().press().await;
        let alert = feed.next().await.unwrap();
        assert_eq!((alert.kind, alert.actor_id.as_str()), (AlertKind::Follow, "omar"));

        feed.stop();
        assert_eq!(backend.live_subscriptions(), 0);
    }

    #[tokio::test]
    async fn failed_start_releases_everything() {
        let (backend, _) = setup().await;
        backend.fail_next(Operation::OnCreateFollow, 1);
        assert!(ActivityFeed::start(&as_user(&backend, "me")).await.is_err());
        assert_eq!(backend.live_subscriptions(), 0);
    }

    #[test]
    fn short_comments_are_not_cut() {
        assert_eq!(preview("nice"), "nice");
        assert_eq!(preview("ñ".repeat(25).as_str()).chars().count(), 23);
    }
}
