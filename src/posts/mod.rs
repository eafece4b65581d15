//! The post feed: which posts a view shows, composing and deleting them.

use serde_json::json;

use crate::{
    graphql::{GraphQlRequest, Operation, PageRequest, SortDirection, any_of},
    model::Post,
    reconcile::{Order, Source},
};

mod delete;
mod new;

pub use delete::delete_post;
pub use new::{Attachment, compose};

/// Which authors a feed shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedScope {
    Everyone,
    /// Ids from [`crate::follows::following_ids`]. Following nobody is an empty feed.
    Following(Vec<String>),
    Author(String),
}

impl Source for FeedScope {
    type Item = Post;

    fn order(&self) -> Order {
        Order::NewestFirst
    }

    fn list(&self, page: &PageRequest) -> GraphQlRequest {
        let request = match self {
            FeedScope::Everyone => GraphQlRequest::new(Operation::ListPosts, json!({})),
            FeedScope::Following(ids) => {
                GraphQlRequest::new(Operation::ListPosts, json!({ "filter": any_of("userID", ids) }))
            }
            FeedScope::Author(id) => GraphQlRequest::new(
                Operation::PostsByUserId,
                json!({ "userID": id, "sortDirection": SortDirection::Desc }),
            ),
        };
        request.paged(page)
    }

    fn subscription(&self) -> Option<GraphQlRequest> {
        let variables = match self {
            FeedScope::Everyone => json!({}),
            FeedScope::Following(ids) => json!({ "filter": any_of("userID", ids) }),
            FeedScope::Author(id) => json!({ "filter": { "userID": { "eq": id } } }),
        };
        Some(GraphQlRequest::new(Operation::OnCreatePost, variables))
    }

    fn admits(&self, post: &Post) -> bool {
        match self {
            FeedScope::Everyone => true,
            FeedScope::Following(ids) => ids.iter().any(|id| *id == post.user_id),
            FeedScope::Author(id) => *id == post.user_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        Client,
        auth::Identity,
        live::LiveView,
        memory::{MemoryBackend, MemoryObjectStore, Table},
        model::UserProfile,
        reconcile::PushOutcome,
    };

    fn client() -> (Arc<MemoryBackend>, Client) {
        let backend = Arc::new(MemoryBackend::new());
        for id in ["me", "friend", "stranger"] {
            backend
                .insert(
                    Table::UserProfile,
                    &UserProfile { id: id.into(), username: id.into(), bio: None, avatar: None, cover_image: None },
                )
                .unwrap();
        }
        let client = Client::new(backend.clone(), Arc::new(MemoryObjectStore::new()), Identity::new("me", "me"));
        (backend, client)
    }

    #[test]
    fn author_scope_uses_the_index_newest_first() {
        let req = FeedScope::Author("u1".into()).list(&PageRequest::first(10));
        assert_eq!(req.operation, Operation::PostsByUserId);
        assert_eq!(req.variables, json!({ "userID": "u1", "sortDirection": "DESC", "limit": 10 }));
    }

    fn as_user(client: &Client, id: &str) -> Client {
        Client::new(client.backend.clone(), client.store.clone(), Identity::new(id, id))
    }

    #[tokio::test]
    async fn following_feed_only_shows_followed_authors() {
        let (_, me) = client();
        compose(&me, "from me", None).await.unwrap();
        compose(&as_user(&me, "stranger"), "from stranger", None).await.unwrap();
        compose(&as_user(&me, "friend"), "older, from friend", None).await.unwrap();

        let mut view = LiveView::new(me.clone(), FeedScope::Following(vec!["friend".into()]));
        view.mount().await.unwrap();
        assert_eq!(view.items().len(), 1);

        compose(&as_user(&me, "stranger"), "ignored", None).await.unwrap();
        compose(&as_user(&me, "friend"), "hi from friend", None).await.unwrap();
        assert_eq!(view.next_push().await, Some(PushOutcome::Inserted(0)));
        assert_eq!(view.items().len(), 2);
        assert_eq!(view.items()[0].record.content, "hi from friend");
    }

    #[test]
    fn push_outside_author_scope_is_not_admitted() {
        let post: Post = serde_json::from_value(json!({
            "id": "p", "userID": "stranger", "content": "x", "media": [],
            "createdAt": "2025-01-01T00:00:00Z", "updatedAt": "2025-01-01T00:00:00Z"
        }))
        .unwrap();
        assert!(!FeedScope::Author("me".into()).admits(&post));
        assert!(!FeedScope::Following(vec![]).admits(&post));
        assert!(FeedScope::Everyone.admits(&post));
    }
}
