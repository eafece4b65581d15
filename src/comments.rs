//! Per-post comment threads.

use serde_json::{Value, json};

use crate::{
    AppResult, Client,
    graphql::{GraphQlRequest, Operation, PageRequest, SortDirection},
    model::Comment,
    reconcile::{Order, Reconciler, Source},
};

/// The comments under one post, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadScope {
    pub post_id: String,
}

impl ThreadScope {
    pub fn new(post_id: impl Into<String>) -> Self {
        Self { post_id: post_id.into() }
    }
}

impl Source for ThreadScope {
    type Item = Comment;

    fn order(&self) -> Order {
        Order::NewestFirst
    }

    fn list(&self, page: &PageRequest) -> GraphQlRequest {
        GraphQlRequest::new(
            Operation::CommentsByPostId,
            json!({ "postID": self.post_id, "sortDirection": SortDirection::Desc }),
        )
        .paged(page)
    }

    fn subscription(&self) -> Option<GraphQlRequest> {
        Some(GraphQlRequest::new(
            Operation::OnCreateComment,
            json!({ "filter": { "postID": { "eq": self.post_id } } }),
        ))
    }

    fn admits(&self, comment: &Comment) -> bool {
        comment.post_id == self.post_id
    }
}

/// Comments on `post_id` as the signed-in user. The new comment reaches
/// open threads through their subscription.
pub async fn add(client: &Client, post_id: &str, text: &str) -> AppResult<Comment> {
    let text = text.trim();
    if text.is_empty() {
        client.notices.invalid("comment", "Write a comment first.");
        return Err("comment is empty".into());
    }

    let result: AppResult<Comment> = client
        .run(GraphQlRequest::new(
            Operation::CreateComment,
            json!({ "input": { "postID": post_id, "userID": client.user_id(), "content": text } }),
        ))
        .await;
    if let Err(err) = &result {
        client.notices.mutation_failed("post your comment", err);
    }
    result
}

/// Deletes a comment and drops it from `thread` once confirmed.
pub async fn delete(client: &Client, thread: &mut Reconciler<Comment>, comment_id: &str) -> AppResult<()> {
    let result: AppResult<Value> = client
        .run(GraphQlRequest::new(Operation::DeleteComment, json!({ "input": { "id": comment_id } })))
        .await;
    match result {
        Ok(_) => {
            thread.remove(comment_id);
            Ok(())
        }
        Err(err) => {
            client.notices.mutation_failed("delete this comment", &err);
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        auth::Identity,
        live::LiveView,
        memory::{MemoryBackend, MemoryObjectStore, Table},
        model::UserProfile,
        reconcile::PushOutcome,
    };

    fn setup() -> (Arc<MemoryBackend>, Client) {
        let backend = Arc::new(MemoryBackend::new());
        backend
            .insert(
                Table::UserProfile,
                &UserProfile { id: "me".into(), username: "me".into(), bio: None, avatar: None, cover_image: None },
            )
            .unwrap();
        let client = Client::new(backend.clone(), Arc::new(MemoryObjectStore::new()), Identity::new("me", "me"));
        (backend, client)
    }

    #[tokio::test]
    async fn thread_shows_only_its_post_newest_first() {
        let (_, client) = setup();
        add(&client, "p1", "first").await.unwrap();
        add(&client, "p2", "elsewhere").await.unwrap();
        add(&client, "p1", "second").await.unwrap();

        let mut thread = LiveView::new(client.clone(), ThreadScope::new("p1"));
        thread.mount().await.unwrap();
        let texts: Vec<&str> = thread.items().iter().map(|c| c.record.content.as_str()).collect();
        assert_eq!(texts, ["second", "first"]);

        add(&client, "p2", "not here").await.unwrap();
        add(&client, "p1", "*third*").await.unwrap();
        assert_eq!(thread.next_push().await, Some(PushOutcome::Inserted(0)));
        assert_eq!(thread.items().len(), 3);
        assert_eq!(thread.items()[0].body_html.as_deref(), Some("<p><em>third</em></p>\n"));
    }

    #[tokio::test]
    async fn blank_comment_is_refused() {
        let (backend, client) = setup();
        assert!(add(&client, "p1", "  ").await.is_err());
        assert_eq!(backend.count(Table::Comment), 0);
    }

    #[tokio::test]
    async fn delete_removes_from_thread() {
        let (backend, client) = setup();
        let comment = add(&client, "p1", "oops").await.unwrap();
        let mut thread = LiveView::new(client.clone(), ThreadScope::new("p1"));
        thread.mount().await.unwrap();

        backend.fail_next(Operation::DeleteComment, 1);
        assert!(delete(&client, thread.reconciler_mut(), &comment.id).await.is_err());
        assert_eq!(thread.items().len(), 1);

        delete(&client, thread.reconciler_mut(), &comment.id).await.unwrap();
        assert!(thread.items().is_empty());
    }
}
