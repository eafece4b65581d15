use serde_json::json;
use uuid::Uuid;

use crate::{AppResult, Client, graphql::{GraphQlRequest, Operation}, model::Post};

/// A file picked for upload alongside a post.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Publishes a post as the signed-in user. The attachment, if any, is
/// uploaded first under `posts/{uuid}-{file name}`.
///
/// Blank content is refused before anything is sent. Every failure is also
/// published as a notice.
pub async fn compose(client: &Client, content: &str, attachment: Option<Attachment>) -> AppResult<Post> {
    let content = content.trim();
    if content.is_empty() {
        client.notices.invalid("post", "Write something before posting.");
        return Err("post content is empty".into());
    }

    let result = publish(client, content, attachment).await;
    if let Err(err) = &result {
        client.notices.mutation_failed("publish your post", err);
    }
    result
}

async fn publish(client: &Client, content: &str, attachment: Option<Attachment>) -> AppResult<Post> {
    let mut media = Vec::new();
    if let Some(Attachment { file_name, content_type, bytes }) = attachment {
        let key = format!("posts/{}-{file_name}", Uuid::new_v4());
        client.store.upload(&key, bytes, &content_type).await?;
        tracing::debug!(key = %key, "attachment uploaded");
        media.push(key);
    }

    let post: Post = client
        .run(GraphQlRequest::new(
            Operation::CreatePost,
            json!({ "input": { "userID": client.user_id(), "content": content, "media": media } }),
        ))
        .await?;
    tracing::info!(post_id = %post.id, "post published");
    Ok(post)
}
