use serde_json::{Value, json};

use crate::{
    AppResult, Client,
    graphql::{GraphQlRequest, Operation},
    model::Post,
    reconcile::Reconciler,
};

/// Deletes a post and, once the backend confirms, drops it from `feed`.
/// On failure the feed is left alone and a notice goes out.
pub async fn delete_post(client: &Client, feed: &mut Reconciler<Post>, post_id: &str) -> AppResult<()> {
    let result: AppResult<Value> = client
        .run(GraphQlRequest::new(Operation::DeletePost, json!({ "input": { "id": post_id } })))
        .await;

    match result {
        Ok(_) => {
            feed.remove(post_id);
            tracing::info!(post_id, "post deleted");
            Ok(())
        }
        Err(err) => {
            client.notices.mutation_failed("delete this post", &err);
            Err(err)
        }
    }
}
