use serde_json::json;

use crate::{
    AppResult, Client,
    graphql::{GraphQlRequest, Operation},
    model::Message,
};

/// Sends a message into `chat_id`. It shows up in open transcripts through
/// their subscription, not through this call.
pub async fn send_message(client: &Client, chat_id: &str, text: &str) -> AppResult<Message> {
    if text.trim().is_empty() {
        client.notices.invalid("send message", "Type a message first.");
        return Err("message is empty".into());
    }

    let result: AppResult<Message> = client
        .run(GraphQlRequest::new(
            Operation::CreateMessage,
            json!({ "input": { "chatID": chat_id, "senderID": client.user_id(), "content": text } }),
        ))
        .await;
    match result {
        Ok(message) => {
            tracing::debug!(chat_id, message_id = %message.id, "message sent");
            Ok(message)
        }
        Err(err) => {
            client.notices.mutation_failed("send your message", &err);
            Err(err)
        }
    }
}
