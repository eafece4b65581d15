use serde_json::json;

use crate::{
    AppResult, Client,
    graphql::{GraphQlRequest, Operation},
    model::{Chat, UserProfile},
};

use super::{ChatList, ChatSummary};

/// Opens the chat with `other`: the existing one if the list has it,
/// otherwise a new chat, which goes to the top of the list.
pub async fn start_chat(client: &Client, list: &mut ChatList, other: &UserProfile) -> AppResult<ChatSummary> {
    if other.id == client.user_id() {
        client.notices.invalid("chat", "You can't start a chat with yourself.");
        return Err("cannot chat with yourself".into());
    }
    if let Some(existing) = list.with_user(&other.id) {
        return Ok(existing.clone());
    }

    let result: AppResult<Chat> = client
        .run(GraphQlRequest::new(
            Operation::CreateChat,
            json!({ "input": { "participants": [client.user_id(), other.id] } }),
        ))
        .await;
    let chat = match result {
        Ok(chat) => chat,
        Err(err) => {
            client.notices.mutation_failed("start this chat", &err);
            return Err(err);
        }
    };

    tracing::info!(chat_id = %chat.id, with = %other.id, "chat started");
    let other_avatar_url = crate::media::resolve_opt(client.store.as_ref(), other.avatar.as_deref()).await;
    let summary = ChatSummary {
        chat,
        other: other.clone(),
        other_avatar_url,
        unread: 0,
    };
    list.push_front(summary.clone());
    Ok(summary)
}
