//! Direct chats: the chat list, starting a chat, sending and reading messages.

use std::collections::HashMap;

use futures_util::future::join_all;
use serde_json::json;

use crate::{
    AppResult, Client,
    graphql::{GraphQlRequest, Operation},
    media,
    model::{Chat, Notification, NotificationKind, UserProfile},
    profiles,
};

mod msg;
mod new;
mod transcript;

pub use msg::send_message;
pub use new::start_chat;
pub use transcript::TranscriptScope;

/// One row of the chat list.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatSummary {
    pub chat: Chat,
    /// The other participant, or a placeholder when their profile is gone.
    pub other: UserProfile,
    pub other_avatar_url: Option<String>,
    /// Unread message notifications from `other`.
    pub unread: usize,
}

/// The signed-in user's chats, most recently active first.
#[derive(Debug, Clone, Default)]
pub struct ChatList {
    items: Vec<ChatSummary>,
}

impl ChatList {
    pub async fn load(client: &Client) -> AppResult<ChatList> {
        let me = client.user_id();
        let chats: Vec<Chat> = client
            .run_all(GraphQlRequest::new(
                Operation::ListChats,
                json!({ "filter": { "participants": { "contains": me } } }),
            ))
            .await?;

        let unread: Vec<Notification> = client
            .run_all(GraphQlRequest::new(
                Operation::NotificationsByReceiverId,
                json!({
                    "receiverID": me,
                    "filter": { "type": { "eq": NotificationKind::Message }, "isRead": { "eq": false } },
                }),
            ))
            .await?;
        let mut unread_by_sender: HashMap<String, usize> = HashMap::new();
        for notification in unread {
            *unread_by_sender.entry(notification.sender_id).or_default() += 1;
        }

        let mine = chats.into_iter().filter(|chat| chat.participants.iter().any(|p| p == me));
        let mut items = join_all(mine.map(|chat| {
            let unread = &unread_by_sender;
            async move {
                let other_id = chat.other_participant(me).to_owned();
                let unread = unread.get(&other_id).copied().unwrap_or(0);
                summarize(client, chat, &other_id, unread).await
            }
        }))
        .await;
        items.sort_by(|a, b| b.chat.updated_at.cmp(&a.chat.updated_at));

        tracing::debug!(count = items.len(), "chat list loaded");
        Ok(ChatList { items })
    }

    pub fn items(&self) -> &[ChatSummary] {
        &self.items
    }

    /// The existing chat whose other participant is `user_id`, if there is one.
    pub fn with_user(&self, user_id: &str) -> Option<&ChatSummary> {
        self.items.iter().find(|summary| summary.other.id == user_id)
    }

    pub fn total_unread(&self) -> usize {
        self.items.iter().map(|summary| summary.unread).sum()
    }

    fn push_front(&mut self, summary: ChatSummary) {
        self.items.insert(0, summary);
    }
}

async fn summarize(client: &Client, chat: Chat, other_id: &str, unread: usize) -> ChatSummary {
    let other = match profiles::get(client, other_id).await {
        Ok(Some(profile)) => profile,
        Ok(None) => UserProfile::placeholder(other_id),
        Err(err) => {
            tracing::warn!(chat_id = %chat.id, error = %err, "chat participant lookup failed");
            UserProfile::placeholder(other_id)
        }
    };
    let other_avatar_url = media::resolve_opt(client.store.as_ref(), other.avatar.as_deref()).await;
    ChatSummary {
        chat,
        other,
        other_avatar_url,
        unread,
    }
}
