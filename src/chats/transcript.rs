use serde_json::json;

use crate::{
    graphql::{GraphQlRequest, Operation, PageRequest, SortDirection},
    model::Message,
    reconcile::{Order, Source},
};

/// The messages of one chat, oldest first, with new ones appended live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptScope {
    pub chat_id: String,
}

impl TranscriptScope {
    pub fn new(chat_id: impl Into<String>) -> Self {
        Self { chat_id: chat_id.into() }
    }
}

impl Source for TranscriptScope {
    type Item = Message;

    fn order(&self) -> Order {
        Order::OldestFirst
    }

    fn list(&self, page: &PageRequest) -> GraphQlRequest {
        GraphQlRequest::new(
            Operation::MessagesByChatIdAndCreatedAt,
            json!({ "chatID": self.chat_id, "sortDirection": SortDirection::Asc }),
        )
        .paged(page)
    }

    fn subscription(&self) -> Option<GraphQlRequest> {
        Some(GraphQlRequest::new(
            Operation::OnCreateMessage,
            json!({ "filter": { "chatID": { "eq": self.chat_id } } }),
        ))
    }

    fn admits(&self, message: &Message) -> bool {
        message.chat_id == self.chat_id
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        chats::{
            send_message,
            tests::{as_user, profile},
        },
        live::LiveView,
        memory::{MemoryBackend, Table},
        reconcile::PushOutcome,
    };

    #[tokio::test]
    async fn transcript_appends_in_send_order() {
        let backend = Arc::new(MemoryBackend::new());
        for id in ["me", "sam"] {
            backend.insert(Table::UserProfile, &profile(id)).unwrap();
        }
        let me = as_user(&backend, "me");
        let sam = as_user(&backend, "sam");
        send_message(&me, "c1", "hi").await.unwrap();
        send_message(&sam, "c1", "hey").await.unwrap();

        let mut transcript = LiveView::new(me.clone(), TranscriptScope::new("c1"));
        transcript.mount().await.unwrap();
        send_message(&sam, "c2", "elsewhere").await.unwrap();
        send_message(&me, "c1", "how are you?").await.unwrap();

        assert_eq!(transcript.next_push().await, Some(PushOutcome::Inserted(2)));
        let texts: Vec<&str> = transcript.items().iter().map(|m| m.record.content.as_str()).collect();
        assert_eq!(texts, ["hi", "hey", "how are you?"]);
        assert_eq!(transcript.items()[1].owner.username, "sam");
    }

    #[tokio::test]
    async fn blank_message_is_not_sent() {
        let backend = Arc::new(MemoryBackend::new());
        let me = as_user(&backend, "me");
        assert!(send_message(&me, "c1", " \t").await.is_err());
        assert_eq!(backend.count(Table::Message), 0);
    }

    #[tokio::test]
    async fn failed_send_reports_a_notice() {
        let backend = Arc::new(MemoryBackend::new());
        let me = as_user(&backend, "me");
        let mut notices = me.notices.subscribe();
        backend.fail_next(Operation::CreateMessage, 1);

        assert!(send_message(&me, "c1", "hello").await.is_err());
        assert_eq!(notices.try_recv().unwrap().message, "Couldn't send your message. Please try again.");
    }
}
