//! The notification inbox.

use serde_json::{Value, json};

use crate::{
    AppResult, Client,
    graphql::{GraphQlRequest, Operation, PageRequest, SortDirection},
    model::{Notification, NotificationKind},
    reconcile::{Order, Reconciler, Resolved, Source},
};

/// Notifications addressed to one user, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboxScope {
    pub receiver_id: String,
}

impl InboxScope {
    pub fn for_user(client: &Client) -> Self {
        Self {
            receiver_id: client.user_id().to_owned(),
        }
    }
}

impl Source for InboxScope {
    type Item = Notification;

    fn order(&self) -> Order {
        Order::NewestFirst
    }

    fn list(&self, page: &PageRequest) -> GraphQlRequest {
        GraphQlRequest::new(
            Operation::NotificationsByReceiverId,
            json!({ "receiverID": self.receiver_id, "sortDirection": SortDirection::Desc }),
        )
        .paged(page)
    }

    fn subscription(&self) -> Option<GraphQlRequest> {
        Some(GraphQlRequest::new(
            Operation::OnCreateNotification,
            json!({ "filter": { "receiverID": { "eq": self.receiver_id } } }),
        ))
    }

    fn admits(&self, notification: &Notification) -> bool {
        notification.receiver_id == self.receiver_id
    }
}

/// Marks a notification read on the backend, then in `inbox`.
pub async fn mark_read(client: &Client, inbox: &mut Reconciler<Notification>, id: &str) -> AppResult<()> {
    if inbox.get(id).is_some_and(|n| n.record.is_read) {
        return Ok(());
    }

    let result: AppResult<Value> = client
        .run(GraphQlRequest::new(
            Operation::UpdateNotification,
            json!({ "input": { "id": id, "isRead": true } }),
        ))
        .await;
    match result {
        Ok(_) => {
            inbox.patch(id, |n| n.is_read = true);
            Ok(())
        }
        Err(err) => {
            client.notices.mutation_failed("mark this notification as read", &err);
            Err(err)
        }
    }
}

pub fn unread_count(inbox: &Reconciler<Notification>) -> usize {
    inbox.items().iter().filter(|n| !n.record.is_read).count()
}

/// One-line text for a notification, naming whoever caused it.
pub fn describe(notification: &Resolved<Notification>) -> String {
    let who = &notification.owner.username;
    match notification.record.kind {
        NotificationKind::Like => format!("{who} liked your post"),
        NotificationKind::Comment => format!("{who} commented on your post"),
        NotificationKind::Follow => format!("{who} started following you"),
        NotificationKind::Message => format!("{who} sent you a message"),
    }
}
