use tokio::sync::broadcast;

use crate::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// A create/update/delete did not go through; local state was restored.
    MutationFailed,
    /// Input rejected before anything was sent.
    Invalid,
}

/// A transient message for the user (a toast).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub action: &'static str,
    pub message: String,
}

/// Fan-out of user-facing notices to whatever is rendering them.
#[derive(Clone)]
pub struct Notices {
    tx: broadcast::Sender<Notice>,
}

impl Default for Notices {
    fn default() -> Self {
        Self::new()
    }
}

impl Notices {
    pub fn new() -> Self {
        Self { tx: broadcast::channel(64).0 }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.tx.subscribe()
    }

    pub fn mutation_failed(&self, action: &'static str, err: &AppError) {
        tracing::warn!(action, error = %err, "mutation failed");
        self.publish(Notice {
            kind: NoticeKind::MutationFailed,
            action,
            message: format!("Couldn't {action}. Please try again."),
        });
    }

    pub fn invalid(&self, action: &'static str, message: impl Into<String>) {
        self.publish(Notice {
            kind: NoticeKind::Invalid,
            action,
            message: message.into(),
        });
    }

    fn publish(&self, notice: Notice) {
        if self.tx.send(notice).is_err() {
            tracing::debug!("notice dropped, nobody is listening");
        }
    }
}
