//! Canonical client-side shapes for every backend entity.
//!
//! Field names follow the backend schema (`userID`, `createdAt`, ...); every
//! call site decodes into these, never into ad hoc JSON.

use serde::{Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;

/// Anything a reconciled collection can hold.
pub trait Record: Clone + Send + Sync + 'static {
    fn id(&self) -> &str;
    fn created_at(&self) -> OffsetDateTime;
    /// The user the entity is attributed to; an unresolvable owner hides the entity.
    fn owner_id(&self) -> &str;

    fn media_keys(&self) -> &[String] {
        &[]
    }

    /// Markdown text rendered into `body_html` on resolution.
    fn body(&self) -> Option<&str> {
        None
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub bio: Option<String>,
    /// Storage key of the avatar image.
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
}

impl UserProfile {
    /// Stand-in for a participant whose profile is gone.
    pub fn placeholder(id: &str) -> Self {
        UserProfile {
            id: id.to_owned(),
            username: "Unknown user".to_owned(),
            bio: None,
            avatar: None,
            cover_image: None,
        }
    }

    pub fn initial(&self) -> char {
        self.username
            .chars()
            .next()
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or('?')
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRef {
    pub id: String,
    #[serde(rename = "userID")]
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    #[serde(rename = "userID")]
    pub user_id: String,
    pub content: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub media: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Record for Post {
    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }

    fn owner_id(&self) -> &str {
        &self.user_id
    }

    fn media_keys(&self) -> &[String] {
        &self.media
    }

    fn body(&self) -> Option<&str> {
        Some(&self.content)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    #[serde(rename = "postID")]
    pub post_id: String,
    #[serde(rename = "userID")]
    pub user_id: String,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(default)]
    pub post: Option<PostRef>,
    #[serde(default)]
    pub user: Option<UserProfile>,
}

impl Record for Comment {
    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }

    fn owner_id(&self) -> &str {
        &self.user_id
    }

    fn body(&self) -> Option<&str> {
        Some(&self.content)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Like {
    pub id: String,
    #[serde(rename = "postID")]
    pub post_id: String,
    #[serde(rename = "userID")]
    pub user_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(default)]
    pub post: Option<PostRef>,
    #[serde(default)]
    pub user: Option<UserProfile>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Follow {
    pub id: String,
    #[serde(rename = "followerID")]
    pub follower_id: String,
    #[serde(rename = "followedID")]
    pub followed_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(default)]
    pub follower: Option<UserProfile>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub participants: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Chat {
    /// The participant who isn't `me`; a chat with yourself yields `me`.
    pub fn other_participant<'a>(&'a self, me: &'a str) -> &'a str {
        self.participants
            .iter()
            .map(String::as_str)
            .find(|p| *p != me)
            .unwrap_or(me)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    #[serde(rename = "chatID")]
    pub chat_id: String,
    #[serde(rename = "senderID")]
    pub sender_id: String,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Record for Message {
    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }

    fn owner_id(&self) -> &str {
        &self.sender_id
    }

    fn body(&self) -> Option<&str> {
        Some(&self.content)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    Like,
    Comment,
    Follow,
    Message,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub is_read: bool,
    #[serde(rename = "senderID")]
    pub sender_id: String,
    #[serde(rename = "receiverID")]
    pub receiver_id: String,
    #[serde(rename = "postID", default)]
    pub post_id: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Record for Notification {
    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }

    /// Notifications are attributed to whoever caused them.
    fn owner_id(&self) -> &str {
        &self.sender_id
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use time::macros::datetime;

    use super::*;

    #[test]
    fn post_with_null_media_decodes_empty() {
        let post: Post = serde_json::from_value(json!({
            "id": "p1",
            "userID": "u1",
            "content": "hola",
            "media": null,
            "createdAt": "2025-01-02T03:04:05.000Z",
            "updatedAt": "2025-01-02T03:04:05.000Z",
            "owner": "u1",
            "__typename": "Post"
        }))
        .unwrap();
        assert!(post.media.is_empty());
        assert_eq!(post.created_at, datetime!(2025-01-02 03:04:05 UTC));
        assert_eq!(post.owner_id(), "u1");
    }

    #[test]
    fn notification_kind_uses_schema_names() {
        let n: Notification = serde_json::from_value(json!({
            "id": "n1",
            "type": "MESSAGE",
            "isRead": false,
            "senderID": "a",
            "receiverID": "b",
            "createdAt": "2025-01-02T03:04:05Z"
        }))
        .unwrap();
        assert_eq!(n.kind, NotificationKind::Message);
        assert_eq!(n.post_id, None);
    }

    #[test]
    fn other_participant_falls_back_to_self() {
        let chat = Chat {
            id: "c".into(),
            participants: vec!["me".into()],
            created_at: datetime!(2025-01-01 0:00 UTC),
            updated_at: datetime!(2025-01-01 0:00 UTC),
        };
        assert_eq!(chat.other_participant("me"), "me");
    }

    #[test]
    fn placeholder_initial() {
        assert_eq!(UserProfile::placeholder("x").initial(), 'U');
    }
}
