use crate::{
    AppResult, Client,
    follows::FollowButton,
    live::LiveView,
    media,
    model::UserProfile,
    posts::FeedScope,
};

/// Everything a profile screen shows.
pub struct ProfilePage {
    pub profile: UserProfile,
    pub avatar_url: Option<String>,
    pub cover_url: Option<String>,
    /// The user's own posts, live.
    pub posts: LiveView<FeedScope>,
    /// Absent on the signed-in user's own page.
    pub follow: Option<FollowButton>,
}

impl ProfilePage {
    /// `None` when the profile doesn't exist. A failed post load leaves the
    /// page up with the feed in its failed state.
    pub async fn load(client: &Client, user_id: &str) -> AppResult<Option<ProfilePage>> {
        let Some(profile) = super::get(client, user_id).await? else {
            return Ok(None);
        };

        let store = client.store.as_ref();
        let (avatar_url, cover_url) = futures_util::join!(
            media::resolve_opt(store, profile.avatar.as_deref()),
            media::resolve_opt(store, profile.cover_image.as_deref()),
        );

        let mut posts = LiveView::new(client.clone(), FeedScope::Author(profile.id.clone()));
        if let Err(err) = posts.mount().await {
            tracing::warn!(user_id, error = %err, "profile posts unavailable");
        }
        let follow = FollowButton::load(client, &profile.id).await?;

        Ok(Some(ProfilePage {
            profile,
            avatar_url,
            cover_url,
            posts,
            follow,
        }))
    }

    pub fn is_own(&self) -> bool {
        self.follow.is_none()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        auth::Identity,
        graphql::Operation,
        memory::{MemoryBackend, MemoryObjectStore, Table},
        posts::compose,
        reconcile::LoadState,
    };

    fn setup() -> (Arc<MemoryBackend>, Arc<MemoryObjectStore>) {
        let backend = Arc::new(MemoryBackend::new());
        let store = Arc::new(MemoryObjectStore::new());
        for (id, avatar) in [("me", None), ("nora", Some("avatars/nora.jpg"))] {
            backend
                .insert(
                    Table::UserProfile,
                    &UserProfile {
                        id: id.into(),
                        username: id.into(),
                        bio: None,
                        avatar: avatar.map(Into::into),
                        cover_image: Some("covers/missing.jpg".into()),
                    },
                )
                .unwrap();
        }
        store.put("avatars/nora.jpg", vec![1, 2]);
        (backend, store)
    }

    fn as_user(backend: &Arc<MemoryBackend>, store: &Arc<MemoryObjectStore>, id: &str) -> Client {
        Client::new(backend.clone(), store.clone(), Identity::new(id, id))
    }

    #[tokio::test]
    async fn someone_elses_page() {
        let (backend, store) = setup();
        compose(&as_user(&backend, &store, "nora"), "mine", None).await.unwrap();
        compose(&as_user(&backend, &store, "me"), "not nora's", None).await.unwrap();

        let page = ProfilePage::load(&as_user(&backend, &store, "me"), "nora").await.unwrap().unwrap();
        assert_eq!(page.avatar_url.as_deref(), Some("memory://media/avatars/nora.jpg?expires=900"));
        assert_eq!(page.cover_url, None);
        assert_eq!(page.posts.items().len(), 1);
        assert_eq!(page.posts.items()[0].record.content, "mine");
        assert!(!page.is_own());
    }

    #[tokio::test]
    async fn own_page_has_no_follow_button() {
        let (backend, store) = setup();
        let page = ProfilePage::load(&as_user(&backend, &store, "me"), "me").await.unwrap().unwrap();
        assert!(page.is_own());
    }

    #[tokio::test]
    async fn unknown_user_has_no_page() {
        let (backend, store) = setup();
        assert!(ProfilePage::load(&as_user(&backend, &store, "me"), "ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn failed_posts_keep_the_page() {
        let (backend, store) = setup();
        backend.fail_next(Operation::PostsByUserId, 1);
        let page = ProfilePage::load(&as_user(&backend, &store, "me"), "nora").await.unwrap().unwrap();
        assert!(matches!(page.posts.reconciler().state(), LoadState::Failed(_)));
    }
}
