//! Storage key to display URL. Never fails: a key that can't be resolved
//! yields `None` and the caller shows its placeholder.

use futures_util::future::join_all;

use crate::storage::ObjectStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaSlot {
    pub key: String,
    pub url: Option<String>,
}

pub async fn resolve(store: &dyn ObjectStore, key: &str) -> Option<String> {
    match store.url_for(key).await {
        Ok(url) => Some(url),
        Err(err) => {
            tracing::warn!(key, error = %err, "media url unresolved");
            None
        }
    }
}

pub async fn resolve_opt(store: &dyn ObjectStore, key: Option<&str>) -> Option<String> {
    match key {
        Some(key) if !key.is_empty() => resolve(store, key).await,
        _ => None,
    }
}

/// Resolves all keys concurrently, keeping their order.
pub async fn resolve_all(store: &dyn ObjectStore, keys: &[String]) -> Vec<MediaSlot> {
    let urls = join_all(keys.iter().map(|key| resolve(store, key))).await;
    keys.iter()
        .cloned()
        .zip(urls)
        .map(|(key, url)| MediaSlot { key, url })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryObjectStore;

    #[tokio::test]
    async fn missing_key_degrades_to_none() {
        let store = MemoryObjectStore::new();
        store.put("posts/a.png", b"png".to_vec());

        let slots = resolve_all(&store, &["posts/a.png".to_owned(), "posts/gone.png".to_owned()]).await;
        assert_eq!(slots.len(), 2);
        assert!(slots[0].url.as_deref().unwrap().contains("posts/a.png"));
        assert_eq!(slots[1].url, None);
    }

    #[tokio::test]
    async fn empty_avatar_key_is_skipped() {
        let store = MemoryObjectStore::new();
        assert_eq!(resolve_opt(&store, Some("")).await, None);
        assert_eq!(resolve_opt(&store, None).await, None);
    }
}
