//! Read-model reconciliation.
//!
//! A [`Reconciler`] holds the one ordered, id-unique collection a view
//! renders. It is filled by a fetched page, grown by push events and
//! shrunk after deletes. Every entry is fully resolved (owner profile,
//! avatar URL, media URLs, rendered body) before it becomes visible, and
//! entries whose owner can't be found never do.

use std::{
    cmp::Ordering,
    collections::{HashMap, HashSet},
};

use futures_util::future::join_all;
use serde::de::DeserializeOwned;

use crate::{
    AppResult, Client,
    graphql::{GraphQlRequest, Page, PageRequest},
    media::{self, MediaSlot},
    model::{Record, UserProfile},
    profiles, render_markdown,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    NewestFirst,
    OldestFirst,
}

/// What a view shows: which page query fills it, which subscription keeps
/// it live, and in which order.
pub trait Source: Send + Sync {
    type Item: Record + DeserializeOwned;

    fn order(&self) -> Order;
    fn list(&self, page: &PageRequest) -> GraphQlRequest;
    fn subscription(&self) -> Option<GraphQlRequest>;

    /// Push events are checked against the scope again before insertion.
    fn admits(&self, item: &Self::Item) -> bool {
        let _ = item;
        true
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<T> {
    pub record: T,
    pub owner: UserProfile,
    pub owner_avatar_url: Option<String>,
    pub media: Vec<MediaSlot>,
    pub body_html: Option<String>,
}

impl<T: Record> Resolved<T> {
    pub fn id(&self) -> &str {
        self.record.id()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Ready,
    /// The page fetch failed; the view offers a retry.
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// Inserted at this index.
    Inserted(usize),
    Duplicate,
    OutOfScope,
    /// Couldn't be decoded or enriched; logged and forgotten.
    Dropped,
}

fn compare<T: Record>(order: Order, a: &Resolved<T>, b: &Resolved<T>) -> Ordering {
    let ascending = a
        .record
        .created_at()
        .cmp(&b.record.created_at())
        .then_with(|| a.id().cmp(b.id()));
    match order {
        Order::OldestFirst => ascending,
        Order::NewestFirst => ascending.reverse(),
    }
}

pub struct Reconciler<T> {
    client: Client,
    order: Order,
    items: Vec<Resolved<T>>,
    ids: HashSet<String>,
    owners: HashMap<String, UserProfile>,
    state: LoadState,
    next_token: Option<String>,
}

impl<T: Record + DeserializeOwned> Reconciler<T> {
    pub fn new(client: Client, order: Order) -> Self {
        Self {
            client,
            order,
            items: Vec::new(),
            ids: HashSet::new(),
            owners: HashMap::new(),
            state: LoadState::Idle,
            next_token: None,
        }
    }

    pub fn items(&self) -> &[Resolved<T>] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn has_more(&self) -> bool {
        self.next_token.is_some()
    }

    pub fn get(&self, id: &str) -> Option<&Resolved<T>> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.ids.clear();
        self.owners.clear();
        self.next_token = None;
        self.state = LoadState::Idle;
    }

    /// Replaces the collection with a freshly fetched and resolved page.
    ///
    /// On failure the collection stays empty and the state records why.
    pub async fn load<S: Source<Item = T>>(&mut self, scope: &S, page: PageRequest) -> AppResult<()> {
        self.clear();
        self.order = scope.order();

        let request = scope.list(&page);
        let operation = request.operation;
        let page: Page<T> = match self.client.run(request).await {
            Ok(page) => page,
            Err(err) => {
                tracing::error!(operation = operation.name(), error = %err, "load failed");
                self.state = LoadState::Failed(err.to_string());
                return Err(err);
            }
        };

        self.next_token = page.next_token;
        let resolved = self.resolve_batch(page.items).await;
        self.merge(resolved);
        self.state = LoadState::Ready;
        tracing::debug!(operation = operation.name(), count = self.items.len(), "loaded");
        Ok(())
    }

    /// Fetches the continuation page and merges it in. Returns whether
    /// another page remains.
    pub async fn load_more<S: Source<Item = T>>(&mut self, scope: &S, limit: u32) -> AppResult<bool> {
        let Some(token) = self.next_token.clone() else {
            return Ok(false);
        };

        let page: Page<T> = self.client.run(scope.list(&PageRequest::after(limit, token))).await?;
        self.next_token = page.next_token;
        let resolved = self.resolve_batch(page.items).await;
        self.merge(resolved);
        Ok(self.has_more())
    }

    /// Handles one pushed entity. Known ids are ignored without touching the
    /// existing entry; new ones are resolved and inserted at their sorted
    /// position, so a late event can't misorder the view.
    pub async fn apply_push<S: Source<Item = T>>(&mut self, scope: &S, item: T) -> PushOutcome {
        if self.ids.contains(item.id()) {
            return PushOutcome::Duplicate;
        }
        if !scope.admits(&item) {
            return PushOutcome::OutOfScope;
        }

        let id = item.id().to_owned();
        let Some(owner) = self.owner(item.owner_id()).await else {
            tracing::warn!(id = %id, "push dropped, owner unresolved");
            return PushOutcome::Dropped;
        };
        let resolved = enrich(&self.client, item, owner).await;

        if self.ids.contains(&id) {
            return PushOutcome::Duplicate;
        }
        PushOutcome::Inserted(self.insert_sorted(resolved))
    }

    /// Drops the entry with this id, if there is one.
    pub fn remove(&mut self, id: &str) -> Option<Resolved<T>> {
        if !self.ids.remove(id) {
            return None;
        }
        let pos = self.items.iter().position(|item| item.id() == id)?;
        Some(self.items.remove(pos))
    }

    /// Edits an entry's record in place (e.g. a read flag); returns whether it existed.
    pub fn patch(&mut self, id: &str, edit: impl FnOnce(&mut T)) -> bool {
        match self.items.iter_mut().find(|item| item.id() == id) {
            Some(item) => {
                edit(&mut item.record);
                true
            }
            None => false,
        }
    }

    fn insert_sorted(&mut self, resolved: Resolved<T>) -> usize {
        let order = self.order;
        let pos = self
            .items
            .partition_point(|existing| compare(order, existing, &resolved) == Ordering::Less);
        self.ids.insert(resolved.id().to_owned());
        self.items.insert(pos, resolved);
        pos
    }

    fn merge(&mut self, resolved: Vec<Resolved<T>>) {
        for entry in resolved {
            if self.ids.insert(entry.id().to_owned()) {
                self.items.push(entry);
            }
        }
        let order = self.order;
        self.items.sort_by(|a, b| compare(order, a, b));
    }

    async fn owner(&mut self, owner_id: &str) -> Option<UserProfile> {
        if let Some(owner) = self.owners.get(owner_id) {
            return Some(owner.clone());
        }
        let owner = lookup_owner(&self.client, owner_id).await?;
        self.owners.insert(owner_id.to_owned(), owner.clone());
        Some(owner)
    }

    /// Resolves a page: owners first (one lookup per distinct owner), then
    /// every entry's derived fields, all concurrently.
    async fn resolve_batch(&mut self, items: Vec<T>) -> Vec<Resolved<T>> {
        let missing: HashSet<&str> = items
            .iter()
            .map(Record::owner_id)
            .filter(|id| !self.owners.contains_key(*id))
            .collect();
        let client = &self.client;
        let found = join_all(missing.into_iter().map(|id| async move {
            (id.to_owned(), lookup_owner(client, id).await)
        }))
        .await;
        for (id, owner) in found {
            if let Some(owner) = owner {
                self.owners.insert(id, owner);
            }
        }

        let owners = &self.owners;
        let visible: Vec<(T, UserProfile)> = items
            .into_iter()
            .filter_map(|item| match owners.get(item.owner_id()) {
                Some(owner) => Some((item, owner.clone())),
                None => {
                    tracing::debug!(id = item.id(), owner = item.owner_id(), "orphaned entity hidden");
                    None
                }
            })
            .collect();

        join_all(visible.into_iter().map(|(item, owner)| enrich(client, item, owner))).await
    }
}

async fn lookup_owner(client: &Client, owner_id: &str) -> Option<UserProfile> {
    match profiles::get(client, owner_id).await {
        Ok(owner) => owner,
        Err(err) => {
            tracing::warn!(owner = owner_id, error = %err, "owner lookup failed");
            None
        }
    }
}

async fn enrich<T: Record>(client: &Client, record: T, owner: UserProfile) -> Resolved<T> {
    let store = client.store.as_ref();
    let (owner_avatar_url, media) = futures_util::join!(
        media::resolve_opt(store, owner.avatar.as_deref()),
        media::resolve_all(store, record.media_keys()),
    );
    let body_html = record.body().map(render_markdown);

    Resolved {
        record,
        owner,
        owner_avatar_url,
        media,
        body_html,
    }
}
