//! A reconciled collection plus the subscription that keeps it current.

use crate::{
    AppResult, Client,
    backend::Subscription,
    graphql::{self, PageRequest},
    reconcile::{PushOutcome, Reconciler, Resolved, Source},
};

/// One mounted view. The subscription is opened before the first page is
/// fetched so nothing created meanwhile is missed; pushes that duplicate the
/// page are dropped by the reconciler. Dropping the view closes the
/// subscription.
pub struct LiveView<S: Source> {
    client: Client,
    scope: S,
    reconciler: Reconciler<S::Item>,
    subscription: Option<Subscription>,
}

impl<S: Source> LiveView<S> {
    pub fn new(client: Client, scope: S) -> Self {
        let reconciler = Reconciler::new(client.clone(), scope.order());
        Self {
            client,
            scope,
            reconciler,
            subscription: None,
        }
    }

    /// Subscribes, then loads the first page. A subscription that can't be
    /// opened leaves the view static but still loaded.
    pub async fn mount(&mut self) -> AppResult<()> {
        if self.subscription.is_none() {
            self.subscribe().await;
        }
        self.reload().await
    }

    /// Refetches the first page; the retry after a failed load.
    pub async fn reload(&mut self) -> AppResult<()> {
        let page = PageRequest::first(self.client.page_size);
        self.reconciler.load(&self.scope, page).await
    }

    pub async fn load_more(&mut self) -> AppResult<bool> {
        self.reconciler.load_more(&self.scope, self.client.page_size).await
    }

    /// Switches scope: the old subscription is released before the new one opens.
    pub async fn rescope(&mut self, scope: S) -> AppResult<()> {
        self.unmount();
        self.reconciler.clear();
        self.scope = scope;
        self.mount().await
    }

    pub fn unmount(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
    }

    async fn subscribe(&mut self) {
        let Some(request) = self.scope.subscription() else {
            return;
        };
        let operation = request.operation;
        match self.client.backend.subscribe(request).await {
            Ok(subscription) => self.subscription = Some(subscription),
            Err(err) => {
                tracing::warn!(operation = operation.name(), error = %err, "subscription unavailable, view stays static");
            }
        }
    }

    /// Waits for the next pushed event and applies it. `None` when the view
    /// isn't subscribed or the stream has ended.
    pub async fn next_push(&mut self) -> Option<PushOutcome> {
        let subscription = self.subscription.as_mut()?;
        let operation = subscription.operation();

        let data = match subscription.next().await {
            Some(Ok(data)) => data,
            Some(Err(err)) => {
                tracing::warn!(operation = operation.name(), error = %err, "push event failed");
                return Some(PushOutcome::Dropped);
            }
            None => {
                tracing::info!(operation = operation.name(), "subscription ended");
                self.subscription = None;
                return None;
            }
        };

        match graphql::decode_root::<S::Item>(operation, data) {
            Ok(item) => Some(self.reconciler.apply_push(&self.scope, item).await),
            Err(err) => {
                tracing::warn!(operation = operation.name(), error = %err, "undecodable push event");
                Some(PushOutcome::Dropped)
            }
        }
    }

    pub fn is_live(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn scope(&self) -> &S {
        &self.scope
    }

    pub fn items(&self) -> &[Resolved<S::Item>] {
        self.reconciler.items()
    }

    pub fn reconciler(&self) -> &Reconciler<S::Item> {
        &self.reconciler
    }

    pub fn reconciler_mut(&mut self) -> &mut Reconciler<S::Item> {
        &mut self.reconciler
    }
}
