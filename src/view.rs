//! State holders for screens that show server data.
//!
//! A `ListView` never patches its snapshot after a mutation. It listens on the `Invalidations` bus
//! and reloads the whole list from the server when something it depends on went stale.

use crate::model::{Amount, Category, Outcome, OutcomeFilters};
use crate::repo::{BalanceService, Budget, Invalidations, RepoError, RepoResult, Resource};
use crate::stats::{self, ChartSlice};
use std::fmt::{Debug, Formatter};
use std::future::Future;
use std::pin::Pin;
use tokio::sync::broadcast::error::TryRecvError;
use tokio::sync::broadcast::Receiver;
use tracing::{debug, warn};

type LoadFuture<T> = Pin<Box<dyn Future<Output = RepoResult<Vec<T>>> + Send>>;
type Loader<T> = Box<dyn Fn() -> LoadFuture<T> + Send + Sync>;

/// The last loaded snapshot of a list, plus what it takes to reload it.
pub struct ListView<T> {
    items: Vec<T>,
    loaded: bool,
    loader: Loader<T>,
    resources: Vec<Resource>,
    receiver: Receiver<Resource>,
}

impl<T: Send + 'static> ListView<T> {
    /// Creates an empty view. Nothing is loaded until `refresh` or `sync` is called.
    pub fn new<F, Fut>(invalidations: &Invalidations, resources: &[Resource], loader: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = RepoResult<Vec<T>>> + Send + 'static,
    {
        Self {
            items: Vec::new(),
            loaded: false,
            loader: Box::new(move || -> LoadFuture<T> { Box::pin(loader()) }),
            resources: resources.to_vec(),
            receiver: invalidations.subscribe(),
        }
    }

    /// Reloads the list. On failure the previous snapshot is kept.
    pub async fn refresh(&mut self) -> RepoResult<&[T]> {
        match (self.loader)().await {
            Ok(items) => {
                self.items = items;
                self.loaded = true;
                Ok(&self.items)
            }
            Err(e) => {
                warn!("Reload failed, keeping {} items: {e}", self.items.len());
                Err(e)
            }
        }
    }

    /// Drains pending invalidations and reloads if any of them concern this view, or if the view
    /// has never been loaded. Returns whether a reload happened.
    pub async fn sync(&mut self) -> RepoResult<bool> {
        let mut stale = !self.loaded;
        loop {
            match self.receiver.try_recv() {
                Ok(resource) => stale |= self.resources.contains(&resource),
                Err(TryRecvError::Lagged(missed)) => {
                    debug!("Missed {missed} invalidations, reloading");
                    stale = true;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        if stale {
            self.refresh().await?;
        }
        Ok(stale)
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// True when the last successful load returned nothing, which screens render as "No Data".
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }
}

impl<T: Debug> Debug for ListView<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListView")
            .field("items", &self.items)
            .field("loaded", &self.loaded)
            .field("resources", &self.resources)
            .finish()
    }
}

impl ListView<Category> {
    pub fn categories(budget: &Budget) -> Self {
        let repo = budget.categories();
        ListView::new(budget.invalidations(), &[Resource::Categories], move || {
            let repo = repo.clone();
            async move { repo.list().await }
        })
    }
}

impl ListView<Outcome> {
    pub fn outcomes(budget: &Budget, filters: OutcomeFilters) -> Self {
        let repo = budget.outcomes();
        ListView::new(budget.invalidations(), &[Resource::Outcomes], move || {
            let repo = repo.clone();
            let filters = filters.clone();
            async move { repo.list(&filters).await }
        })
    }
}

impl ListView<ChartSlice> {
    /// The spend chart. It always holds at least one slice once loaded.
    pub fn chart(budget: &Budget) -> Self {
        let repo = budget.outcomes();
        ListView::new(budget.invalidations(), &[Resource::Statistics], move || {
            let repo = repo.clone();
            async move {
                let stats = repo.list_with_statistics().await?;
                Ok(stats::aggregate(&stats))
            }
        })
    }
}

/// The editable balance. `displayed` is what the input shows; `confirmed` is the last value the
/// server accepted. A rejected edit puts the confirmed value back on display.
#[derive(Debug, Clone)]
pub struct BalanceField {
    service: BalanceService,
    confirmed: Option<Amount>,
    displayed: String,
}

impl BalanceField {
    pub fn new(service: BalanceService) -> Self {
        Self {
            service,
            confirmed: None,
            displayed: String::new(),
        }
    }

    pub async fn load(&mut self) -> RepoResult<Amount> {
        let balance = self.service.get().await?;
        self.confirm(balance);
        Ok(balance)
    }

    pub fn confirmed(&self) -> Option<Amount> {
        self.confirmed
    }

    pub fn displayed(&self) -> &str {
        &self.displayed
    }

    /// Updates the text shown while the user types.
    pub fn edit(&mut self, text: impl Into<String>) {
        self.displayed = text.into();
    }

    /// Parses `text` and sends it as the new balance. On any failure the display reverts to the
    /// last confirmed value.
    pub async fn submit(&mut self, text: &str) -> RepoResult<Amount> {
        self.displayed = text.to_string();
        let result = match Amount::parse_non_negative(text) {
            Ok(amount) => self.service.set(amount).await,
            Err(e) => Err(RepoError::from(e)),
        };
        match result {
            Ok(balance) => {
                self.confirm(balance);
                Ok(balance)
            }
            Err(e) => {
                debug!("Balance edit '{text}' rejected: {e}");
                self.revert();
                Err(e)
            }
        }
    }

    fn confirm(&mut self, balance: Amount) {
        self.confirmed = Some(balance);
        self.displayed = balance.value().to_string();
    }

    fn revert(&mut self) {
        self.displayed = self
            .confirmed
            .map(|balance| balance.value().to_string())
            .unwrap_or_default();
    }
}
