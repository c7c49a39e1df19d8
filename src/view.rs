//! Client-side view of the catalog.
//!
//! The view keeps the last bird list the server returned and derives
//! everything else from it: filtered subsets, counts, the expanded bird and
//! the export selection.
//!
//! Toggling a bird never edits the list locally. The mutation is sent, the
//! list is fetched again, and the fresh snapshot replaces the old one. Every
//! fetch is stamped when it is issued, so a snapshot requested earlier never
//! overwrites one requested later. A toggle overtaken by a newer toggle for
//! the same bird is held back until that newer toggle settles.

use crate::client::{CatalogApi, ClientError};
use crate::record::{Bird, BirdWithSeenStatus, Category};
use clap::ValueEnum;
use log::{debug, warn};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ViewError {
    #[error("bird {0} is not in the current list")]
    UnknownBird(u64),

    #[error(transparent)]
    Client(#[from] ClientError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum CategoryFilter {
    #[default]
    All,
    Common,
    Rare,
    Endangered,
}

impl CategoryFilter {
    fn matches(self, category: Category) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Common => category == Category::Common,
            CategoryFilter::Rare => category == Category::Rare,
            CategoryFilter::Endangered => category == Category::Endangered,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum SeenFilter {
    #[default]
    All,
    Seen,
    Unseen,
}

impl SeenFilter {
    fn matches(self, seen: bool) -> bool {
        match self {
            SeenFilter::All => true,
            SeenFilter::Seen => seen,
            SeenFilter::Unseen => !seen,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleAction {
    MarkSeen,
    MarkUnseen,
}

/// A bird list together with the position of its fetch in request order.
/// A larger `fetched_at` was requested later and reflects newer server state.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub fetched_at: u64,
    pub birds: Vec<BirdWithSeenStatus>,
}

/// A toggle that has been issued but not yet settled.
#[derive(Debug, Clone)]
pub struct ToggleTicket {
    pub seq: u64,
    pub user_id: u64,
    pub bird_id: u64,
    pub action: ToggleAction,
    fetch_clock: Arc<AtomicU64>,
}

impl ToggleTicket {
    /// Sends the mutation, then fetches the list it invalidated. The fetch is
    /// stamped only once the mutation has resolved.
    pub async fn execute<A: CatalogApi + ?Sized>(self, api: &A) -> ToggleOutcome {
        let result = async {
            match self.action {
                ToggleAction::MarkSeen => {
                    api.add_sighting(self.user_id, self.bird_id).await?;
                }
                ToggleAction::MarkUnseen => {
                    api.remove_sighting(self.user_id, self.bird_id).await?;
                }
            }
            fetch_snapshot(api, self.user_id, &self.fetch_clock).await
        }
        .await;

        ToggleOutcome {
            ticket: self,
            result,
        }
    }
}

async fn fetch_snapshot<A: CatalogApi + ?Sized>(
    api: &A,
    user_id: u64,
    fetch_clock: &AtomicU64,
) -> Result<Snapshot, ClientError> {
    let fetched_at = fetch_clock.fetch_add(1, Ordering::SeqCst) + 1;
    let birds = api.birds(Some(user_id)).await?;
    Ok(Snapshot { fetched_at, birds })
}

#[derive(Debug)]
pub struct ToggleOutcome {
    pub ticket: ToggleTicket,
    pub result: Result<Snapshot, ClientError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settled {
    Applied,
    /// A newer toggle for the same bird is still pending or already applied.
    Superseded,
    /// A snapshot fetched later was already applied.
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeenCounts {
    pub seen: usize,
    pub total: usize,
}

/// Per-bird bookkeeping for toggles.
#[derive(Debug, Default)]
struct BirdRequests {
    latest: u64,
    latest_failed: bool,
    /// Snapshot of a superseded toggle, held back in case the newer one fails.
    parked: Option<Snapshot>,
}

pub struct ViewState<A> {
    api: A,
    user_id: u64,
    birds: Vec<BirdWithSeenStatus>,
    search: String,
    category: CategoryFilter,
    seen_filter: SeenFilter,
    expanded: Option<u64>,
    selected: BTreeSet<u64>,
    next_seq: u64,
    fetch_clock: Arc<AtomicU64>,
    applied_fetch: u64,
    requests: HashMap<u64, BirdRequests>,
}

impl<A: CatalogApi> ViewState<A> {
    pub fn new(api: A, user_id: u64) -> Self {
        Self {
            api,
            user_id,
            birds: Vec::new(),
            search: String::new(),
            category: CategoryFilter::All,
            seen_filter: SeenFilter::All,
            expanded: None,
            selected: BTreeSet::new(),
            next_seq: 1,
            fetch_clock: Arc::new(AtomicU64::new(0)),
            applied_fetch: 0,
            requests: HashMap::new(),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub async fn refresh(&mut self) -> Result<Settled, ViewError> {
        let snapshot = fetch_snapshot(&self.api, self.user_id, &self.fetch_clock).await?;
        Ok(self.apply_if_fresher(snapshot))
    }

    /// Picks the action from the bird's current seen status.
    pub fn begin_toggle(&mut self, bird_id: u64) -> Result<ToggleTicket, ViewError> {
        let seen = self
            .find(bird_id)
            .map(|b| b.seen)
            .ok_or(ViewError::UnknownBird(bird_id))?;

        let action = if seen {
            ToggleAction::MarkUnseen
        } else {
            ToggleAction::MarkSeen
        };
        self.begin(bird_id, action)
    }

    /// Reserves a sequence number for `action`, making it the latest request
    /// for this bird.
    pub fn begin(&mut self, bird_id: u64, action: ToggleAction) -> Result<ToggleTicket, ViewError> {
        if self.find(bird_id).is_none() {
            return Err(ViewError::UnknownBird(bird_id));
        }

        let seq = self.next_seq;
        self.next_seq += 1;

        let requests = self.requests.entry(bird_id).or_default();
        requests.latest = seq;
        requests.latest_failed = false;

        Ok(ToggleTicket {
            seq,
            user_id: self.user_id,
            bird_id,
            action,
            fetch_clock: Arc::clone(&self.fetch_clock),
        })
    }

    /// Applies a finished toggle unless a newer toggle for the same bird is
    /// pending, or a later fetch has already been applied.
    ///
    /// A failed toggle changes nothing of its own. If it was the latest for
    /// its bird, a snapshot held back from an older successful toggle is
    /// applied in its place.
    pub fn settle(&mut self, outcome: ToggleOutcome) -> Result<Settled, ViewError> {
        let ToggleOutcome { ticket, result } = outcome;
        let applied = self.applied_fetch;
        let requests = self.requests.entry(ticket.bird_id).or_default();

        let snapshot = match result {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Toggle of bird {} failed: {}", ticket.bird_id, e);
                if ticket.seq == requests.latest {
                    requests.latest_failed = true;
                    if let Some(parked) = requests.parked.take() {
                        debug!("Falling back to held snapshot for bird {}", ticket.bird_id);
                        self.apply_if_fresher(parked);
                    }
                }
                return Err(e.into());
            }
        };

        if ticket.seq < requests.latest && !requests.latest_failed {
            debug!(
                "Holding response {} for bird {}: superseded",
                ticket.seq, ticket.bird_id
            );
            if snapshot.fetched_at > applied
                && requests
                    .parked
                    .as_ref()
                    .is_none_or(|parked| parked.fetched_at < snapshot.fetched_at)
            {
                requests.parked = Some(snapshot);
            }
            return Ok(Settled::Superseded);
        }

        Ok(self.apply_if_fresher(snapshot))
    }

    pub async fn toggle_seen(&mut self, bird_id: u64) -> Result<Settled, ViewError> {
        let ticket = self.begin_toggle(bird_id)?;
        let outcome = ticket.execute(&self.api).await;
        self.settle(outcome)
    }

    fn apply_if_fresher(&mut self, snapshot: Snapshot) -> Settled {
        if snapshot.fetched_at < self.applied_fetch {
            debug!("Dropping snapshot {}: stale", snapshot.fetched_at);
            return Settled::Stale;
        }

        self.applied_fetch = snapshot.fetched_at;
        self.birds = snapshot.birds;

        let applied = self.applied_fetch;
        for requests in self.requests.values_mut() {
            if requests
                .parked
                .as_ref()
                .is_some_and(|parked| parked.fetched_at <= applied)
            {
                requests.parked = None;
            }
        }

        if self.expanded.is_some_and(|id| self.find(id).is_none()) {
            self.expanded = None;
        }
        let present: BTreeSet<u64> = self.birds.iter().map(|b| b.bird.id).collect();
        self.selected.retain(|id| present.contains(id));
        Settled::Applied
    }

    fn find(&self, bird_id: u64) -> Option<&BirdWithSeenStatus> {
        self.birds.iter().find(|b| b.bird.id == bird_id)
    }

    pub fn birds(&self) -> &[BirdWithSeenStatus] {
        &self.birds
    }

    pub fn bird(&self, bird_id: u64) -> Option<&BirdWithSeenStatus> {
        self.find(bird_id)
    }

    pub fn set_search(&mut self, term: &str) {
        self.search = term.trim().to_lowercase();
    }

    pub fn set_category(&mut self, category: CategoryFilter) {
        self.category = category;
    }

    pub fn set_seen_filter(&mut self, seen_filter: SeenFilter) {
        self.seen_filter = seen_filter;
    }

    /// Birds passing the search, category and seen filters, in catalog order.
    pub fn visible(&self) -> Vec<&BirdWithSeenStatus> {
        self.birds
            .iter()
            .filter(|b| {
                self.search.is_empty()
                    || b.bird.name.to_lowercase().contains(&self.search)
                    || b.bird.scientific_name.to_lowercase().contains(&self.search)
            })
            .filter(|b| self.category.matches(b.bird.category))
            .filter(|b| self.seen_filter.matches(b.seen))
            .collect()
    }

    pub fn seen_birds(&self) -> Vec<&Bird> {
        self.birds.iter().filter(|b| b.seen).map(|b| &b.bird).collect()
    }

    pub fn unseen_birds(&self) -> Vec<&Bird> {
        self.birds.iter().filter(|b| !b.seen).map(|b| &b.bird).collect()
    }

    pub fn counts(&self) -> SeenCounts {
        SeenCounts {
            seen: self.birds.iter().filter(|b| b.seen).count(),
            total: self.birds.len(),
        }
    }

    /// Expands one bird, collapsing whichever was expanded before.
    pub fn expand(&mut self, bird_id: u64) -> Result<(), ViewError> {
        if self.find(bird_id).is_none() {
            return Err(ViewError::UnknownBird(bird_id));
        }
        self.expanded = Some(bird_id);
        Ok(())
    }

    pub fn collapse(&mut self) {
        self.expanded = None;
    }

    pub fn expanded(&self) -> Option<&BirdWithSeenStatus> {
        self.expanded.and_then(|id| self.find(id))
    }

    pub fn toggle_selection(&mut self, bird_id: u64) {
        if !self.selected.remove(&bird_id) {
            self.selected.insert(bird_id);
        }
    }

    /// Selects every visible bird, or clears the selection when all of them
    /// are already selected.
    pub fn toggle_select_all(&mut self) {
        let visible: BTreeSet<u64> = self.visible().iter().map(|b| b.bird.id).collect();
        if !visible.is_empty() && visible.is_subset(&self.selected) {
            self.selected.clear();
        } else {
            self.selected = visible;
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    pub fn selected_birds(&self) -> Vec<&Bird> {
        self.birds
            .iter()
            .filter(|b| self.selected.contains(&b.bird.id))
            .map(|b| &b.bird)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        catalog::CatalogStore, fallback::fallback_birds, record::Sighting,
        service::CatalogService, sightings::SightingStore,
    };
    use async_trait::async_trait;
    use futures::future::join;
    use std::sync::{
        Mutex,
        atomic::{AtomicBool, Ordering},
    };

    /// In-process stand-in for the HTTP server.
    struct FakeApi {
        service: Mutex<CatalogService>,
        failing: AtomicBool,
    }

    impl FakeApi {
        fn new() -> Self {
            Self {
                service: Mutex::new(CatalogService::new(
                    CatalogStore::from_birds(fallback_birds()),
                    SightingStore::new(),
                )),
                failing: AtomicBool::new(false),
            }
        }

        fn check(&self) -> Result<(), ClientError> {
            if self.failing.load(Ordering::SeqCst) {
                Err(ClientError::Status(503))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl CatalogApi for FakeApi {
        async fn birds(&self, user_id: Option<u64>) -> Result<Vec<BirdWithSeenStatus>, ClientError> {
            self.check()?;
            Ok(self.service.lock().unwrap().birds_with_seen_status(user_id))
        }

        async fn bird(&self, id: u64) -> Result<Option<Bird>, ClientError> {
            self.check()?;
            Ok(self.service.lock().unwrap().bird(id))
        }

        async fn add_sighting(&self, user_id: u64, bird_id: u64) -> Result<Sighting, ClientError> {
            self.check()?;
            Ok(self.service.lock().unwrap().mark_seen(user_id, bird_id))
        }

        async fn remove_sighting(&self, user_id: u64, bird_id: u64) -> Result<bool, ClientError> {
            self.check()?;
            Ok(self.service.lock().unwrap().mark_unseen(user_id, bird_id))
        }
    }

    async fn loaded_view() -> ViewState<FakeApi> {
        let mut view = ViewState::new(FakeApi::new(), 1);
        assert_eq!(view.refresh().await.unwrap(), Settled::Applied);
        view
    }

    fn ids<'a>(birds: impl IntoIterator<Item = &'a BirdWithSeenStatus>) -> Vec<u64> {
        birds.into_iter().map(|b| b.bird.id).collect()
    }

    #[tokio::test]
    async fn test_toggle_marks_and_unmarks() {
        let mut view = loaded_view().await;
        assert_eq!(view.counts(), SeenCounts { seen: 0, total: 5 });

        assert_eq!(view.toggle_seen(3).await.unwrap(), Settled::Applied);
        assert!(view.bird(3).unwrap().seen);
        assert_eq!(view.counts().seen, 1);

        assert_eq!(view.toggle_seen(3).await.unwrap(), Settled::Applied);
        assert!(!view.bird(3).unwrap().seen);
        assert_eq!(view.counts().seen, 0);
    }

    #[tokio::test]
    async fn test_unknown_bird_cannot_be_toggled() {
        let mut view = loaded_view().await;
        assert!(matches!(
            view.begin_toggle(42),
            Err(ViewError::UnknownBird(42))
        ));
    }

    #[tokio::test]
    async fn test_slow_response_does_not_resurrect_seen() {
        let mut view = loaded_view().await;

        let add = view.begin_toggle(3).unwrap();
        assert_eq!(add.action, ToggleAction::MarkSeen);
        let add_outcome = add.execute(view.api()).await;

        // The add has reached the server but its response is still in flight
        // when the user takes the bird back off the list.
        let remove = view.begin(3, ToggleAction::MarkUnseen).unwrap();
        let remove_outcome = remove.execute(view.api()).await;

        assert_eq!(view.settle(remove_outcome).unwrap(), Settled::Applied);
        assert_eq!(view.settle(add_outcome).unwrap(), Settled::Superseded);
        assert!(!view.bird(3).unwrap().seen);
        assert!(
            view.api()
                .service
                .lock()
                .unwrap()
                .sightings_for(1)
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_later_fetch_wins_across_birds() {
        let mut view = loaded_view().await;

        let first = view.begin_toggle(1).unwrap();
        let second = view.begin_toggle(2).unwrap();

        // The second toggle runs to completion before the first reaches the
        // server, so the first toggle's refetch is the newest state.
        let second_outcome = second.execute(view.api()).await;
        let first_outcome = first.execute(view.api()).await;

        assert_eq!(view.settle(second_outcome).unwrap(), Settled::Applied);
        assert_eq!(view.settle(first_outcome).unwrap(), Settled::Applied);

        let server = view.api().service.lock().unwrap().birds_with_seen_status(Some(1));
        assert_eq!(view.birds(), server.as_slice());
        assert!(view.bird(1).unwrap().seen);
        assert!(view.bird(2).unwrap().seen);
    }

    #[tokio::test]
    async fn test_earlier_fetch_is_stale() {
        let mut view = loaded_view().await;

        let first = view.begin_toggle(1).unwrap();
        let second = view.begin_toggle(2).unwrap();
        let first_outcome = first.execute(view.api()).await;
        let second_outcome = second.execute(view.api()).await;

        assert_eq!(view.settle(second_outcome).unwrap(), Settled::Applied);
        assert_eq!(view.settle(first_outcome).unwrap(), Settled::Stale);

        // The applied snapshot was fetched after both mutations.
        assert!(view.bird(1).unwrap().seen);
        assert!(view.bird(2).unwrap().seen);
    }

    #[tokio::test]
    async fn test_concurrent_toggles_match_server() {
        let mut view = loaded_view().await;

        let first = view.begin_toggle(4).unwrap();
        let second = view.begin_toggle(5).unwrap();
        let (first_outcome, second_outcome) =
            join(first.execute(view.api()), second.execute(view.api())).await;

        view.settle(first_outcome).unwrap();
        view.settle(second_outcome).unwrap();

        let server = view.api().service.lock().unwrap().birds_with_seen_status(Some(1));
        assert_eq!(view.birds(), server.as_slice());
    }

    #[tokio::test]
    async fn test_failed_newer_toggle_releases_held_snapshot() {
        let mut view = loaded_view().await;

        let add = view.begin_toggle(3).unwrap();
        let add_outcome = add.execute(view.api()).await;

        let remove = view.begin(3, ToggleAction::MarkUnseen).unwrap();
        view.api().failing.store(true, Ordering::SeqCst);
        let remove_outcome = remove.execute(view.api()).await;
        view.api().failing.store(false, Ordering::SeqCst);

        assert_eq!(view.settle(add_outcome).unwrap(), Settled::Superseded);
        assert!(!view.bird(3).unwrap().seen);

        assert!(matches!(
            view.settle(remove_outcome),
            Err(ViewError::Client(ClientError::Status(503)))
        ));
        assert!(view.bird(3).unwrap().seen);
        assert_eq!(view.api().service.lock().unwrap().sightings_for(1).len(), 1);
    }

    #[tokio::test]
    async fn test_superseded_after_newer_failure_is_applied() {
        let mut view = loaded_view().await;

        let add = view.begin_toggle(2).unwrap();
        let add_outcome = add.execute(view.api()).await;

        let remove = view.begin(2, ToggleAction::MarkUnseen).unwrap();
        view.api().failing.store(true, Ordering::SeqCst);
        let remove_outcome = remove.execute(view.api()).await;
        view.api().failing.store(false, Ordering::SeqCst);

        assert!(view.settle(remove_outcome).is_err());
        assert_eq!(view.settle(add_outcome).unwrap(), Settled::Applied);
        assert!(view.bird(2).unwrap().seen);
    }

    #[tokio::test]
    async fn test_failed_toggle_keeps_last_good_state() {
        let mut view = loaded_view().await;
        view.toggle_seen(2).await.unwrap();
        let before = view.birds().to_vec();

        view.api().failing.store(true, Ordering::SeqCst);
        let result = view.toggle_seen(4).await;

        assert!(matches!(result, Err(ViewError::Client(ClientError::Status(503)))));
        assert_eq!(view.birds(), before.as_slice());

        view.api().failing.store(false, Ordering::SeqCst);
        assert_eq!(view.toggle_seen(4).await.unwrap(), Settled::Applied);
        assert!(view.bird(4).unwrap().seen);
    }

    #[tokio::test]
    async fn test_filters_combine() {
        let mut view = loaded_view().await;
        view.toggle_seen(5).await.unwrap();

        view.set_search("  FALCO ");
        assert_eq!(ids(view.visible()), vec![3]);

        view.set_search("");
        view.set_category(CategoryFilter::Rare);
        assert_eq!(ids(view.visible()), vec![3, 5]);

        view.set_seen_filter(SeenFilter::Seen);
        assert_eq!(ids(view.visible()), vec![5]);

        view.set_seen_filter(SeenFilter::Unseen);
        assert_eq!(ids(view.visible()), vec![3]);

        view.set_category(CategoryFilter::All);
        view.set_seen_filter(SeenFilter::All);
        assert_eq!(view.visible().len(), 5);
        assert_eq!(view.seen_birds().len(), 1);
        assert_eq!(view.unseen_birds().len(), 4);
    }

    #[tokio::test]
    async fn test_only_one_bird_expanded() {
        let mut view = loaded_view().await;

        view.expand(1).unwrap();
        view.expand(4).unwrap();
        assert_eq!(view.expanded().map(|b| b.bird.id), Some(4));

        assert!(view.expand(99).is_err());
        assert_eq!(view.expanded().map(|b| b.bird.id), Some(4));

        view.collapse();
        assert!(view.expanded().is_none());
    }

    #[tokio::test]
    async fn test_selection() {
        let mut view = loaded_view().await;

        view.toggle_selection(2);
        view.toggle_selection(4);
        view.toggle_selection(2);
        let selected: Vec<u64> = view.selected_birds().iter().map(|b| b.id).collect();
        assert_eq!(selected, vec![4]);

        view.set_category(CategoryFilter::Rare);
        view.toggle_select_all();
        let selected: Vec<u64> = view.selected_birds().iter().map(|b| b.id).collect();
        assert_eq!(selected, vec![3, 5]);

        view.toggle_select_all();
        assert!(view.selected_birds().is_empty());

        view.toggle_selection(1);
        view.clear_selection();
        assert!(view.selected_birds().is_empty());
    }
}
