//! The suggestion engine.
//!
//! `SuggestionEngine` owns a `SearchBoxState` and performs the effects the
//! state asks for: debounce timers, suggestion fetches, the zero-state fetch,
//! navigation and analytics. Every state change is published as a
//! `ViewModel` over a `tokio::sync::watch` channel.
//!
//! ## Task Model
//!
//! ```text
//! on_input_change ──► debounce task ──(sleep)──► fetch task ──► settle_suggestions
//!        │               (aborted when superseded)     (never aborted; stale
//!        │                                              results are dropped)
//!        └──(empty)────► zero-state task ──────────────► settle_zero_state
//! ```
//!
//! Spawned tasks hold a `Weak` reference and do nothing once the engine is
//! gone. The state and the armed debounce timer share one lock, so calls from
//! several threads behave as if they ran one after another.

use parking_lot::{Mutex, MutexGuard};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use suggest_core::{
    ConfigError, EngineConfig, Epoch, FetchError, NavigationAction, ResultSet, SuggestionItem,
    ZeroState,
};
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::actions::EngineAction;
use crate::backend::{Backend, RuntimeBackend};
use crate::events::{EventSink, SearchEvent, TracingEventSink};
use crate::keymap::Keymap;
use crate::model::{ApplyOutcome, Commit, CommitTarget, InputEffect, SearchBoxState, ViewModel};
use crate::navigation::Navigator;

// =============================================================================
// Errors
// =============================================================================

/// Errors creating an engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("No tokio runtime available: {0}")]
    NoRuntime(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

// =============================================================================
// Pointer Input
// =============================================================================

/// Where a pointer-down landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerTarget {
    /// On a panel item, by flattened index.
    Item(usize),
    /// Somewhere else inside the component.
    Inside,
    /// Outside the component.
    Outside,
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for `SuggestionEngine`.
pub struct EngineBuilder {
    backend: Arc<dyn Backend>,
    navigator: Arc<dyn Navigator>,
    events: Arc<dyn EventSink>,
    keymap: Keymap,
    debounce: Duration,
    runtime: Option<Handle>,
}

impl EngineBuilder {
    /// Apply debounce delay and key bindings from configuration.
    pub fn with_config(mut self, config: &EngineConfig) -> Result<Self, ConfigError> {
        self.keymap = Keymap::from_config(&config.keymap)?;
        self.debounce = config.debounce();
        Ok(self)
    }

    /// Report analytics events to this sink instead of the log.
    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn with_keymap(mut self, keymap: Keymap) -> Self {
        self.keymap = keymap;
        self
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Spawn tasks on this runtime instead of the current one.
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Build the engine. Without an explicit runtime, must be called from
    /// within a tokio runtime.
    pub fn build(self) -> Result<SuggestionEngine, EngineError> {
        let runtime = match self.runtime {
            Some(handle) => handle,
            None => Handle::try_current().map_err(|e| EngineError::NoRuntime(e.to_string()))?,
        };

        let state = SearchBoxState::new();
        let (view_tx, _) = watch::channel(state.view());

        tracing::debug!("SuggestionEngine::build: debounce={:?}", self.debounce);

        Ok(SuggestionEngine {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    state,
                    debounce: None,
                }),
                backend: self.backend,
                navigator: self.navigator,
                events: self.events,
                keymap: self.keymap,
                debounce: self.debounce,
                view_tx,
                runtime,
                closed: AtomicBool::new(false),
            }),
        })
    }
}

// =============================================================================
// Suggestion Engine
// =============================================================================

/// Search box controller.
///
/// Dropping the engine tears it down: pending timers are cancelled and late
/// responses are ignored. All methods may be called from any thread.
pub struct SuggestionEngine {
    shared: Arc<Shared>,
}

struct Shared {
    inner: Mutex<Inner>,
    backend: Arc<dyn Backend>,
    navigator: Arc<dyn Navigator>,
    events: Arc<dyn EventSink>,
    keymap: Keymap,
    debounce: Duration,
    view_tx: watch::Sender<ViewModel>,
    runtime: Handle,
    /// Only set with `inner` locked.
    closed: AtomicBool,
}

/// Everything behind the engine lock.
struct Inner {
    state: SearchBoxState,
    /// Timer for `state.pending_debounce()`, if one is armed.
    debounce: Option<DebounceTimer>,
}

struct DebounceTimer {
    seq: u64,
    handle: JoinHandle<()>,
}

impl SuggestionEngine {
    /// Start building an engine over a backend and a navigator.
    pub fn builder(backend: Arc<dyn Backend>, navigator: Arc<dyn Navigator>) -> EngineBuilder {
        EngineBuilder {
            backend,
            navigator,
            events: Arc::new(TracingEventSink),
            keymap: Keymap::default(),
            debounce: EngineConfig::default().debounce(),
            runtime: None,
        }
    }

    /// Engine talking to the configured remote service.
    pub fn from_config(
        config: &EngineConfig,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, EngineError> {
        let backend = RuntimeBackend::from_config(config)?;
        Self::builder(Arc::new(backend), navigator)
            .with_config(config)?
            .build()
    }

    // -------------------------------------------------------------------------
    // Observation
    // -------------------------------------------------------------------------

    /// Subscribe to view changes. Clone the receiver for each subscriber.
    pub fn subscribe(&self) -> watch::Receiver<ViewModel> {
        self.shared.view_tx.subscribe()
    }

    /// Current view snapshot.
    pub fn view(&self) -> ViewModel {
        self.shared.view_tx.borrow().clone()
    }

    pub fn is_shut_down(&self) -> bool {
        self.shared.closed.load(Ordering::SeqCst)
    }

    // -------------------------------------------------------------------------
    // Input
    // -------------------------------------------------------------------------

    /// The input text changed.
    pub fn on_input_change(&self, text: &str) {
        let fetch_zero_state = {
            let Some(mut inner) = self.shared.lock_open() else {
                return;
            };
            let effect = inner.state.set_query(text);
            self.shared.sync_debounce(&mut inner);
            self.shared.publish(&inner);
            matches!(effect, InputEffect::ZeroState { fetch: true })
        };
        if fetch_zero_state {
            self.shared.spawn_zero_state();
        }
    }

    /// The input gained focus.
    pub fn on_focus(&self) {
        let fetch = {
            let Some(mut inner) = self.shared.lock_open() else {
                return;
            };
            let fetch = inner.state.focus();
            self.shared.publish(&inner);
            fetch
        };
        if fetch {
            self.shared.spawn_zero_state();
        }
    }

    /// A pointer went down somewhere on the page.
    pub fn on_pointer_down(&self, target: PointerTarget) -> Option<NavigationAction> {
        match target {
            PointerTarget::Item(index) => self.on_item_click(index),
            PointerTarget::Inside => None,
            PointerTarget::Outside => {
                self.shared.update(SearchBoxState::pointer_down_outside);
                None
            }
        }
    }

    /// A key was pressed in the input. Returns true when the key was bound.
    pub fn on_key(&self, key: &str) -> bool {
        match self.shared.keymap.resolve(key) {
            Some(action) => {
                self.dispatch(action);
                true
            }
            None => false,
        }
    }

    /// Execute an action.
    pub fn dispatch(&self, action: EngineAction) -> Option<NavigationAction> {
        tracing::debug!("dispatch: action={}", action);
        match action {
            EngineAction::MoveNext => {
                self.shared.update(SearchBoxState::move_next);
                None
            }
            EngineAction::MovePrevious => {
                self.shared.update(SearchBoxState::move_previous);
                None
            }
            EngineAction::Submit => self.submit(),
            EngineAction::Close => {
                self.shared.update(SearchBoxState::escape);
                None
            }
        }
    }

    /// An item was clicked.
    pub fn on_item_click(&self, index: usize) -> Option<NavigationAction> {
        self.shared.commit(|state| state.commit(CommitTarget::Index(index)))
    }

    /// The pointer moved over an item.
    pub fn on_item_hover(&self, index: usize) {
        self.shared.update(|state| state.highlight(index));
    }

    /// Commit an explicit item.
    pub fn commit(&self, item: SuggestionItem) -> Option<NavigationAction> {
        self.shared.commit(|state| state.commit(CommitTarget::Item(item)))
    }

    /// Commit the highlighted item.
    pub fn commit_highlighted(&self) -> Option<NavigationAction> {
        self.shared.commit(|state| state.commit(CommitTarget::Highlighted))
    }

    /// Form submit: the highlight if any, else the raw query.
    pub fn submit(&self) -> Option<NavigationAction> {
        self.shared.commit(SearchBoxState::submit)
    }

    /// Tear down: cancel the pending debounce and ignore late responses.
    ///
    /// Idempotent; the engine ignores all input afterwards.
    pub fn shutdown(&self) {
        let Some(mut inner) = self.shared.lock_open() else {
            return;
        };
        self.shared.closed.store(true, Ordering::SeqCst);
        inner.state.teardown();
        self.shared.sync_debounce(&mut inner);
        self.shared.publish(&inner);
        tracing::debug!("SuggestionEngine::shutdown");
    }
}

impl Drop for SuggestionEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// =============================================================================
// Shared State and Effects
// =============================================================================

impl Shared {
    /// Take the engine lock unless the engine has been shut down.
    fn lock_open(&self) -> Option<MutexGuard<'_, Inner>> {
        let inner = self.inner.lock();
        if self.closed.load(Ordering::SeqCst) {
            return None;
        }
        Some(inner)
    }

    /// Broadcast the current view. Called with the lock held so subscribers
    /// see changes in order.
    fn publish(&self, inner: &Inner) {
        self.view_tx.send_replace(inner.state.view());
    }

    /// Apply a synchronous transition and publish.
    fn update(&self, f: impl FnOnce(&mut SearchBoxState)) {
        let Some(mut inner) = self.lock_open() else {
            return;
        };
        f(&mut inner.state);
        self.publish(&inner);
    }

    /// Make the armed timer match `state.pending_debounce()`: abort a timer
    /// whose sequence number was superseded, arm one for a new sequence.
    /// Must be called with the lock held, after every transition that can
    /// change the pending debounce.
    fn sync_debounce(self: &Arc<Self>, inner: &mut Inner) {
        let pending = inner.state.pending_debounce();
        if inner
            .debounce
            .as_ref()
            .is_some_and(|timer| Some(timer.seq) != pending)
        {
            if let Some(stale) = inner.debounce.take() {
                stale.handle.abort();
            }
        }
        if let (Some(seq), true) = (pending, inner.debounce.is_none()) {
            inner.debounce = Some(DebounceTimer {
                seq,
                handle: self.spawn_debounce(seq),
            });
        }
    }

    fn spawn_debounce(self: &Arc<Self>, seq: u64) -> JoinHandle<()> {
        let weak = Arc::downgrade(self);
        let delay = self.debounce;
        self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(shared) = weak.upgrade() {
                shared.fire_debounce(seq);
            }
        })
    }

    /// Runs on the timer task itself.
    fn fire_debounce(self: &Arc<Self>, seq: u64) {
        let Some(mut inner) = self.lock_open() else {
            return;
        };
        // This task is finishing; forget its handle rather than abort it.
        if inner.debounce.as_ref().is_some_and(|timer| timer.seq == seq) {
            inner.debounce = None;
        }
        let Some((epoch, query)) = inner.state.fire_debounce(seq) else {
            return;
        };
        self.publish(&inner);
        drop(inner);

        self.spawn_fetch(epoch, query);
    }

    fn spawn_fetch(self: &Arc<Self>, epoch: Epoch, query: String) {
        tracing::debug!("fetch_suggestions: epoch={}, query={:?}", epoch, query);
        let future = self.backend.fetch_suggestions(query);
        let weak = Arc::downgrade(self);
        self.runtime.spawn(async move {
            let result = future.await;
            if let Some(shared) = weak.upgrade() {
                shared.settle_suggestions(epoch, result);
            }
        });
    }

    fn settle_suggestions(&self, epoch: Epoch, result: Result<ResultSet, FetchError>) {
        let succeeded = result.is_ok();
        let event = {
            let Some(mut inner) = self.lock_open() else {
                return;
            };
            if inner.state.apply_suggestions(epoch, result) == ApplyOutcome::Discarded {
                return;
            }
            self.publish(&inner);
            inner
                .state
                .results()
                .filter(|_| succeeded)
                .map(|set| SearchEvent::ResultsShown {
                    query: set.query.clone(),
                    suggestions: set.suggestions.len(),
                    products: set.products.len(),
                    result_id: set.result_id.clone(),
                })
        };
        if let Some(event) = event {
            self.events.record(&event);
        }
    }

    fn spawn_zero_state(self: &Arc<Self>) {
        tracing::debug!("fetch_zero_state");
        let future = self.backend.fetch_zero_state();
        let weak = Arc::downgrade(self);
        self.runtime.spawn(async move {
            let result = future.await;
            if let Some(shared) = weak.upgrade() {
                shared.settle_zero_state(result);
            }
        });
    }

    fn settle_zero_state(&self, result: Result<ZeroState, FetchError>) {
        let event = {
            let Some(mut inner) = self.lock_open() else {
                return;
            };
            let outcome = inner.state.apply_zero_state(result);
            self.publish(&inner);
            match (outcome, inner.state.zero_state()) {
                (ApplyOutcome::Applied, Some(zero)) => Some(SearchEvent::ZeroStateShown {
                    title: zero.title.clone(),
                    products: zero.products.len(),
                    result_id: zero.result_id.clone(),
                }),
                _ => None,
            }
        };
        if let Some(event) = event {
            self.events.record(&event);
        }
    }

    /// Run a committing transition, then report and navigate.
    fn commit(
        self: &Arc<Self>,
        f: impl FnOnce(&mut SearchBoxState) -> Option<Commit>,
    ) -> Option<NavigationAction> {
        let commit = {
            let mut inner = self.lock_open()?;
            let commit = f(&mut inner.state);
            self.sync_debounce(&mut inner);
            self.publish(&inner);
            commit
        }?;
        Some(self.finish_commit(commit))
    }

    /// Report and navigate. Runs without the lock so a navigator may call
    /// back into the engine.
    fn finish_commit(&self, commit: Commit) -> NavigationAction {
        let event = match commit.item {
            Some(item) => SearchEvent::ItemSelected {
                original_query: commit.original_query,
                item,
                action: commit.action.clone(),
            },
            None => SearchEvent::SearchSubmitted {
                query: commit.original_query,
            },
        };
        self.events.record(&event);

        tracing::info!("navigate: route={}", commit.action.route());
        self.navigator.navigate(&commit.action);
        commit.action
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::MockBackend;
    use crate::events::MockEventSink;
    use crate::model::ViewMode;
    use crate::navigation::MockNavigator;
    use suggest_core::ProductRef;
    use tokio::sync::mpsc;

    const DEBOUNCE: Duration = Duration::from_millis(200);

    fn sh_results() -> ResultSet {
        ResultSet::new(
            "sh",
            vec![
                SuggestionItem::suggestion("shirt"),
                SuggestionItem::suggestion("shoes"),
            ],
            vec![SuggestionItem::product("Shirt A", ProductRef::new("42"))],
        )
    }

    fn popular() -> ZeroState {
        let products = (0..6)
            .map(|i| SuggestionItem::product(format!("P{}", i), ProductRef::new(format!("p{}", i))))
            .collect();
        ZeroState::products("Popular", products)
    }

    struct Harness {
        engine: SuggestionEngine,
        backend: Arc<MockBackend>,
        routes: mpsc::UnboundedReceiver<NavigationAction>,
    }

    fn harness(backend: MockBackend) -> Harness {
        let backend = Arc::new(backend);
        let (tx, routes) = mpsc::unbounded_channel();
        let engine = SuggestionEngine::builder(backend.clone(), Arc::new(tx))
            .with_debounce(DEBOUNCE)
            .build()
            .unwrap();
        Harness {
            engine,
            backend,
            routes,
        }
    }

    /// Let timers fire and spawned tasks run.
    async fn advance(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
        tokio::task::yield_now().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_keystrokes_within_window_fetch_once() {
        let h = harness(MockBackend::new().with_results("shirt", sh_results()));

        for text in ["s", "sh", "shi", "shir", "shirt"] {
            h.engine.on_input_change(text);
            advance(50).await;
        }
        assert!(h.backend.queries().is_empty());

        advance(300).await;
        assert_eq!(h.backend.queries(), ["shirt"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sh_scenario_navigates_to_product() {
        let mut h = harness(MockBackend::new().with_results("sh", sh_results()));

        h.engine.on_focus();
        h.engine.on_input_change("sh");
        advance(300).await;

        let view = h.engine.view();
        assert!(view.is_open);
        assert_eq!(view.item_count, 3);

        for _ in 0..3 {
            assert!(h.engine.on_key("ArrowDown"));
        }
        assert_eq!(h.engine.view().highlighted_index(), 2);
        assert!(h.engine.on_key("Enter"));

        assert_eq!(h.routes.try_recv().unwrap(), NavigationAction::product("42"));
        let view = h.engine.view();
        assert!(!view.is_open);
        assert_eq!(view.query, "Shirt A");
    }

    #[tokio::test(start_paused = true)]
    async fn test_last_issued_wins_over_slow_response() {
        let backend = MockBackend::new()
            .with_results("sh", sh_results())
            .with_results(
                "shi",
                ResultSet::new("shi", vec![SuggestionItem::suggestion("shirt")], vec![]),
            )
            .with_query_delay("sh", Duration::from_millis(500))
            .with_query_delay("shi", Duration::from_millis(50));
        let h = harness(backend);

        h.engine.on_input_change("sh");
        advance(250).await;
        h.engine.on_input_change("shi");
        advance(300).await;
        assert!(h.engine.view().is_open);
        assert_eq!(h.engine.view().item_count, 1);

        // "sh" settles after "shi".
        advance(500).await;
        assert_eq!(h.backend.queries(), ["sh", "shi"]);
        let view = h.engine.view();
        assert_eq!(view.item_count, 1);
        assert_eq!(view.items().next().unwrap().value, "shirt");
        assert!(!view.fetching);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_state_fetched_once() {
        let h = harness(MockBackend::new().with_zero_state(Ok(popular())));

        h.engine.on_focus();
        advance(10).await;
        let view = h.engine.view();
        assert!(view.is_open);
        assert_eq!(view.mode, ViewMode::ZeroState);
        assert_eq!(view.item_count, 6);

        for _ in 0..5 {
            h.engine.on_pointer_down(PointerTarget::Outside);
            assert!(!h.engine.view().is_open);
            h.engine.on_focus();
            advance(10).await;
        }
        h.engine.on_input_change("s");
        h.engine.on_input_change("");
        advance(10).await;

        assert_eq!(h.backend.zero_state_calls(), 1);
        assert!(h.backend.queries().is_empty());
        assert_eq!(h.engine.view().item_count, 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_state_loading_flag() {
        let h = harness(
            MockBackend::new()
                .with_zero_state(Ok(popular()))
                .with_zero_state_delay(Duration::from_millis(100)),
        );

        h.engine.on_focus();
        assert!(h.engine.view().zero_state_loading);
        advance(150).await;
        assert!(!h.engine.view().zero_state_loading);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_state_failure_retries_on_next_focus() {
        let h = harness(
            MockBackend::new().with_zero_state(Err(FetchError::Network("offline".to_string()))),
        );

        h.engine.on_focus();
        advance(10).await;
        assert_eq!(h.engine.view().item_count, 0);

        *h.backend.zero_state.lock() = Ok(popular());
        h.engine.on_pointer_down(PointerTarget::Outside);
        h.engine.on_focus();
        advance(10).await;

        assert_eq!(h.backend.zero_state_calls(), 2);
        assert_eq!(h.engine.view().item_count, 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_fetch_shows_no_results_and_submit_still_works() {
        let mut h = harness(
            MockBackend::new().with_failure("xyz", FetchError::Network("offline".to_string())),
        );

        h.engine.on_focus();
        h.engine.on_input_change("xyz");
        advance(300).await;

        let view = h.engine.view();
        assert!(view.is_open);
        assert!(view.show_no_results);
        assert_eq!(view.item_count, 0);

        assert_eq!(h.engine.submit(), Some(NavigationAction::search("xyz")));
        assert_eq!(h.routes.try_recv().unwrap().route(), "/search?q=xyz");
    }

    #[tokio::test(start_paused = true)]
    async fn test_double_click_commits_once() {
        let backend = Arc::new(MockBackend::new().with_results("sh", sh_results()));
        let mut navigator = MockNavigator::new();
        navigator
            .expect_navigate()
            .withf(|action| *action == NavigationAction::search("shirt"))
            .times(1)
            .return_const(());

        let engine = SuggestionEngine::builder(backend, Arc::new(navigator))
            .build()
            .unwrap();
        engine.on_input_change("sh");
        advance(300).await;

        assert!(engine.on_pointer_down(PointerTarget::Item(0)).is_some());
        assert!(engine.on_pointer_down(PointerTarget::Item(0)).is_none());
        assert_eq!(engine.view().query, "shirt");
    }

    #[tokio::test(start_paused = true)]
    async fn test_commit_does_not_refetch() {
        let h = harness(MockBackend::new().with_results("sh", sh_results()));

        h.engine.on_input_change("sh");
        advance(300).await;
        h.engine.on_item_click(1);
        advance(300).await;

        assert_eq!(h.backend.queries(), ["sh"]);
        assert!(!h.engine.view().is_open);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clearing_query_drops_in_flight_fetch() {
        let h = harness(
            MockBackend::new()
                .with_results("sh", sh_results())
                .with_delay(Duration::from_millis(100))
                .with_zero_state(Ok(popular())),
        );

        h.engine.on_input_change("sh");
        advance(250).await;
        assert!(h.engine.view().fetching);

        h.engine.on_input_change("");
        assert!(!h.engine.view().fetching);
        advance(200).await;

        let view = h.engine.view();
        assert_eq!(view.mode, ViewMode::ZeroState);
        assert_eq!(view.items().next().unwrap().value, "P0");
    }

    #[tokio::test(start_paused = true)]
    async fn test_escape_closes_and_keeps_query() {
        let h = harness(MockBackend::new().with_results("sh", sh_results()));

        h.engine.on_input_change("sh");
        advance(300).await;
        h.engine.on_key("down");
        h.engine.on_key("Escape");

        let view = h.engine.view();
        assert!(!view.is_open);
        assert_eq!(view.highlighted, None);
        assert_eq!(view.query, "sh");

        h.engine.on_focus();
        assert!(h.engine.view().is_open);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pointer_inside_keeps_panel_open() {
        let h = harness(MockBackend::new().with_results("sh", sh_results()));

        h.engine.on_input_change("sh");
        advance(300).await;
        assert!(h.engine.on_pointer_down(PointerTarget::Inside).is_none());
        assert!(h.engine.view().is_open);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hover_moves_highlight() {
        let h = harness(MockBackend::new().with_results("sh", sh_results()));

        h.engine.on_input_change("sh");
        advance(300).await;
        h.engine.on_item_hover(2);
        assert_eq!(
            h.engine.view().highlighted_item().unwrap().product_id(),
            Some("42")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_unbound_key_is_not_handled() {
        let h = harness(MockBackend::new());
        assert!(!h.engine.on_key("tab"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_see_results() {
        let h = harness(MockBackend::new().with_results("sh", sh_results()));
        let mut rx = h.engine.subscribe();

        h.engine.on_input_change("sh");
        advance(300).await;

        assert!(rx.has_changed().unwrap());
        let view = rx.borrow_and_update().clone();
        assert_eq!(view.item_count, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_pending_debounce() {
        let h = harness(MockBackend::new().with_results("sh", sh_results()));

        h.engine.on_input_change("sh");
        h.engine.shutdown();
        advance(300).await;

        assert!(h.backend.queries().is_empty());
        assert!(h.engine.is_shut_down());
        h.engine.on_input_change("shirt");
        advance(300).await;
        assert!(h.backend.queries().is_empty());
    }

    /// Run two inputs on two threads at once, let any debounce fire, and
    /// return the final query and the queries fetched.
    async fn race_inputs(first: &str, second: &str) -> (String, Vec<String>) {
        let backend = Arc::new(MockBackend::new());
        let (tx, _routes) = mpsc::unbounded_channel();
        let engine = SuggestionEngine::builder(backend.clone(), Arc::new(tx))
            .with_debounce(Duration::from_millis(5))
            .build()
            .unwrap();

        let barrier = std::sync::Barrier::new(2);
        std::thread::scope(|scope| {
            for text in [first, second] {
                let (engine, barrier) = (&engine, &barrier);
                scope.spawn(move || {
                    barrier.wait();
                    engine.on_input_change(text);
                });
            }
        });
        tokio::time::sleep(Duration::from_millis(40)).await;

        (engine.view().query, backend.queries())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_clear_and_type_still_fetches() {
        for _ in 0..100 {
            let (query, queries) = race_inputs("", "a").await;
            if query == "a" {
                assert_eq!(queries, ["a"]);
            }
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_inputs_fetch_final_query() {
        for _ in 0..100 {
            let (query, queries) = race_inputs("ab", "cd").await;
            assert_eq!(queries.last(), Some(&query));
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_no_fetch_after_concurrent_shutdown() {
        for _ in 0..50 {
            let backend = Arc::new(MockBackend::new());
            let (tx, _routes) = mpsc::unbounded_channel();
            let engine = SuggestionEngine::builder(backend.clone(), Arc::new(tx))
                .with_debounce(Duration::from_millis(2))
                .build()
                .unwrap();

            engine.on_input_change("a");
            std::thread::sleep(Duration::from_millis(2));
            engine.shutdown();
            let issued = backend.queries().len();

            tokio::time::sleep(Duration::from_millis(20)).await;
            assert_eq!(backend.queries().len(), issued);
            assert!(!engine.view().is_open);
            assert!(!engine.view().fetching);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_with_fetch_in_flight() {
        let h = harness(
            MockBackend::new()
                .with_results("sh", sh_results())
                .with_delay(Duration::from_millis(100)),
        );
        let backend = h.backend.clone();
        let rx = h.engine.subscribe();

        h.engine.on_input_change("sh");
        advance(250).await;
        drop(h);
        advance(200).await;

        assert_eq!(backend.queries(), ["sh"]);
        assert!(!rx.borrow().is_open);
    }

    #[tokio::test(start_paused = true)]
    async fn test_events_reported() {
        let backend = Arc::new(MockBackend::new().with_results("sh", sh_results()));
        let (tx, _routes) = mpsc::unbounded_channel();
        let mut events = MockEventSink::new();
        events
            .expect_record()
            .withf(|event| {
                matches!(event, SearchEvent::ResultsShown { query, suggestions: 2, products: 1, .. }
                    if query == "sh")
            })
            .times(1)
            .return_const(());
        events
            .expect_record()
            .withf(|event| {
                matches!(event, SearchEvent::ItemSelected { original_query, item, .. }
                    if original_query == "sh" && item.value == "Shirt A")
            })
            .times(1)
            .return_const(());

        let engine = SuggestionEngine::builder(backend, Arc::new(tx))
            .with_events(Arc::new(events))
            .build()
            .unwrap();
        engine.on_input_change("sh");
        advance(300).await;
        engine.on_item_click(2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_config_keymap_and_debounce() {
        let config = EngineConfig::from_toml_str(
            r#"
            debounce_ms = 50

            [keymap]
            tab = "move_next"
            "#,
        )
        .unwrap();
        let backend = Arc::new(MockBackend::new().with_results("sh", sh_results()));
        let (tx, _routes) = mpsc::unbounded_channel();
        let engine = SuggestionEngine::builder(backend.clone(), Arc::new(tx))
            .with_config(&config)
            .unwrap()
            .build()
            .unwrap();

        engine.on_input_change("sh");
        advance(60).await;
        assert_eq!(backend.queries(), ["sh"]);

        assert!(engine.on_key("tab"));
        assert_eq!(engine.view().highlighted, Some(0));
    }

    #[test]
    fn test_build_outside_runtime_fails() {
        let (tx, _routes) = mpsc::unbounded_channel();
        let result = SuggestionEngine::builder(Arc::new(MockBackend::new()), Arc::new(tx)).build();
        assert!(matches!(result, Err(EngineError::NoRuntime(_))));
    }

    #[test]
    fn test_build_with_explicit_runtime() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        let (tx, _routes) = mpsc::unbounded_channel();
        let engine = SuggestionEngine::builder(Arc::new(MockBackend::new()), Arc::new(tx))
            .with_runtime(runtime.handle().clone())
            .build()
            .unwrap();
        assert!(!engine.view().is_open);
    }
}
