//! Search box state machine.
//!
//! This is the synchronous heart of the engine: query text, fetch
//! sequencing, the zero-state one-shot and the navigation index. It performs
//! no I/O and never sleeps; the controller drives it and performs the
//! effects it asks for.

use suggest_core::{
    Epoch, FetchError, NavigationAction, ResultSet, Section, SectionTitles, SuggestionItem,
    ZeroState,
};

use super::view::{ListEntry, ViewMode, ViewModel};

// =============================================================================
// Outcomes and Effects
// =============================================================================

/// Whether a settled response changed the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The response was current and replaced the displayed state.
    Applied,
    /// The response was stale (or failed, for the zero-state) and was dropped.
    Discarded,
}

/// What the controller has to do after the query text changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEffect {
    /// Start (or restart) the debounce timer for this sequence number.
    ArmDebounce(u64),
    /// The query is empty; fetch the zero-state if `fetch` is set.
    ZeroState { fetch: bool },
}

/// Lifecycle of the one-shot zero-state fetch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ZeroStateStatus {
    /// Never fetched, or the last attempt failed.
    #[default]
    Idle,
    /// A fetch is in flight.
    InFlight,
    /// Cached for the rest of the component's lifetime.
    Fetched,
}

/// Which item a commit targets.
#[derive(Debug, Clone, PartialEq)]
pub enum CommitTarget {
    /// The highlighted item.
    Highlighted,
    /// An index into the flattened list.
    Index(usize),
    /// An explicit item, e.g. from an external selection.
    Item(SuggestionItem),
}

/// A resolved selection.
#[derive(Debug, Clone, PartialEq)]
pub struct Commit {
    /// Where to go.
    pub action: NavigationAction,
    /// The committed item; `None` for a raw-query submit.
    pub item: Option<SuggestionItem>,
    /// Query text as typed before the commit.
    pub original_query: String,
}

// =============================================================================
// Navigation State
// =============================================================================

/// Panel visibility and keyboard highlight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NavigationState {
    pub is_open: bool,
    /// Index into the flattened list; `None` means nothing highlighted.
    pub highlighted: Option<usize>,
}

impl NavigationState {
    fn open(&mut self) {
        if !self.is_open {
            self.is_open = true;
            self.highlighted = None;
        }
    }

    fn close(&mut self) {
        self.is_open = false;
        self.highlighted = None;
    }
}

// =============================================================================
// Search Box State
// =============================================================================

/// Complete state of one search box.
#[derive(Debug, Default)]
pub struct SearchBoxState {
    query: String,

    /// Last applied suggestion results.
    results: Option<ResultSet>,

    /// Zero-state payload, set once.
    zero_state: Option<ZeroState>,
    zero_state_status: ZeroStateStatus,

    /// Last epoch handed out.
    last_issued: Epoch,
    /// Epoch whose response may still be applied.
    active_epoch: Option<Epoch>,

    /// Debounce sequence numbers.
    debounce_seq: u64,
    pending_debounce: Option<u64>,

    nav: NavigationState,
}

impl SearchBoxState {
    pub fn new() -> Self {
        Self::default()
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Exactly one view is active, chosen by the trimmed query.
    pub fn mode(&self) -> ViewMode {
        if self.query.trim().is_empty() {
            ViewMode::ZeroState
        } else {
            ViewMode::Results
        }
    }

    pub fn results(&self) -> Option<&ResultSet> {
        self.results.as_ref()
    }

    pub fn zero_state(&self) -> Option<&ZeroState> {
        self.zero_state.as_ref()
    }

    pub fn zero_state_status(&self) -> ZeroStateStatus {
        self.zero_state_status
    }

    pub fn navigation(&self) -> NavigationState {
        self.nav
    }

    pub fn is_open(&self) -> bool {
        self.nav.is_open
    }

    pub fn highlighted(&self) -> Option<usize> {
        self.nav.highlighted
    }

    /// True from issuance to settlement of the latest suggestion fetch.
    pub fn is_fetching(&self) -> bool {
        self.active_epoch.is_some()
    }

    /// Last epoch handed out by `begin_fetch`.
    pub fn last_issued(&self) -> Epoch {
        self.last_issued
    }

    pub fn has_pending_debounce(&self) -> bool {
        self.pending_debounce.is_some()
    }

    /// Sequence number of the debounce that is still allowed to fire.
    pub fn pending_debounce(&self) -> Option<u64> {
        self.pending_debounce
    }

    // -------------------------------------------------------------------------
    // Input Controller
    // -------------------------------------------------------------------------

    /// Record new input text.
    ///
    /// Empty or whitespace-only text switches to the zero-state at once.
    /// Anything else arms a new debounce sequence and supersedes the old one.
    pub fn set_query(&mut self, text: impl Into<String>) -> InputEffect {
        let previous_mode = self.mode();
        self.query = text.into();

        if self.mode() != previous_mode {
            self.nav.highlighted = None;
        }

        match self.mode() {
            ViewMode::ZeroState => {
                self.pending_debounce = None;
                self.invalidate_in_flight();
                self.nav.open();
                InputEffect::ZeroState {
                    fetch: self.begin_zero_state(),
                }
            }
            ViewMode::Results => {
                self.debounce_seq += 1;
                self.pending_debounce = Some(self.debounce_seq);
                InputEffect::ArmDebounce(self.debounce_seq)
            }
        }
    }

    /// The debounce timer for `seq` elapsed.
    ///
    /// Returns the fetch to issue, or `None` when the timer was superseded.
    pub fn fire_debounce(&mut self, seq: u64) -> Option<(Epoch, String)> {
        if self.pending_debounce != Some(seq) {
            return None;
        }
        self.pending_debounce = None;

        if self.mode() == ViewMode::ZeroState {
            return None;
        }
        let query = self.query.clone();
        Some((self.begin_fetch(), query))
    }

    /// Focus entered the input.
    ///
    /// Returns true when the zero-state fetch must be issued.
    pub fn focus(&mut self) -> bool {
        match self.mode() {
            ViewMode::ZeroState => {
                self.nav.open();
                self.begin_zero_state()
            }
            ViewMode::Results => {
                if self.results.is_some() {
                    self.nav.open();
                }
                false
            }
        }
    }

    /// A pointer went down outside the component.
    pub fn pointer_down_outside(&mut self) {
        self.nav.close();
    }

    /// Escape closes the panel; the query is kept.
    pub fn escape(&mut self) {
        self.nav.close();
    }

    /// Component is being torn down; nothing may fire or apply afterwards.
    pub fn teardown(&mut self) {
        self.pending_debounce = None;
        self.invalidate_in_flight();
        self.nav.close();
    }

    // -------------------------------------------------------------------------
    // Fetch Sequencer
    // -------------------------------------------------------------------------

    /// Hand out the next epoch and mark it as the only applicable one.
    pub fn begin_fetch(&mut self) -> Epoch {
        self.last_issued = self.last_issued.next();
        self.active_epoch = Some(self.last_issued);
        self.last_issued
    }

    /// Apply a settled suggestion fetch.
    ///
    /// Only the response for the active epoch is applied. A failure counts as
    /// an empty result; the panel stays as it is.
    pub fn apply_suggestions(
        &mut self,
        epoch: Epoch,
        result: Result<ResultSet, FetchError>,
    ) -> ApplyOutcome {
        if self.active_epoch != Some(epoch) {
            tracing::debug!(
                "Discarding stale response {} (active: {:?})",
                epoch,
                self.active_epoch
            );
            return ApplyOutcome::Discarded;
        }
        self.active_epoch = None;

        let mut set = match result {
            Ok(set) => set,
            Err(e) => {
                tracing::warn!("Suggestion fetch {} failed: {}", epoch, e);
                ResultSet::empty(self.query.clone())
            }
        };
        set.epoch = epoch;

        if !set.is_empty() {
            self.nav.open();
        }
        self.nav.highlighted = None;
        self.results = Some(set);
        ApplyOutcome::Applied
    }

    /// Start the zero-state fetch unless it is cached or in flight.
    pub fn begin_zero_state(&mut self) -> bool {
        if self.zero_state_status != ZeroStateStatus::Idle {
            return false;
        }
        self.zero_state_status = ZeroStateStatus::InFlight;
        true
    }

    /// Apply the settled zero-state fetch.
    ///
    /// A failure resets the one-shot so a later focus retries.
    pub fn apply_zero_state(&mut self, result: Result<ZeroState, FetchError>) -> ApplyOutcome {
        match result {
            Ok(payload) => {
                self.zero_state_status = ZeroStateStatus::Fetched;
                if self.zero_state.is_some() {
                    return ApplyOutcome::Discarded;
                }
                self.zero_state = Some(payload);
                if self.mode() == ViewMode::ZeroState {
                    self.nav.highlighted = None;
                }
                ApplyOutcome::Applied
            }
            Err(e) => {
                tracing::warn!("Zero-state fetch failed: {}", e);
                if self.zero_state_status == ZeroStateStatus::InFlight {
                    self.zero_state_status = ZeroStateStatus::Idle;
                }
                ApplyOutcome::Discarded
            }
        }
    }

    fn invalidate_in_flight(&mut self) {
        self.active_epoch = None;
    }

    // -------------------------------------------------------------------------
    // Navigation Index
    // -------------------------------------------------------------------------

    /// Displayed sections for the active view: (suggestions, products).
    fn displayed(&self) -> (&[SuggestionItem], &[SuggestionItem]) {
        match self.mode() {
            ViewMode::ZeroState => self
                .zero_state
                .as_ref()
                .map(|z| (z.suggestions.as_slice(), z.products.as_slice()))
                .unwrap_or_default(),
            ViewMode::Results => self
                .results
                .as_ref()
                .map(|r| (r.suggestions.as_slice(), r.products.as_slice()))
                .unwrap_or_default(),
        }
    }

    /// Displayed suggestions followed by displayed products.
    pub fn flattened(&self) -> Vec<&SuggestionItem> {
        let (suggestions, products) = self.displayed();
        suggestions.iter().chain(products.iter()).collect()
    }

    pub fn flattened_len(&self) -> usize {
        let (suggestions, products) = self.displayed();
        suggestions.len() + products.len()
    }

    /// Item at a flattened index.
    pub fn item_at(&self, index: usize) -> Option<&SuggestionItem> {
        let (suggestions, products) = self.displayed();
        if index < suggestions.len() {
            suggestions.get(index)
        } else {
            products.get(index - suggestions.len())
        }
    }

    /// Step the highlight forward with wrap-around.
    pub fn move_next(&mut self) {
        let len = self.flattened_len();
        if !self.nav.is_open || len == 0 {
            return;
        }
        self.nav.highlighted = Some(match self.nav.highlighted {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        });
    }

    /// Step the highlight backward with wrap-around.
    pub fn move_previous(&mut self) {
        let len = self.flattened_len();
        if !self.nav.is_open || len == 0 {
            return;
        }
        self.nav.highlighted = Some(match self.nav.highlighted {
            Some(i) if i > 0 && i < len => i - 1,
            _ => len - 1,
        });
    }

    /// Highlight an index directly (pointer hover).
    pub fn highlight(&mut self, index: usize) {
        if self.nav.is_open && index < self.flattened_len() {
            self.nav.highlighted = Some(index);
        }
    }

    /// Resolve a commit target and close the panel.
    ///
    /// No-op while the panel is closed, so repeating a commit has no effect.
    pub fn commit(&mut self, target: CommitTarget) -> Option<Commit> {
        if !self.nav.is_open {
            return None;
        }

        let item = match target {
            CommitTarget::Highlighted => {
                self.nav.highlighted.and_then(|i| self.item_at(i)).cloned()
            }
            CommitTarget::Index(index) => self.item_at(index).cloned(),
            CommitTarget::Item(item) => Some(item),
        }?;

        let action = match item.product_id() {
            Some(id) => NavigationAction::product(id),
            None => NavigationAction::search(item.value.clone()),
        };
        let original_query = std::mem::replace(&mut self.query, item.value.clone());
        self.settle_after_navigation();

        Some(Commit {
            action,
            item: Some(item),
            original_query,
        })
    }

    /// Form submit (Enter).
    ///
    /// Commits the highlighted item when there is one; otherwise navigates to
    /// search results for the raw typed query.
    pub fn submit(&mut self) -> Option<Commit> {
        if self.nav.is_open && self.nav.highlighted.is_some() {
            return self.commit(CommitTarget::Highlighted);
        }
        if self.mode() == ViewMode::ZeroState {
            return None;
        }

        let query = self.query.clone();
        self.settle_after_navigation();
        Some(Commit {
            action: NavigationAction::search(query.clone()),
            item: None,
            original_query: query,
        })
    }

    /// After navigating, nothing scheduled for the old text may reopen the panel.
    fn settle_after_navigation(&mut self) {
        self.pending_debounce = None;
        self.invalidate_in_flight();
        self.nav.close();
    }

    // -------------------------------------------------------------------------
    // View Model
    // -------------------------------------------------------------------------

    /// Snapshot for renderers.
    pub fn view(&self) -> ViewModel {
        let mode = self.mode();
        let (suggestions, products) = self.displayed();

        let titles = match mode {
            ViewMode::Results => self
                .results
                .as_ref()
                .map(|set| set.titles.clone())
                .unwrap_or_default(),
            ViewMode::ZeroState => SectionTitles::default(),
        };
        let product_title = match (mode, &self.zero_state) {
            (ViewMode::ZeroState, Some(zero)) => zero.title.clone(),
            _ => titles.title(Section::Product).to_string(),
        };

        let mut entries = Vec::with_capacity(suggestions.len() + products.len() + 2);
        let mut flat_index = 0;
        for (title, items) in [
            (titles.title(Section::Suggestion).to_string(), suggestions),
            (product_title, products),
        ] {
            if items.is_empty() {
                continue;
            }
            entries.push(ListEntry::SectionHeader { title });
            for item in items {
                entries.push(ListEntry::Item {
                    item: item.clone(),
                    flat_index,
                    highlighted: self.nav.highlighted == Some(flat_index),
                });
                flat_index += 1;
            }
        }

        let show_no_results = mode == ViewMode::Results
            && self.nav.is_open
            && !self.is_fetching()
            && self.results.as_ref().is_some_and(ResultSet::is_empty);

        ViewModel {
            query: self.query.clone(),
            mode,
            is_open: self.nav.is_open,
            highlighted: self.nav.highlighted,
            fetching: self.is_fetching(),
            zero_state_loading: self.zero_state_status == ZeroStateStatus::InFlight,
            show_no_results,
            entries,
            item_count: flat_index,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
