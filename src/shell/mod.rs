//! Interactive shell: the client-side orchestration behind the showtime page.
//!
//! The shell lives on one logical thread. Its methods take `&self` and keep
//! state in a `RefCell` that is never borrowed across an `.await`, so user
//! actions and network completions can interleave the way event handlers do
//! in a browser. Suspension points are exactly the [`Backend`] calls and the
//! sync delays.

pub mod backend;
pub mod favorites;

pub use backend::{Backend, HttpBackend};
pub use favorites::{FavoriteSet, PendingToggle};

use std::cell::RefCell;
use std::collections::HashSet;
use std::time::Duration;

use chrono::NaiveDateTime;
use tokio::time::Instant;

use crate::models::{Showtime, Status};
use crate::view::{ShowtimeView, ViewBuilder};

/// Timing of the post-scrape refresh.
#[derive(Debug, Clone, Copy)]
pub struct SyncPolicy {
    /// Wait before the first status poll.
    pub initial_delay: Duration,
    pub poll_interval: Duration,
    /// Give up waiting for a new scrape time after this long and refresh anyway.
    pub timeout: Duration,
}

impl Default for SyncPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(5),
            poll_interval: Duration::from_secs(2),
            timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Another sync holds the latch.
    AlreadyRunning,
    /// The backend reported a new scrape and the data was re-fetched.
    Refreshed,
    /// No new scrape time within the timeout; data re-fetched anyway.
    TimedOut,
    /// Trigger or re-fetch failed; previous data kept.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellAction {
    /// Session cleared; reload so the gate starts over.
    Reload,
    Stay,
}

#[derive(Debug, Default)]
struct ShellState {
    loading: bool,
    syncing: bool,
    confirming_logout: bool,
    showtimes: Vec<Showtime>,
    favorites: FavoriteSet,
    last_scraped: Option<NaiveDateTime>,
    selected_date: Option<String>,
    selected_cinema: Option<String>,
}

pub struct Shell<B: Backend> {
    backend: B,
    builder: ViewBuilder,
    policy: SyncPolicy,
    state: RefCell<ShellState>,
}

impl<B: Backend> Shell<B> {
    pub fn new(backend: B, builder: ViewBuilder) -> Self {
        Self::with_policy(backend, builder, SyncPolicy::default())
    }

    pub fn with_policy(backend: B, builder: ViewBuilder, policy: SyncPolicy) -> Self {
        Self {
            backend,
            builder,
            policy,
            state: RefCell::new(ShellState {
                loading: true,
                ..ShellState::default()
            }),
        }
    }

    // -- Accessors --

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn is_syncing(&self) -> bool {
        self.state.borrow().syncing
    }

    pub fn is_confirming_logout(&self) -> bool {
        self.state.borrow().confirming_logout
    }

    pub fn last_scraped(&self) -> Option<NaiveDateTime> {
        self.state.borrow().last_scraped
    }

    pub fn selected_date(&self) -> Option<String> {
        self.state.borrow().selected_date.clone()
    }

    pub fn selected_cinema(&self) -> Option<String> {
        self.state.borrow().selected_cinema.clone()
    }

    pub fn favorite_titles(&self) -> HashSet<String> {
        self.state.borrow().favorites.titles().clone()
    }

    pub fn showtime_count(&self) -> usize {
        self.state.borrow().showtimes.len()
    }

    /// Current view model, rebuilt from scratch.
    pub fn view(&self) -> ShowtimeView {
        let state = self.state.borrow();
        self.builder.build(
            &state.showtimes,
            state.favorites.titles(),
            state.selected_date.as_deref(),
            state.selected_cinema.as_deref(),
        )
    }

    // -- Initial load --

    /// Fetch showtimes, favorites and status together. Always ends loaded.
    pub async fn load(&self) {
        let result = tokio::try_join!(
            self.backend.movies(),
            self.backend.favorites(),
            self.backend.status()
        );

        let mut state = self.state.borrow_mut();
        match result {
            Ok((showtimes, favorites, status)) => {
                tracing::info!(
                    "Loaded {} showtimes and {} favorites",
                    showtimes.len(),
                    favorites.len()
                );
                state.selected_date = Some(default_date(&showtimes));
                state.showtimes = showtimes;
                state.favorites =
                    FavoriteSet::from_titles(favorites.into_iter().map(|f| f.movie_title));
                state.last_scraped = status.last_scrape_time;
            }
            Err(e) => {
                tracing::error!("Failed to fetch data: {}", e);
            }
        }
        state.loading = false;
    }

    // -- Filters --

    pub fn select_date(&self, date: &str) {
        let mut state = self.state.borrow_mut();
        state.selected_date = Some(date.to_string());

        let cinema_still_offered = state.selected_cinema.as_deref().map_or(true, |cinema| {
            state
                .showtimes
                .iter()
                .any(|st| st.date_str == date && st.cinema_name == cinema)
        });
        if !cinema_still_offered {
            state.selected_cinema = None;
        }
    }

    pub fn select_cinema(&self, cinema: Option<&str>) {
        self.state.borrow_mut().selected_cinema = cinema.map(str::to_owned);
    }

    // -- Favorites --

    /// Optimistic half of a toggle: flips membership right away.
    pub fn begin_toggle(&self, title: &str) -> PendingToggle {
        self.state.borrow_mut().favorites.begin_toggle(title)
    }

    /// Settle a toggle with the network outcome; rolls back on failure.
    pub fn settle_toggle(&self, pending: &PendingToggle, confirmed: bool) {
        let reverted = self
            .state
            .borrow_mut()
            .favorites
            .settle(pending, confirmed);
        if reverted {
            tracing::warn!("Reverted favorite toggle for {}", pending.title);
        }
    }

    /// Returns whether the backend confirmed the change.
    pub async fn toggle_favorite(&self, title: &str) -> bool {
        let pending = self.begin_toggle(title);

        let result = if pending.adds() {
            self.backend.add_favorite(title).await
        } else {
            self.backend.remove_favorite(title).await
        };

        if let Err(ref e) = result {
            tracing::error!("Failed to update favorite {}: {}", title, e);
        }
        let confirmed = result.is_ok();
        self.settle_toggle(&pending, confirmed);
        confirmed
    }

    // -- Sync --

    /// Trigger a scrape and refresh once the backend reports it finished.
    pub async fn sync(&self) -> SyncOutcome {
        let cached = {
            let mut state = self.state.borrow_mut();
            if state.syncing {
                return SyncOutcome::AlreadyRunning;
            }
            state.syncing = true;
            state.last_scraped
        };
        let _latch = SyncLatch(&self.state);

        // A scheduled scrape may have finished since the page loaded.
        let previous = match self.backend.status().await {
            Ok(status) => status.last_scrape_time,
            Err(e) => {
                tracing::warn!("Status before sync failed, using cached time: {}", e);
                cached
            }
        };

        self.run_sync(previous).await
    }

    async fn run_sync(&self, previous: Option<NaiveDateTime>) -> SyncOutcome {
        if let Err(e) = self.backend.trigger_scrape().await {
            tracing::error!("Sync failed: {}", e);
            return SyncOutcome::Failed;
        }

        let finished = self.wait_for_scrape(previous).await;

        match tokio::try_join!(self.backend.movies(), self.backend.status()) {
            Ok((showtimes, status)) => {
                let mut state = self.state.borrow_mut();
                state.showtimes = showtimes;
                state.last_scraped = status.last_scrape_time;
                if finished {
                    SyncOutcome::Refreshed
                } else {
                    SyncOutcome::TimedOut
                }
            }
            Err(e) => {
                tracing::error!("Refresh after sync failed: {}", e);
                SyncOutcome::Failed
            }
        }
    }

    /// Poll `/status` until the scrape time moves past `previous`.
    async fn wait_for_scrape(&self, previous: Option<NaiveDateTime>) -> bool {
        let started = Instant::now();
        tokio::time::sleep(self.policy.initial_delay).await;

        loop {
            match self.backend.status().await {
                Ok(Status {
                    last_scrape_time: Some(time),
                }) if Some(time) != previous => return true,
                Ok(_) => {}
                Err(e) => tracing::warn!("Status poll failed: {}", e),
            }

            if started.elapsed() >= self.policy.timeout {
                tracing::warn!(
                    "Scrape did not report completion within {:?}",
                    self.policy.timeout
                );
                return false;
            }
            tokio::time::sleep(self.policy.poll_interval).await;
        }
    }

    // -- Logout --

    pub fn request_logout(&self) {
        self.state.borrow_mut().confirming_logout = true;
    }

    pub fn cancel_logout(&self) {
        self.state.borrow_mut().confirming_logout = false;
    }

    /// Clears the session once the user has confirmed.
    pub async fn confirm_logout(&self) -> ShellAction {
        if !self.is_confirming_logout() {
            return ShellAction::Stay;
        }
        self.cancel_logout();

        match self.backend.logout().await {
            Ok(()) => ShellAction::Reload,
            Err(e) => {
                tracing::error!("Logout failed: {}", e);
                ShellAction::Stay
            }
        }
    }
}

/// Releases the sync flag on every exit, including a dropped future.
struct SyncLatch<'a>(&'a RefCell<ShellState>);

impl Drop for SyncLatch<'_> {
    fn drop(&mut self) {
        self.0.borrow_mut().syncing = false;
    }
}

/// Earliest date present, or today when there are no showtimes.
fn default_date(showtimes: &[Showtime]) -> String {
    showtimes
        .iter()
        .map(|st| st.date_str.as_str())
        .min()
        .map(str::to_owned)
        .unwrap_or_else(|| chrono::Local::now().date_naive().format("%Y-%m-%d").to_string())
}
