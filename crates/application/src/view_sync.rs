use std::collections::VecDeque;
use std::time::Duration;

use fieldforce_domain::{ViewMode, ViewState};
use tokio::time::Instant;
use tracing::debug;

#[cfg(test)]
mod tests;

/// How long a programmatic URL write may echo back as a change notification.
pub const DEFAULT_ECHO_WINDOW: Duration = Duration::from_millis(300);

const MAX_TRACKED_WRITES: usize = 16;
const MAX_BACK_STACK: usize = 32;

/// A URL replacement the host must perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlWrite {
    /// Generation of this write.
    pub generation: u64,
    /// New query string, without the leading `?`.
    pub query: String,
}

/// Outcome of a URL change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlChange<M> {
    /// External navigation; the view switched to this state.
    Adopted(ViewState<M>),
    /// The URL already matches the current state.
    Unchanged,
    /// Echo of the latest programmatic write.
    Echo,
    /// Echo of an older write that a newer one replaced.
    Superseded,
}

#[derive(Debug, Clone)]
struct TrackedWrite<M> {
    generation: u64,
    state: ViewState<M>,
    written_at: Instant,
}

/// Keeps a page's view state and its URL query string in step.
///
/// The URL is the source of truth on mount; afterwards local state leads
/// and URL notifications are filtered against recent programmatic writes.
#[derive(Debug)]
pub struct ViewSynchronizer<M> {
    current: ViewState<M>,
    back_stack: Vec<ViewState<M>>,
    generation: u64,
    recent_writes: VecDeque<TrackedWrite<M>>,
    echo_window: Duration,
}

impl<M: ViewMode> ViewSynchronizer<M> {
    /// Mounts from the URL query string.
    #[must_use]
    pub fn mount(query: &str, echo_window: Duration) -> Self {
        Self {
            current: ViewState::from_query(query),
            back_stack: Vec::new(),
            generation: 0,
            recent_writes: VecDeque::new(),
            echo_window,
        }
    }

    /// Returns the visible state.
    #[must_use]
    pub fn current(&self) -> &ViewState<M> {
        &self.current
    }

    /// Returns recorded parent states, outermost first.
    #[must_use]
    pub fn breadcrumbs(&self) -> &[ViewState<M>] {
        &self.back_stack
    }

    /// Restores parent states saved by a previous session.
    pub fn restore_breadcrumbs(&mut self, breadcrumbs: Vec<ViewState<M>>) {
        self.back_stack = breadcrumbs
            .into_iter()
            .filter(|state| *state != self.current)
            .collect();
        self.back_stack.truncate(MAX_BACK_STACK);
    }

    /// Drills into another state, recording the current one as its parent.
    ///
    /// Navigating to root clears the recorded parents; navigating to a
    /// recorded parent unwinds back to it.
    pub fn navigate(&mut self, next: ViewState<M>, now: Instant) -> Option<UrlWrite> {
        if next == self.current {
            return None;
        }

        if next.is_root() {
            self.back_stack.clear();
        } else if let Some(index) = self.back_stack.iter().position(|state| *state == next) {
            self.back_stack.truncate(index);
        } else {
            self.back_stack.push(self.current.clone());
            if self.back_stack.len() > MAX_BACK_STACK {
                self.back_stack.remove(0);
            }
        }

        self.current = next;
        Some(self.write(now))
    }

    /// Returns to the immediate parent, or to root when none was recorded.
    pub fn back(&mut self, now: Instant) -> Option<UrlWrite> {
        let parent = self.back_stack.pop().unwrap_or_else(ViewState::root);
        if parent == self.current {
            return None;
        }

        self.current = parent;
        Some(self.write(now))
    }

    /// Handles a URL change reported by the host.
    pub fn on_url_changed(&mut self, query: &str, now: Instant) -> UrlChange<M> {
        self.expire_writes(now);
        let observed = ViewState::<M>::from_query(query);

        if let Some(index) = self
            .recent_writes
            .iter()
            .rposition(|write| write.state == observed)
        {
            let is_latest = index + 1 == self.recent_writes.len();
            let write = &self.recent_writes[index];
            debug!(
                generation = write.generation,
                live_generation = self.generation,
                is_latest,
                "ignoring echo of programmatic url write"
            );
            self.recent_writes.drain(..=index);
            return if is_latest {
                UrlChange::Echo
            } else {
                UrlChange::Superseded
            };
        }

        if observed == self.current {
            return UrlChange::Unchanged;
        }

        self.recent_writes.clear();
        if self.back_stack.last() == Some(&observed) {
            self.back_stack.pop();
        } else if observed.is_root() {
            self.back_stack.clear();
        } else {
            self.back_stack.push(self.current.clone());
        }

        self.current = observed.clone();
        UrlChange::Adopted(observed)
    }

    fn write(&mut self, now: Instant) -> UrlWrite {
        self.generation = self.generation.saturating_add(1);
        self.recent_writes.push_back(TrackedWrite {
            generation: self.generation,
            state: self.current.clone(),
            written_at: now,
        });
        while self.recent_writes.len() > MAX_TRACKED_WRITES {
            self.recent_writes.pop_front();
        }

        UrlWrite {
            generation: self.generation,
            query: self.current.to_query(),
        }
    }

    fn expire_writes(&mut self, now: Instant) {
        let echo_window = self.echo_window;
        self.recent_writes
            .retain(|write| now.saturating_duration_since(write.written_at) <= echo_window);
    }
}
