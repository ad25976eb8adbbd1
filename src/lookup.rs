//! The lookup handle returned by every [`Cache`](crate::traits::Cache).
//!
//! A [`CacheLookup`] mediates one read / possible-write cycle for one key. It
//! is created by `lookup`, resolved exactly once by [`hydrate`] or [`close`],
//! and inert afterwards.
//!
//! ```text
//!                 hydrate(v) ──► store v, release key
//!   ┌──────┐     ╱
//!   │ Open │ ───┤                                   ┌──────────┐
//!   └──────┘     ╲                                  │ Terminal │  hydrate/close: no-op
//!                 close() / drop ──► release key ──►└──────────┘  value(): None
//! ```
//!
//! Releasing the key lets the next waiter for the same key proceed. A handle
//! that is dropped while still open closes itself, so cancelling the task that
//! owns a handle never strands the key. [`std::mem::forget`] on an open handle
//! does strand it: every later lookup of that key waits forever.
//!
//! [`hydrate`]: CacheLookup::hydrate
//! [`close`]: CacheLookup::close

use std::fmt;
use std::sync::Arc;

use tracing::debug;

/// Lifecycle state of a [`CacheLookup`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupState {
    /// Returned by `lookup`; value and hit flag are fixed.
    Open,
    /// `hydrate` or `close` has run.
    Terminal,
}

type HydrateFn<V> = Box<dyn FnOnce(V) + Send>;
type ReleaseFn = Box<dyn FnOnce() + Send>;

/// One-shot handle for a single cache lookup.
pub struct CacheLookup<V> {
    key: Arc<str>,
    value: Option<V>,
    hit: bool,
    state: LookupState,
    on_hydrate: Option<HydrateFn<V>>,
    on_release: Option<ReleaseFn>,
}

impl<V> CacheLookup<V> {
    /// A handle carrying `value` (a hit when `Some`) with no side effects on
    /// resolution. Attach behaviour with [`with_hydrate`](Self::with_hydrate)
    /// and [`with_release`](Self::with_release).
    pub fn new(key: impl Into<Arc<str>>, value: Option<V>) -> Self {
        Self {
            key: key.into(),
            hit: value.is_some(),
            value,
            state: LookupState::Open,
            on_hydrate: None,
            on_release: None,
        }
    }

    /// A miss that stores nothing and holds nothing.
    pub fn miss(key: impl Into<Arc<str>>) -> Self {
        Self::new(key, None)
    }

    /// Runs `f` with the hydrated value on the first `hydrate`.
    pub fn with_hydrate(mut self, f: impl FnOnce(V) + Send + 'static) -> Self {
        self.on_hydrate = Some(Box::new(f));
        self
    }

    /// Runs `f` as the last step of whichever of `hydrate`/`close` fires first.
    pub fn with_release(mut self, f: impl FnOnce() + Send + 'static) -> Self {
        self.on_release = Some(Box::new(f));
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn state(&self) -> LookupState {
        self.state
    }

    /// Whether the key was present when the handle was opened.
    pub fn is_hit(&self) -> bool {
        self.hit
    }

    /// The value found at open time.
    ///
    /// Always `None` once the handle is terminal.
    pub fn value(&self) -> Option<&V> {
        match self.state {
            LookupState::Open => self.value.as_ref(),
            LookupState::Terminal => None,
        }
    }

    /// Takes the value found at open time and closes the handle.
    pub fn into_value(mut self) -> Option<V> {
        let value = match self.state {
            LookupState::Open => self.value.take(),
            LookupState::Terminal => None,
        };
        self.close();
        value
    }

    /// Backfills `value` into the cache and releases the key.
    ///
    /// Only the first call on an open handle has any effect.
    pub fn hydrate(&mut self, value: V) {
        if self.state == LookupState::Terminal {
            return;
        }
        self.state = LookupState::Terminal;
        self.value = None;
        if let Some(store) = self.on_hydrate.take() {
            store(value);
        }
        self.release();
    }

    /// Releases the key without storing anything. Idempotent.
    pub fn close(&mut self) {
        if self.state == LookupState::Terminal {
            return;
        }
        self.state = LookupState::Terminal;
        self.value = None;
        self.on_hydrate = None;
        self.release();
    }

    fn release(&mut self) {
        if let Some(release) = self.on_release.take() {
            release();
        }
    }
}

impl<V> Drop for CacheLookup<V> {
    fn drop(&mut self) {
        if self.state == LookupState::Open {
            debug!(key = %self.key, hit = self.hit, "lookup handle dropped while open");
            self.close();
        }
    }
}

impl<V: fmt::Debug> fmt::Debug for CacheLookup<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheLookup")
            .field("key", &self.key)
            .field("hit", &self.hit)
            .field("state", &self.state)
            .field("value", &self.value())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use parking_lot::Mutex;

    use super::*;

    fn tracked(
        key: &str,
        value: Option<&'static str>,
    ) -> (
        CacheLookup<&'static str>,
        Arc<Mutex<Vec<&'static str>>>,
        Arc<AtomicUsize>,
    ) {
        let stored = Arc::new(Mutex::new(Vec::new()));
        let released = Arc::new(AtomicUsize::new(0));
        let lookup = CacheLookup::new(key, value)
            .with_hydrate({
                let stored = Arc::clone(&stored);
                move |v| stored.lock().push(v)
            })
            .with_release({
                let released = Arc::clone(&released);
                move || {
                    released.fetch_add(1, Ordering::SeqCst);
                }
            });
        (lookup, stored, released)
    }

    mod state_machine {
        use super::*;

        #[test]
        fn first_hydrate_wins() {
            let (mut lookup, stored, released) = tracked("wooper", None);
            lookup.hydrate("ground");
            lookup.hydrate("water");
            assert_eq!(*stored.lock(), vec!["ground"]);
            assert_eq!(released.load(Ordering::SeqCst), 1);
            assert_eq!(lookup.state(), LookupState::Terminal);
        }

        #[test]
        fn hydrate_after_close_is_ignored() {
            let (mut lookup, stored, released) = tracked("wooper", None);
            lookup.close();
            lookup.hydrate("ground");
            lookup.close();
            assert!(stored.lock().is_empty());
            assert_eq!(released.load(Ordering::SeqCst), 1);
        }

        #[test]
        fn value_cleared_after_terminal() {
            let (mut lookup, _, _) = tracked("wooper", Some("water"));
            assert!(lookup.is_hit());
            assert_eq!(lookup.value(), Some(&"water"));
            lookup.close();
            assert_eq!(lookup.value(), None);
            assert!(lookup.is_hit());
        }

        #[test]
        fn into_value_closes() {
            let (lookup, stored, released) = tracked("wooper", Some("water"));
            assert_eq!(lookup.into_value(), Some("water"));
            assert!(stored.lock().is_empty());
            assert_eq!(released.load(Ordering::SeqCst), 1);
        }
    }

    mod drop_behaviour {
        use super::*;

        #[test]
        fn drop_while_open_releases_once() {
            let (lookup, stored, released) = tracked("wooper", None);
            drop(lookup);
            assert!(stored.lock().is_empty());
            assert_eq!(released.load(Ordering::SeqCst), 1);
        }

        #[test]
        fn drop_after_hydrate_does_not_release_twice() {
            let (mut lookup, _, released) = tracked("wooper", None);
            lookup.hydrate("ground");
            drop(lookup);
            assert_eq!(released.load(Ordering::SeqCst), 1);
        }
    }

    #[test]
    fn detached_miss_has_no_effects() {
        let mut lookup = CacheLookup::<u32>::miss("https://catalog.test/api/v2/item?offset=20");
        assert!(!lookup.is_hit());
        assert_eq!(lookup.key(), "https://catalog.test/api/v2/item?offset=20");
        lookup.hydrate(7);
        assert_eq!(lookup.state(), LookupState::Terminal);
    }
}
