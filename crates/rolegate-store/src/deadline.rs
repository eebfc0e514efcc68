//! Per-call deadlines that reach into blocking store work.
//!
//! A caller runs a store future inside [`CallDeadline::scope`]. Stores that
//! do blocking I/O pick the deadline up with [`CallDeadline::current`] and
//! consult it from the worker thread.
//!
//! The deadline also arbitrates the race between a commit and a caller
//! giving up. Exactly one of [`CallDeadline::begin_commit`] and
//! [`CallDeadline::abandon`] wins:
//!
//! - `begin_commit` wins: the write commits and the caller must wait for it.
//! - `abandon` wins: the write rolls back and the caller reports the timeout.

use std::future::Future;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

const PENDING: u8 = 0;
const COMMITTING: u8 = 1;
const ABANDONED: u8 = 2;

tokio::task_local! {
    static CURRENT: Arc<CallDeadline>;
}

/// The deadline of one store call.
#[derive(Debug)]
pub struct CallDeadline {
    expires_at: Instant,
    state: AtomicU8,
}

impl CallDeadline {
    pub fn new(limit: Duration) -> Arc<Self> {
        Arc::new(Self {
            expires_at: Instant::now() + limit,
            state: AtomicU8::new(PENDING),
        })
    }

    /// The deadline of the call being polled, if it runs inside a scope.
    pub fn current() -> Option<Arc<Self>> {
        CURRENT.try_with(Arc::clone).ok()
    }

    /// Run `fut` with this deadline visible to the store.
    pub async fn scope<F: Future>(self: Arc<Self>, fut: F) -> F::Output {
        CURRENT.scope(self, fut).await
    }

    /// Time left before expiry.
    pub fn remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }

    /// True once the clock has run out or the caller has given up.
    pub fn is_expired(&self) -> bool {
        self.state.load(Ordering::Acquire) == ABANDONED || Instant::now() >= self.expires_at
    }

    /// Claim the right to commit. Fails if the call already expired.
    pub fn begin_commit(&self) -> bool {
        if Instant::now() >= self.expires_at {
            return false;
        }
        self.state
            .compare_exchange(PENDING, COMMITTING, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Give up on the call. Fails if a commit is already under way.
    pub fn abandon(&self) -> bool {
        match self
            .state
            .compare_exchange(PENDING, ABANDONED, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => true,
            Err(current) => current == ABANDONED,
        }
    }
}
