// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Semaphore;

/// A point where a test double can be held until the test lets it through.
///
/// An open gate passes every call. A closed gate parks each caller until [`Gate::release`]
/// hands out a permit.
pub struct Gate {
    closed: AtomicBool,
    permits: Semaphore,
    waiting: AtomicUsize,
}

impl Default for Gate {
    fn default() -> Self {
        Self {
            closed: AtomicBool::new(false),
            permits: Semaphore::new(0),
            waiting: AtomicUsize::new(0),
        }
    }
}

impl Gate {
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    /// Let `n` parked or future callers through
    pub fn release(&self, n: usize) {
        self.permits.add_permits(n);
    }

    /// Open the gate for good and wake everyone parked on it
    pub fn open(&self) {
        if self.closed.swap(false, Ordering::SeqCst) {
            self.permits.add_permits(Semaphore::MAX_PERMITS / 2);
        }
    }

    /// Number of callers currently parked
    pub fn waiting(&self) -> usize {
        self.waiting.load(Ordering::SeqCst)
    }

    pub async fn pass(&self) {
        if !self.closed.load(Ordering::SeqCst) {
            return;
        }
        self.waiting.fetch_add(1, Ordering::SeqCst);
        if let Ok(permit) = self.permits.acquire().await {
            permit.forget();
        }
        self.waiting.fetch_sub(1, Ordering::SeqCst);
    }

    /// Yield until `n` callers are parked on the gate
    pub async fn wait_for_waiters(&self, n: usize) {
        while self.waiting() < n {
            tokio::task::yield_now().await;
        }
    }
}
