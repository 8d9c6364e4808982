// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `setTimeout` tick source.
//!
//! [`TimerLoop`] owns the one JS timer the animation scheduler needs. Each
//! [`schedule`](TimerLoop::schedule) replaces the pending timeout, so at most
//! one tick is ever in flight. When it fires, the callback receives the
//! current [`HostTime`] from `performance.now()`.
//!
//! Unlike `requestAnimationFrame`, the loop does not re-register itself: the
//! scene re-arms it at the end of every tick that leaves bindings running,
//! and simply stops asking once it goes idle.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

use tessera_core::time::{Duration, HostTime};

// Direct global bindings instead of `web_sys::Window` methods; avoids
// fetching the Window object on every tick.
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = performance, js_name = "now")]
    pub(crate) fn performance_now() -> f64;

    #[wasm_bindgen(js_name = "setTimeout")]
    fn set_timeout(callback: &JsValue, millis: i32) -> i32;

    #[wasm_bindgen(js_name = "clearTimeout")]
    fn clear_timeout(id: i32);
}

/// Converts a delay into whole `setTimeout` milliseconds, rounding up so a
/// tick never fires early.
#[must_use]
pub fn timeout_millis(after: Duration) -> i32 {
    let millis = after.micros().div_ceil(1000);
    i32::try_from(millis).unwrap_or(i32::MAX)
}

/// A one-shot `setTimeout` timer that can be re-armed.
pub struct TimerLoop {
    inner: Rc<TimerInner>,
}

type TimerClosure = Closure<dyn FnMut()>;

struct TimerInner {
    /// The JS closure handed to `setTimeout`. Built once on first use.
    closure: RefCell<Option<TimerClosure>>,

    /// Receives the fire time.
    callback: RefCell<Option<Box<dyn FnMut(HostTime)>>>,

    /// Id of the pending timeout, if any.
    pending: Cell<Option<i32>>,

    /// Number of times the timer has fired.
    fired: Cell<u64>,
}

impl TimerLoop {
    /// Creates an idle timer with no callback.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(TimerInner {
                closure: RefCell::new(None),
                callback: RefCell::new(None),
                pending: Cell::new(None),
                fired: Cell::new(0),
            }),
        }
    }

    /// Installs the callback that receives each fire.
    pub fn set_callback(&self, callback: impl FnMut(HostTime) + 'static) {
        *self.inner.callback.borrow_mut() = Some(Box::new(callback));
    }

    /// Arms the timer to fire once after `after`, cancelling any pending
    /// timeout.
    pub fn schedule(&self, after: Duration) {
        self.cancel();
        let mut slot = self.inner.closure.borrow_mut();
        let closure = slot.get_or_insert_with(|| fire_closure(Rc::downgrade(&self.inner)));
        let id = set_timeout(closure.as_ref().unchecked_ref(), timeout_millis(after));
        self.inner.pending.set(Some(id));
    }

    /// Cancels the pending timeout, if any.
    pub fn cancel(&self) {
        if let Some(id) = self.inner.pending.take() {
            clear_timeout(id);
        }
    }

    /// Returns `true` if a timeout is pending.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.inner.pending.get().is_some()
    }

    /// Number of times the timer has fired.
    #[must_use]
    pub fn fired(&self) -> u64 {
        self.inner.fired.get()
    }
}

impl Default for TimerLoop {
    fn default() -> Self {
        Self::new()
    }
}

fn fire_closure(inner: Weak<TimerInner>) -> TimerClosure {
    Closure::wrap(Box::new(move || {
        let Some(inner) = inner.upgrade() else {
            return;
        };
        inner.pending.set(None);
        inner.fired.set(inner.fired.get() + 1);
        let now = crate::now();
        // The callback may re-arm the timer; `schedule` only touches
        // `closure` and `pending`, never this cell.
        if let Some(callback) = inner.callback.borrow_mut().as_mut() {
            callback(now);
        }
    }) as Box<dyn FnMut()>)
}

impl Drop for TimerLoop {
    fn drop(&mut self) {
        self.cancel();
        // Drop the JS closure so it doesn't leak.
        self.inner.closure.borrow_mut().take();
    }
}

impl core::fmt::Debug for TimerLoop {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TimerLoop")
            .field("pending", &self.inner.pending.get())
            .field("fired", &self.inner.fired.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeouts_round_up_to_whole_millis() {
        assert_eq!(timeout_millis(Duration::from_millis(10)), 10);
        assert_eq!(timeout_millis(Duration::from_micros(10_001)), 11);
        assert_eq!(timeout_millis(Duration::ZERO), 0);
    }

    #[test]
    fn huge_delays_saturate() {
        assert_eq!(timeout_millis(Duration::from_micros(u64::MAX)), i32::MAX);
    }
}
