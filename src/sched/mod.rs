//! Explicit scheduling primitives.
//!
//! The engine never touches platform timer globals: the host drives a
//! millisecond clock into [`Debounce::poll`] and frame ticks into the
//! surface, which drains a [`FramePump`]. Both coalesce by last-write-wins
//! rescheduling rather than queuing. [`Subscription`] wraps external
//! listener registrations so teardown is a single mandatory `dispose`.

/// A cancellable debounce timer over a caller-supplied clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Debounce {
    quiet_ms: u64,
    deadline: Option<u64>,
}

impl Debounce {
    pub fn new(quiet_ms: u64) -> Self {
        Self {
            quiet_ms,
            deadline: None,
        }
    }

    /// Starts or restarts the quiet period from `now`.
    pub fn schedule(&mut self, now: u64) {
        self.deadline = Some(now + self.quiet_ms);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Fires immediately if anything is pending. Returns whether it fired.
    pub fn flush(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    /// Fires when the quiet period has elapsed at `now`.
    pub fn poll(&mut self, now: u64) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// Animation-frame batching: many requests collapse into one unit of work
/// on the next frame tick.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FramePump {
    requested: bool,
}

impl FramePump {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&mut self) {
        self.requested = true;
    }

    pub fn cancel(&mut self) {
        self.requested = false;
    }

    /// Consumes the pending request, if any. Called once per frame tick.
    pub fn take(&mut self) -> bool {
        std::mem::take(&mut self.requested)
    }
}

/// An owned listener registration with mandatory cleanup. Dropping without
/// an explicit [`Subscription::dispose`] still runs the cleanup so handlers
/// cannot leak across editor instances.
pub struct Subscription {
    cleanup: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(cleanup: impl FnOnce() + 'static) -> Self {
        Self {
            cleanup: Some(Box::new(cleanup)),
        }
    }

    /// Runs the cleanup. Idempotent.
    pub fn dispose(&mut self) {
        if let Some(cleanup) = self.cleanup.take() {
            cleanup();
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.cleanup.is_none()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_debounce_reschedules_last_write_wins() {
        let mut timer = Debounce::new(250);
        timer.schedule(0);
        timer.schedule(100);
        assert!(!timer.poll(250));
        assert!(timer.poll(350));
        assert!(!timer.poll(400));
    }

    #[test]
    fn test_debounce_flush_and_cancel() {
        let mut timer = Debounce::new(250);
        assert!(!timer.flush());
        timer.schedule(0);
        assert!(timer.flush());
        timer.schedule(0);
        timer.cancel();
        assert!(!timer.poll(1_000));
    }

    #[test]
    fn test_frame_pump_coalesces_requests() {
        let mut pump = FramePump::new();
        pump.request();
        pump.request();
        assert!(pump.take());
        assert!(!pump.take());
    }

    #[test]
    fn test_subscription_dispose_is_idempotent() {
        let calls = Rc::new(Cell::new(0));
        let seen = calls.clone();
        let mut subscription = Subscription::new(move || seen.set(seen.get() + 1));
        subscription.dispose();
        subscription.dispose();
        drop(subscription);
        assert_eq!(calls.get(), 1);
    }
}
