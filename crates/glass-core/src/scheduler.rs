//! Single-slot, cancel-and-replace scheduling of recomputes and notifications.
//!
//! Recomputes are bound to the next frame only. The host's frame source owns
//! the actual callback mechanism (animation frame, timer tick, manual pump);
//! the engine only keeps the token of the one task it still wants.

use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameToken(pub u64);

/// Host capability to run work on the next frame or after a delay.
///
/// When a requested task fires, the host hands the token back to the engine
/// (`GlassEffect::on_frame` / `GlassEffect::on_timer`). Cancelled tokens must
/// not be handed back, but the engine ignores stale ones anyway.
pub trait FrameSource {
    fn request_frame(&mut self) -> FrameToken;
    fn cancel_frame(&mut self, token: FrameToken);
    fn request_timer(&mut self, delay: Duration) -> FrameToken;
    fn cancel_timer(&mut self, token: FrameToken);
}

/// At most one pending task; newer work replaces older work.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TaskSlot {
    pending: Option<FrameToken>,
}

impl TaskSlot {
    /// Store `token`, returning the one it replaces.
    #[inline]
    pub fn replace(&mut self, token: FrameToken) -> Option<FrameToken> {
        self.pending.replace(token)
    }

    /// Consume the slot if `token` is the pending one.
    #[inline]
    pub fn fire(&mut self, token: FrameToken) -> bool {
        if self.pending == Some(token) {
            self.pending = None;
            true
        } else {
            false
        }
    }

    #[inline]
    pub fn take(&mut self) -> Option<FrameToken> {
        self.pending.take()
    }

    #[inline]
    pub fn pending(&self) -> Option<FrameToken> {
        self.pending
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

/// Coalesces recompute requests into one per frame.
#[derive(Clone, Copy, Debug, Default)]
pub struct UpdateScheduler {
    slot: TaskSlot,
}

impl UpdateScheduler {
    pub fn schedule(&mut self, frames: &mut dyn FrameSource) -> FrameToken {
        if let Some(stale) = self.slot.take() {
            frames.cancel_frame(stale);
        }
        let token = frames.request_frame();
        self.slot.replace(token);
        log::trace!("[scheduler] frame {:?} requested", token);
        token
    }

    #[inline]
    pub fn fire(&mut self, token: FrameToken) -> bool {
        self.slot.fire(token)
    }

    pub fn cancel(&mut self, frames: &mut dyn FrameSource) {
        if let Some(stale) = self.slot.take() {
            frames.cancel_frame(stale);
        }
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        self.slot.is_pending()
    }
}

/// Trailing-edge debounce of a value through the host timer.
#[derive(Clone, Debug)]
pub struct Debouncer<T> {
    slot: TaskSlot,
    value: Option<T>,
}

impl<T> Default for Debouncer<T> {
    fn default() -> Self {
        Self {
            slot: TaskSlot::default(),
            value: None,
        }
    }
}

impl<T> Debouncer<T> {
    pub fn push(&mut self, value: T, delay: Duration, frames: &mut dyn FrameSource) -> FrameToken {
        if let Some(stale) = self.slot.take() {
            frames.cancel_timer(stale);
        }
        let token = frames.request_timer(delay);
        self.slot.replace(token);
        self.value = Some(value);
        token
    }

    /// The settled value if `token` is the live timer.
    pub fn fire(&mut self, token: FrameToken) -> Option<T> {
        if self.slot.fire(token) {
            self.value.take()
        } else {
            None
        }
    }

    pub fn cancel(&mut self, frames: &mut dyn FrameSource) {
        if let Some(stale) = self.slot.take() {
            frames.cancel_timer(stale);
        }
        self.value = None;
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        self.slot.is_pending()
    }
}

/// Deterministic frame source pumped by the caller.
///
/// Used by headless hosts (pumped from a fixed timer tick) and by tests.
#[derive(Clone, Debug, Default)]
pub struct ManualFrames {
    next: u64,
    now: Duration,
    frames: Vec<FrameToken>,
    timers: BTreeMap<FrameToken, Duration>,
    requested: u64,
    cancelled: u64,
}

impl ManualFrames {
    pub fn new() -> Self {
        Self::default()
    }

    fn token(&mut self) -> FrameToken {
        self.next += 1;
        FrameToken(self.next)
    }

    /// Frames requested and not cancelled, oldest first, emptying the queue.
    pub fn take_frames(&mut self) -> Vec<FrameToken> {
        std::mem::take(&mut self.frames)
    }

    pub fn pending_frames(&self) -> usize {
        self.frames.len()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Advance the clock and return the timers that came due, in due order.
    pub fn advance(&mut self, by: Duration) -> Vec<FrameToken> {
        self.now += by;
        let now = self.now;
        let mut due: Vec<(Duration, FrameToken)> = self
            .timers
            .iter()
            .filter(|(_, at)| **at <= now)
            .map(|(token, at)| (*at, *token))
            .collect();
        due.sort();
        for (_, token) in &due {
            self.timers.remove(token);
        }
        due.into_iter().map(|(_, token)| token).collect()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    /// Total frame requests so far.
    pub fn requested(&self) -> u64 {
        self.requested
    }

    /// Total frame cancellations so far.
    pub fn cancelled(&self) -> u64 {
        self.cancelled
    }
}

impl FrameSource for ManualFrames {
    fn request_frame(&mut self) -> FrameToken {
        let token = self.token();
        self.frames.push(token);
        self.requested += 1;
        token
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        let before = self.frames.len();
        self.frames.retain(|t| *t != token);
        if self.frames.len() != before {
            self.cancelled += 1;
        }
    }

    fn request_timer(&mut self, delay: Duration) -> FrameToken {
        let token = self.token();
        self.timers.insert(token, self.now + delay);
        token
    }

    fn cancel_timer(&mut self, token: FrameToken) {
        self.timers.remove(&token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_replaces_pending_frame() {
        let mut frames = ManualFrames::new();
        let mut scheduler = UpdateScheduler::default();
        let a = scheduler.schedule(&mut frames);
        let b = scheduler.schedule(&mut frames);
        let c = scheduler.schedule(&mut frames);
        assert_eq!(frames.take_frames(), vec![c]);
        assert_eq!(frames.cancelled(), 2);
        assert!(!scheduler.fire(a));
        assert!(!scheduler.fire(b));
        assert!(scheduler.fire(c));
        assert!(!scheduler.fire(c));
    }

    #[test]
    fn cancel_clears_slot() {
        let mut frames = ManualFrames::new();
        let mut scheduler = UpdateScheduler::default();
        let a = scheduler.schedule(&mut frames);
        scheduler.cancel(&mut frames);
        assert!(!scheduler.is_pending());
        assert_eq!(frames.pending_frames(), 0);
        assert!(!scheduler.fire(a));
    }

    #[test]
    fn debouncer_delivers_last_value_once() {
        let mut frames = ManualFrames::new();
        let mut debounce = Debouncer::default();
        debounce.push(1, Duration::from_millis(30), &mut frames);
        frames.advance(Duration::from_millis(10));
        debounce.push(2, Duration::from_millis(30), &mut frames);
        assert!(frames.advance(Duration::from_millis(25)).is_empty());
        let due = frames.advance(Duration::from_millis(5));
        assert_eq!(due.len(), 1);
        assert_eq!(debounce.fire(due[0]), Some(2));
        assert_eq!(debounce.fire(due[0]), None);
    }

    #[test]
    fn zero_delay_timer_is_due_immediately() {
        let mut frames = ManualFrames::new();
        let t = frames.request_timer(Duration::ZERO);
        assert_eq!(frames.advance(Duration::ZERO), vec![t]);
    }
}
