// Timer queue - Cancellable one-shot deadlines polled by the control loop
//
// Every engine owns one queue and cancels its outstanding handles on every
// state-changing call (pause, stop, seek, re-entrant play). Cancellation is
// synchronous removal: once `cancel` returns, the handle can never be
// yielded by `pop_due`, so a stale deadline cannot mutate state after a
// newer command already changed it.

/// Handle to a scheduled deadline
///
/// Ids are never reused within a queue's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerId(u64);

/// One-shot timer queue
#[derive(Debug, Default)]
pub struct TimerQueue {
    next_id: u64,
    pending: Vec<(TimerId, u64)>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a timer for an absolute deadline (ms)
    pub fn schedule_at(&mut self, deadline_ms: u64) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.pending.push((id, deadline_ms));
        id
    }

    /// Arm a timer `delay_ms` from `now_ms`
    pub fn schedule_after(&mut self, now_ms: u64, delay_ms: u64) -> TimerId {
        self.schedule_at(now_ms + delay_ms)
    }

    /// Cancel a pending timer; returns false if it already fired or was
    /// cancelled before
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|(pending_id, _)| *pending_id != id);
        self.pending.len() != before
    }

    /// Cancel everything
    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    /// Remove and return the earliest due timer, if any
    ///
    /// Call in a loop to drain all deadlines that have passed.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<TimerId> {
        let idx = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, (_, deadline))| *deadline <= now_ms)
            .min_by_key(|(_, (_, deadline))| *deadline)
            .map(|(idx, _)| idx)?;

        Some(self.pending.swap_remove(idx).0)
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.pending.iter().any(|(pending_id, _)| *pending_id == id)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fire_order() {
        let mut timers = TimerQueue::new();
        let late = timers.schedule_at(500);
        let early = timers.schedule_at(200);

        assert_eq!(timers.pop_due(100), None);
        assert_eq!(timers.pop_due(500), Some(early));
        assert_eq!(timers.pop_due(500), Some(late));
        assert_eq!(timers.pop_due(500), None);
    }

    #[test]
    fn test_schedule_after() {
        let mut timers = TimerQueue::new();
        let id = timers.schedule_after(1000, 250);

        assert_eq!(timers.pop_due(1249), None);
        assert_eq!(timers.pop_due(1250), Some(id));
    }

    #[test]
    fn test_cancel_is_synchronous() {
        let mut timers = TimerQueue::new();
        let id = timers.schedule_at(200);

        assert!(timers.cancel(id));
        // Fast-forward well past the original deadline: nothing fires
        assert_eq!(timers.pop_due(10_000), None);
        assert!(!timers.cancel(id));
    }

    #[test]
    fn test_cancel_after_fire() {
        let mut timers = TimerQueue::new();
        let id = timers.schedule_at(200);

        assert_eq!(timers.pop_due(200), Some(id));
        assert!(!timers.cancel(id));
        assert!(!timers.is_pending(id));
    }

    #[test]
    fn test_ids_not_reused() {
        let mut timers = TimerQueue::new();
        let a = timers.schedule_at(100);
        timers.pop_due(100);
        let b = timers.schedule_at(100);
        assert_ne!(a, b);
    }

    #[test]
    fn test_cancel_all() {
        let mut timers = TimerQueue::new();
        timers.schedule_at(100);
        timers.schedule_at(200);

        timers.cancel_all();
        assert_eq!(timers.pending_count(), 0);
        assert_eq!(timers.pop_due(1000), None);
    }
}
