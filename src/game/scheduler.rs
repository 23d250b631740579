//! Virtual-clock timer queue.
//!
//! The host page owns real time and reports it through `/api/tick`. Each
//! component owns one `Scheduler`, so tearing the component down drops every
//! task it still had pending.
//!
//! Tasks fire in `(due, sequence)` order. While a task is being handled the
//! clock reads its due time, so follow-up tasks are scheduled relative to when
//! the previous one was *due*, not when the host happened to tick. A single
//! late tick therefore replays a timer chain exactly as if it had been
//! ticked every millisecond.

use std::collections::BTreeMap;

/// Handle returned by [`Scheduler::schedule`], usable with [`Scheduler::cancel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

#[derive(Debug, Clone)]
pub struct Scheduler<T> {
    now: u64,
    next_seq: u64,
    queue: BTreeMap<(u64, u64), T>,
}

impl<T> Scheduler<T> {
    /// Create a scheduler whose clock starts at `now`.
    pub fn starting_at(now: u64) -> Self {
        Self {
            now,
            next_seq: 0,
            queue: BTreeMap::new(),
        }
    }

    pub fn now(&self) -> u64 {
        self.now
    }

    /// Queue `task` to fire `delay_ms` after the current clock.
    pub fn schedule(&mut self, delay_ms: u64, task: T) -> TaskId {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.insert((self.now.saturating_add(delay_ms), seq), task);
        TaskId(seq)
    }

    /// Drop a pending task. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        let key = self.queue.keys().find(|(_, seq)| *seq == id.0).copied();
        match key {
            Some(key) => self.queue.remove(&key).is_some(),
            None => false,
        }
    }

    /// Drop every pending task.
    pub fn cancel_all(&mut self) {
        self.queue.clear();
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn is_idle(&self) -> bool {
        self.queue.is_empty()
    }

    /// Pop the earliest task due at or before `until`, moving the clock to
    /// its due time. Returns `None` once nothing else is due.
    pub fn pop_due(&mut self, until: u64) -> Option<T> {
        let (&(due, seq), _) = self.queue.first_key_value()?;
        if due > until {
            return None;
        }
        self.now = self.now.max(due);
        self.queue.remove(&(due, seq))
    }

    /// Move the clock forward to `until` after all due tasks were handled.
    /// The clock never goes backwards.
    pub fn settle(&mut self, until: u64) {
        self.now = self.now.max(until);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(s: &mut Scheduler<&'static str>, until: u64) -> Vec<&'static str> {
        let mut fired = Vec::new();
        while let Some(t) = s.pop_due(until) {
            fired.push(t);
        }
        s.settle(until);
        fired
    }

    #[test]
    fn fires_in_due_order() {
        let mut s = Scheduler::starting_at(0);
        s.schedule(30, "c");
        s.schedule(10, "a");
        s.schedule(20, "b");
        assert_eq!(drain(&mut s, 25), vec!["a", "b"]);
        assert_eq!(s.now(), 25);
        assert_eq!(drain(&mut s, 30), vec!["c"]);
        assert!(s.is_idle());
    }

    #[test]
    fn same_due_time_keeps_insertion_order() {
        let mut s = Scheduler::starting_at(100);
        s.schedule(5, "first");
        s.schedule(5, "second");
        assert_eq!(drain(&mut s, 105), vec!["first", "second"]);
    }

    #[test]
    fn chained_tasks_are_relative_to_due_time() {
        let mut s = Scheduler::starting_at(0);
        s.schedule(10, "a");
        // Host ticks late, at 1000.
        assert_eq!(s.pop_due(1000), Some("a"));
        assert_eq!(s.now(), 10);
        s.schedule(10, "b");
        assert_eq!(s.pop_due(1000), Some("b"));
        assert_eq!(s.now(), 20);
    }

    #[test]
    fn cancel_removes_single_task() {
        let mut s = Scheduler::starting_at(0);
        let a = s.schedule(10, "a");
        s.schedule(10, "b");
        assert!(s.cancel(a));
        assert!(!s.cancel(a));
        assert_eq!(drain(&mut s, 10), vec!["b"]);
    }

    #[test]
    fn cancel_all_discards_everything() {
        let mut s = Scheduler::starting_at(0);
        s.schedule(1, "a");
        s.schedule(2, "b");
        s.cancel_all();
        assert_eq!(s.pending(), 0);
        assert!(drain(&mut s, 100).is_empty());
    }

    #[test]
    fn clock_never_goes_backwards() {
        let mut s: Scheduler<&str> = Scheduler::starting_at(50);
        s.settle(10);
        assert_eq!(s.now(), 50);
    }
}
