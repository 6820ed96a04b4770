use std::time::Instant;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskKind {
    /// Feedback interval is over; move to the next cue.
    AdvanceAfterFeedback,
    /// Speak "The word is ..." for the current cue.
    AnnounceWord,
}

#[derive(Clone, Debug)]
pub struct ScheduledTask {
    /// Insertion sequence; breaks ties between tasks due at the same instant.
    seq: u64,
    pub kind: TaskKind,
    pub due: Instant,
}

/// Timers owned by a session. Nothing fires on its own: the owner calls
/// `take_due` from its tick, so cancelling is just removal.
#[derive(Debug, Default)]
pub struct Scheduler {
    next_seq: u64,
    tasks: Vec<ScheduledTask>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, kind: TaskKind, due: Instant) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.tasks.push(ScheduledTask { seq, kind, due });
    }

    pub fn cancel_kind(&mut self, kind: TaskKind) {
        self.tasks.retain(|t| t.kind != kind);
    }

    pub fn cancel_all(&mut self) {
        self.tasks.clear();
    }

    pub fn is_pending(&self, kind: TaskKind) -> bool {
        self.tasks.iter().any(|t| t.kind == kind)
    }

    /// Remove and return every task due at `now`, earliest first.
    pub fn take_due(&mut self, now: Instant) -> Vec<TaskKind> {
        let (mut due, pending): (Vec<ScheduledTask>, Vec<ScheduledTask>) =
            self.tasks.drain(..).partition(|t| t.due <= now);
        self.tasks = pending;
        due.sort_by_key(|t| (t.due, t.seq));
        due.into_iter().map(|t| t.kind).collect()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_nothing_due_before_deadline() {
        let t0 = Instant::now();
        let mut s = Scheduler::new();
        s.schedule(TaskKind::AdvanceAfterFeedback, t0 + Duration::from_millis(2400));
        assert!(s.take_due(t0 + Duration::from_millis(2399)).is_empty());
        assert_eq!(
            s.take_due(t0 + Duration::from_millis(2400)),
            vec![TaskKind::AdvanceAfterFeedback]
        );
        assert!(!s.is_pending(TaskKind::AdvanceAfterFeedback));
    }

    #[test]
    fn test_due_tasks_come_back_in_order() {
        let t0 = Instant::now();
        let mut s = Scheduler::new();
        s.schedule(TaskKind::AdvanceAfterFeedback, t0 + Duration::from_millis(500));
        s.schedule(TaskKind::AnnounceWord, t0 + Duration::from_millis(100));
        assert_eq!(
            s.take_due(t0 + Duration::from_secs(1)),
            vec![TaskKind::AnnounceWord, TaskKind::AdvanceAfterFeedback]
        );
    }

    #[test]
    fn test_same_instant_keeps_schedule_order() {
        let t0 = Instant::now();
        let mut s = Scheduler::new();
        s.schedule(TaskKind::AnnounceWord, t0);
        s.schedule(TaskKind::AdvanceAfterFeedback, t0);
        assert_eq!(
            s.take_due(t0),
            vec![TaskKind::AnnounceWord, TaskKind::AdvanceAfterFeedback]
        );
    }

    #[test]
    fn test_cancel_kind_and_all() {
        let t0 = Instant::now();
        let mut s = Scheduler::new();
        s.schedule(TaskKind::AnnounceWord, t0);
        s.schedule(TaskKind::AdvanceAfterFeedback, t0);
        s.cancel_kind(TaskKind::AnnounceWord);
        assert!(!s.is_pending(TaskKind::AnnounceWord));
        assert!(s.is_pending(TaskKind::AdvanceAfterFeedback));
        s.cancel_all();
        assert!(s.take_due(t0).is_empty());
    }
}
