/// Handle to a deferred task. Cancelling through a stale handle is a no-op.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(in crate::app) struct TaskHandle(u64);

struct Scheduled<T> {
    handle: TaskHandle,
    due_at: f64,
    task: T,
}

/// One-shot tasks keyed to frame time, owned by a single view.
///
/// Nothing runs on its own: the owner drains due tasks once per frame with
/// [`Scheduler::take_due`], so dropping or clearing the scheduler is enough to
/// guarantee a cancelled task never fires.
pub(in crate::app) struct Scheduler<T> {
    next_id: u64,
    pending: Vec<Scheduled<T>>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            pending: Vec::new(),
        }
    }
}

impl<T> Scheduler<T> {
    pub(in crate::app) fn schedule(&mut self, due_at: f64, task: T) -> TaskHandle {
        self.next_id += 1;
        let handle = TaskHandle(self.next_id);
        self.pending.push(Scheduled {
            handle,
            due_at,
            task,
        });
        handle
    }

    pub(in crate::app) fn cancel(&mut self, handle: TaskHandle) -> bool {
        let before = self.pending.len();
        self.pending.retain(|scheduled| scheduled.handle != handle);
        self.pending.len() != before
    }

    pub(in crate::app) fn cancel_all(&mut self) -> usize {
        let cancelled = self.pending.len();
        self.pending.clear();
        cancelled
    }

    pub(in crate::app) fn is_pending(&self, handle: TaskHandle) -> bool {
        self.pending
            .iter()
            .any(|scheduled| scheduled.handle == handle)
    }

    pub(in crate::app) fn len(&self) -> usize {
        self.pending.len()
    }

    pub(in crate::app) fn next_due(&self) -> Option<f64> {
        self.pending
            .iter()
            .map(|scheduled| scheduled.due_at)
            .min_by(f64::total_cmp)
    }

    /// Removes and returns every task due at or before `now`, oldest first.
    pub(in crate::app) fn take_due(&mut self, now: f64) -> Vec<(TaskHandle, T)> {
        let mut due = Vec::new();
        let mut index = 0;
        while index < self.pending.len() {
            if self.pending[index].due_at <= now {
                let scheduled = self.pending.remove(index);
                due.push((scheduled.due_at, scheduled.handle, scheduled.task));
            } else {
                index += 1;
            }
        }
        due.sort_by(|a, b| a.0.total_cmp(&b.0));
        due.into_iter()
            .map(|(_, handle, task)| (handle, task))
            .collect()
    }
}
