use super::*;

impl Runtime {
    pub fn now_ms(&self) -> i64 {
        self.scheduler.now_ms
    }

    /// Schedules `callback` to run as a task once the fake clock reaches `now + delay_ms`.
    ///
    /// Timers due at the same instant run in the order they were scheduled.
    pub fn set_timeout<F>(&mut self, delay_ms: i64, callback: F) -> i64
    where
        F: FnOnce(&mut Runtime) -> Result<()> + 'static,
    {
        let due_at = self.scheduler.now_ms.saturating_add(delay_ms.max(0));
        let id = self.scheduler.allocate_timer_id();
        let slot = self
            .scheduler
            .task_queue
            .partition_point(|task| task.due_at <= due_at);
        self.scheduler.task_queue.insert(
            slot,
            ScheduledTask {
                id,
                due_at,
                callback: Box::new(callback),
            },
        );
        self.trace_timer_line(format!("[timer] set id={id} due_at={due_at}"));
        id
    }

    pub fn clear_timer(&mut self, timer_id: i64) -> bool {
        let Some(slot) = self
            .scheduler
            .task_queue
            .iter()
            .position(|task| task.id == timer_id)
        else {
            return false;
        };
        self.scheduler.task_queue.remove(slot);
        self.trace_timer_line(format!("[timer] cleared id={timer_id}"));
        true
    }

    /// Moves the clock forward by `delta_ms`, firing every timer that falls due on the way.
    ///
    /// Each timer runs as its own task, so the microtasks it queues drain before the next
    /// timer fires. Timers scheduled meanwhile fire too if they fall inside the window.
    /// Returns how many timers ran.
    pub fn advance_time(&mut self, delta_ms: i64) -> Result<usize> {
        if delta_ms < 0 {
            return Err(Error::InvalidConfig(format!(
                "advance_time requires non-negative milliseconds, got {delta_ms}"
            )));
        }
        let deadline = self.scheduler.now_ms.saturating_add(delta_ms);
        let mut fired = 0usize;
        while let Some(task) = self.pop_timer_due_by(deadline) {
            if fired == self.scheduler.timer_step_limit {
                self.scheduler.task_queue.push_front(task);
                return Err(Error::TimerStepLimit {
                    limit: self.scheduler.timer_step_limit,
                    now_ms: self.scheduler.now_ms,
                    pending: self.scheduler.task_queue.len(),
                });
            }
            fired += 1;
            self.scheduler.now_ms = self.scheduler.now_ms.max(task.due_at);
            self.trace_timer_line(format!(
                "[timer] fire id={} now_ms={}",
                task.id, self.scheduler.now_ms
            ));
            self.run_in_task_context(task.callback)?;
        }
        self.scheduler.now_ms = deadline;
        Ok(fired)
    }

    fn pop_timer_due_by(&mut self, deadline: i64) -> Option<ScheduledTask> {
        let next_due = self.scheduler.task_queue.front()?.due_at;
        if next_due > deadline {
            return None;
        }
        self.scheduler.task_queue.pop_front()
    }
}
