use super::*;

impl Runtime {
    pub fn queue_microtask<F>(&mut self, task: F)
    where
        F: FnOnce(&mut Runtime) -> Result<()> + 'static,
    {
        self.enqueue_microtask(ScheduledMicrotask::Callback(Box::new(task)));
    }

    pub fn pending_microtasks(&self) -> usize {
        self.scheduler.microtask_queue.len()
    }

    /// Drains the microtask queue, including work queued while draining.
    ///
    /// A call made while a drain is already in progress returns `Ok(0)`: its work is picked
    /// up by the running drain. Returns the number of microtasks run.
    pub fn run_microtasks(&mut self) -> Result<usize> {
        if self.scheduler.draining {
            return Ok(0);
        }
        self.scheduler.draining = true;
        let run_result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            self.drain_microtask_queue()
        }));
        self.scheduler.draining = false;
        let steps = match run_result {
            Ok(result) => result?,
            Err(payload) => std::panic::resume_unwind(payload),
        };
        if steps > 0 {
            self.trace_microtask_line(format!("[microtask] drain steps={steps}"));
        }
        self.report_unhandled_rejections();
        Ok(steps)
    }

    pub(crate) fn enqueue_microtask(&mut self, task: ScheduledMicrotask) {
        self.trace_microtask_line(format!(
            "[microtask] enqueue kind={} queued={}",
            task.label(),
            self.scheduler.microtask_queue.len() + 1
        ));
        self.scheduler.microtask_queue.push_back(task);
    }

    pub(crate) fn queue_promise_reaction_microtask(
        &mut self,
        reaction: PromiseReactionKind,
        settled: Settled,
    ) {
        self.enqueue_microtask(ScheduledMicrotask::Promise { reaction, settled });
    }

    fn drain_microtask_queue(&mut self) -> Result<usize> {
        let mut steps = 0usize;
        while let Some(task) = self.scheduler.microtask_queue.pop_front() {
            let exhausted = self
                .scheduler
                .microtask_step_limit
                .filter(|limit| steps >= *limit);
            if let Some(limit) = exhausted {
                self.scheduler.microtask_queue.push_front(task);
                return Err(Error::MicrotaskStepLimit {
                    limit,
                    pending: self.scheduler.microtask_queue.len(),
                });
            }
            steps += 1;

            match task {
                ScheduledMicrotask::Callback(callback) => callback(self)?,
                ScheduledMicrotask::Promise { reaction, settled } => {
                    self.run_promise_reaction_task(reaction, settled);
                }
                ScheduledMicrotask::AdoptPromise { target, source } => {
                    self.run_adopt_promise(target, source);
                }
                ScheduledMicrotask::AdoptThenable { target, thenable } => {
                    self.run_adopt_thenable(target, thenable);
                }
            }
        }
        Ok(steps)
    }
}
