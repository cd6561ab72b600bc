use super::*;

mod microtasks;
mod timers;
mod trace;

impl Runtime {
    /// Runs `task` synchronously as a task; once the outermost task returns, the microtask
    /// queue is drained before control comes back to the caller.
    pub fn run<T>(&mut self, task: impl FnOnce(&mut Runtime) -> Result<T>) -> Result<T> {
        self.run_in_task_context(task)
    }

    /// Caps how many microtasks one drain may run. Drains are unbounded by default.
    pub fn set_microtask_step_limit(&mut self, max_steps: usize) -> Result<()> {
        if max_steps == 0 {
            return Err(Error::InvalidConfig(
                "set_microtask_step_limit requires at least 1 step".into(),
            ));
        }
        self.scheduler.microtask_step_limit = Some(max_steps);
        Ok(())
    }

    pub fn clear_microtask_step_limit(&mut self) {
        self.scheduler.microtask_step_limit = None;
    }

    pub fn set_timer_step_limit(&mut self, max_steps: usize) -> Result<()> {
        if max_steps == 0 {
            return Err(Error::InvalidConfig(
                "set_timer_step_limit requires at least 1 step".into(),
            ));
        }
        self.scheduler.timer_step_limit = max_steps;
        Ok(())
    }

    fn with_task_depth<T>(&mut self, run: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.scheduler.task_depth += 1;
        let run_result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| run(self)));
        self.scheduler.task_depth = self.scheduler.task_depth.saturating_sub(1);
        match run_result {
            Ok(result) => result,
            Err(payload) => std::panic::resume_unwind(payload),
        }
    }

    pub(crate) fn run_in_task_context<T>(
        &mut self,
        run: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        let result = self.with_task_depth(run);
        let flushed = if self.scheduler.task_depth == 0 {
            self.run_microtasks().map(|_| ())
        } else {
            Ok(())
        };
        let value = result?;
        flushed?;
        Ok(value)
    }
}
