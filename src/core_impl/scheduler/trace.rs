use super::*;

impl Runtime {
    pub fn enable_trace(&mut self, enabled: bool) {
        self.trace_state.enabled = enabled;
    }

    pub fn take_trace_logs(&mut self) -> Vec<String> {
        self.trace_state.logs.drain(..).collect()
    }

    pub fn set_trace_promises(&mut self, enabled: bool) {
        self.trace_state.promises = enabled;
    }

    pub fn set_trace_microtasks(&mut self, enabled: bool) {
        self.trace_state.microtasks = enabled;
    }

    pub fn set_trace_timers(&mut self, enabled: bool) {
        self.trace_state.timers = enabled;
    }

    pub fn set_trace_log_limit(&mut self, max_entries: usize) -> Result<()> {
        if max_entries == 0 {
            return Err(Error::InvalidConfig(
                "set_trace_log_limit requires at least 1 entry".into(),
            ));
        }
        self.trace_state.log_limit = max_entries;
        while self.trace_state.logs.len() > self.trace_state.log_limit {
            self.trace_state.logs.pop_front();
        }
        Ok(())
    }

    pub(crate) fn trace_promise_line(&mut self, line: String) {
        if self.trace_state.enabled && self.trace_state.promises {
            self.trace_line(line);
        }
    }

    pub(crate) fn trace_microtask_line(&mut self, line: String) {
        if self.trace_state.enabled && self.trace_state.microtasks {
            self.trace_line(line);
        }
    }

    pub(crate) fn trace_timer_line(&mut self, line: String) {
        if self.trace_state.enabled && self.trace_state.timers {
            self.trace_line(line);
        }
    }

    fn trace_line(&mut self, line: String) {
        tracing::debug!(target: "settle_engine", "{line}");
        if self.trace_state.logs.len() >= self.trace_state.log_limit {
            self.trace_state.logs.pop_front();
        }
        self.trace_state.logs.push_back(line);
    }
}
