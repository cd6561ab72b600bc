use super::*;

pub(crate) type TaskCallback = Box<dyn FnOnce(&mut Runtime) -> Result<()>>;

pub(crate) struct ScheduledTask {
    pub(crate) id: i64,
    pub(crate) due_at: i64,
    pub(crate) callback: TaskCallback,
}

pub(crate) enum ScheduledMicrotask {
    Callback(TaskCallback),
    Promise {
        reaction: PromiseReactionKind,
        settled: Settled,
    },
    AdoptPromise {
        target: Promise,
        source: Promise,
    },
    AdoptThenable {
        target: Promise,
        thenable: Rc<dyn Thenable>,
    },
}

impl ScheduledMicrotask {
    pub(crate) fn label(&self) -> &'static str {
        match self {
            Self::Callback(_) => "callback",
            Self::Promise { .. } => "reaction",
            Self::AdoptPromise { .. } => "adopt_promise",
            Self::AdoptThenable { .. } => "adopt_thenable",
        }
    }
}

#[derive(Debug)]
pub(crate) struct TraceState {
    pub(crate) enabled: bool,
    pub(crate) promises: bool,
    pub(crate) microtasks: bool,
    pub(crate) timers: bool,
    pub(crate) logs: VecDeque<String>,
    pub(crate) log_limit: usize,
}

impl Default for TraceState {
    fn default() -> Self {
        Self {
            enabled: false,
            promises: true,
            microtasks: true,
            timers: true,
            logs: VecDeque::new(),
            log_limit: 10_000,
        }
    }
}

#[derive(Debug)]
pub(crate) struct PromiseRuntimeState {
    pub(crate) next_promise_id: usize,
    // Rejected before any handler was attached; re-checked when a drain completes.
    pub(crate) pending_rejections: Vec<Promise>,
    pub(crate) unhandled_rejections: Vec<UnhandledRejection>,
}

impl Default for PromiseRuntimeState {
    fn default() -> Self {
        Self {
            next_promise_id: 1,
            pending_rejections: Vec::new(),
            unhandled_rejections: Vec::new(),
        }
    }
}

impl PromiseRuntimeState {
    pub(crate) fn allocate_promise_id(&mut self) -> usize {
        let id = self.next_promise_id;
        self.next_promise_id = self.next_promise_id.saturating_add(1);
        id
    }
}

pub(crate) struct SchedulerState {
    // Sorted by due time; ties keep scheduling order.
    pub(crate) task_queue: VecDeque<ScheduledTask>,
    pub(crate) microtask_queue: VecDeque<ScheduledMicrotask>,
    pub(crate) now_ms: i64,
    // Unbounded unless a host opts in.
    pub(crate) microtask_step_limit: Option<usize>,
    pub(crate) timer_step_limit: usize,
    pub(crate) next_timer_id: i64,
    pub(crate) task_depth: usize,
    pub(crate) draining: bool,
}

impl Default for SchedulerState {
    fn default() -> Self {
        Self {
            task_queue: VecDeque::new(),
            microtask_queue: VecDeque::new(),
            now_ms: 0,
            microtask_step_limit: None,
            timer_step_limit: 10_000,
            next_timer_id: 1,
            task_depth: 0,
            draining: false,
        }
    }
}

impl SchedulerState {
    pub(crate) fn allocate_timer_id(&mut self) -> i64 {
        let id = self.next_timer_id;
        self.next_timer_id += 1;
        id
    }
}
