//! Deterministic, single-threaded promise settlement engine.
//!
//! A [`Runtime`] owns a microtask queue, a fake-clock timer queue and the
//! promises created through it. Promises settle at most once, reactions run
//! only from the microtask queue, and thenables of any origin are adopted
//! through the [`Thenable`] capability.
//!
//! ```
//! use settle_engine::{Handler, Runtime, Settled, Value};
//!
//! let mut rt = Runtime::new();
//! let doubled = rt
//!     .run(|rt| {
//!         let source = rt.resolve(Value::Number(21));
//!         Ok(rt.then(
//!             &source,
//!             Some(Handler::new(|_, value| match value {
//!                 Value::Number(n) => Ok(Value::Number(n * 2)),
//!                 other => Ok(other),
//!             })),
//!             None,
//!         ))
//!     })
//!     .unwrap();
//! assert_eq!(doubled.settled(), Some(Settled::Fulfilled(Value::Number(42))));
//! ```

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

mod core_impl;
mod runtime_state;
mod runtime_values;

use runtime_state::*;

pub use runtime_values::{
    FinallyHandler, Handler, Promise, PromiseStatus, PromiseWithResolvers, Resolver, Settled,
    Thenable, UnhandledRejection, Value,
};

pub(crate) use runtime_values::{
    PromiseAllState, PromiseRaceState, PromiseReaction, PromiseReactionKind, PromiseState,
    PromiseValue,
};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// A value thrown by user code: an executor, handler, thenable, microtask or timer.
    #[error("uncaught exception: {0}")]
    Thrown(Value),
    #[error("TypeError: Chaining cycle detected for promise")]
    CyclicResolution,
    #[error("microtask drain exceeded max steps: limit={limit}, pending={pending}")]
    MicrotaskStepLimit { limit: usize, pending: usize },
    #[error("timer run exceeded max steps: limit={limit}, now_ms={now_ms}, pending={pending}")]
    TimerStepLimit {
        limit: usize,
        now_ms: i64,
        pending: usize,
    },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    pub fn thrown(value: impl Into<Value>) -> Self {
        Self::Thrown(value.into())
    }

    /// Converts the error into the reason a promise rejects with.
    pub fn into_reason(self) -> Value {
        match self {
            Self::Thrown(value) => value,
            other => Value::Error(Rc::new(other)),
        }
    }
}

/// An isolated engine instance: microtask queue, timers, tracing and promise bookkeeping.
///
/// Runtimes never share state, so drains of two runtimes cannot interleave.
pub struct Runtime {
    pub(crate) scheduler: SchedulerState,
    pub(crate) promise_runtime: PromiseRuntimeState,
    pub(crate) trace_state: TraceState,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime {
    pub fn new() -> Self {
        Self {
            scheduler: SchedulerState::default(),
            promise_runtime: PromiseRuntimeState::default(),
            trace_state: TraceState::default(),
        }
    }
}
