use super::*;

mod combinators;
mod reactions;
mod resolution;

impl Runtime {
    /// Creates a promise and runs `executor` synchronously with its resolver pair.
    ///
    /// An `Err` from the executor rejects the promise unless it was already resolved.
    pub fn new_promise<F>(&mut self, executor: F) -> Promise
    where
        F: FnOnce(&mut Runtime, Resolver, Resolver) -> Result<()>,
    {
        let promise = self.new_pending_promise();
        let (resolve, reject) = Self::new_promise_capability_functions(&promise);
        if let Err(err) = executor(self, resolve, reject.clone()) {
            self.trace_promise_line(format!(
                "[promise] executor threw id={} spent={}",
                promise.id(),
                reject.is_spent()
            ));
            reject.call(self, err.into_reason());
        }
        promise
    }

    /// A pending promise together with the resolvers that settle it.
    pub fn with_resolvers(&mut self) -> PromiseWithResolvers {
        let promise = self.new_pending_promise();
        let (resolve, reject) = Self::new_promise_capability_functions(&promise);
        PromiseWithResolvers {
            promise,
            resolve,
            reject,
        }
    }

    pub fn then(
        &mut self,
        promise: &Promise,
        on_fulfilled: Option<Handler>,
        on_rejected: Option<Handler>,
    ) -> Promise {
        let result = self.new_pending_promise();
        self.promise_add_reaction(
            promise,
            PromiseReactionKind::Then {
                on_fulfilled,
                on_rejected,
                result: result.clone(),
            },
        );
        result
    }

    pub fn catch(&mut self, promise: &Promise, on_rejected: Handler) -> Promise {
        self.then(promise, None, Some(on_rejected))
    }

    /// Runs `callback` on either outcome; the result mirrors `promise` unless the callback
    /// fails or returns a thenable that rejects.
    pub fn finally(&mut self, promise: &Promise, callback: Option<FinallyHandler>) -> Promise {
        let result = self.new_pending_promise();
        self.promise_add_reaction(
            promise,
            PromiseReactionKind::Finally {
                callback,
                result: result.clone(),
            },
        );
        result
    }

    /// Rejections that had no handler attached when the microtask drain that followed them
    /// finished.
    pub fn take_unhandled_rejections(&mut self) -> Vec<UnhandledRejection> {
        std::mem::take(&mut self.promise_runtime.unhandled_rejections)
    }

    pub(crate) fn new_pending_promise(&mut self) -> Promise {
        let id = self.promise_runtime.allocate_promise_id();
        self.trace_promise_line(format!("[promise] create id={id}"));
        Promise(Rc::new(RefCell::new(PromiseValue {
            id,
            state: PromiseState::Pending,
            reactions: Vec::new(),
            handled: false,
            adopting: None,
        })))
    }

    pub(crate) fn new_promise_capability_functions(promise: &Promise) -> (Resolver, Resolver) {
        let already_resolved = Rc::new(Cell::new(false));
        let resolve = Resolver {
            promise: promise.clone(),
            reject: false,
            already_resolved: already_resolved.clone(),
        };
        let reject = Resolver {
            promise: promise.clone(),
            reject: true,
            already_resolved,
        };
        (resolve, reject)
    }

    pub(crate) fn promise_add_reaction(&mut self, promise: &Promise, kind: PromiseReactionKind) {
        let settled = {
            let mut promise_ref = promise.0.borrow_mut();
            promise_ref.handled = true;
            if matches!(promise_ref.state, PromiseState::Pending) {
                promise_ref.reactions.push(PromiseReaction { kind });
                return;
            }
            match &promise_ref.state {
                PromiseState::Pending => return,
                PromiseState::Fulfilled(value) => Settled::Fulfilled(value.clone()),
                PromiseState::Rejected(reason) => Settled::Rejected(reason.clone()),
            }
        };
        self.queue_promise_reaction_microtask(kind, settled);
    }

    pub(crate) fn promise_fulfill(&mut self, promise: &Promise, value: Value) {
        let (id, reactions) = {
            let mut promise_ref = promise.0.borrow_mut();
            if !matches!(promise_ref.state, PromiseState::Pending) {
                return;
            }
            promise_ref.state = PromiseState::Fulfilled(value.clone());
            promise_ref.adopting = None;
            (promise_ref.id, std::mem::take(&mut promise_ref.reactions))
        };
        self.trace_promise_line(format!(
            "[promise] fulfill id={id} reactions={}",
            reactions.len()
        ));
        for reaction in reactions {
            self.queue_promise_reaction_microtask(reaction.kind, Settled::Fulfilled(value.clone()));
        }
    }

    pub(crate) fn promise_reject(&mut self, promise: &Promise, reason: Value) {
        let (id, handled, reactions) = {
            let mut promise_ref = promise.0.borrow_mut();
            if !matches!(promise_ref.state, PromiseState::Pending) {
                return;
            }
            promise_ref.state = PromiseState::Rejected(reason.clone());
            promise_ref.adopting = None;
            (
                promise_ref.id,
                promise_ref.handled,
                std::mem::take(&mut promise_ref.reactions),
            )
        };
        self.trace_promise_line(format!(
            "[promise] reject id={id} reactions={} handled={handled}",
            reactions.len()
        ));
        if !handled {
            self.promise_runtime.pending_rejections.push(promise.clone());
        }
        for reaction in reactions {
            self.queue_promise_reaction_microtask(reaction.kind, Settled::Rejected(reason.clone()));
        }
    }

    pub(crate) fn report_unhandled_rejections(&mut self) {
        let pending = std::mem::take(&mut self.promise_runtime.pending_rejections);
        for promise in pending {
            let reason = {
                let promise_ref = promise.0.borrow();
                match (&promise_ref.state, promise_ref.handled) {
                    (PromiseState::Rejected(reason), false) => reason.clone(),
                    _ => continue,
                }
            };
            self.trace_promise_line(format!(
                "[promise] unhandled rejection id={} reason={reason}",
                promise.id()
            ));
            self.promise_runtime
                .unhandled_rejections
                .push(UnhandledRejection { promise, reason });
        }
    }
}
