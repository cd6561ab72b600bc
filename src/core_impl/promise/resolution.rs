use super::*;

impl Runtime {
    /// Settles `promise` from `value`, adopting it when it is a thenable.
    pub(crate) fn promise_resolve(&mut self, promise: &Promise, value: Value) {
        if !promise.is_pending() {
            return;
        }

        match value {
            Value::Promise(other) if other == *promise => {
                self.trace_promise_line(format!(
                    "[promise] cyclic resolution id={}",
                    promise.id()
                ));
                self.promise_reject(promise, Error::CyclicResolution.into_reason());
            }
            Value::Promise(source) => {
                self.enqueue_microtask(ScheduledMicrotask::AdoptPromise {
                    target: promise.clone(),
                    source,
                });
            }
            Value::Thenable(thenable) => {
                self.enqueue_microtask(ScheduledMicrotask::AdoptThenable {
                    target: promise.clone(),
                    thenable,
                });
            }
            value => self.promise_fulfill(promise, value),
        }
    }

    /// Chains `target` to `source`. Rejects instead when `source` is already waiting,
    /// directly or through other promises, on `target`.
    pub(crate) fn run_adopt_promise(&mut self, target: Promise, source: Promise) {
        if source.adoption_chain_reaches(&target) {
            self.trace_promise_line(format!(
                "[promise] cyclic adoption id={} from={}",
                target.id(),
                source.id()
            ));
            self.promise_reject(&target, Error::CyclicResolution.into_reason());
            return;
        }
        target.0.borrow_mut().adopting = Some(source.clone());
        self.trace_promise_line(format!(
            "[promise] adopt id={} from={}",
            target.id(),
            source.id()
        ));
        self.promise_add_reaction(&source, PromiseReactionKind::ResolveTo { target });
    }

    pub(crate) fn run_adopt_thenable(&mut self, target: Promise, thenable: Rc<dyn Thenable>) {
        let (resolve, reject) = Self::new_promise_capability_functions(&target);
        if let Err(err) = thenable.then(self, resolve, reject.clone()) {
            self.trace_promise_line(format!(
                "[promise] thenable threw id={} spent={}",
                target.id(),
                reject.is_spent()
            ));
            reject.call(self, err.into_reason());
        }
    }
}
