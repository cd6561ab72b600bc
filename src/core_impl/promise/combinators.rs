use super::*;

impl Runtime {
    /// Returns `value` itself when it is already a promise; otherwise a new promise resolved
    /// with it.
    pub fn resolve(&mut self, value: Value) -> Promise {
        self.promise_resolve_value_as_promise(value)
    }

    /// A promise rejected with `reason` as-is, even when `reason` is a thenable.
    pub fn reject(&mut self, reason: Value) -> Promise {
        let promise = self.new_pending_promise();
        self.promise_reject(&promise, reason);
        promise
    }

    /// Fulfills with every input's value in input order, or rejects with the first rejection.
    pub fn all(&mut self, inputs: Vec<Value>) -> Promise {
        let result = self.new_pending_promise();
        if inputs.is_empty() {
            self.promise_fulfill(&result, Value::array(Vec::new()));
            return result;
        }

        let state = Rc::new(RefCell::new(PromiseAllState {
            result: result.clone(),
            remaining: inputs.len(),
            values: vec![None; inputs.len()],
            settled: false,
        }));

        for (index, value) in inputs.into_iter().enumerate() {
            let promise = self.promise_resolve_value_as_promise(value);
            self.promise_add_reaction(
                &promise,
                PromiseReactionKind::All {
                    state: state.clone(),
                    index,
                },
            );
        }

        result
    }

    /// Settles like whichever input settles first. Stays pending for an empty input.
    pub fn race(&mut self, inputs: Vec<Value>) -> Promise {
        let result = self.new_pending_promise();
        if inputs.is_empty() {
            return result;
        }

        let state = Rc::new(RefCell::new(PromiseRaceState {
            result: result.clone(),
            settled: false,
        }));

        for value in inputs {
            let promise = self.promise_resolve_value_as_promise(value);
            self.promise_add_reaction(
                &promise,
                PromiseReactionKind::Race {
                    state: state.clone(),
                },
            );
        }

        result
    }

    pub(crate) fn promise_resolve_value_as_promise(&mut self, value: Value) -> Promise {
        if let Value::Promise(promise) = value {
            return promise;
        }
        let promise = self.new_pending_promise();
        self.promise_resolve(&promise, value);
        promise
    }
}
