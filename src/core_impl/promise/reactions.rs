use super::*;

impl Runtime {
    pub(crate) fn run_promise_reaction_task(
        &mut self,
        reaction: PromiseReactionKind,
        settled: Settled,
    ) {
        match reaction {
            PromiseReactionKind::Then {
                on_fulfilled,
                on_rejected,
                result,
            } => match settled {
                Settled::Fulfilled(value) => match on_fulfilled {
                    Some(callback) => {
                        let outcome = callback.call(self, value);
                        self.settle_with_handler_outcome(&result, outcome);
                    }
                    None => self.promise_fulfill(&result, value),
                },
                Settled::Rejected(reason) => match on_rejected {
                    Some(callback) => {
                        let outcome = callback.call(self, reason);
                        self.settle_with_handler_outcome(&result, outcome);
                    }
                    None => self.promise_reject(&result, reason),
                },
            },
            PromiseReactionKind::Finally { callback, result } => {
                let Some(callback) = callback else {
                    self.settle_from(&result, settled);
                    return;
                };
                match callback.call(self) {
                    Ok(next) => {
                        let continuation = self.promise_resolve_value_as_promise(next);
                        self.promise_add_reaction(
                            &continuation,
                            PromiseReactionKind::FinallyContinuation {
                                original: settled,
                                result,
                            },
                        );
                    }
                    Err(err) => self.promise_reject(&result, err.into_reason()),
                }
            }
            PromiseReactionKind::FinallyContinuation { original, result } => match settled {
                Settled::Fulfilled(_) => self.settle_from(&result, original),
                Settled::Rejected(reason) => self.promise_reject(&result, reason),
            },
            PromiseReactionKind::ResolveTo { target } => match settled {
                Settled::Fulfilled(value) => self.promise_resolve(&target, value),
                Settled::Rejected(reason) => self.promise_reject(&target, reason),
            },
            PromiseReactionKind::All { state, index } => {
                let mut state_ref = state.borrow_mut();
                if state_ref.settled {
                    return;
                }
                match settled {
                    Settled::Fulfilled(value) => {
                        if state_ref.values[index].is_none() {
                            state_ref.values[index] = Some(value);
                            state_ref.remaining = state_ref.remaining.saturating_sub(1);
                        }
                        if state_ref.remaining == 0 {
                            state_ref.settled = true;
                            let result = state_ref.result.clone();
                            let values = state_ref
                                .values
                                .iter_mut()
                                .map(|value| value.take().unwrap_or(Value::Undefined))
                                .collect::<Vec<_>>();
                            drop(state_ref);
                            self.promise_fulfill(&result, Value::array(values));
                        }
                    }
                    Settled::Rejected(reason) => {
                        state_ref.settled = true;
                        let result = state_ref.result.clone();
                        drop(state_ref);
                        self.promise_reject(&result, reason);
                    }
                }
            }
            PromiseReactionKind::Race { state } => {
                let mut state_ref = state.borrow_mut();
                if state_ref.settled {
                    return;
                }
                state_ref.settled = true;
                let result = state_ref.result.clone();
                drop(state_ref);
                self.settle_from(&result, settled);
            }
        }
    }

    fn settle_with_handler_outcome(&mut self, result: &Promise, outcome: Result<Value>) {
        match outcome {
            Ok(next) => self.promise_resolve(result, next),
            Err(err) => self.promise_reject(result, err.into_reason()),
        }
    }

    fn settle_from(&mut self, result: &Promise, settled: Settled) {
        match settled {
            Settled::Fulfilled(value) => self.promise_fulfill(result, value),
            Settled::Rejected(reason) => self.promise_reject(result, reason),
        }
    }
}
