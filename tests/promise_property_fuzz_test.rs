use std::cell::RefCell;
use std::rc::Rc;

use proptest::collection::vec;
use proptest::prelude::*;
use proptest::test_runner::{FileFailurePersistence, TestCaseResult};
use settle_engine::{Handler, Runtime, Settled, Value};

const PROMISE_PROPTEST_REGRESSION_FILE: &str =
    "tests/proptest-regressions/promise_property_fuzz_test.txt";
const DEFAULT_PROMISE_PROPTEST_CASES: u32 = 128;

#[derive(Clone, Debug)]
enum SettleAttempt {
    Resolve(i64),
    Reject(i64),
}

#[derive(Clone, Debug)]
struct TimedInput {
    value: i64,
    delay_ms: i64,
    rejects: bool,
}

fn promise_proptest_cases() -> u32 {
    std::env::var("SETTLE_ENGINE_PROPTEST_CASES")
        .ok()
        .and_then(|raw| raw.parse::<u32>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_PROMISE_PROPTEST_CASES)
}

fn settle_attempt_strategy() -> BoxedStrategy<SettleAttempt> {
    prop_oneof![
        any::<i64>().prop_map(SettleAttempt::Resolve),
        any::<i64>().prop_map(SettleAttempt::Reject),
    ]
    .boxed()
}

fn timed_input_strategy() -> BoxedStrategy<TimedInput> {
    (any::<i64>(), 0i64..=50, prop::bool::weighted(0.15))
        .prop_map(|(value, delay_ms, rejects)| TimedInput {
            value,
            delay_ms,
            rejects,
        })
        .boxed()
}

fn assert_first_attempt_wins(attempts: &[SettleAttempt]) -> TestCaseResult {
    let mut rt = Runtime::new();
    let deferred = rt.with_resolvers();
    for attempt in attempts {
        match attempt {
            SettleAttempt::Resolve(value) => deferred.resolve.call(&mut rt, Value::Number(*value)),
            SettleAttempt::Reject(value) => deferred.reject.call(&mut rt, Value::Number(*value)),
        }
    }

    let expected = match attempts.first() {
        Some(SettleAttempt::Resolve(value)) => Some(Settled::Fulfilled(Value::Number(*value))),
        Some(SettleAttempt::Reject(value)) => Some(Settled::Rejected(Value::Number(*value))),
        None => None,
    };
    prop_assert_eq!(deferred.promise.settled(), expected);
    Ok(())
}

fn assert_all_matches_timed_inputs(inputs: &[TimedInput]) -> TestCaseResult {
    let mut rt = Runtime::new();
    let mut promises = Vec::with_capacity(inputs.len());
    for input in inputs {
        let deferred = rt.with_resolvers();
        let resolve = deferred.resolve.clone();
        let reject = deferred.reject.clone();
        let TimedInput {
            value, rejects, ..
        } = input.clone();
        rt.set_timeout(input.delay_ms, move |rt| {
            if rejects {
                reject.call(rt, Value::Number(value));
            } else {
                resolve.call(rt, Value::Number(value));
            }
            Ok(())
        });
        promises.push(Value::Promise(deferred.promise));
    }
    let aggregate = rt.all(promises);
    rt.advance_time(50)
        .map_err(|err| proptest::test_runner::TestCaseError::fail(format!("{err:?}")))?;

    // Timers fire by due time, then scheduling order; the earliest rejecting input wins.
    let first_rejection = inputs
        .iter()
        .enumerate()
        .filter(|(_, input)| input.rejects)
        .min_by_key(|(index, input)| (input.delay_ms, *index))
        .map(|(_, input)| input.value);
    let expected = match first_rejection {
        Some(reason) => Settled::Rejected(Value::Number(reason)),
        None => Settled::Fulfilled(Value::array(
            inputs.iter().map(|input| Value::Number(input.value)).collect(),
        )),
    };
    prop_assert_eq!(aggregate.settled(), Some(expected));
    Ok(())
}

fn assert_reactions_keep_registration_order(count: usize) -> TestCaseResult {
    let mut rt = Runtime::new();
    let log = Rc::new(RefCell::new(Vec::new()));
    let deferred = rt.with_resolvers();
    for index in 0..count {
        let log = log.clone();
        rt.then(
            &deferred.promise,
            Some(Handler::new(move |_, value| {
                log.borrow_mut().push(index);
                Ok(value)
            })),
            None,
        );
    }

    deferred.resolve.call(&mut rt, Value::Null);
    prop_assert!(log.borrow().is_empty(), "reaction ran during settlement");
    rt.run_microtasks()
        .map_err(|err| proptest::test_runner::TestCaseError::fail(format!("{err:?}")))?;
    prop_assert_eq!(log.borrow().clone(), (0..count).collect::<Vec<_>>());
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: promise_proptest_cases(),
        failure_persistence: Some(Box::new(
            FileFailurePersistence::Direct(PROMISE_PROPTEST_REGRESSION_FILE),
        )),
        .. ProptestConfig::default()
    })]

    #[test]
    fn only_the_first_settle_attempt_has_effect(attempts in vec(settle_attempt_strategy(), 0..=12)) {
        assert_first_attempt_wins(&attempts)?;
    }

    #[test]
    fn all_matches_input_order_or_earliest_rejection(inputs in vec(timed_input_strategy(), 0..=16)) {
        assert_all_matches_timed_inputs(&inputs)?;
    }

    #[test]
    fn reactions_fire_in_registration_order(count in 1usize..=48) {
        assert_reactions_keep_registration_order(count)?;
    }
}
