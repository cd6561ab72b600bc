use super::*;

/// A dynamic payload carried by promises as fulfillment value or rejection reason.
#[derive(Clone)]
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    Number(i64),
    Float(f64),
    String(String),
    Array(Rc<Vec<Value>>),
    Promise(Promise),
    Thenable(Rc<dyn Thenable>),
    Error(Rc<Error>),
}

impl Value {
    pub fn array(values: Vec<Value>) -> Self {
        Self::Array(Rc::new(values))
    }

    pub fn thenable(thenable: impl Thenable + 'static) -> Self {
        Self::Thenable(Rc::new(thenable))
    }

    pub fn as_promise(&self) -> Option<&Promise> {
        match self {
            Self::Promise(promise) => Some(promise),
            _ => None,
        }
    }

    pub fn is_thenable(&self) -> bool {
        matches!(self, Self::Promise(_) | Self::Thenable(_))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Undefined, Self::Undefined) | (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => a == b,
            (Self::Promise(a), Self::Promise(b)) => a == b,
            (Self::Thenable(a), Self::Thenable(b)) => Rc::ptr_eq(a, b),
            (Self::Error(a), Self::Error(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => f.write_str("Undefined"),
            Self::Null => f.write_str("Null"),
            Self::Bool(value) => f.debug_tuple("Bool").field(value).finish(),
            Self::Number(value) => f.debug_tuple("Number").field(value).finish(),
            Self::Float(value) => f.debug_tuple("Float").field(value).finish(),
            Self::String(value) => f.debug_tuple("String").field(value).finish(),
            Self::Array(values) => f.debug_tuple("Array").field(&**values).finish(),
            Self::Promise(promise) => fmt::Debug::fmt(promise, f),
            Self::Thenable(_) => f.write_str("Thenable"),
            Self::Error(err) => f.debug_tuple("Error").field(&**err).finish(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => f.write_str("undefined"),
            Self::Null => f.write_str("null"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Number(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::String(value) => f.write_str(value),
            Self::Array(values) => {
                for (index, value) in values.iter().enumerate() {
                    if index > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{value}")?;
                }
                Ok(())
            }
            Self::Promise(_) => f.write_str("[object Promise]"),
            Self::Thenable(_) => f.write_str("[object Object]"),
            Self::Error(err) => write!(f, "{err}"),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Number(i64::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(values: Vec<Value>) -> Self {
        Self::array(values)
    }
}

impl From<Promise> for Value {
    fn from(promise: Promise) -> Self {
        Self::Promise(promise)
    }
}

impl From<Error> for Value {
    fn from(err: Error) -> Self {
        Self::Error(Rc::new(err))
    }
}

/// Capability of any value that can drive a promise's settlement.
///
/// Implementations call `resolve` or `reject` at most once, now or later. Calls after the
/// first have no effect. Returning `Err` is treated as a throw from `then`: the adopting
/// promise rejects with it unless one of the resolvers already ran.
pub trait Thenable {
    fn then(&self, rt: &mut Runtime, resolve: Resolver, reject: Resolver) -> Result<()>;
}

/// Reaction callback for `then`/`catch`. `Err` rejects the downstream promise.
pub struct Handler(Box<dyn FnOnce(&mut Runtime, Value) -> Result<Value>>);

impl Handler {
    pub fn new<F>(callback: F) -> Self
    where
        F: FnOnce(&mut Runtime, Value) -> Result<Value> + 'static,
    {
        Self(Box::new(callback))
    }

    pub(crate) fn call(self, rt: &mut Runtime, value: Value) -> Result<Value> {
        (self.0)(rt, value)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Handler")
    }
}

/// Callback for `finally`; receives no payload.
pub struct FinallyHandler(Box<dyn FnOnce(&mut Runtime) -> Result<Value>>);

impl FinallyHandler {
    pub fn new<F>(callback: F) -> Self
    where
        F: FnOnce(&mut Runtime) -> Result<Value> + 'static,
    {
        Self(Box::new(callback))
    }

    pub(crate) fn call(self, rt: &mut Runtime) -> Result<Value> {
        (self.0)(rt)
    }
}

impl fmt::Debug for FinallyHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FinallyHandler")
    }
}

/// One half of a resolve/reject pair bound to a promise.
///
/// Both halves share one `already_resolved` flag: only the first call across the pair has
/// any effect.
#[derive(Clone)]
pub struct Resolver {
    pub(crate) promise: Promise,
    pub(crate) reject: bool,
    pub(crate) already_resolved: Rc<Cell<bool>>,
}

impl Resolver {
    pub fn call(&self, rt: &mut Runtime, value: Value) {
        if self.already_resolved.replace(true) {
            return;
        }
        if self.reject {
            rt.promise_reject(&self.promise, value);
        } else {
            rt.promise_resolve(&self.promise, value);
        }
    }

    pub fn is_reject(&self) -> bool {
        self.reject
    }

    pub fn is_spent(&self) -> bool {
        self.already_resolved.get()
    }
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("promise", &self.promise.id())
            .field("reject", &self.reject)
            .field("already_resolved", &self.already_resolved.get())
            .finish()
    }
}

#[derive(Debug)]
pub struct PromiseWithResolvers {
    pub promise: Promise,
    pub resolve: Resolver,
    pub reject: Resolver,
}

/// Shared handle to a promise owned by a [`Runtime`]. Equality is identity.
#[derive(Clone)]
pub struct Promise(pub(crate) Rc<RefCell<PromiseValue>>);

impl Promise {
    pub fn id(&self) -> usize {
        self.0.borrow().id
    }

    pub fn state(&self) -> PromiseStatus {
        match self.0.borrow().state {
            PromiseState::Pending => PromiseStatus::Pending,
            PromiseState::Fulfilled(_) => PromiseStatus::Fulfilled,
            PromiseState::Rejected(_) => PromiseStatus::Rejected,
        }
    }

    /// The settled outcome, or `None` while pending.
    pub fn settled(&self) -> Option<Settled> {
        match &self.0.borrow().state {
            PromiseState::Pending => None,
            PromiseState::Fulfilled(value) => Some(Settled::Fulfilled(value.clone())),
            PromiseState::Rejected(reason) => Some(Settled::Rejected(reason.clone())),
        }
    }

    pub fn is_handled(&self) -> bool {
        self.0.borrow().handled
    }

    pub(crate) fn is_pending(&self) -> bool {
        matches!(self.0.borrow().state, PromiseState::Pending)
    }

    /// Whether following pending adoption links from `self` arrives at `target`.
    pub(crate) fn adoption_chain_reaches(&self, target: &Promise) -> bool {
        let mut current = Some(self.clone());
        while let Some(promise) = current {
            if promise == *target {
                return true;
            }
            let promise_ref = promise.0.borrow();
            if !matches!(promise_ref.state, PromiseState::Pending) {
                return false;
            }
            current = promise_ref.adopting.clone();
        }
        false
    }
}

impl PartialEq for Promise {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

// Payloads stay out: a promise may be reachable from its own value.
impl fmt::Debug for Promise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(promise) => {
                let status = match promise.state {
                    PromiseState::Pending => PromiseStatus::Pending,
                    PromiseState::Fulfilled(_) => PromiseStatus::Fulfilled,
                    PromiseState::Rejected(_) => PromiseStatus::Rejected,
                };
                write!(f, "Promise(id={}, {status})", promise.id)
            }
            Err(_) => f.write_str("Promise(<borrowed>)"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromiseStatus {
    Pending,
    Fulfilled,
    Rejected,
}

impl fmt::Display for PromiseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => f.write_str("pending"),
            Self::Fulfilled => f.write_str("fulfilled"),
            Self::Rejected => f.write_str("rejected"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Settled {
    Fulfilled(Value),
    Rejected(Value),
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnhandledRejection {
    pub promise: Promise,
    pub reason: Value,
}

pub(crate) struct PromiseValue {
    pub(crate) id: usize,
    pub(crate) state: PromiseState,
    pub(crate) reactions: Vec<PromiseReaction>,
    pub(crate) handled: bool,
    /// The promise this one is waiting on after being resolved with it.
    pub(crate) adopting: Option<Promise>,
}

#[derive(Debug, Clone)]
pub(crate) enum PromiseState {
    Pending,
    Fulfilled(Value),
    Rejected(Value),
}

#[derive(Debug)]
pub(crate) struct PromiseReaction {
    pub(crate) kind: PromiseReactionKind,
}

#[derive(Debug)]
pub(crate) enum PromiseReactionKind {
    Then {
        on_fulfilled: Option<Handler>,
        on_rejected: Option<Handler>,
        result: Promise,
    },
    Finally {
        callback: Option<FinallyHandler>,
        result: Promise,
    },
    FinallyContinuation {
        original: Settled,
        result: Promise,
    },
    ResolveTo {
        target: Promise,
    },
    All {
        state: Rc<RefCell<PromiseAllState>>,
        index: usize,
    },
    Race {
        state: Rc<RefCell<PromiseRaceState>>,
    },
}

#[derive(Debug)]
pub(crate) struct PromiseAllState {
    pub(crate) result: Promise,
    pub(crate) remaining: usize,
    pub(crate) values: Vec<Option<Value>>,
    pub(crate) settled: bool,
}

#[derive(Debug)]
pub(crate) struct PromiseRaceState {
    pub(crate) result: Promise,
    pub(crate) settled: bool,
}
