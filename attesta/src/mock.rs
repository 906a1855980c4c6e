//! Mock functions: callables that record their own invocations.
//!
//! A `MockFn` is a cheap clone-by-handle value; all clones share one
//! recorder, so a mock captured inside a suite body and the one asserted
//! on in a test observe the same call history.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::values::Value;

type MockImpl = Rc<dyn Fn() -> Value>;

struct MockState {
    calls: Vec<Vec<Value>>,
    response: Option<Value>,
    implementation: Option<MockImpl>,
}

struct MockInner {
    name: String,
    default_impl: Option<MockImpl>,
    state: RefCell<MockState>,
}

/// A callable recorder with a resettable implementation override.
///
/// Invoking the mock appends the argument list to its call history and
/// returns, in order of precedence: the fixed return value if one has
/// been set, the current implementation's result, or `Nil`.
#[derive(Clone)]
pub struct MockFn {
    inner: Rc<MockInner>,
}

impl MockFn {
    /// A mock with no default implementation; calls return `Nil`.
    pub fn new() -> MockFn {
        MockFn::build("mock", None)
    }

    /// A mock whose calls run `implementation` when no fixed return
    /// value is set. `reset` restores this implementation.
    pub fn with_impl(implementation: impl Fn() -> Value + 'static) -> MockFn {
        MockFn::build("mock", Some(Rc::new(implementation)))
    }

    /// Same as `new`, with a name used in failure messages and display.
    pub fn named(name: impl Into<String>) -> MockFn {
        MockFn::build(name, None)
    }

    fn build(name: impl Into<String>, default_impl: Option<MockImpl>) -> MockFn {
        MockFn {
            inner: Rc::new(MockInner {
                name: name.into(),
                state: RefCell::new(MockState {
                    calls: Vec::new(),
                    response: None,
                    implementation: default_impl.clone(),
                }),
                default_impl,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Invoke the mock, recording `args` in the call history.
    pub fn call(&self, args: Vec<Value>) -> Value {
        let mut state = self.inner.state.borrow_mut();
        state.calls.push(args);
        if let Some(response) = &state.response {
            return response.clone();
        }
        let implementation = state.implementation.clone();
        // Release the borrow before running user code: the implementation
        // may re-enter this mock.
        drop(state);
        match implementation {
            Some(f) => f(),
            None => Value::Nil,
        }
    }

    /// Fix the value returned by every subsequent call. Cleared only by
    /// `reset`.
    pub fn return_value(&self, value: impl Into<Value>) {
        self.inner.state.borrow_mut().response = Some(value.into());
    }

    /// Ad hoc implementation override; shadowed by a fixed return value
    /// and reverted by `reset`.
    pub fn set_implementation(&self, implementation: impl Fn() -> Value + 'static) {
        self.inner.state.borrow_mut().implementation = Some(Rc::new(implementation));
    }

    /// Clear the call history and fixed return value, and restore the
    /// originally supplied implementation. A fresh mock starts in this
    /// state.
    pub fn reset(&self) {
        let mut state = self.inner.state.borrow_mut();
        state.calls.clear();
        state.response = None;
        state.implementation = self.inner.default_impl.clone();
    }

    pub fn calls(&self) -> Vec<Vec<Value>> {
        self.inner.state.borrow().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.inner.state.borrow().calls.len()
    }

    pub fn nth_call(&self, index: usize) -> Option<Vec<Value>> {
        self.inner.state.borrow().calls.get(index).cloned()
    }
}

impl Default for MockFn {
    fn default() -> Self {
        MockFn::new()
    }
}

impl fmt::Debug for MockFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockFn")
            .field("name", &self.inner.name)
            .field("calls", &self.call_count())
            .finish()
    }
}

impl PartialEq for MockFn {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_every_invocation_in_order() {
        let mock = MockFn::new();
        assert_eq!(mock.call_count(), 0);
        mock.call(vec![Value::from(1), Value::from(2)]);
        mock.call(vec![Value::from("next")]);
        assert_eq!(mock.call_count(), 2);
        assert_eq!(
            mock.nth_call(0),
            Some(vec![Value::from(1), Value::from(2)])
        );
        assert_eq!(mock.nth_call(1), Some(vec![Value::from("next")]));
    }

    #[test]
    fn returns_nil_without_implementation() {
        let mock = MockFn::new();
        assert_eq!(mock.call(vec![]), Value::Nil);
    }

    #[test]
    fn fixed_response_wins_over_implementation() {
        let mock = MockFn::with_impl(|| Value::from(1));
        assert_eq!(mock.call(vec![]), Value::from(1));

        mock.set_implementation(|| Value::from(2));
        assert_eq!(mock.call(vec![]), Value::from(2));

        mock.return_value(3);
        assert_eq!(mock.call(vec![]), Value::from(3));
    }

    #[test]
    fn reset_restores_the_original_implementation() {
        let mock = MockFn::with_impl(|| Value::from(1));
        mock.return_value(3);
        mock.call(vec![Value::from(9)]);
        assert_eq!(mock.call(vec![]), Value::from(3));

        mock.reset();
        assert!(mock.calls().is_empty());
        assert_eq!(mock.call(vec![]), Value::from(1));
    }

    #[test]
    fn clones_share_one_recorder() {
        let mock = MockFn::new();
        let alias = mock.clone();
        alias.call(vec![Value::from(7)]);
        assert_eq!(mock.call_count(), 1);
        assert_eq!(mock, alias);
        assert_ne!(mock, MockFn::new());
    }
}
