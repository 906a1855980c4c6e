//! The chainable assertion surface returned by `expect`.
//!
//! An expectation is an ephemeral wrapper around one subject value and a
//! handle to the live matcher registry. Because matcher lookup happens
//! at call time, matchers merged in after the expectation was created
//! are still reachable, negated form included.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::error::{TestError, TestResult};
use crate::matchers::MatcherRegistry;
use crate::values::Value;

/// One subject value bound to the matcher registry.
///
/// Every matcher call either returns a fresh positive expectation over
/// the same subject (so assertions chain) or fails with
/// `TestError::Assertion`. The negated view obtained through `not` is a
/// second handle with an inverted pass condition, not a mutable toggle;
/// chaining past a passing matcher always resumes in positive form.
pub struct Expectation {
    subject: Value,
    registry: Rc<RefCell<MatcherRegistry>>,
    negated: bool,
}

impl fmt::Debug for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Expectation")
            .field("subject", &self.subject)
            .field("negated", &self.negated)
            .finish()
    }
}

impl Expectation {
    pub fn new(subject: Value, registry: Rc<RefCell<MatcherRegistry>>) -> Expectation {
        Expectation {
            subject,
            registry,
            negated: false,
        }
    }

    /// The negated view: same subject, same registry, inverted pass
    /// condition.
    pub fn not(self) -> Expectation {
        Expectation {
            negated: !self.negated,
            ..self
        }
    }

    pub fn subject(&self) -> &Value {
        &self.subject
    }

    /// Evaluate the named matcher against the subject. Passing returns a
    /// positive expectation over the same subject for further chaining;
    /// failing raises a descriptive assertion error.
    pub fn check(self, matcher: &str, args: &[Value]) -> TestResult<Expectation> {
        let outcome = self.registry.borrow().eval(matcher, &self.subject, args)?;
        if outcome != self.negated {
            Ok(Expectation::new(self.subject, self.registry))
        } else {
            Err(TestError::Assertion(self.failure_message(matcher, args)))
        }
    }

    fn failure_message(&self, matcher: &str, args: &[Value]) -> String {
        let subject = match self.subject.callable_name() {
            Some(name) => name.to_string(),
            None => self.subject.to_json().to_string(),
        };
        let mut message = format!(
            "Expected {} {}{}",
            subject,
            if self.negated { "not " } else { "" },
            decamelize(matcher)
        );
        match args {
            [] => {}
            [only] => {
                message.push(' ');
                message.push_str(&only.to_json().to_string());
            }
            many => {
                let rendered = Value::Vector(many.to_vec()).to_json().to_string();
                message.push(' ');
                message.push_str(&rendered);
            }
        }
        message
    }

    pub fn to_be_truthy(self) -> TestResult<Expectation> {
        self.check("toBeTruthy", &[])
    }

    pub fn to_be_boolean(self) -> TestResult<Expectation> {
        self.check("toBeBoolean", &[])
    }

    pub fn to_be_number(self) -> TestResult<Expectation> {
        self.check("toBeNumber", &[])
    }

    pub fn to_be_string(self) -> TestResult<Expectation> {
        self.check("toBeString", &[])
    }

    pub fn to_be_array(self) -> TestResult<Expectation> {
        self.check("toBeArray", &[])
    }

    pub fn to_be_date(self) -> TestResult<Expectation> {
        self.check("toBeDate", &[])
    }

    pub fn to_be_object(self) -> TestResult<Expectation> {
        self.check("toBeObject", &[])
    }

    pub fn to_be_function(self) -> TestResult<Expectation> {
        self.check("toBeFunction", &[])
    }

    pub fn to_have_length(self, length: i64) -> TestResult<Expectation> {
        self.check("toHaveLength", &[Value::Integer(length)])
    }

    pub fn to_be(self, expected: impl Into<Value>) -> TestResult<Expectation> {
        self.check("toBe", &[expected.into()])
    }

    pub fn to_contain(self, needle: impl Into<Value>) -> TestResult<Expectation> {
        self.check("toContain", &[needle.into()])
    }

    pub fn to_have_been_called(self) -> TestResult<Expectation> {
        self.check("toHaveBeenCalled", &[])
    }

    pub fn to_have_been_called_times(self, times: i64) -> TestResult<Expectation> {
        self.check("toHaveBeenCalledTimes", &[Value::Integer(times)])
    }

    pub fn to_have_been_called_with(
        self,
        args: impl IntoIterator<Item = Value>,
    ) -> TestResult<Expectation> {
        let args: Vec<Value> = args.into_iter().collect();
        self.check("toHaveBeenCalledWith", &args)
    }
}

/// `toHaveBeenCalledWith` -> `to have been called with`.
fn decamelize(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            out.push(' ');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockFn;

    fn expect(subject: impl Into<Value>) -> Expectation {
        Expectation::new(
            subject.into(),
            Rc::new(RefCell::new(MatcherRegistry::with_builtins())),
        )
    }

    #[test]
    fn passing_matchers_chain() {
        let chained = expect(Value::vector(vec![Value::from(1), Value::from(2)]))
            .to_be_array()
            .and_then(|e| e.to_have_length(2))
            .and_then(|e| e.to_contain(1));
        assert!(chained.is_ok());
    }

    #[test]
    fn chains_short_circuit_at_the_first_failure() {
        let err = expect(1)
            .to_be_number()
            .and_then(|e| e.to_be_string())
            .unwrap_err();
        assert_eq!(err, TestError::Assertion("Expected 1 to be string".to_string()));
    }

    #[test]
    fn negation_inverts_the_pass_condition() {
        assert!(expect("1").not().to_be_number().is_ok());
        assert!(expect(1).not().to_be_number().is_err());
    }

    #[test]
    fn chaining_past_a_negated_matcher_resumes_positive() {
        // .not applies to a single matcher call, as in
        // expect(mock).not.toHaveBeenCalledTimes(1).toHaveBeenCalled()
        let mock = MockFn::new();
        mock.call(vec![]);
        mock.call(vec![]);
        let result = expect(mock)
            .not()
            .to_have_been_called_times(1)
            .and_then(|e| e.to_have_been_called());
        assert!(result.is_ok());
    }

    #[test]
    fn failure_messages_decamelize_and_render_arguments() {
        let err = expect(2).to_be(1).unwrap_err();
        assert_eq!(err, TestError::Assertion("Expected 2 to be 1".to_string()));

        let err = expect("hello").not().to_be_string().unwrap_err();
        assert_eq!(
            err,
            TestError::Assertion("Expected \"hello\" not to be string".to_string())
        );
    }

    #[test]
    fn multiple_arguments_render_as_an_array() {
        let mock = MockFn::named("sender");
        let err = expect(mock)
            .to_have_been_called_with(vec![Value::from(1), Value::from(2)])
            .unwrap_err();
        assert_eq!(
            err,
            TestError::Assertion(
                "Expected sender to have been called with [1,2]".to_string()
            )
        );
    }

    #[test]
    fn expectations_render_subject_and_polarity_for_debugging() {
        let rendered = format!("{:?}", expect(1).not());
        assert!(rendered.contains("Integer(1)"));
        assert!(rendered.contains("negated: true"));
    }

    #[test]
    fn unknown_matchers_surface_as_errors_not_assertions() {
        let err = expect(1).check("toBeMissing", &[]).unwrap_err();
        assert_eq!(err, TestError::UnknownMatcher("toBeMissing".to_string()));
    }
}
