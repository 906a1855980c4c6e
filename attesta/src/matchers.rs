//! The matcher registry: named predicates over a subject value.
//!
//! Matchers are registered by name and looked up at expectation time, so
//! entries merged in through `extend` become first-class (including
//! their negated form) on every subsequent `expect` call. Predicates
//! receive the live registry as their first argument, which lets custom
//! matchers compose existing ones.

use std::rc::Rc;

use indexmap::IndexMap;

use crate::equality::deep_eq;
use crate::error::{TestError, TestResult};
use crate::values::Value;

/// Argument-count contract of a matcher, not counting the subject.
#[derive(Debug, Clone, PartialEq)]
pub enum Arity {
    Fixed(usize),
    /// Minimum number of arguments.
    Variadic(usize),
}

impl Arity {
    fn accepts(&self, count: usize) -> bool {
        match self {
            Arity::Fixed(n) => count == *n,
            Arity::Variadic(min) => count >= *min,
        }
    }

    fn describe(&self) -> String {
        match self {
            Arity::Fixed(n) => n.to_string(),
            Arity::Variadic(min) => format!("at least {}", min),
        }
    }
}

pub type MatcherFn = Rc<dyn Fn(&MatcherRegistry, &Value, &[Value]) -> bool>;

/// A named predicate usable as an assertion against a subject value.
#[derive(Clone)]
pub struct Matcher {
    pub name: String,
    pub arity: Arity,
    pub func: MatcherFn,
}

impl Matcher {
    pub fn new(
        name: impl Into<String>,
        arity: Arity,
        func: impl Fn(&MatcherRegistry, &Value, &[Value]) -> bool + 'static,
    ) -> Matcher {
        Matcher {
            name: name.into(),
            arity,
            func: Rc::new(func),
        }
    }
}

/// Registry of matchers, shared by every expectation of a run.
pub struct MatcherRegistry {
    matchers: IndexMap<String, Matcher>,
}

impl MatcherRegistry {
    pub fn new() -> Self {
        MatcherRegistry {
            matchers: IndexMap::new(),
        }
    }

    /// A registry populated with the built-in matcher set.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_type_predicates();
        registry.register_structural_matchers();
        registry.register_mock_matchers();
        registry
    }

    pub fn register(&mut self, matcher: Matcher) {
        self.matchers.insert(matcher.name.clone(), matcher);
    }

    /// Merge additional matchers produced by `builder`, which receives
    /// the current registry so new entries can delegate to existing ones.
    pub fn extend<F>(&mut self, builder: F)
    where
        F: FnOnce(&MatcherRegistry) -> Vec<Matcher>,
    {
        for matcher in builder(self) {
            self.register(matcher);
        }
    }

    pub fn get(&self, name: &str) -> Option<&Matcher> {
        self.matchers.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.matchers.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }

    /// Evaluate the named matcher against `subject`. Unknown names and
    /// argument-count mismatches are errors, not assertion failures.
    pub fn eval(&self, name: &str, subject: &Value, args: &[Value]) -> TestResult<bool> {
        let matcher = self
            .matchers
            .get(name)
            .ok_or_else(|| TestError::UnknownMatcher(name.to_string()))?;
        if !matcher.arity.accepts(args.len()) {
            return Err(TestError::MatcherArity {
                matcher: name.to_string(),
                expected: matcher.arity.describe(),
                actual: args.len(),
            });
        }
        Ok((matcher.func)(self, subject, args))
    }

    fn register_type_predicates(&mut self) {
        self.register(Matcher::new("toBeTruthy", Arity::Fixed(0), |_, v, _| {
            v.is_truthy()
        }));
        self.register(Matcher::new("toBeBoolean", Arity::Fixed(0), |_, v, _| {
            matches!(v, Value::Boolean(_))
        }));
        self.register(Matcher::new("toBeNumber", Arity::Fixed(0), |_, v, _| {
            matches!(v, Value::Integer(_) | Value::Float(_))
        }));
        self.register(Matcher::new("toBeString", Arity::Fixed(0), |_, v, _| {
            matches!(v, Value::String(_))
        }));
        self.register(Matcher::new("toBeArray", Arity::Fixed(0), |_, v, _| {
            matches!(v, Value::Vector(_))
        }));
        // Only a timestamp that parses to a real instant counts as a date.
        self.register(Matcher::new("toBeDate", Arity::Fixed(0), |_, v, _| {
            v.instant().is_some()
        }));
        self.register(Matcher::new("toBeObject", Arity::Fixed(0), |_, v, _| {
            matches!(v, Value::Map(_) | Value::Vector(_))
        }));
        self.register(Matcher::new("toBeFunction", Arity::Fixed(0), |_, v, _| {
            v.is_callable()
        }));
    }

    fn register_structural_matchers(&mut self) {
        self.register(Matcher::new(
            "toHaveLength",
            Arity::Fixed(1),
            |_, v, args| {
                let expected = match &args[0] {
                    Value::Integer(n) => *n,
                    _ => return false,
                };
                match v {
                    Value::Vector(items) => items.len() as i64 == expected,
                    Value::String(s) => s.chars().count() as i64 == expected,
                    _ => false,
                }
            },
        ));
        self.register(Matcher::new("toBe", Arity::Fixed(1), |_, v, args| {
            deep_eq(v, &args[0])
        }));
        self.register(Matcher::new("toContain", Arity::Fixed(1), |_, v, args| {
            let needle = &args[0];
            match (v, needle) {
                (Value::Vector(items), _) => items.iter().any(|item| deep_eq(item, needle)),
                // The haystack value is the left operand of the asymmetric
                // equality, so a haystack entry may carry extra nested keys
                // only when the needle's entry lists them too.
                (Value::Map(haystack), Value::Map(wanted)) => wanted.iter().all(|(key, value)| {
                    deep_eq(haystack.get(key).unwrap_or(&Value::Nil), value)
                }),
                (Value::String(haystack), Value::String(part)) => haystack.contains(part),
                _ => false,
            }
        }));
    }

    fn register_mock_matchers(&mut self) {
        self.register(Matcher::new(
            "toHaveBeenCalled",
            Arity::Fixed(0),
            |_, v, _| matches!(v, Value::Mock(mock) if mock.call_count() > 0),
        ));
        self.register(Matcher::new(
            "toHaveBeenCalledTimes",
            Arity::Fixed(1),
            |_, v, args| match (v, &args[0]) {
                (Value::Mock(mock), Value::Integer(n)) => mock.call_count() as i64 == *n,
                _ => false,
            },
        ));
        // Argument lists are compared with the same asymmetric deep
        // equality as `toBe`, expected-against-recorded.
        self.register(Matcher::new(
            "toHaveBeenCalledWith",
            Arity::Variadic(0),
            |_, v, args| {
                let expected = Value::Vector(args.to_vec());
                matches!(v, Value::Mock(mock) if mock
                    .calls()
                    .iter()
                    .any(|call| deep_eq(&expected, &Value::Vector(call.clone()))))
            },
        ));
    }
}

impl Default for MatcherRegistry {
    fn default() -> Self {
        MatcherRegistry::with_builtins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockFn;

    fn eval(name: &str, subject: Value, args: &[Value]) -> bool {
        MatcherRegistry::with_builtins()
            .eval(name, &subject, args)
            .unwrap()
    }

    #[test]
    fn type_predicates_match_their_variants() {
        assert!(eval("toBeNumber", Value::from(1), &[]));
        assert!(eval("toBeNumber", Value::from(1.3), &[]));
        assert!(!eval("toBeNumber", Value::from("1"), &[]));
        assert!(eval("toBeString", Value::from("hello"), &[]));
        assert!(eval("toBeArray", Value::vector(vec![Value::from(1)]), &[]));
        assert!(eval("toBeObject", Value::map([("hello", Value::from("World"))]), &[]));
        assert!(eval("toBeBoolean", Value::from(true), &[]));
        assert!(eval("toBeFunction", Value::Mock(MockFn::new()), &[]));
    }

    #[test]
    fn only_valid_instants_are_dates() {
        assert!(eval("toBeDate", Value::timestamp("2000-02-01T00:00:00Z"), &[]));
        assert!(!eval("toBeDate", Value::timestamp(""), &[]));
        assert!(!eval("toBeDate", Value::from("2000-02-01"), &[]));
    }

    #[test]
    fn length_applies_to_vectors_and_strings_only() {
        let v = Value::vector(vec![Value::from(1), Value::from(2), Value::from(3)]);
        assert!(eval("toHaveLength", v, &[Value::from(3)]));
        assert!(eval("toHaveLength", Value::from("Hello"), &[Value::from(5)]));
        assert!(!eval("toHaveLength", Value::from("Hello world"), &[Value::from(5)]));
        assert!(!eval("toHaveLength", Value::from(5), &[Value::from(1)]));
    }

    #[test]
    fn contain_covers_vectors_maps_and_strings() {
        let v = Value::vector(vec![Value::from(1), Value::from(2), Value::from(3)]);
        assert!(eval("toContain", v.clone(), &[Value::from(3)]));
        assert!(!eval("toContain", v, &[Value::from(4)]));

        assert!(eval("toContain", Value::from("hello"), &[Value::from("l")]));
        assert!(!eval("toContain", Value::from("hello"), &[Value::from("w")]));

        let haystack = Value::map([("hello", Value::from("world")), ("hola", Value::from("mon"))]);
        let wanted = Value::map([("hello", Value::from("world"))]);
        assert!(eval("toContain", haystack, &[wanted.clone()]));
        assert!(!eval(
            "toContain",
            Value::map([("hola", Value::from("mon"))]),
            &[wanted]
        ));
    }

    #[test]
    fn contain_on_maps_keeps_the_haystack_as_left_operand() {
        // Observable with nested maps: the haystack entry's keys must
        // all be listed by the needle's entry, not the other way round.
        let nested_full = Value::map([("a", Value::from(1)), ("b", Value::from(2))]);
        let nested_partial = Value::map([("a", Value::from(1))]);

        let haystack = Value::map([("cfg", nested_full.clone())]);
        assert!(!eval("toContain", haystack, &[Value::map([("cfg", nested_partial.clone())])]));

        let haystack = Value::map([("cfg", nested_partial)]);
        assert!(eval("toContain", haystack, &[Value::map([("cfg", nested_full)])]));
    }

    #[test]
    fn mock_matchers_inspect_the_recorder() {
        let mock = MockFn::new();
        assert!(!eval("toHaveBeenCalled", Value::Mock(mock.clone()), &[]));

        mock.call(vec![Value::from(1), Value::from(2), Value::from(3)]);
        let subject = Value::Mock(mock);
        assert!(eval("toHaveBeenCalled", subject.clone(), &[]));
        assert!(eval("toHaveBeenCalledTimes", subject.clone(), &[Value::from(1)]));
        assert!(eval(
            "toHaveBeenCalledWith",
            subject.clone(),
            &[Value::from(1), Value::from(2), Value::from(3)]
        ));
        assert!(!eval(
            "toHaveBeenCalledWith",
            subject,
            &[Value::from(7), Value::from(8), Value::from(9)]
        ));
    }

    #[test]
    fn mock_matchers_reject_plain_values() {
        assert!(!eval("toHaveBeenCalled", Value::from(1), &[]));
        assert!(!eval("toHaveBeenCalledTimes", Value::from(1), &[Value::from(0)]));
    }

    #[test]
    fn unknown_matcher_is_an_error() {
        let registry = MatcherRegistry::with_builtins();
        let err = registry
            .eval("toBeWhatever", &Value::Nil, &[])
            .unwrap_err();
        assert_eq!(err, TestError::UnknownMatcher("toBeWhatever".to_string()));
    }

    #[test]
    fn arity_mismatch_is_an_error() {
        let registry = MatcherRegistry::with_builtins();
        let err = registry.eval("toHaveLength", &Value::Nil, &[]).unwrap_err();
        assert!(matches!(err, TestError::MatcherArity { .. }));
    }

    #[test]
    fn extension_matchers_compose_existing_ones() {
        let mut registry = MatcherRegistry::with_builtins();
        registry.extend(|_| {
            vec![Matcher::new(
                "toBeDecimal",
                Arity::Fixed(0),
                |reg, v, _| {
                    reg.eval("toBeNumber", v, &[]).unwrap_or(false)
                        && matches!(v, Value::Float(f) if f.fract() != 0.0)
                },
            )]
        });
        assert!(registry.eval("toBeDecimal", &Value::from(1.3), &[]).unwrap());
        assert!(!registry.eval("toBeDecimal", &Value::from(1), &[]).unwrap());
    }
}
