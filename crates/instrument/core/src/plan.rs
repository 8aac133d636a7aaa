//! Decorator planning.
//!
//! A [`WrappedInterface`] names the decorator and its constructor and lists
//! the methods that receive a synthesized body. Methods left out of the plan
//! are still satisfied by the embedded inner implementation.

use crate::model::{Interface, Method};
use crate::rules::PrefixRuleSet;
use crate::select::select;

/// The decorator plan for one interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrappedInterface<'a> {
    pub interface: &'a Interface,
    pub title_name: String,
    pub decorated_type_name: String,
    pub constructor_name: String,
    pub wrapped_methods: Vec<WrappedMethod<'a>>,
}

/// A method selected for instrumentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrappedMethod<'a> {
    pub method: &'a Method,
    pub metric_prefix: String,
    pub has_error_result: bool,
}

impl<'a> WrappedMethod<'a> {
    pub fn new(method: &'a Method, metric_prefix: impl Into<String>) -> Self {
        Self {
            method,
            metric_prefix: metric_prefix.into(),
            has_error_result: method.has_error_result(),
        }
    }
}

/// Plan the decorator for `interface`.
///
/// `tag` identifies the generation run and is spliced into the type name as
/// `Instrumented<tag><Title>`.
pub fn plan<'a>(interface: &'a Interface, rules: &PrefixRuleSet, tag: &str) -> WrappedInterface<'a> {
    let title_name = title(&interface.name);
    let decorated_type_name = format!("Instrumented{tag}{title_name}");
    let constructor_name = format!("New{decorated_type_name}");

    let wrapped_methods = interface
        .methods
        .iter()
        .filter_map(|method| {
            let prefix = select(method, rules);
            tracing::debug!(
                interface = %interface.name,
                method = %method.name,
                prefix = ?prefix,
                "method selection"
            );
            prefix.map(|prefix| WrappedMethod::new(method, prefix))
        })
        .collect();

    WrappedInterface {
        interface,
        title_name,
        decorated_type_name,
        constructor_name,
        wrapped_methods,
    }
}

/// Upper-case the first character.
pub fn title(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Origin, Type, TypeExpr};
    use proptest::prelude::*;

    fn origin() -> Origin {
        Origin::new("github.com/efritz/go-instrument/test", "test", "client")
    }

    fn variadic_strings() -> Vec<Type> {
        vec![
            Type::string(),
            Type::opaque(TypeExpr::slice_of(TypeExpr::predeclared("string"))),
        ]
    }

    fn client() -> Interface {
        Interface::new(
            "Client",
            origin(),
            vec![
                Method::new("Do", variadic_strings(), vec![Type::string(), Type::error()], true),
                Method::new("Try", variadic_strings(), vec![Type::string()], true),
            ],
        )
    }

    #[test]
    fn test_to_title() {
        assert_eq!(title("client"), "Client");
        assert_eq!(title("Client"), "Client");
        assert_eq!(title("x"), "X");
        assert_eq!(title(""), "");
    }

    #[test]
    fn names_decorator_and_constructor() {
        let iface = client();
        let rules = PrefixRuleSet::parse([".+:test"]).unwrap();
        let wrapped = plan(&iface, &rules, "Test");

        assert_eq!(wrapped.title_name, "Client");
        assert_eq!(wrapped.decorated_type_name, "InstrumentedTestClient");
        assert_eq!(wrapped.constructor_name, "NewInstrumentedTestClient");
    }

    #[test]
    fn empty_tag_and_lowercase_name() {
        let iface = Interface::new("client", origin(), vec![]);
        let wrapped = plan(&iface, &PrefixRuleSet::default(), "");
        assert_eq!(wrapped.decorated_type_name, "InstrumentedClient");
    }

    #[test]
    fn error_result_detection_per_method() {
        let iface = client();
        let rules = PrefixRuleSet::parse([".+:svc"]).unwrap();
        let wrapped = plan(&iface, &rules, "");

        assert_eq!(wrapped.wrapped_methods.len(), 2);
        assert!(wrapped.wrapped_methods[0].has_error_result);
        assert!(!wrapped.wrapped_methods[1].has_error_result);
        assert!(wrapped.wrapped_methods.iter().all(|m| m.metric_prefix == "svc"));
    }

    #[test]
    fn unmatched_methods_are_omitted() {
        let iface = Interface::new(
            "Store",
            origin(),
            vec![
                Method::new("GetValue", vec![], vec![Type::string()], false),
                Method::new("Delete", vec![], vec![], false),
                Method::new("SetValue", vec![Type::string()], vec![Type::error()], false),
            ],
        );
        let rules = PrefixRuleSet::parse(["^Get:read", "^Set:write"]).unwrap();
        let wrapped = plan(&iface, &rules, "");

        let names: Vec<_> = wrapped
            .wrapped_methods
            .iter()
            .map(|m| (m.method.name.as_str(), m.metric_prefix.as_str()))
            .collect();
        assert_eq!(names, vec![("GetValue", "read"), ("SetValue", "write")]);
    }

    proptest! {
        #[test]
        fn empty_rule_set_wraps_nothing(names in proptest::collection::vec("[A-Za-z]{1,10}", 0..8)) {
            let methods = names
                .iter()
                .map(|name| Method::new(name.clone(), vec![], vec![Type::error()], false))
                .collect();
            let iface = Interface::new("Svc", origin(), methods);
            let wrapped = plan(&iface, &PrefixRuleSet::default(), "");
            prop_assert!(wrapped.wrapped_methods.is_empty());
        }
    }
}
