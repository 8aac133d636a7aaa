//! Method selection against a [`PrefixRuleSet`].

use crate::model::Method;
use crate::rules::PrefixRuleSet;

/// Prefix of the first rule whose pattern matches the method name.
///
/// Patterns are unanchored; `^` and `$` must be written into the rule.
pub fn select<'r>(method: &Method, rules: &'r PrefixRuleSet) -> Option<&'r str> {
    select_name(&method.name, rules)
}

/// Same as [`select`], keyed by a bare method name.
pub fn select_name<'r>(name: &str, rules: &'r PrefixRuleSet) -> Option<&'r str> {
    rules
        .iter()
        .find(|rule| rule.matches(name))
        .map(|rule| rule.prefix.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::PrefixRule;
    use proptest::prelude::*;
    use regex::Regex;

    #[test]
    fn first_rule_in_declaration_order_wins() {
        let rules = PrefixRuleSet::parse(["Value:generic", "^GetValue$:exact"]).unwrap();
        assert_eq!(select_name("GetValue", &rules), Some("generic"));
    }

    #[test]
    fn get_and_set_rules() {
        let rules = PrefixRuleSet::parse(["^Get:read", "^Set:write"]).unwrap();
        assert_eq!(select_name("GetValue", &rules), Some("read"));
        assert_eq!(select_name("SetValue", &rules), Some("write"));
        assert_eq!(select_name("Delete", &rules), None);
    }

    #[test]
    fn match_is_unanchored() {
        let rules = PrefixRuleSet::parse(["Value:v"]).unwrap();
        assert_eq!(select_name("GetValueNow", &rules), Some("v"));
    }

    #[test]
    fn empty_set_selects_nothing() {
        assert_eq!(select_name("Anything", &PrefixRuleSet::default()), None);
    }

    proptest! {
        #[test]
        fn resolved_prefix_is_first_matching_rule(
            name in "[A-Z][a-z]{0,8}",
            literals in proptest::collection::vec("[a-z]{1,2}", 0..6),
        ) {
            let rules: PrefixRuleSet = literals
                .iter()
                .enumerate()
                .map(|(i, lit)| {
                    let pattern = Regex::new(&regex::escape(lit)).unwrap();
                    PrefixRule::new(pattern, format!("p{i}"))
                })
                .collect();

            let expected = literals
                .iter()
                .position(|lit| name.contains(lit.as_str()))
                .map(|i| format!("p{i}"));

            prop_assert_eq!(select_name(&name, &rules).map(str::to_string), expected);
        }
    }
}
