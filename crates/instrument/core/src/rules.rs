//! Ordered `pattern:prefix` rules.
//!
//! Rule order is evaluation priority: the first rule whose pattern matches a
//! method name decides that method's metric prefix.

use std::fmt;
use std::str::FromStr;

use regex::Regex;

use crate::error::{Error, Result};

/// A compiled method-name pattern and the metric prefix it assigns.
#[derive(Debug, Clone)]
pub struct PrefixRule {
    pub pattern: Regex,
    pub prefix: String,
}

impl PrefixRule {
    pub fn new(pattern: Regex, prefix: impl Into<String>) -> Self {
        Self {
            pattern,
            prefix: prefix.into(),
        }
    }

    /// Parse a raw `pattern:prefix` entry, splitting on the first `:`.
    pub fn parse(raw: &str) -> Result<Self> {
        let Some((pattern, prefix)) = raw.split_once(':') else {
            return Err(Error::MalformedRule {
                raw: raw.to_string(),
            });
        };

        let pattern = Regex::new(pattern).map_err(|source| Error::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;

        Ok(Self::new(pattern, prefix))
    }

    pub fn matches(&self, name: &str) -> bool {
        self.pattern.is_match(name)
    }
}

impl FromStr for PrefixRule {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for PrefixRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.pattern.as_str(), self.prefix)
    }
}

/// Rules in declaration order.
#[derive(Debug, Clone, Default)]
pub struct PrefixRuleSet {
    rules: Vec<PrefixRule>,
}

impl PrefixRuleSet {
    pub fn new(rules: Vec<PrefixRule>) -> Self {
        Self { rules }
    }

    /// Parse raw entries in order, stopping at the first bad one.
    pub fn parse<I, S>(raw: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rules = raw
            .into_iter()
            .map(|entry| PrefixRule::parse(entry.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    pub fn push(&mut self, rule: PrefixRule) {
        self.rules.push(rule);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PrefixRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Raw `pattern:prefix` form of every rule, in order.
    pub fn to_raw(&self) -> Vec<String> {
        self.rules.iter().map(ToString::to_string).collect()
    }
}

impl<'a> IntoIterator for &'a PrefixRuleSet {
    type Item = &'a PrefixRule;
    type IntoIter = std::slice::Iter<'a, PrefixRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

impl FromIterator<PrefixRule> for PrefixRuleSet {
    fn from_iter<T: IntoIterator<Item = PrefixRule>>(iter: T) -> Self {
        Self {
            rules: iter.into_iter().collect(),
        }
    }
}
