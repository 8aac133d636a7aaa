//! Import bookkeeping for a generated file.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::module::default_package_name;
use crate::prelude::is_predeclared;

/// Identifiers the rendered code binds itself.
const RESERVED: &[&str] = &["i", "inner", "reporter", "start", "duration"];

/// Qualifiers assigned to imported packages, in first-use order.
#[derive(Debug)]
pub struct ImportSet<'a> {
    local: Option<&'a str>,
    package_names: &'a HashMap<String, String>,
    alias_hints: &'a HashMap<String, String>,
    qualifiers: BTreeMap<String, String>,
    taken: HashSet<String>,
}

impl<'a> ImportSet<'a> {
    /// `local` is the import path of the package being generated; names from
    /// it are never qualified.
    pub fn new(
        local: Option<&'a str>,
        package_names: &'a HashMap<String, String>,
        alias_hints: &'a HashMap<String, String>,
    ) -> Self {
        Self {
            local,
            package_names,
            alias_hints,
            qualifiers: BTreeMap::new(),
            taken: RESERVED.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    /// Qualifier to use for `path`, or `None` when it is the local package.
    pub fn qualify(&mut self, path: &str) -> Option<String> {
        if self.local == Some(path) {
            return None;
        }
        if let Some(existing) = self.qualifiers.get(path) {
            return Some(existing.clone());
        }

        let base = self
            .alias_hints
            .get(path)
            .filter(|alias| !matches!(alias.as_str(), "_" | "."))
            .or_else(|| self.package_names.get(path))
            .cloned()
            .unwrap_or_else(|| default_package_name(path));

        let mut candidate = base.clone();
        let mut n = 2;
        while is_predeclared(&candidate) || self.taken.contains(&candidate) {
            candidate = format!("{base}{n}");
            n += 1;
        }

        self.taken.insert(candidate.clone());
        self.qualifiers.insert(path.to_string(), candidate.clone());
        Some(candidate)
    }

    pub fn is_empty(&self) -> bool {
        self.qualifiers.is_empty()
    }

    /// The import declaration: standard library first, then everything
    /// else, each group sorted by path.
    pub fn render(&self) -> String {
        let line = |path: &str, qualifier: &str| {
            let last = path.rsplit('/').next().unwrap_or(path);
            if qualifier == last {
                format!("\"{path}\"")
            } else {
                format!("{qualifier} \"{path}\"")
            }
        };

        if self.qualifiers.len() == 1
            && let Some((path, qualifier)) = self.qualifiers.iter().next()
        {
            return format!("import {}\n", line(path, qualifier));
        }

        let (std, other): (Vec<_>, Vec<_>) = self
            .qualifiers
            .iter()
            .partition(|(path, _)| is_standard_library(path));

        let mut out = String::from("import (\n");
        for (path, qualifier) in &std {
            out.push('\t');
            out.push_str(&line(path, qualifier));
            out.push('\n');
        }
        if !std.is_empty() && !other.is_empty() {
            out.push('\n');
        }
        for (path, qualifier) in &other {
            out.push('\t');
            out.push_str(&line(path, qualifier));
            out.push('\n');
        }
        out.push_str(")\n");
        out
    }
}

/// Standard library paths have no dot in their first element.
pub fn is_standard_library(path: &str) -> bool {
    !path.split('/').next().unwrap_or(path).contains('.')
}
