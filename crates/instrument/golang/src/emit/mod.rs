//! Go source emission for decorator plans.

pub mod imports;
pub mod render;

use std::collections::HashMap;
use std::fmt::Write as _;

use instrument_core::WrappedInterface;
use instrument_core::synth::synthesize_all;

use imports::ImportSet;
use render::{doc_comment, type_expr};

/// Version stamped into the generated-code header.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The metrics sink every decorator holds a pointer to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reporter {
    pub import_path: String,
    pub type_name: String,
    pub request_method: String,
    pub error_method: String,
    pub duration_method: String,
}

impl Default for Reporter {
    fn default() -> Self {
        Self {
            import_path: "github.com/efritz/imperial/red".into(),
            type_name: "Reporter".into(),
            request_method: "ReportRequest".into(),
            error_method: "ReportError".into(),
            duration_method: "ReportDuration".into(),
        }
    }
}

/// Where the rendered file lives.
#[derive(Debug, Clone, Copy)]
pub struct Target<'a> {
    pub package: &'a str,
    /// Import path of the output package, when it is known.
    pub import_path: Option<&'a str>,
}

/// Package names and source-file aliases used to spell qualifiers.
#[derive(Debug, Default)]
pub struct Naming {
    pub package_names: HashMap<String, String>,
    pub alias_hints: HashMap<String, String>,
}

pub fn header() -> String {
    format!("// Code generated by go-instrument {VERSION}; DO NOT EDIT.")
}

/// Render one output file holding a decorator per plan.
pub fn render_file(
    target: Target<'_>,
    plans: &[WrappedInterface<'_>],
    reporter: &Reporter,
    naming: &Naming,
) -> String {
    let mut imports = ImportSet::new(
        target.import_path,
        &naming.package_names,
        &naming.alias_hints,
    );

    let decls: Vec<String> = plans
        .iter()
        .map(|plan| decorator(&mut imports, reporter, plan))
        .collect();

    let mut out = header();
    let _ = write!(out, "\n\npackage {}\n", target.package);
    if !imports.is_empty() {
        out.push('\n');
        out.push_str(&imports.render());
    }
    for decl in decls {
        out.push('\n');
        out.push_str(&decl);
    }
    out
}

fn reporter_type(imports: &mut ImportSet<'_>, reporter: &Reporter) -> String {
    if reporter.import_path.is_empty() {
        return format!("*{}", reporter.type_name);
    }
    match imports.qualify(&reporter.import_path) {
        Some(qualifier) => format!("*{qualifier}.{}", reporter.type_name),
        None => format!("*{}", reporter.type_name),
    }
}

/// Struct, constructor and instrumented methods for one interface.
fn decorator(imports: &mut ImportSet<'_>, reporter: &Reporter, plan: &WrappedInterface<'_>) -> String {
    let iface = plan.interface;
    let iface_type = type_expr(imports, &iface.type_expr());
    let reporter_type = reporter_type(imports, reporter);
    let name = &plan.decorated_type_name;

    let mut out = doc_comment(&format!(
        "{name} is a wrapper around the {} interface (from the package {}) that emits request, duration, and error metrics.",
        iface.name, iface.origin.import_path
    ));
    let _ = write!(
        out,
        "type {name} struct {{\n\t{iface_type}\n\treporter {reporter_type}\n}}\n\n"
    );

    out.push_str(&doc_comment(&format!(
        "{} creates a new instrumented version of the {} interface.",
        plan.constructor_name, iface.name
    )));
    let _ = write!(
        out,
        "func {}(inner {iface_type}, reporter {reporter_type}) *{name} {{\n\treturn &{name}{{{}: inner, reporter: reporter}}\n}}\n",
        plan.constructor_name, iface.name
    );

    for method in synthesize_all(plan) {
        out.push('\n');
        out.push_str(&render::method(imports, reporter, &method));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use instrument_core::model::{Interface, Method, Origin, Type};
    use instrument_core::{PrefixRuleSet, plan};
    use pretty_assertions::assert_eq;

    #[test]
    fn interface_without_wrapped_methods_still_gets_a_decorator() {
        let iface = Interface::new(
            "pinger",
            Origin::new("example.com/svc", "svc", "pinger"),
            vec![Method::new("Ping", vec![], vec![Type::error()], false)],
        );
        let rules = PrefixRuleSet::parse(["^Nothing$:none"]).unwrap();
        let plans = [plan(&iface, &rules, "")];
        let rendered = render_file(
            Target {
                package: "svc",
                import_path: Some("example.com/svc"),
            },
            &plans,
            &Reporter::default(),
            &Naming::default(),
        );

        assert_eq!(
            rendered,
            "// Code generated by go-instrument 0.1.0; DO NOT EDIT.

package svc

import \"github.com/efritz/imperial/red\"

// InstrumentedPinger is a wrapper around the pinger interface (from the
// package example.com/svc) that emits request, duration, and error
// metrics.
type InstrumentedPinger struct {
\tpinger
\treporter *red.Reporter
}

// NewInstrumentedPinger creates a new instrumented version of the pinger
// interface.
func NewInstrumentedPinger(inner pinger, reporter *red.Reporter) *InstrumentedPinger {
\treturn &InstrumentedPinger{pinger: inner, reporter: reporter}
}
"
        );
    }

    #[test]
    fn zero_result_methods_have_no_return_and_report_nil() {
        let iface = Interface::new(
            "Closer",
            Origin::new("example.com/svc", "svc", "closer"),
            vec![Method::new("Close", vec![], vec![], false)],
        );
        let rules = PrefixRuleSet::parse(["Close:closer"]).unwrap();
        let plans = [plan(&iface, &rules, "")];
        let reporter = Reporter {
            import_path: "example.com/metrics".into(),
            type_name: "Sink".into(),
            request_method: "Attempt".into(),
            error_method: "Fail".into(),
            duration_method: "Time".into(),
        };
        let rendered = render_file(
            Target {
                package: "wrapped",
                import_path: Some("example.com/svc/wrapped"),
            },
            &plans,
            &reporter,
            &Naming::default(),
        );

        assert_eq!(
            rendered.split("\n\n").last().unwrap(),
            "// Close delegates to the wrapped implementation and emits metrics with the
// prefix 'closer'.
func (i *InstrumentedCloser) Close() {
\tstart := time.Now()
\ti.reporter.Attempt(\"closer\")
\ti.Closer.Close()
\tduration := float64(time.Now().Sub(start)) / float64(time.Second)
\ti.reporter.Fail(\"closer\", nil)
\ti.reporter.Time(\"closer\", duration)
}
"
        );
        assert!(rendered.contains("\tsvc.Closer\n\treporter *metrics.Sink\n"));
        assert!(rendered.contains(
            "import (\n\t\"time\"\n\n\t\"example.com/metrics\"\n\t\"example.com/svc\"\n)\n"
        ));
    }
}
