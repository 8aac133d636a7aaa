//! Go source rendering for types, doc comments and method bodies.

use std::fmt::Write as _;

use instrument_core::model::{ChanDir, FuncType, TypeExpr};
use instrument_core::synth::{ErrorArgument, Operation, SynthesizedMethod};

use super::Reporter;
use super::imports::ImportSet;

/// Doc comment text width, excluding the `// ` marker.
pub const DOC_WIDTH: usize = 72;

pub fn type_expr(imports: &mut ImportSet<'_>, expr: &TypeExpr) -> String {
    match expr {
        TypeExpr::Named { path, name, args } => {
            let mut out = match path.as_deref().and_then(|p| imports.qualify(p)) {
                Some(qualifier) => format!("{qualifier}.{name}"),
                None => name.clone(),
            };
            if !args.is_empty() {
                let args: Vec<_> = args.iter().map(|a| type_expr(imports, a)).collect();
                let _ = write!(out, "[{}]", args.join(", "));
            }
            out
        }
        TypeExpr::Pointer(elem) => format!("*{}", type_expr(imports, elem)),
        TypeExpr::Slice(elem) => format!("[]{}", type_expr(imports, elem)),
        TypeExpr::Array { len, elem } => format!("[{len}]{}", type_expr(imports, elem)),
        TypeExpr::Map { key, value } => format!(
            "map[{}]{}",
            type_expr(imports, key),
            type_expr(imports, value)
        ),
        TypeExpr::Chan { dir, elem } => {
            let inner = type_expr(imports, elem);
            match dir {
                ChanDir::Both if matches!(**elem, TypeExpr::Chan { dir: ChanDir::Recv, .. }) => {
                    format!("chan ({inner})")
                }
                ChanDir::Both => format!("chan {inner}"),
                ChanDir::Send => format!("chan<- {inner}"),
                ChanDir::Recv => format!("<-chan {inner}"),
            }
        }
        TypeExpr::Func(func) => format!("func{}", signature(imports, func)),
        TypeExpr::Interface(signatures) if signatures.is_empty() => "interface{}".to_string(),
        TypeExpr::Interface(signatures) => {
            let methods: Vec<_> = signatures
                .iter()
                .map(|sig| format!("{}{}", sig.name, signature(imports, &sig.func)))
                .collect();
            format!("interface{{ {} }}", methods.join("; "))
        }
        TypeExpr::Struct(fields) if fields.is_empty() => "struct{}".to_string(),
        TypeExpr::Struct(fields) => {
            let fields: Vec<_> = fields
                .iter()
                .map(|field| {
                    let mut out = match &field.name {
                        Some(name) => format!("{name} {}", type_expr(imports, &field.ty)),
                        None => type_expr(imports, &field.ty),
                    };
                    if let Some(tag) = &field.tag {
                        out.push(' ');
                        out.push_str(tag);
                    }
                    out
                })
                .collect();
            format!("struct{{ {} }}", fields.join("; "))
        }
    }
}

/// `(params) results` of an anonymous function type.
fn signature(imports: &mut ImportSet<'_>, func: &FuncType) -> String {
    let last = func.params.len().checked_sub(1);
    let params: Vec<_> = func
        .params
        .iter()
        .enumerate()
        .map(|(index, param)| variadic_param(imports, param, func.variadic && Some(index) == last))
        .collect();
    let results: Vec<_> = func.results.iter().map(|r| type_expr(imports, r)).collect();
    format!("({}){}", params.join(", "), results_clause(&results))
}

fn variadic_param(imports: &mut ImportSet<'_>, ty: &TypeExpr, variadic: bool) -> String {
    match ty.slice_elem() {
        Some(elem) if variadic => format!("...{}", type_expr(imports, elem)),
        _ => type_expr(imports, ty),
    }
}

fn results_clause(results: &[String]) -> String {
    match results {
        [] => String::new(),
        [single] => format!(" {single}"),
        many => format!(" ({})", many.join(", ")),
    }
}

/// Quote `s` as a Go interpreted string literal.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04x}", u32::from(c));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Greedy word wrap into `// ` comment lines.
pub fn doc_comment(text: &str) -> String {
    let mut out = String::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        if !line.is_empty() && line.len() + 1 + word.len() > DOC_WIDTH {
            let _ = writeln!(out, "// {line}");
            line.clear();
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(word);
    }
    if !line.is_empty() {
        let _ = writeln!(out, "// {line}");
    }
    out
}

/// One instrumented method, doc comment included.
pub fn method(imports: &mut ImportSet<'_>, reporter: &Reporter, method: &SynthesizedMethod) -> String {
    let mut out = doc_comment(&format!(
        "{} delegates to the wrapped implementation and emits metrics with the prefix '{}'.",
        method.name, method.metric_prefix
    ));

    let params: Vec<_> = method
        .params
        .iter()
        .map(|param| {
            format!(
                "{} {}",
                param.name,
                variadic_param(imports, &param.ty.expr, param.variadic)
            )
        })
        .collect();
    let results: Vec<_> = method
        .results
        .iter()
        .map(|r| type_expr(imports, &r.expr))
        .collect();

    let _ = writeln!(
        out,
        "func ({} *{}) {}({}){} {{",
        method.receiver,
        method.receiver_type,
        method.name,
        params.join(", "),
        results_clause(&results)
    );
    for operation in &method.operations {
        if let Some(statement) = statement(imports, reporter, &method.receiver, operation) {
            let _ = writeln!(out, "\t{statement}");
        }
    }
    out.push_str("}\n");
    out
}

fn statement(
    imports: &mut ImportSet<'_>,
    reporter: &Reporter,
    receiver: &str,
    operation: &Operation,
) -> Option<String> {
    let report = |method: &str, args: &str| format!("{receiver}.reporter.{method}({args})");

    Some(match operation {
        Operation::CaptureStart { binding } => {
            let time = qualified(imports, "time", "Now");
            format!("{binding} := {time}()")
        }
        Operation::ReportRequest { prefix } => report(&reporter.request_method, &quote(prefix)),
        Operation::Invoke {
            target,
            method,
            args,
            bindings,
        } => {
            let args: Vec<_> = args
                .iter()
                .map(|arg| {
                    if arg.spread {
                        format!("{}...", arg.name)
                    } else {
                        arg.name.clone()
                    }
                })
                .collect();
            let call = format!("{receiver}.{target}.{method}({})", args.join(", "));
            if bindings.is_empty() {
                call
            } else {
                format!("{} := {call}", bindings.join(", "))
            }
        }
        Operation::MeasureDuration { binding, start } => {
            let now = qualified(imports, "time", "Now");
            let second = qualified(imports, "time", "Second");
            format!("{binding} := float64({now}().Sub({start})) / float64({second})")
        }
        Operation::ReportError { prefix, error } => {
            let error = match error {
                ErrorArgument::Result(name) => name.as_str(),
                ErrorArgument::Nil => "nil",
            };
            report(&reporter.error_method, &format!("{}, {error}", quote(prefix)))
        }
        Operation::ReportDuration { prefix, duration } => report(
            &reporter.duration_method,
            &format!("{}, {duration}", quote(prefix)),
        ),
        Operation::Return { values } if values.is_empty() => return None,
        Operation::Return { values } => format!("return {}", values.join(", ")),
    })
}

fn qualified(imports: &mut ImportSet<'_>, path: &str, name: &str) -> String {
    match imports.qualify(path) {
        Some(qualifier) => format!("{qualifier}.{name}"),
        None => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use instrument_core::model::{Field, Signature};
    use std::collections::HashMap;

    fn render(expr: &TypeExpr) -> String {
        let names = HashMap::new();
        let hints = HashMap::new();
        let mut imports = ImportSet::new(Some("example.com/svc"), &names, &hints);
        type_expr(&mut imports, expr)
    }

    #[test]
    fn renders_composite_types() {
        let int = || TypeExpr::predeclared("int");
        assert_eq!(render(&TypeExpr::named("example.com/svc", "Local")), "Local");
        assert_eq!(render(&TypeExpr::named("net/http", "Request")), "http.Request");
        assert_eq!(
            render(&TypeExpr::Map {
                key: Box::new(TypeExpr::predeclared("string")),
                value: Box::new(TypeExpr::slice_of(TypeExpr::pointer_to(int()))),
            }),
            "map[string][]*int"
        );
        assert_eq!(
            render(&TypeExpr::Array {
                len: "4".into(),
                elem: Box::new(TypeExpr::predeclared("byte")),
            }),
            "[4]byte"
        );
        assert_eq!(
            render(&TypeExpr::Chan {
                dir: ChanDir::Both,
                elem: Box::new(TypeExpr::Chan {
                    dir: ChanDir::Recv,
                    elem: Box::new(int()),
                }),
            }),
            "chan (<-chan int)"
        );
        assert_eq!(
            render(&TypeExpr::Chan {
                dir: ChanDir::Send,
                elem: Box::new(int()),
            }),
            "chan<- int"
        );
        assert_eq!(
            render(&TypeExpr::Func(FuncType {
                params: vec![int(), TypeExpr::slice_of(TypeExpr::predeclared("any"))],
                results: vec![int(), TypeExpr::predeclared("error")],
                variadic: true,
            })),
            "func(int, ...any) (int, error)"
        );
        assert_eq!(
            render(&TypeExpr::Interface(vec![Signature::new(
                "Error",
                FuncType {
                    params: vec![],
                    results: vec![TypeExpr::predeclared("string")],
                    variadic: false,
                },
            )])),
            "interface{ Error() string }"
        );
        assert_eq!(render(&TypeExpr::Interface(vec![])), "interface{}");
        assert_eq!(
            render(&TypeExpr::Struct(vec![
                Field {
                    name: Some("Name".into()),
                    ty: TypeExpr::predeclared("string"),
                    tag: Some("`json:\"name\"`".into()),
                },
                Field {
                    name: None,
                    ty: TypeExpr::named("sync", "Mutex"),
                    tag: None,
                },
            ])),
            "struct{ Name string `json:\"name\"`; sync.Mutex }"
        );
        assert_eq!(
            render(&TypeExpr::Named {
                path: Some("example.com/svc".into()),
                name: "Box".into(),
                args: vec![int()],
            }),
            "Box[int]"
        );
    }

    #[test]
    fn quotes_go_strings() {
        assert_eq!(quote("svc"), "\"svc\"");
        assert_eq!(quote("a\"b\\c\n"), "\"a\\\"b\\\\c\\n\"");
        assert_eq!(quote("\u{1}"), "\"\\u0001\"");
    }

    #[test]
    fn wraps_doc_comments() {
        let text = "NewInstrumentedTestClient creates a new instrumented version of the Client interface.";
        assert_eq!(
            doc_comment(text),
            "// NewInstrumentedTestClient creates a new instrumented version of the\n// Client interface.\n"
        );
        assert_eq!(doc_comment("short"), "// short\n");
        assert_eq!(doc_comment(""), "");
    }
}
