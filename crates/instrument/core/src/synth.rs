//! Instrumented method bodies.
//!
//! [`synthesize`] lays out the body of one decorated method as a fixed
//! sequence of abstract [`Operation`]s. Emitters render the sequence in
//! order; they never reorder or drop steps.

use crate::model::Type;
use crate::plan::{WrappedInterface, WrappedMethod};

/// Name of the receiver in decorated methods.
pub const RECEIVER: &str = "i";

/// Local holding the start timestamp.
pub const START: &str = "start";

/// Local holding the elapsed seconds.
pub const DURATION: &str = "duration";

/// A positional parameter of a decorated method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub ty: Type,
    /// Last parameter of a variadic method; `ty` is the collected slice type.
    pub variadic: bool,
}

/// An argument forwarded to the inner implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument {
    pub name: String,
    /// Forward as a spread of the caller's variadic arguments.
    pub spread: bool,
}

/// Value passed to the error metric.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorArgument {
    /// The bound trailing result.
    Result(String),
    /// Nothing to report; the metric is still emitted.
    Nil,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    CaptureStart {
        binding: String,
    },
    ReportRequest {
        prefix: String,
    },
    Invoke {
        target: String,
        method: String,
        args: Vec<Argument>,
        bindings: Vec<String>,
    },
    MeasureDuration {
        binding: String,
        start: String,
    },
    ReportError {
        prefix: String,
        error: ErrorArgument,
    },
    ReportDuration {
        prefix: String,
        duration: String,
    },
    Return {
        values: Vec<String>,
    },
}

/// A decorated method ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedMethod {
    pub name: String,
    pub receiver: String,
    pub receiver_type: String,
    pub metric_prefix: String,
    pub params: Vec<Param>,
    pub results: Vec<Type>,
    pub operations: Vec<Operation>,
}

pub fn param_name(index: usize) -> String {
    format!("v{index}")
}

pub fn result_name(index: usize) -> String {
    format!("r{index}")
}

/// Lay out the instrumented body for `wrapped`.
pub fn synthesize(iface: &WrappedInterface<'_>, wrapped: &WrappedMethod<'_>) -> SynthesizedMethod {
    let method = wrapped.method;
    let prefix = wrapped.metric_prefix.clone();
    let last_param = method.params.len().checked_sub(1);

    let params: Vec<Param> = method
        .params
        .iter()
        .enumerate()
        .map(|(index, ty)| Param {
            name: param_name(index),
            ty: ty.clone(),
            variadic: method.variadic && Some(index) == last_param,
        })
        .collect();

    let args = params
        .iter()
        .map(|param| Argument {
            name: param.name.clone(),
            spread: param.variadic,
        })
        .collect();

    let bindings: Vec<String> = (0..method.results.len()).map(result_name).collect();

    let error = match bindings.last() {
        Some(last) if wrapped.has_error_result => ErrorArgument::Result(last.clone()),
        _ => ErrorArgument::Nil,
    };

    let operations = vec![
        Operation::CaptureStart {
            binding: START.to_string(),
        },
        Operation::ReportRequest {
            prefix: prefix.clone(),
        },
        Operation::Invoke {
            target: iface.interface.name.clone(),
            method: method.name.clone(),
            args,
            bindings: bindings.clone(),
        },
        Operation::MeasureDuration {
            binding: DURATION.to_string(),
            start: START.to_string(),
        },
        Operation::ReportError {
            prefix: prefix.clone(),
            error,
        },
        Operation::ReportDuration {
            prefix: prefix.clone(),
            duration: DURATION.to_string(),
        },
        Operation::Return { values: bindings },
    ];

    SynthesizedMethod {
        name: method.name.clone(),
        receiver: RECEIVER.to_string(),
        receiver_type: iface.decorated_type_name.clone(),
        metric_prefix: prefix,
        params,
        results: method.results.clone(),
        operations,
    }
}

/// Synthesize every planned method, in plan order.
pub fn synthesize_all(iface: &WrappedInterface<'_>) -> Vec<SynthesizedMethod> {
    iface
        .wrapped_methods
        .iter()
        .map(|wrapped| synthesize(iface, wrapped))
        .collect()
}
