//! Decorator synthesis for instrumented interface wrappers.
//!
//! This crate provides:
//! - [`model`]: the language-agnostic Type Model (interfaces, methods, types
//!   and their capability sets)
//! - [`rules`]: ordered `pattern:prefix` rules deciding which methods are
//!   instrumented
//! - [`select`]: first-match-wins method selection
//! - [`plan`]: the decorator plan for one interface
//! - [`synth`]: the instrumented method body as an ordered operation list
//!
//! Nothing here performs I/O. Loading interfaces and rendering the plan into
//! source text is left to the language collaborators.
//!
//! # Example
//! ```
//! use instrument_core::model::{Interface, Method, Origin, Type};
//! use instrument_core::rules::PrefixRuleSet;
//! use instrument_core::{plan, synth};
//!
//! let iface = Interface::new(
//!     "client",
//!     Origin::new("example.com/svc", "svc", "client"),
//!     vec![Method::new("Ping", vec![], vec![Type::error()], false)],
//! );
//! let rules = PrefixRuleSet::parse([".+:svc"]).unwrap();
//!
//! let wrapped = plan::plan(&iface, &rules, "");
//! assert_eq!(wrapped.decorated_type_name, "InstrumentedClient");
//!
//! let body = synth::synthesize(&wrapped, &wrapped.wrapped_methods[0]);
//! assert_eq!(body.operations.len(), 7);
//! ```

pub mod error;
pub mod model;
pub mod plan;
pub mod rules;
pub mod select;
pub mod synth;

pub use error::{Error, Result};
pub use model::{CapabilitySet, Interface, Method, Origin, Signature, Type, TypeExpr};
pub use plan::{WrappedInterface, WrappedMethod, plan};
pub use rules::{PrefixRule, PrefixRuleSet};
pub use synth::{Operation, SynthesizedMethod, synthesize};
